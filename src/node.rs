//! Source node model.
//!
//! Already-parsed Python definitions, as handed over by whatever parsed the
//! source files. Only the node kinds the extractors pattern-match on exist here;
//! dotted references (`pytest.raises`, `self.assertTrue`) are carried as a
//! single [`Node::Name`] whose id contains a `.`.
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// EXPRESSIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Name {
        id: String,
    },
    Call {
        func: Box<Node>,
        #[serde(default)]
        args: Vec<Node>,
        #[serde(default)]
        keywords: Vec<Keyword>,
    },
    Subscript {
        value: Box<Node>,
        slice: Box<Node>,
    },
    Constant {
        value: Constant,
    },
    List {
        elts: Vec<Node>,
    },
    Mapping {
        keys: Vec<Node>,
        values: Vec<Node>,
    },
    /// `with <context>: <body>`
    ScopedBlock {
        #[serde(default)]
        context: Vec<Node>,
        body: Vec<Node>,
    },
    ExprStatement {
        value: Box<Node>,
    },
}

/// `arg=value`; a missing `arg` is a `**value` splat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(default)]
    pub arg: Option<String>,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    None,
}

impl Node {
    pub fn name(id: impl Into<String>) -> Self {
        Node::Name { id: id.into() }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Node::Constant { value: Constant::Str(value.into()) }
    }

    pub fn int(value: i64) -> Self {
        Node::Constant { value: Constant::Int(value) }
    }

    pub fn call(func: Node, args: Vec<Node>, keywords: Vec<Keyword>) -> Self {
        Node::Call { func: Box::new(func), args, keywords }
    }

    pub fn subscript(value: Node, slice: Node) -> Self {
        Node::Subscript { value: Box::new(value), slice: Box::new(slice) }
    }

    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Name { .. } => "name",
            Node::Call { .. } => "call",
            Node::Subscript { .. } => "subscript",
            Node::Constant { .. } => "constant",
            Node::List { .. } => "list",
            Node::Mapping { .. } => "mapping",
            Node::ScopedBlock { .. } => "scoped block",
            Node::ExprStatement { .. } => "expression statement",
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Node::Name { id } => Some(id),
            _ => None,
        }
    }

    pub fn as_str_constant(&self) -> Option<&str> {
        match self {
            Node::Constant { value: Constant::Str(s) } => Some(s),
            _ => None,
        }
    }
}

impl Keyword {
    pub fn new(arg: impl Into<String>, value: Node) -> Self {
        Self { arg: Some(arg.into()), value }
    }

    pub fn splat(value: Node) -> Self {
        Self { arg: None, value }
    }
}

impl Constant {
    /// Text of the constant as Python's `str()` would print it.
    pub fn render(&self) -> String {
        match self {
            Constant::Bool(true) => "True".to_string(),
            Constant::Bool(false) => "False".to_string(),
            Constant::Int(i) => i.to_string(),
            Constant::Float(f) => format!("{f:?}"),
            Constant::Str(s) => s.clone(),
            Constant::None => "None".to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::from(*i),
            Constant::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Constant::Str(s) => Value::String(s.clone()),
            Constant::None => Value::Null,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFINITIONS
// ————————————————————————————————————————————————————————————————————————————

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// File stem, e.g. `serializers` for `serializers.py`.
    pub name: String,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Class(ClassDef),
    Function(FunctionDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub body: Vec<ClassItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ClassItem {
    /// `name: annotation [= value]`
    Field(AnnotatedField),
    /// `targets = value`
    Assign(Assign),
    Method(FunctionDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedField {
    pub name: String,
    pub annotation: Node,
    #[serde(default)]
    pub value: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub targets: Vec<String>,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub body: Vec<Node>,
}

impl Module {
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::Class(class) => Some(class),
            Stmt::Function(_) => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::Function(function) => Some(function),
            Stmt::Class(_) => None,
        })
    }
}
