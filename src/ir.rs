// Strongly-typed IR shared by extraction and codegen. No source nodes here.
use serde::Serialize;

/// Name of the shared pagination block composed into paginated schemas.
pub const PAGINATION_STRUCT: &str = "PaginationParamModel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseType {
    String,
    Int,
    Float,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ty {
    Base(BaseType),
    /// Element type is always tracked for lists.
    List(Box<Ty>),
    /// Always `map[string]string`; value typing is not tracked.
    Map,
    /// Reference to another registered struct, by source name.
    Struct(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requiredness {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Go identifier.
    pub name: String,
    pub ty: Ty,
    /// JSON key the field (de)serializes under.
    pub key: String,
    /// Validator directives; the first one is always the requiredness.
    pub directives: Vec<String>,
    pub requiredness: Requiredness,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>, // declaration order
    /// Embeds the shared pagination block.
    pub pagination: bool,
    /// Go names of per-struct check methods, in declaration order.
    pub checks: Vec<String>,
}

impl BaseType {
    pub const ALL: [BaseType; 4] = [BaseType::Int, BaseType::Float, BaseType::Bool, BaseType::String];

    pub fn go_name(self) -> &'static str {
        match self {
            BaseType::String => "string",
            BaseType::Int => "int",
            BaseType::Float => "float64",
            BaseType::Bool => "bool",
        }
    }

    pub fn zero_literal(self) -> &'static str {
        match self {
            BaseType::String => "\"\"",
            BaseType::Int => "0",
            BaseType::Float => "0.0",
            BaseType::Bool => "false",
        }
    }

    /// Runtime helper that turns a value into a pointer.
    pub fn ptr_helper(self) -> &'static str {
        match self {
            BaseType::String => "StringPtr",
            BaseType::Int => "IntPtr",
            BaseType::Float => "Float64Ptr",
            BaseType::Bool => "BoolPtr",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BaseType::Int | BaseType::Float)
    }
}

impl Ty {
    pub fn is_base_type(&self) -> bool {
        matches!(self, Ty::Base(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Ty::List(_) | Ty::Map)
    }

    pub fn element(&self) -> Option<&Ty> {
        match self {
            Ty::List(element) => Some(element),
            Ty::Base(_) | Ty::Map | Ty::Struct(_) => None,
        }
    }

    /// Struct name this type bottoms out in, looking through lists.
    pub fn struct_ref(&self) -> Option<&str> {
        match self {
            Ty::Struct(name) => Some(name),
            Ty::List(element) => element.struct_ref(),
            Ty::Base(_) | Ty::Map => None,
        }
    }

    pub fn go_type(&self) -> String {
        match self {
            Ty::Base(base) => base.go_name().to_string(),
            Ty::List(element) => format!("[]{}", element.go_type()),
            Ty::Map => "map[string]string".to_string(),
            Ty::Struct(name) => name.clone(),
        }
    }
}

impl Requiredness {
    pub fn directive(self) -> &'static str {
        match self {
            Requiredness::Required => "required",
            Requiredness::Optional => "omitempty",
        }
    }
}

impl Field {
    /// Optional scalars and structs are pointers; lists and maps never are.
    pub fn is_pointer(&self) -> bool {
        self.requiredness == Requiredness::Optional && !self.ty.is_container()
    }

    pub fn go_type(&self) -> String {
        let ty = self.ty.go_type();
        if self.is_pointer() { format!("*{ty}") } else { ty }
    }

    pub fn tag(&self) -> String {
        format!(
            "`json:\"{}\" validate:\"{}\"`",
            self.key,
            self.directives.join(",")
        )
    }
}

impl Struct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            pagination: false,
            checks: Vec::new(),
        }
    }

    /// The shared pagination block, as an ordinary struct.
    pub fn pagination_block() -> Self {
        fn page_field(name: &str, key: &str, requiredness: Requiredness, rules: &[&str]) -> Field {
            let mut directives = vec![requiredness.directive().to_string()];
            directives.extend(rules.iter().map(|r| r.to_string()));
            Field {
                name: name.to_string(),
                ty: Ty::Base(BaseType::Int),
                key: key.to_string(),
                directives,
                requiredness,
            }
        }
        Self {
            name: PAGINATION_STRUCT.to_string(),
            fields: vec![
                page_field("PageNo", "page_no", Requiredness::Optional, &["gte=1"]),
                page_field("Page", "page", Requiredness::Optional, &["gte=1"]),
                page_field("PageNumber", "page_number", Requiredness::Optional, &["gte=1"]),
                page_field("PageSize", "page_size", Requiredness::Required, &["gte=1", "lte=50"]),
            ],
            pagination: false,
            checks: Vec::new(),
        }
    }

    /// Names of structs referenced by this struct's fields, in field order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| f.ty.struct_ref())
    }
}
