//! Test fixture mining.
//!
//! Pass payloads come from bare schema calls in test functions
//! (`HostParam(**{...})`); fail payloads come from the first call inside a
//! scoped block (`with pytest.raises(...): HostParam(**{...})`).
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ConvertError, Result};
use crate::naming::name_with_file;
use crate::node::{ClassItem, FunctionDef, Keyword, Module, Node};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fixtures {
    pub success: Vec<Value>,
    pub fail: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FixtureTable {
    entries: IndexMap<String, Fixtures>,
    #[serde(skip)]
    owners: IndexMap<String, String>, // schema key → test module that claimed it
}

impl FixtureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &str) -> Option<&Fixtures> {
        self.entries.get(schema)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mine every test function of `module`: methods of its classes, then
    /// top-level functions.
    pub fn mine_module(&mut self, module: &Module) -> Result<()> {
        let methods = module.classes().flat_map(|class| {
            class.body.iter().filter_map(|item| match item {
                ClassItem::Method(method) => Some(method),
                ClassItem::Field(_) | ClassItem::Assign(_) => None,
            })
        });
        for function in methods.chain(module.functions()) {
            if let Some((schema, fixtures)) = mine_function(&module.name, function)? {
                self.insert(&module.name, schema, fixtures);
            }
        }
        Ok(())
    }

    fn insert(&mut self, module: &str, schema: String, fixtures: Fixtures) {
        let key = match self.owners.get(&schema) {
            Some(owner) if owner != module => {
                name_with_file(&schema, module.strip_prefix("test_").unwrap_or(module))
            }
            _ => schema,
        };
        self.owners.entry(key.clone()).or_insert_with(|| module.to_string());
        let entry = self.entries.entry(key).or_default();
        entry.success.extend(fixtures.success);
        entry.fail.extend(fixtures.fail);
    }
}

fn mine_function(module: &str, function: &FunctionDef) -> Result<Option<(String, Fixtures)>> {
    let context = format!("{module}::{}", function.name);
    let mut schema: Option<String> = None;
    let mut fixtures = Fixtures::default();

    for stmt in &function.body {
        match stmt {
            Node::ExprStatement { value } => match schema_call(value) {
                Some((name, keywords)) => {
                    schema = Some(name.to_string());
                    fixtures.success.push(payload(&context, keywords)?);
                }
                None => tracing::debug!(%context, "skipping non-schema expression"),
            },
            Node::ScopedBlock { body, .. } => {
                let call = match body.first() {
                    Some(Node::ExprStatement { value }) => schema_call(value),
                    _ => None,
                };
                match call {
                    Some((name, keywords)) => {
                        schema.get_or_insert_with(|| name.to_string());
                        fixtures.fail.push(payload(&context, keywords)?);
                    }
                    None => tracing::debug!(%context, "skipping scoped block without a schema call"),
                }
            }
            other => tracing::debug!(%context, kind = other.kind(), "skipping statement"),
        }
    }

    Ok(schema.map(|name| (name, fixtures)))
}

/// `Name(...)` on an undotted name; dotted calls are assertions and helpers.
fn schema_call(node: &Node) -> Option<(&str, &[Keyword])> {
    match node {
        Node::Call { func, keywords, .. } => {
            let name = func.as_name()?;
            if name.contains('.') { None } else { Some((name, keywords)) }
        }
        _ => None,
    }
}

fn payload(context: &str, keywords: &[Keyword]) -> Result<Value> {
    if let [Keyword { arg: None, value }] = keywords {
        return node_to_value(context, value);
    }
    let mut map = Map::new();
    for keyword in keywords {
        match &keyword.arg {
            Some(arg) => {
                map.insert(arg.clone(), node_to_value(context, &keyword.value)?);
            }
            None => {
                if let Value::Object(splat) = node_to_value(context, &keyword.value)? {
                    map.extend(splat);
                }
            }
        }
    }
    Ok(Value::Object(map))
}

/// Literal payload node → untyped value tree.
pub fn node_to_value(context: &str, node: &Node) -> Result<Value> {
    match node {
        Node::Constant { value } => Ok(value.to_value()),
        Node::List { elts } => elts
            .iter()
            .map(|elt| node_to_value(context, elt))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Node::Mapping { keys, values } => {
            if keys.len() != values.len() {
                return Err(ConvertError::MalformedNode {
                    schema: context.to_string(),
                    reason: "mapping literal with mismatched keys and values".to_string(),
                });
            }
            let mut map = Map::new();
            for (key, value) in keys.iter().zip(values) {
                let key = key.as_str_constant().ok_or_else(|| ConvertError::MalformedNode {
                    schema: context.to_string(),
                    reason: format!("mapping key is a {}, not a string constant", key.kind()),
                })?;
                map.insert(key.to_string(), node_to_value(context, value)?);
            }
            Ok(Value::Object(map))
        }
        Node::Name { .. }
        | Node::Call { .. }
        | Node::Subscript { .. }
        | Node::ScopedBlock { .. }
        | Node::ExprStatement { .. } => {
            tracing::debug!(%context, kind = node.kind(), "non-literal payload value, using null");
            Ok(Value::Null)
        }
    }
}
