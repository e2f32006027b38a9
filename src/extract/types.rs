//! Type mapping: annotation node → token chain → [`Ty`].
use crate::ir::{BaseType, Requiredness, Ty};
use crate::node::{Keyword, Node};

pub const OPTIONAL_MARKER: &str = "Optional";

enum Mapped {
    Base(BaseType),
    List,
    Map,
}

fn lookup(token: &str) -> Option<Mapped> {
    let mapped = match token.to_ascii_lowercase().as_str() {
        "str" | "strictstr" | "constr" | "datetime" | "ipv4address" | "ipv6address" => {
            Mapped::Base(BaseType::String)
        }
        "int" | "strictint" | "conint" => Mapped::Base(BaseType::Int),
        "float" | "strictfloat" | "confloat" => Mapped::Base(BaseType::Float),
        "bool" | "strictbool" => Mapped::Base(BaseType::Bool),
        "list" | "conlist" => Mapped::List,
        "dict" => Mapped::Map,
        _ => return None,
    };
    Some(mapped)
}

/// Flattened annotation: outermost token first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTokens {
    pub tokens: Vec<String>,
    /// Keywords of constrained-type calls such as `conint(ge=1)`.
    pub keywords: Vec<Keyword>,
}

impl TypeTokens {
    pub fn requiredness(&self) -> Requiredness {
        match self.tokens.first() {
            Some(first) if first == OPTIONAL_MARKER => Requiredness::Optional,
            _ => Requiredness::Required,
        }
    }

    pub fn to_ty(&self) -> Result<Ty, String> {
        map_tokens(&self.tokens)
    }
}

/// Walk a type annotation into its token chain.
pub fn annotation_tokens(annotation: &Node) -> Result<TypeTokens, String> {
    let mut out = TypeTokens::default();
    collect_tokens(annotation, &mut out)?;
    Ok(out)
}

fn collect_tokens(node: &Node, out: &mut TypeTokens) -> Result<(), String> {
    match node {
        Node::Name { id } => {
            out.tokens.push(id.clone());
            Ok(())
        }
        Node::Call { func, args, keywords } => {
            let Some(id) = func.as_name() else {
                return Err(format!("constrained type is a call on a {}", func.kind()));
            };
            out.tokens.push(id.to_string());
            out.keywords.extend(keywords.iter().cloned());
            // conlist(str, ...) carries its element type positionally
            match args.first() {
                Some(element) => collect_tokens(element, out),
                None => Ok(()),
            }
        }
        Node::Subscript { value, slice } => {
            let Some(id) = value.as_name() else {
                return Err(format!("subscripted {} in type annotation", value.kind()));
            };
            out.tokens.push(id.to_string());
            if id.eq_ignore_ascii_case("dict") {
                return Ok(());
            }
            collect_tokens(slice, out)
        }
        Node::Constant { .. }
        | Node::List { .. }
        | Node::Mapping { .. }
        | Node::ScopedBlock { .. }
        | Node::ExprStatement { .. } => {
            Err(format!("unexpected {} in type annotation", node.kind()))
        }
    }
}

/// Map a token chain to a type. A leading optional marker is skipped; unknown
/// tokens are taken to name another schema.
pub fn map_tokens(tokens: &[String]) -> Result<Ty, String> {
    let tokens = match tokens.split_first() {
        Some((first, rest)) if first == OPTIONAL_MARKER => rest,
        _ => tokens,
    };
    let Some((head, rest)) = tokens.split_first() else {
        return Err("empty type annotation".to_string());
    };
    match lookup(head) {
        Some(Mapped::Base(base)) => Ok(Ty::Base(base)),
        Some(Mapped::Map) => Ok(Ty::Map),
        Some(Mapped::List) => {
            if rest.is_empty() {
                return Err(format!("`{head}` without an element type"));
            }
            Ok(Ty::List(Box::new(map_tokens(rest)?)))
        }
        None => {
            tracing::debug!(token = %head, "unmapped type name, assuming a schema reference");
            Ok(Ty::Struct(head.clone()))
        }
    }
}
