//! Constraint keywords and custom validators → validator directives.
use crate::error::{ConvertError, Result};
use crate::ir::Requiredness;
use crate::node::{AnnotatedField, Keyword, Node};

use super::types::TypeTokens;

/// Rule functions that map onto validator built-ins.
const BUILT_IN_CHECKS: &[(&str, &str)] = &[
    ("check_email", "email"),
    ("check_uuid", "uuid"),
    ("check_ip", "ip"),
    ("check_ipv6", "ipv6"),
    ("check_ipv4", "ipv4"),
    ("check_cidr", "cidr"),
    ("check_uuids", "dive,uuid,required"),
    ("check_ipv6s", "dive,ipv6,required"),
    ("check_ips", "dive,ip,required"),
    ("check_cidrs", "dive,cidr,required"),
];

pub fn builtin_check(function: &str) -> Option<&'static str> {
    BUILT_IN_CHECKS
        .iter()
        .find(|(name, _)| *name == function)
        .map(|(_, directive)| *directive)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub requiredness: Requiredness,
    pub key: String,
    pub directives: Vec<String>,
}

/// Build the tag of one annotated field.
///
/// Keywords of the default-value call come first, then those of a
/// constrained annotation type. `custom` is the rule function attached to
/// the field by a class-level validator, if any.
pub fn build_tag(
    schema: &str,
    field: &AnnotatedField,
    tokens: &TypeTokens,
    custom: Option<&str>,
) -> Result<Tag> {
    let requiredness = tokens.requiredness();
    let mut key = field.name.clone();
    let mut directives = vec![requiredness.directive().to_string()];

    let default_keywords: &[Keyword] = match &field.value {
        Some(Node::Call { keywords, .. }) => keywords,
        // literal defaults are not translated
        _ => &[],
    };

    for keyword in default_keywords.iter().chain(&tokens.keywords) {
        let Some(arg) = keyword.arg.as_deref() else {
            return Err(ConvertError::UnknownConstraint {
                schema: schema.to_string(),
                field: field.name.clone(),
                keyword: "**".to_string(),
            });
        };
        let value = |allow_name: bool| literal_text(schema, &field.name, arg, &keyword.value, allow_name);
        match arg {
            "alias" => {
                key = keyword
                    .value
                    .as_str_constant()
                    .ok_or_else(|| ConvertError::MalformedAnnotation {
                        schema: schema.to_string(),
                        field: field.name.clone(),
                        reason: "`alias` must be a string constant".to_string(),
                    })?
                    .to_string();
            }
            "min_length" | "min_items" => directives.push(format!("min={}", value(false)?)),
            "max_length" | "max_items" => directives.push(format!("max={}", value(true)?)),
            "ge" => directives.push(format!("gte={}", value(false)?)),
            "le" => directives.push(format!("lte={}", value(true)?)),
            "gt" | "exclusiveMinimum" => directives.push(format!("gt={}", value(false)?)),
            "lt" => directives.push(format!("lt={}", value(false)?)),
            "strict" | "default" => {}
            other => {
                return Err(ConvertError::UnknownConstraint {
                    schema: schema.to_string(),
                    field: field.name.clone(),
                    keyword: other.to_string(),
                });
            }
        }
    }

    if let Some(function) = custom {
        directives.push(builtin_check(function).unwrap_or(function).to_string());
    }

    Ok(Tag { requiredness, key, directives })
}

fn literal_text(schema: &str, field: &str, arg: &str, value: &Node, allow_name: bool) -> Result<String> {
    match value {
        Node::Constant { value } => Ok(value.render()),
        Node::Name { id } if allow_name => Ok(id.clone()),
        other => Err(ConvertError::MalformedAnnotation {
            schema: schema.to_string(),
            field: field.to_string(),
            reason: format!("`{arg}` cannot take a {}", other.kind()),
        }),
    }
}
