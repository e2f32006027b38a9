//! Schema extraction: one Pydantic class definition → one [`Struct`].
pub mod tags;
pub mod types;

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{ConvertError, Result};
use crate::ir::{Field, Struct};
use crate::naming::underline_to_hump;
use crate::node::{Assign, ClassDef, ClassItem, Node};

const PAGINATION_BASES: [&str; 2] = ["PaginationGetParamModel", "PaginationPostParamModel"];

/// Extract `class` into a struct named `name` (already deduplicated).
pub fn extract_struct(class: &ClassDef, name: &str) -> Result<Struct> {
    let customs = custom_validators(class, name)?;
    check_go_names(class, name)?;

    let mut out = Struct::new(name);
    out.pagination = class
        .bases
        .iter()
        .any(|base| PAGINATION_BASES.iter().any(|p| base.contains(p)));

    for item in &class.body {
        match item {
            ClassItem::Field(field) => {
                let malformed = |reason: String| ConvertError::MalformedAnnotation {
                    schema: name.to_string(),
                    field: field.name.clone(),
                    reason,
                };
                let tokens = types::annotation_tokens(&field.annotation).map_err(malformed)?;
                let ty = tokens.to_ty().map_err(malformed)?;
                let custom = customs.get(&field.name).map(String::as_str);
                let tag = tags::build_tag(name, field, &tokens, custom)?;
                out.fields.push(Field {
                    name: underline_to_hump(&field.name),
                    ty,
                    key: tag.key,
                    directives: tag.directives,
                    requiredness: tag.requiredness,
                });
            }
            ClassItem::Method(method) => out.checks.push(underline_to_hump(&method.name)),
            ClassItem::Assign(_) => {}
        }
    }

    for (field, validator) in &customs {
        let declared = class.body.iter().any(|item| {
            matches!(item, ClassItem::Field(f) if &f.name == field)
        });
        if !declared {
            return Err(ConvertError::UnknownValidatorField {
                schema: name.to_string(),
                field: field.clone(),
                validator: validator.clone(),
            });
        }
    }

    Ok(out)
}

/// Fields, check methods and the aggregate `Check()` share one Go namespace
/// once cased.
fn check_go_names(class: &ClassDef, schema: &str) -> Result<()> {
    let mut taken: HashMap<String, String> = HashMap::new();
    if class.body.iter().any(|item| matches!(item, ClassItem::Method(_))) {
        taken.insert("Check".to_string(), "the aggregate `Check()`".to_string());
    }
    for item in &class.body {
        let (kind, source) = match item {
            ClassItem::Field(field) => ("field", field.name.as_str()),
            ClassItem::Method(method) => ("method", method.name.as_str()),
            ClassItem::Assign(_) => continue,
        };
        let go = underline_to_hump(source);
        if let Some(previous) = taken.insert(go.clone(), format!("`{source}`")) {
            return Err(ConvertError::MalformedNode {
                schema: schema.to_string(),
                reason: format!("{kind} `{source}` becomes Go `{go}`, already used by {previous}"),
            });
        }
    }
    Ok(())
}

/// Field name → rule function, from `x = validator("field", ...)(check_fn)`.
fn custom_validators(class: &ClassDef, schema: &str) -> Result<IndexMap<String, String>> {
    let mut customs = IndexMap::new();
    for item in &class.body {
        let ClassItem::Assign(assign) = item else { continue };
        let (fields, function) = validator_assignment(assign).ok_or_else(|| {
            ConvertError::MalformedNode {
                schema: schema.to_string(),
                reason: format!(
                    "`{}` is not a `validator(\"field\")(check)` assignment",
                    assign.targets.join(", ")
                ),
            }
        })?;
        for field in fields {
            customs.insert(field, function.clone());
        }
    }
    Ok(customs)
}

fn validator_assignment(assign: &Assign) -> Option<(Vec<String>, String)> {
    let Node::Call { func, args, .. } = &assign.value else { return None };
    let Node::Call { args: field_args, .. } = func.as_ref() else { return None };
    let function = args.first()?.as_name()?.to_string();
    let fields: Vec<String> = field_args
        .iter()
        .filter_map(|arg| arg.as_str_constant().map(str::to_string))
        .collect();
    if fields.is_empty() {
        return None;
    }
    Some((fields, function))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BaseType, Requiredness, Ty};
    use crate::node::{AnnotatedField, FunctionDef, Keyword};

    fn ann(name: &str, annotation: Node, value: Option<Node>) -> ClassItem {
        ClassItem::Field(AnnotatedField { name: name.into(), annotation, value })
    }

    fn validator(field: &str, function: &str) -> ClassItem {
        ClassItem::Assign(Assign {
            targets: vec![format!("_{field}")],
            value: Node::call(
                Node::call(
                    Node::name("validator"),
                    vec![Node::str(field)],
                    vec![Keyword::new("allow_reuse", Node::Constant { value: crate::node::Constant::Bool(true) })],
                ),
                vec![Node::name(function)],
                vec![],
            ),
        })
    }

    fn host_class() -> ClassDef {
        ClassDef {
            name: "HostParam".into(),
            bases: vec!["PaginationGetParamModel".into()],
            body: vec![
                ann("host_name", Node::name("str"), None),
                ann(
                    "admin_email",
                    Node::subscript(Node::name("Optional"), Node::name("str")),
                    Some(Node::call(Node::name("Field"), vec![], vec![Keyword::new("alias", Node::str("email"))])),
                ),
                validator("admin_email", "check_email"),
                ClassItem::Method(FunctionDef { name: "check_host_name".into(), body: vec![] }),
            ],
        }
    }

    #[test]
    fn extracts_fields_in_declaration_order() {
        let s = extract_struct(&host_class(), "HostParam").unwrap();
        assert_eq!(s.name, "HostParam");
        assert!(s.pagination);
        assert_eq!(s.checks, ["CheckHostName"]);
        let names: Vec<_> = s.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["HostName", "AdminEmail"]);

        let email = &s.fields[1];
        assert_eq!(email.ty, Ty::Base(BaseType::String));
        assert_eq!(email.key, "email");
        assert_eq!(email.requiredness, Requiredness::Optional);
        assert_eq!(email.directives, ["omitempty", "email"]);
    }

    #[test]
    fn validator_for_missing_field_is_fatal() {
        let mut class = host_class();
        class.body.push(validator("ghost", "check_uuid"));
        assert_eq!(
            extract_struct(&class, "HostParam"),
            Err(ConvertError::UnknownValidatorField {
                schema: "HostParam".into(),
                field: "ghost".into(),
                validator: "check_uuid".into(),
            })
        );
    }

    #[test]
    fn plain_assignment_is_malformed() {
        let mut class = host_class();
        class.body.push(ClassItem::Assign(Assign { targets: vec!["LIMIT".into()], value: Node::int(3) }));
        assert!(matches!(
            extract_struct(&class, "HostParam"),
            Err(ConvertError::MalformedNode { .. })
        ));
    }

    #[test]
    fn bad_annotation_names_schema_and_field() {
        let class = ClassDef {
            name: "Broken".into(),
            bases: vec![],
            body: vec![ann("tags", Node::name("List"), None)],
        };
        let err = extract_struct(&class, "Broken").unwrap_err();
        assert!(err.to_string().starts_with("Broken.tags: malformed annotation"), "{err}");
    }

    #[test]
    fn go_name_collisions_are_malformed() {
        let mut class = host_class();
        class.body.push(ann("hostName", Node::name("str"), None));
        assert_eq!(
            extract_struct(&class, "HostParam").unwrap_err().to_string(),
            "HostParam: malformed node: field `hostName` becomes Go `HostName`, already used by `host_name`"
        );

        let mut class = host_class();
        class.body.push(ClassItem::Method(FunctionDef { name: "check".into(), body: vec![] }));
        assert_eq!(
            extract_struct(&class, "HostParam").unwrap_err().to_string(),
            "HostParam: malformed node: method `check` becomes Go `Check`, already used by the aggregate `Check()`"
        );

        let mut class = host_class();
        class.body.push(ann("check_host_name", Node::name("str"), None));
        assert!(matches!(
            extract_struct(&class, "HostParam"),
            Err(ConvertError::MalformedNode { .. })
        ));
    }
}
