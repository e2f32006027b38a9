//! Literal synthesis: (struct, payload) → Go composite literal.
//!
//! Recursion follows the schema, so its depth is the nesting depth of the
//! registry, which is acyclic by construction. The `visiting` stack still
//! guards against cycles rather than trusting that.
use serde_json::Value;

use crate::error::{ConvertError, Result};
use crate::ir::{BaseType, Field, Requiredness, Struct, Ty, PAGINATION_STRUCT};
use crate::registry::Registry;

pub struct LiteralSynth<'a> {
    registry: &'a Registry,
    strict: bool,
    pagination: Struct,
    visiting: Vec<String>,
}

impl<'a> LiteralSynth<'a> {
    pub fn new(registry: &'a Registry, strict: bool) -> Self {
        Self {
            registry,
            strict,
            pagination: Struct::pagination_block(),
            visiting: Vec::new(),
        }
    }

    /// Literal of `s` built from `value`.
    ///
    /// The first line carries no indentation (the caller places it); nested
    /// lines are indented one tab deeper than `indent` and the closing brace
    /// sits at `indent`.
    pub fn struct_literal(&mut self, s: &Struct, value: &Value, pointer: bool, indent: usize) -> Result<String> {
        let amp = if pointer { "&" } else { "" };
        let object = match value {
            Value::Object(map) if !map.is_empty() => map,
            other => {
                if truthy(other) {
                    tracing::warn!(schema = %s.name, "payload is not a mapping, using the zero value");
                }
                return Ok(format!("{amp}{}{{}}", s.name));
            }
        };

        if self.visiting.iter().any(|v| v == &s.name) {
            let mut path = self.visiting.clone();
            path.push(s.name.clone());
            return Err(ConvertError::CyclicSchema { path });
        }
        self.visiting.push(s.name.clone());

        let pad = tabs(indent + 1);
        let mut out = format!("{amp}{}{{\n", s.name);
        if s.pagination && self.pagination.fields.iter().any(|f| object.contains_key(&f.key)) {
            let block = self.pagination.clone();
            let literal = self.struct_literal(&block, value, false, indent + 1)?;
            out.push_str(&format!("{pad}{PAGINATION_STRUCT}: {literal},\n"));
        }
        for field in &s.fields {
            let sub = object.get(&field.key).unwrap_or(&Value::Null);
            let expr = self.field_value(s, field, sub, indent + 1)?;
            out.push_str(&format!("{pad}{}: {expr},\n", field.name));
        }
        out.push_str(&tabs(indent));
        out.push('}');

        self.visiting.pop();
        Ok(out)
    }

    fn field_value(&mut self, s: &Struct, field: &Field, value: &Value, indent: usize) -> Result<String> {
        match &field.ty {
            Ty::Base(base) => {
                let scalar = self.scalar(s, field, *base, value)?;
                Ok(match field.requiredness {
                    Requiredness::Optional => format!("{}({scalar})", base.ptr_helper()),
                    Requiredness::Required => scalar,
                })
            }
            Ty::Struct(name) => {
                let registry = self.registry;
                let target = registry.resolve(name)?;
                let pointer = field.requiredness == Requiredness::Optional;
                self.struct_literal(target, value, pointer, indent)
            }
            Ty::List(element) => self.list_literal(s, field, element, value, indent),
            Ty::Map => Ok(self.map_literal(s, field, value, indent)),
        }
    }

    /// Lists use `nil` when absent or empty; requiredness never adds a pointer.
    fn list_literal(&mut self, s: &Struct, field: &Field, element: &Ty, value: &Value, indent: usize) -> Result<String> {
        if !truthy(value) {
            return Ok("nil".to_string());
        }
        // a lone value stands for a one-element list
        let items = match value {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let pad = tabs(indent + 1);
        let mut out = format!("[]{}{{\n", element.go_type());
        for item in items {
            let expr = self.element(s, field, element, item, indent + 1)?;
            out.push_str(&format!("{pad}{expr},\n"));
        }
        out.push_str(&tabs(indent));
        out.push('}');
        Ok(out)
    }

    /// Values are always rendered as strings.
    fn map_literal(&self, s: &Struct, field: &Field, value: &Value, indent: usize) -> String {
        let map = match value {
            Value::Object(map) if !map.is_empty() => map,
            other => {
                if truthy(other) {
                    tracing::warn!(schema = %s.name, field = %field.key, "map payload is not a mapping, using nil");
                }
                return "nil".to_string();
            }
        };
        let pad = tabs(indent + 1);
        let mut out = String::from("map[string]string{\n");
        for (key, item) in map {
            out.push_str(&format!("{pad}{}: {},\n", go_quote(key), go_quote(&plain_text(item))));
        }
        out.push_str(&tabs(indent));
        out.push('}');
        out
    }

    fn element(&mut self, s: &Struct, field: &Field, ty: &Ty, value: &Value, indent: usize) -> Result<String> {
        match ty {
            Ty::Base(base) => self.scalar(s, field, *base, value),
            Ty::Struct(name) => {
                let registry = self.registry;
                let target = registry.resolve(name)?;
                self.struct_literal(target, value, false, indent)
            }
            Ty::List(inner) => self.list_literal(s, field, inner, value, indent),
            Ty::Map => Ok(self.map_literal(s, field, value, indent)),
        }
    }

    fn scalar(&self, s: &Struct, field: &Field, base: BaseType, value: &Value) -> Result<String> {
        match base {
            BaseType::String => Ok(go_quote(&plain_text(value))),
            BaseType::Bool => Ok(truthy(value).to_string()),
            BaseType::Int => match coerce_int(value) {
                Some(i) => Ok(i.to_string()),
                None => self.fallback(s, field, base, value),
            },
            BaseType::Float => match coerce_float(value) {
                Some(f) => Ok(format!("{f:?}")),
                None => self.fallback(s, field, base, value),
            },
        }
    }

    /// Zero for a value that is not a number; absent values are not failures.
    fn fallback(&self, s: &Struct, field: &Field, base: BaseType, value: &Value) -> Result<String> {
        if value.is_null() {
            return Ok(base.zero_literal().to_string());
        }
        if self.strict {
            return Err(ConvertError::Coercion {
                schema: s.name.clone(),
                field: field.key.clone(),
                value: value.to_string(),
            });
        }
        tracing::warn!(
            schema = %s.name,
            field = %field.key,
            value = %value,
            "not a {}, substituting zero",
            base.go_name()
        );
        Ok(base.zero_literal().to_string())
    }
}

fn tabs(n: usize) -> String {
    "\t".repeat(n)
}

/// Python-style truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.abs() < i64::MAX as f64).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn coerce_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    f.filter(|f| f.is_finite())
}

/// Text of a scalar as it would appear inside a string field.
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, key: &str, ty: Ty, requiredness: Requiredness) -> Field {
        Field {
            name: name.into(),
            ty,
            key: key.into(),
            directives: vec![requiredness.directive().into()],
            requiredness,
        }
    }

    fn person() -> Struct {
        let mut s = Struct::new("Person");
        s.fields.push(field("Name", "name", Ty::Base(BaseType::String), Requiredness::Required));
        s.fields.push(field("Age", "years", Ty::Base(BaseType::Int), Requiredness::Optional));
        s
    }

    fn registry(structs: Vec<Struct>) -> Registry {
        let mut reg = Registry::new();
        for s in structs {
            reg.register(s).unwrap();
        }
        reg
    }

    /// `Field: value` pairs of a flat literal.
    fn field_lines(literal: &str) -> Vec<(String, String)> {
        literal
            .lines()
            .skip(1)
            .filter_map(|line| {
                let (k, v) = line.trim().split_once(": ")?;
                Some((k.to_string(), v.trim_end_matches(',').to_string()))
            })
            .collect()
    }

    #[test]
    fn example_payload_and_empty_payload() {
        let reg = registry(vec![person()]);
        let mut synth = LiteralSynth::new(&reg, false);
        let s = reg.resolve("Person").unwrap();

        let lit = synth.struct_literal(s, &json!({"name": "Ann", "years": 5}), true, 1).unwrap();
        assert_eq!(lit, "&Person{\n\t\tName: \"Ann\",\n\t\tAge: IntPtr(5),\n\t}");

        assert_eq!(synth.struct_literal(s, &json!({}), true, 1).unwrap(), "&Person{}");
        assert_eq!(synth.struct_literal(s, &Value::Null, false, 0).unwrap(), "Person{}");
    }

    #[test]
    fn missing_keys_take_zero_values() {
        let mut s = Struct::new("Flags");
        s.fields.push(field("Name", "name", Ty::Base(BaseType::String), Requiredness::Required));
        s.fields.push(field("Count", "count", Ty::Base(BaseType::Int), Requiredness::Required));
        s.fields.push(field("Ratio", "ratio", Ty::Base(BaseType::Float), Requiredness::Required));
        s.fields.push(field("On", "on", Ty::Base(BaseType::Bool), Requiredness::Required));
        s.fields.push(field("Tags", "tags", Ty::List(Box::new(Ty::Base(BaseType::String))), Requiredness::Required));
        s.fields.push(field("Meta", "meta", Ty::Map, Requiredness::Optional));
        let reg = registry(vec![s]);
        let mut synth = LiteralSynth::new(&reg, false);
        let lit = synth
            .struct_literal(reg.resolve("Flags").unwrap(), &json!({"other": 1}), false, 0)
            .unwrap();
        let values: Vec<_> = field_lines(&lit).into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, ["\"\"", "0", "0.0", "false", "nil", "nil"]);
    }

    #[test]
    fn non_numeric_values_fall_back_to_zero_unless_strict() {
        let reg = registry(vec![person()]);
        let s = reg.resolve("Person").unwrap();
        let payload = json!({"name": "Bo", "years": "many"});

        let lit = LiteralSynth::new(&reg, false).struct_literal(s, &payload, false, 0).unwrap();
        assert!(lit.contains("Age: IntPtr(0),"), "{lit}");

        let err = LiteralSynth::new(&reg, true).struct_literal(s, &payload, false, 0).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Coercion { schema: "Person".into(), field: "years".into(), value: "\"many\"".into() }
        );
    }

    #[test]
    fn numeric_coercion_follows_python_int() {
        assert_eq!(coerce_int(&json!("42")), Some(42));
        assert_eq!(coerce_int(&json!(" 7 ")), Some(7));
        assert_eq!(coerce_int(&json!(5.9)), Some(5));
        assert_eq!(coerce_int(&json!(true)), Some(1));
        assert_eq!(coerce_int(&json!("5.5")), None);
        assert_eq!(coerce_int(&json!([1])), None);
        assert_eq!(coerce_float(&json!("0.25")), Some(0.25));
        assert_eq!(coerce_float(&json!("nan")), None);
    }

    #[test]
    fn nested_lists_maps_and_structs() {
        let mut port = Struct::new("Port");
        port.fields.push(field("Number", "number", Ty::Base(BaseType::Int), Requiredness::Required));
        let mut host = Struct::new("Host");
        host.fields.push(field("Ports", "ports", Ty::List(Box::new(Ty::Struct("Port".into()))), Requiredness::Required));
        host.fields.push(field("Labels", "labels", Ty::Map, Requiredness::Optional));
        host.fields.push(field("Primary", "primary", Ty::Struct("Port".into()), Requiredness::Optional));
        host.fields.push(field("Weights", "weights", Ty::List(Box::new(Ty::Base(BaseType::Float))), Requiredness::Optional));
        let reg = registry(vec![port, host]);
        let mut synth = LiteralSynth::new(&reg, false);

        let lit = synth
            .struct_literal(
                reg.resolve("Host").unwrap(),
                &json!({
                    "ports": [{"number": 80}, {}],
                    "labels": {"env": "prod", "tier": 2},
                    "primary": {"number": "443"},
                    "weights": 0.5
                }),
                true,
                0,
            )
            .unwrap();
        let expected = "&Host{
\tPorts: []Port{
\t\tPort{
\t\t\tNumber: 80,
\t\t},
\t\tPort{},
\t},
\tLabels: map[string]string{
\t\t\"env\": \"prod\",
\t\t\"tier\": \"2\",
\t},
\tPrimary: &Port{
\t\tNumber: 443,
\t},
\tWeights: []float64{
\t\t0.5,
\t},
}";
        assert_eq!(lit, expected);
    }

    #[test]
    fn well_formed_payload_round_trips() {
        let mut s = Struct::new("Sample");
        s.fields.push(field("Name", "name", Ty::Base(BaseType::String), Requiredness::Required));
        s.fields.push(field("Count", "count", Ty::Base(BaseType::Int), Requiredness::Required));
        s.fields.push(field("On", "on", Ty::Base(BaseType::Bool), Requiredness::Required));
        s.fields.push(field("Ratio", "ratio", Ty::Base(BaseType::Float), Requiredness::Required));
        s.fields.push(field(
            "Tags",
            "tags",
            Ty::List(Box::new(Ty::Base(BaseType::String))),
            Requiredness::Required,
        ));
        s.fields.push(field("Ports", "ports", Ty::List(Box::new(Ty::Base(BaseType::Int))), Requiredness::Optional));
        s.fields.push(field("Labels", "labels", Ty::Map, Requiredness::Required));
        let reg = registry(vec![s]);
        let payload = json!({
            "name": "a \"quoted\" name",
            "count": 12,
            "on": true,
            "ratio": 2.5,
            "tags": ["web", "edge\tnode"],
            "ports": [80, 443],
            "labels": {"env": "prod", "team": "infra"},
        });
        let sample = reg.resolve("Sample").unwrap();
        let lit = LiteralSynth::new(&reg, false).struct_literal(sample, &payload, false, 0).unwrap();

        assert_eq!(read_literal(sample, &lit), payload, "{lit}");
    }

    /// Read a literal with scalar, list and map fields back into a payload.
    /// Go string literals of the forms emitted here are valid JSON strings.
    fn read_literal(s: &Struct, literal: &str) -> Value {
        let mut out = serde_json::Map::new();
        let mut lines = literal.lines().skip(1);
        while let Some(line) = lines.next() {
            let Some((name, rest)) = line.trim().split_once(": ") else { continue };
            let key = s.fields.iter().find(|f| f.name == name).unwrap().key.clone();
            let mut block = lines.by_ref().take_while(|l| l.trim() != "},");
            let value = if rest.starts_with("[]") {
                Value::Array(
                    block
                        .by_ref()
                        .map(|l| serde_json::from_str(l.trim().trim_end_matches(',')).unwrap())
                        .collect(),
                )
            } else if rest.starts_with("map[") {
                Value::Object(
                    block
                        .by_ref()
                        .map(|l| {
                            let (k, v) = l.trim().trim_end_matches(',').split_once(": ").unwrap();
                            (serde_json::from_str::<String>(k).unwrap(), serde_json::from_str(v).unwrap())
                        })
                        .collect(),
                )
            } else {
                serde_json::from_str(rest.trim_end_matches(',')).unwrap()
            };
            out.insert(key, value);
        }
        Value::Object(out)
    }

    #[test]
    fn pagination_block_is_composed_when_present() {
        let mut s = Struct::new("ListHosts");
        s.pagination = true;
        s.fields.push(field("Name", "name", Ty::Base(BaseType::String), Requiredness::Required));
        let reg = registry(vec![s]);
        let lit = LiteralSynth::new(&reg, false)
            .struct_literal(reg.resolve("ListHosts").unwrap(), &json!({"page_size": 10, "name": "x"}), false, 0)
            .unwrap();
        assert!(lit.starts_with("ListHosts{\n\tPaginationParamModel: PaginationParamModel{\n"), "{lit}");
        assert!(lit.contains("\t\tPageSize: 10,\n"), "{lit}");
        assert!(lit.contains("\t\tPageNo: IntPtr(0),\n"), "{lit}");
    }

    #[test]
    fn quoting_matches_go_escapes() {
        assert_eq!(go_quote("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
        assert_eq!(go_quote("\u{1}"), "\"\\u0001\"");
        assert_eq!(go_quote("héllo"), "\"héllo\"");
    }
}
