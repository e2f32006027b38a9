//! Go code synthesis from a finished [`Session`].
//!
//! ```text
//! registry ──┬─> <module>.go        structs, check stubs, aggregate Check()
//!            ├─> <module>_test.go   zero case, fixture cases, placeholder
//! rules ─────┴─> runtime.go         GetValidate, ValidateStruct, Ptr helpers,
//!                runtime_test.go    pagination block, rule stubs
//! ```
pub mod literal;
pub mod runtime;

use serde_json::Value;

use crate::error::Result;
use crate::ir::{PAGINATION_STRUCT, Struct};
use crate::session::{ModuleSchemas, Session};

use literal::LiteralSynth;

/// One generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path: String,
    pub contents: String,
}

/// Line-oriented Go writer.
pub struct Codegen {
    output: String,
    indent: usize,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.output.push('\t');
            }
            self.output.push_str(text);
        }
        self.output.push('\n');
    }

    pub fn blank(&mut self) {
        self.output.push('\n');
    }

    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    pub fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    pub fn package(&mut self, package: &str) {
        self.line(&format!("package {package}"));
        self.blank();
    }

    /// Single or grouped import block; groups are separated by a blank line.
    pub fn imports(&mut self, groups: &[&[&str]]) {
        let groups: Vec<&[&str]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
        match groups.as_slice() {
            [] => return,
            [[single]] => {
                self.line(&format!("import \"{single}\""));
            }
            _ => {
                self.open("import (");
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        self.blank();
                    }
                    for path in group.iter() {
                        self.line(&format!("\"{path}\""));
                    }
                }
                self.close(")");
            }
        }
        self.blank();
    }

    pub fn into_string(self) -> String {
        self.output
    }

    /// `type X struct { ... }` with tagged fields in declaration order.
    pub fn emit_struct(&mut self, s: &Struct) {
        self.open(&format!("type {} struct {{", s.name));
        if s.pagination {
            self.line(PAGINATION_STRUCT);
        }
        for field in &s.fields {
            self.line(&format!("{} {} {}", field.name, field.go_type(), field.tag()));
        }
        self.close("}");
        self.blank();
    }

    /// One stub per check method, then `Check()` calling them in order.
    pub fn emit_checks(&mut self, s: &Struct) {
        if s.checks.is_empty() {
            return;
        }
        for check in &s.checks {
            self.open(&format!("func (p *{}) {check}() error {{", s.name));
            self.line("// TODO: need to be implemented.");
            self.line(&format!(
                "return errors.New(\"{}.{check}: not implemented\")",
                s.name
            ));
            self.close("}");
            self.blank();
        }
        self.open(&format!("func (p *{}) Check() error {{", s.name));
        for check in &s.checks {
            self.open(&format!("if err := p.{check}(); err != nil {{"));
            self.line("return err");
            self.close("}");
        }
        self.line("return nil");
        self.close("}");
        self.blank();
    }
}

/// Every output file of the run. Fails before producing anything if the
/// registry is incomplete or a literal cannot be synthesized.
pub fn generate(session: &Session) -> Result<Vec<GeneratedFile>> {
    session.finish_extraction()?;
    let mut files = vec![runtime::runtime_file(session)];
    if let Some(tests) = runtime::runtime_test_file(session) {
        files.push(tests);
    }
    for module in session.modules() {
        files.push(struct_file(session, module)?);
        files.push(test_file(session, module)?);
    }
    Ok(files)
}

/// `<module>.go`: struct declarations and their check scaffolding.
pub fn struct_file(session: &Session, module: &ModuleSchemas) -> Result<GeneratedFile> {
    let structs = module
        .structs
        .iter()
        .map(|name| session.registry().resolve(name))
        .collect::<Result<Vec<_>>>()?;

    let mut cg = Codegen::new();
    cg.package(&session.options.package);
    if structs.iter().any(|s| !s.checks.is_empty()) {
        cg.imports(&[&["errors"]]);
    }
    for s in &structs {
        tracing::info!(schema = %s.name, "emitting struct");
        cg.emit_struct(s);
        cg.emit_checks(s);
    }
    Ok(GeneratedFile {
        path: format!("{}.go", module.module),
        contents: cg.into_string(),
    })
}

/// `<module>_test.go`: one test function per struct.
///
/// Case 1 validates the zero value and expects failure, then one case per
/// mined pass payload, one per fail payload, and a trailing placeholder.
pub fn test_file(session: &Session, module: &ModuleSchemas) -> Result<GeneratedFile> {
    let mut synth = LiteralSynth::new(session.registry(), session.options.strict);
    let mut cg = Codegen::new();
    cg.package(&session.options.package);
    cg.imports(&[&["testing"], &["github.com/stretchr/testify/assert"]]);

    for name in &module.structs {
        let s = session.registry().resolve(name)?;
        let (success, fail) = match session.fixtures().get(name) {
            Some(fixtures) => (fixtures.success.as_slice(), fixtures.fail.as_slice()),
            None => (&[][..], &[][..]),
        };

        cg.open(&format!("func Test{}(t *testing.T) {{", s.name));
        cg.line("// case 1.");
        cg.line(&format!("param := &{}{{}}", s.name));
        cg.line("err := ValidateStruct(param)");
        cg.line("assert.Error(t, err)");
        cg.blank();

        let mut case = 2;
        let cases = success.iter().map(|p| (p, true)).chain(fail.iter().map(|p| (p, false)));
        for (payload, passes) in cases {
            emit_case(&mut cg, &mut synth, s, case, payload, passes)?;
            case += 1;
        }

        cg.line(&format!("// case {case}."));
        cg.line("// TODO: need to be implemented.");
        cg.close("}");
        cg.blank();
    }

    Ok(GeneratedFile {
        path: format!("{}_test.go", module.module),
        contents: cg.into_string(),
    })
}

fn emit_case(
    cg: &mut Codegen,
    synth: &mut LiteralSynth<'_>,
    s: &Struct,
    case: usize,
    payload: &Value,
    passes: bool,
) -> Result<()> {
    let literal = synth.struct_literal(s, payload, true, cg.indent)?;
    cg.line(&format!("// case {case}."));
    cg.line(&format!("param = {literal}"));
    cg.line("err = ValidateStruct(param)");
    if passes {
        cg.line("assert.NoError(t, err)");
    } else {
        cg.line("assert.Error(t, err)");
        cg.line("// TODO: assert the specific validation error.");
    }
    cg.blank();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AnnotatedField, ClassDef, ClassItem, FunctionDef, Keyword, Module, Node, Stmt};
    use crate::session::Options;

    fn person_module() -> Module {
        Module {
            name: "people".into(),
            body: vec![Stmt::Class(ClassDef {
                name: "Person".into(),
                bases: vec!["BaseModel".into()],
                body: vec![
                    ClassItem::Field(AnnotatedField {
                        name: "name".into(),
                        annotation: Node::name("str"),
                        value: None,
                    }),
                    ClassItem::Field(AnnotatedField {
                        name: "age".into(),
                        annotation: Node::subscript(Node::name("Optional"), Node::name("int")),
                        value: Some(Node::call(
                            Node::name("Field"),
                            vec![],
                            vec![Keyword::new("alias", Node::str("years")), Keyword::new("ge", Node::int(0))],
                        )),
                    }),
                    ClassItem::Method(FunctionDef { name: "check_age".into(), body: vec![] }),
                ],
            })],
        }
    }

    fn person_tests() -> Module {
        let call = |years: Node| {
            Node::ExprStatement {
                value: Box::new(Node::call(
                    Node::name("Person"),
                    vec![],
                    vec![Keyword::splat(Node::Mapping {
                        keys: vec![Node::str("name"), Node::str("years")],
                        values: vec![Node::str("Ann"), years],
                    })],
                )),
            }
        };
        Module {
            name: "test_people".into(),
            body: vec![Stmt::Function(FunctionDef {
                name: "test_person".into(),
                body: vec![
                    call(Node::int(5)),
                    Node::ScopedBlock { context: vec![], body: vec![call(Node::int(-1))] },
                ],
            })],
        }
    }

    fn session() -> Session {
        let mut session = Session::new(Options::default());
        session.mine_fixtures(&person_tests()).unwrap();
        session.extract_module(&person_module()).unwrap();
        session
    }

    #[test]
    fn struct_file_declares_tags_and_checks() {
        let session = session();
        let file = struct_file(&session, &session.modules()[0]).unwrap();
        assert_eq!(file.path, "people.go");
        let expected = "package validator

import \"errors\"

type Person struct {
\tName string `json:\"name\" validate:\"required\"`
\tAge *int `json:\"years\" validate:\"omitempty,gte=0\"`
}

func (p *Person) CheckAge() error {
\t// TODO: need to be implemented.
\treturn errors.New(\"Person.CheckAge: not implemented\")
}

func (p *Person) Check() error {
\tif err := p.CheckAge(); err != nil {
\t\treturn err
\t}
\treturn nil
}

";
        assert_eq!(file.contents, expected);
    }

    #[test]
    fn test_file_has_zero_fixture_and_placeholder_cases() {
        let session = session();
        let file = test_file(&session, &session.modules()[0]).unwrap();
        assert_eq!(file.path, "people_test.go");
        let expected = "package validator

import (
\t\"testing\"

\t\"github.com/stretchr/testify/assert\"
)

func TestPerson(t *testing.T) {
\t// case 1.
\tparam := &Person{}
\terr := ValidateStruct(param)
\tassert.Error(t, err)

\t// case 2.
\tparam = &Person{
\t\tName: \"Ann\",
\t\tAge: IntPtr(5),
\t}
\terr = ValidateStruct(param)
\tassert.NoError(t, err)

\t// case 3.
\tparam = &Person{
\t\tName: \"Ann\",
\t\tAge: IntPtr(-1),
\t}
\terr = ValidateStruct(param)
\tassert.Error(t, err)
\t// TODO: assert the specific validation error.

\t// case 4.
\t// TODO: need to be implemented.
}

";
        assert_eq!(file.contents, expected);
    }

    #[test]
    fn generate_orders_runtime_first() {
        let files = generate(&session()).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["runtime.go", "people.go", "people_test.go"]);
    }

    #[test]
    fn struct_without_checks_needs_no_imports() {
        let mut module = person_module();
        let Stmt::Class(class) = &mut module.body[0] else { unreachable!() };
        class.body.pop();
        class.bases = vec!["PaginationPostParamModel".into()];
        let mut session = Session::new(Options { package: "api".into(), strict: false });
        session.extract_module(&module).unwrap();
        let file = struct_file(&session, &session.modules()[0]).unwrap();
        assert!(file.contents.starts_with("package api\n\ntype Person struct {\n\tPaginationParamModel\n"));
        assert!(!file.contents.contains("import"));
    }
}
