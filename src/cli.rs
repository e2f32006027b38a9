//! CLI: node documents → (ir | go)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use crate::codegen::{GeneratedFile, generate};
use crate::fixtures::FixtureTable;
use crate::node::Module;
use crate::registry::Registry;
use crate::session::{Options, Session};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert Pydantic schema node documents into Go structs, validators and tests
#[derive(Parser, Debug)]
#[command(name = "pydantic-go", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate the Go package
    Convert(ConvertOut),
    /// extract and print the struct registry and mined fixtures as JSON
    Ir(IrOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// Schema module documents. May be literal paths or quoted glob patterns.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// Test module documents to mine fixtures from.
    #[arg(long, num_args = 1..)]
    tests: Vec<String>,

    /// Module of shared rule functions registered as custom validators.
    #[arg(long)]
    common: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Go package name of the generated files
    #[arg(long, default_value = "validator")]
    package: String,

    /// fail on fixture values that cannot be coerced to numeric fields
    #[arg(long)]
    strict: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct IrOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(Serialize)]
struct IrDump<'a> {
    structs: &'a Registry,
    fixtures: &'a FixtureTable,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Rules, then fixtures, then schemas: everything is registered before
    /// anything is synthesized.
    fn build_session(&self, options: Options) -> Result<Session> {
        let mut session = Session::new(options);
        if let Some(common) = self.common.as_ref() {
            for module in self.load_modules(std::slice::from_ref(common))? {
                session.register_rules(&module);
            }
        }
        for module in self.load_modules(&self.tests)? {
            session.mine_fixtures(&module)?;
        }
        for module in self.load_modules(&self.input)? {
            session.extract_module(&module)?;
        }
        Ok(session)
    }

    fn load_modules(&self, patterns: &[String]) -> Result<Vec<Module>> {
        let mut modules = Vec::new();
        for source_path in resolve_file_path_patterns(patterns)? {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {origin}"))?;
            let json_value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file {origin}"))?;
            let documents = match self.jq_expr.as_ref() {
                None => vec![json_value],
                Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                    format!("failed to apply jq expression to source file {origin}")
                })?,
            };
            for mut document in documents {
                default_module_name(&mut document, &source_path);
                modules.push(crate::path_de::from_value_with_path(&origin, document)?);
            }
        }
        Ok(modules)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Convert(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let options = Options {
                    package: target.package.clone(),
                    strict: target.strict,
                };
                let session = target.input_settings.build_session(options)?;
                let files = generate(&session)?;
                match target.out_dir.as_ref() {
                    Some(out_dir) => write_files(out_dir, &files),
                    None => {
                        for file in &files {
                            println!("// ==> {} <==\n{}", file.path, file.contents);
                        }
                        Ok(())
                    }
                }
            }
            Command::Ir(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let session = target.input_settings.build_session(Options::default())?;
                session.finish_extraction()?;
                let dump = IrDump {
                    structs: session.registry(),
                    fixtures: session.fixtures(),
                };
                let json_src = serde_json::to_string_pretty(&dump)?;
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(out, &json_src)
                            .with_context(|| format!("failed to write {}", out.display()))
                    }
                    None => {
                        println!("{json_src}");
                        Ok(())
                    }
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Documents may omit `name`; the file stem stands in.
fn default_module_name(document: &mut Value, source_path: &Path) {
    let Value::Object(object) = document else { return };
    if object.contains_key("name") {
        return;
    }
    if let Some(stem) = source_path.file_stem() {
        object.insert("name".to_string(), Value::from(stem.to_string_lossy().to_string()));
    }
}

fn write_files(out_dir: &Path, files: &[GeneratedFile]) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    for file in files {
        let path = out_dir.join(&file.path);
        std::fs::write(&path, &file.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
