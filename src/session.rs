//! State of one conversion run.
use indexmap::IndexMap;

use crate::error::{ConvertError, Result};
use crate::extract::extract_struct;
use crate::fixtures::FixtureTable;
use crate::naming::{name_with_file, underline_to_hump};
use crate::node::Module;
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Go package of every generated file.
    pub package: String,
    /// Fail on payload values that cannot be coerced to a numeric field
    /// instead of substituting zero.
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            package: "validator".to_string(),
            strict: false,
        }
    }
}

/// Structs extracted from one schema module, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSchemas {
    pub module: String,
    pub structs: Vec<String>,
}

/// Everything a run accumulates. Mined and extracted first, then read-only
/// during synthesis.
#[derive(Debug, Default)]
pub struct Session {
    pub options: Options,
    registry: Registry,
    fixtures: FixtureTable,
    rules: IndexMap<String, String>, // rule function → Go function
    modules: Vec<ModuleSchemas>,
}

impl Session {
    pub fn new(options: Options) -> Self {
        Self { options, ..Self::default() }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn fixtures(&self) -> &FixtureTable {
        &self.fixtures
    }

    pub fn rules(&self) -> &IndexMap<String, String> {
        &self.rules
    }

    pub fn modules(&self) -> &[ModuleSchemas] {
        &self.modules
    }

    pub fn mine_fixtures(&mut self, tests: &Module) -> Result<()> {
        self.fixtures.mine_module(tests)
    }

    /// Register the top-level functions of a shared rules module as custom
    /// validators.
    pub fn register_rules(&mut self, rules: &Module) {
        for function in rules.functions() {
            self.rules
                .insert(function.name.clone(), underline_to_hump(&function.name));
        }
    }

    /// Extract and register every class of a schema module.
    pub fn extract_module(&mut self, module: &Module) -> Result<()> {
        let mut structs = Vec::new();
        for class in module.classes() {
            let name = self.unique_name(&class.name, &module.name)?;
            let s = extract_struct(class, &name)?;
            tracing::info!(module = %module.name, schema = %name, fields = s.fields.len(), "extracted");
            self.registry.register(s)?;
            structs.push(name);
        }
        self.modules.push(ModuleSchemas {
            module: module.name.clone(),
            structs,
        });
        Ok(())
    }

    /// Assert the registry is complete before anything is synthesized.
    pub fn finish_extraction(&self) -> Result<()> {
        self.registry.check_references()
    }

    fn unique_name(&self, name: &str, module: &str) -> Result<String> {
        if !self.registry.contains(name) {
            return Ok(name.to_string());
        }
        let derived = name_with_file(name, module);
        if self.registry.contains(&derived) {
            return Err(ConvertError::DuplicateSchema { name: derived });
        }
        Ok(derived)
    }
}
