//! Struct registry: schema name → struct, for one conversion run.
use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::ir::Struct;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Registry {
    structs: IndexMap<String, Struct>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `s`, rejecting name clashes and any reference cycle it closes.
    ///
    /// Every cycle is closed by whichever of its members is registered last,
    /// so checking each new struct keeps the whole registry a DAG.
    pub fn register(&mut self, s: Struct) -> Result<()> {
        if self.structs.contains_key(&s.name) {
            return Err(ConvertError::DuplicateSchema { name: s.name });
        }
        let name = s.name.clone();
        self.structs.insert(name.clone(), s);
        if let Some(path) = self.cycle_through(&name) {
            self.structs.shift_remove(&name);
            return Err(ConvertError::CyclicSchema { path });
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Struct> {
        self.structs.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&Struct> {
        self.get(name).ok_or_else(|| ConvertError::UnregisteredStruct { name: name.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Struct> {
        self.structs.values()
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Every field reference must name a registered struct.
    pub fn check_references(&self) -> Result<()> {
        for s in self.iter() {
            for name in s.references() {
                self.resolve(name)?;
            }
        }
        Ok(())
    }

    fn cycle_through(&self, start: &str) -> Option<Vec<String>> {
        let mut path = vec![start.to_string()];
        let mut explored = HashSet::new();
        self.walk(start, start, &mut path, &mut explored)
    }

    /// Depth-first search for a route back to `start`. A struct explored once
    /// without reaching `start` never will, so shared sub-schemas are walked
    /// a single time.
    fn walk<'a>(
        &'a self,
        start: &str,
        current: &str,
        path: &mut Vec<String>,
        explored: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        // unregistered references are dead ends for now
        let s = self.structs.get(current)?;
        for next in s.references() {
            if next == start {
                let mut cycle = path.clone();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            if !explored.insert(next) {
                continue;
            }
            path.push(next.to_string());
            if let Some(cycle) = self.walk(start, next, path, explored) {
                return Some(cycle);
            }
            path.pop();
        }
        None
    }
}
