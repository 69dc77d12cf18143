//! Per-run generator state.
//!
//! One `GenContext` is created per `generate_code` call and discarded at the
//! end of the run (see the Concurrency & Resource Model notes in
//! `spec.md` §5): collected imports, the property-block list, block
//! name-uniqueness counters, and the current type/resource context all live
//! here rather than as globals, so two concurrent calls never share state.

use std::collections::BTreeMap;

use crate::analysis::Analysis;
use crate::error::Diagnostic;
use crate::ir::Template;

/// A top-level declaration lifted out of a nested property map, e.g.
/// `var MyRoleAssumeRolePolicyDocumentStatement0 = PolicyStatement{...}`.
#[derive(Debug, Clone)]
pub struct PropertyBlock {
    pub name: String,
    pub type_name: String,
    pub body: String,
    /// Discovery order; a block that lifts a nested property pushes its own
    /// entry only after everything nested *inside* it has already pushed
    /// theirs, so emitting in ascending discovery order naturally puts the
    /// deepest dependencies first and the blocks that reference them last
    /// (see `spec.md` §4.4, "Property-block extraction").
    pub discovery_index: usize,
}

pub struct GenContext<'a> {
    pub template: &'a Template,
    pub analysis: &'a Analysis,
    pub diagnostics: Vec<Diagnostic>,
    pub blocks: Vec<PropertyBlock>,
    name_counters: BTreeMap<String, u32>,
    next_discovery_index: usize,
}

impl<'a> GenContext<'a> {
    pub fn new(template: &'a Template, analysis: &'a Analysis) -> Self {
        GenContext {
            template,
            analysis,
            diagnostics: Vec::new(),
            blocks: Vec::new(),
            name_counters: BTreeMap::new(),
            next_discovery_index: 0,
        }
    }

    /// Reserve a unique block name, disambiguating repeats with `_N`.
    pub fn unique_block_name(&mut self, base: &str) -> String {
        let count = self.name_counters.entry(base.to_string()).or_insert(0);
        let name = if *count == 0 {
            base.to_string()
        } else {
            format!("{base}_{count}")
        };
        *count += 1;
        name
    }

    pub fn push_block(&mut self, name: String, type_name: String, body: String) {
        let discovery_index = self.next_discovery_index;
        self.next_discovery_index += 1;
        self.blocks.push(PropertyBlock {
            name,
            type_name,
            body,
            discovery_index,
        });
    }

    /// Blocks discovered for a single resource, in emission order (ascending
    /// discovery index: deepest dependencies first, their referrers after).
    pub fn drain_blocks_for_resource(&mut self) -> Vec<PropertyBlock> {
        let mut taken = std::mem::take(&mut self.blocks);
        taken.sort_by(|a, b| a.discovery_index.cmp(&b.discovery_index));
        taken
    }
}
