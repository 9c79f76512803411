//! Output of the name-scope resolver: which declaration each path node names

use std::collections::HashMap;
use crate::hir::HirId;

/// A binding introduced by name resolution. Value-namespace names resolve to
/// the binding node; `parent` is the declaration the binding stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub node: HirId,
    pub parent: HirId,
}

/// Name-resolution results, keyed by the syntax node that was resolved
#[derive(Debug, Default)]
pub struct NameResolution {
    /// Value namespace: syntax node -> binding node
    resolved_names: HashMap<HirId, HirId>,
    /// Type namespace: syntax node -> declaration
    resolved_types: HashMap<HirId, HirId>,
    definitions: HashMap<HirId, Definition>,
}

impl NameResolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_resolved_name(&mut self, node: HirId, target: HirId) {
        self.resolved_names.insert(node, target);
    }

    pub fn lookup_resolved_name(&self, node: HirId) -> Option<HirId> {
        self.resolved_names.get(&node).copied()
    }

    pub fn insert_resolved_type(&mut self, node: HirId, target: HirId) {
        self.resolved_types.insert(node, target);
    }

    pub fn lookup_resolved_type(&self, node: HirId) -> Option<HirId> {
        self.resolved_types.get(&node).copied()
    }

    pub fn insert_definition(&mut self, node: HirId, parent: HirId) {
        self.definitions.insert(node, Definition { node, parent });
    }

    pub fn lookup_definition(&self, node: HirId) -> Option<Definition> {
        self.definitions.get(&node).copied()
    }
}
