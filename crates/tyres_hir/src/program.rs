//! The declaration tables shared by every resolution phase

use std::collections::{BTreeMap, HashMap};
use tyres_diag::Span;
use crate::hir::*;

/// All declarations of a compilation unit, plus the id allocator
#[derive(Debug, Default)]
pub struct Program {
    next_id: u32,
    defs: HashMap<HirId, DefInfo>,
    /// Ordered by id so trait iteration is deterministic
    traits: BTreeMap<HirId, Trait>,
    impls: Vec<ImplBlock>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_hir_id(&mut self) -> HirId {
        let id = HirId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn define(&mut self, name: &str, kind: DefKind, span: Span, parent: Option<HirId>) -> HirId {
        let id = self.next_hir_id();
        self.defs.insert(id, DefInfo {
            id,
            name: name.to_string(),
            kind,
            span,
            parent,
        });
        id
    }

    pub fn def(&self, id: HirId) -> Option<&DefInfo> {
        self.defs.get(&id)
    }

    pub fn is_module(&self, id: HirId) -> bool {
        matches!(self.def(id), Some(DefInfo { kind: DefKind::Module, .. }))
    }

    pub fn add_trait(&mut self, t: Trait) {
        self.traits.insert(t.id, t);
    }

    pub fn lookup_trait(&self, id: HirId) -> Option<&Trait> {
        self.traits.get(&id)
    }

    pub fn add_impl(&mut self, imp: ImplBlock) {
        self.impls.push(imp);
    }

    pub fn lookup_impl(&self, id: HirId) -> Option<&ImplBlock> {
        self.impls.iter().find(|i| i.id == id)
    }

    /// Impl blocks in declaration order
    pub fn impls(&self) -> &[ImplBlock] {
        &self.impls
    }

    // === Syntax construction ===

    pub fn new_segment(&mut self, ident: &str, generic_args: Option<GenericArgs>, span: Span) -> PathSegment {
        PathSegment {
            id: self.next_hir_id(),
            ident: ident.to_string(),
            generic_args,
            span,
        }
    }

    pub fn new_type_path(&mut self, segments: Vec<PathSegment>) -> TypePath {
        let span = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => Span::default(),
        };
        TypePath {
            id: self.next_hir_id(),
            segments,
            span,
        }
    }

    pub fn new_type(&mut self, kind: HirTypeKind, span: Span) -> HirType {
        HirType {
            id: self.next_hir_id(),
            kind,
            span,
        }
    }

    /// Wrap a path as a type expression sharing the path's id
    pub fn path_type(&self, path: TypePath) -> HirType {
        HirType {
            id: path.id,
            span: path.span,
            kind: HirTypeKind::Path(path),
        }
    }
}
