//! Candidate probing: which items a name can refer to on a receiver type

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};
use tyres_diag::{Diagnostic, DiagnosticSink, ErrorCode, Span};
use tyres_hir::{HirId, ImplItem, Program, TraitItemKind};

use crate::assoc::{project_through_impl, setup_associated_types};
use crate::bounds::BoundsOracle;
use crate::config::ResolveOptions;
use crate::context::TypeContext;
use crate::error::{InternalError, ResolveResult};
use crate::subst::subst_self;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Function,
    Const,
    TypeAlias,
}

impl From<&ImplItem> for ItemKind {
    fn from(item: &ImplItem) -> Self {
        match item {
            ImplItem::Function(_) => ItemKind::Function,
            ImplItem::Constant(_) => ItemKind::Const,
            ImplItem::TypeAlias(_) => ItemKind::TypeAlias,
        }
    }
}

impl From<TraitItemKind> for ItemKind {
    fn from(kind: TraitItemKind) -> Self {
        match kind {
            TraitItemKind::Function => ItemKind::Function,
            TraitItemKind::Const => ItemKind::Const,
            TraitItemKind::Type => ItemKind::TypeAlias,
        }
    }
}

/// Where a candidate comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// An item declared in an impl block
    Inherent { item: HirId, kind: ItemKind, impl_id: HirId },
    /// An item of a trait; `impl_id` is `None` when the trait is only a declared bound
    Trait { trait_id: HirId, item: HirId, kind: ItemKind, impl_id: Option<HirId> },
}

/// A declaration a path segment may refer to
#[derive(Debug, Clone)]
pub struct Candidate {
    pub origin: CandidateOrigin,
    pub ty: TypeNode,
    /// Declaration site of the item
    pub span: Span,
}

impl Candidate {
    pub fn item(&self) -> HirId {
        match self.origin {
            CandidateOrigin::Inherent { item, .. } | CandidateOrigin::Trait { item, .. } => item,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self.origin {
            CandidateOrigin::Inherent { kind, .. } | CandidateOrigin::Trait { kind, .. } => kind,
        }
    }

    pub fn impl_id(&self) -> Option<HirId> {
        match self.origin {
            CandidateOrigin::Inherent { impl_id, .. } => Some(impl_id),
            CandidateOrigin::Trait { impl_id, .. } => impl_id,
        }
    }

    pub fn is_trait_item(&self) -> bool {
        matches!(self.origin, CandidateOrigin::Trait { .. })
    }
}

/// Looks up a name on a receiver type
pub struct PathProbe<'a> {
    ctx: &'a mut TypeContext,
    program: &'a Program,
    oracle: &'a dyn BoundsOracle,
    options: ResolveOptions,
}

impl<'a> PathProbe<'a> {
    pub fn new(
        ctx: &'a mut TypeContext,
        program: &'a Program,
        oracle: &'a dyn BoundsOracle,
        options: ResolveOptions,
    ) -> Self {
        Self { ctx, program, oracle, options }
    }

    /// Every item named `name` reachable from `receiver`.
    ///
    /// Inherent matches come first, then trait items ordered by trait id.
    /// With `ignore_required`, trait items without a default are skipped.
    pub fn probe(
        &mut self,
        receiver: &TypeNode,
        name: &str,
        probe_inherent: bool,
        probe_bounds: bool,
        ignore_required: bool,
    ) -> ResolveResult<Vec<Candidate>> {
        let mut candidates = Vec::new();
        if probe_inherent {
            self.probe_inherent(receiver, name, &mut candidates)?;
        }
        if probe_bounds {
            self.probe_bounds(receiver, name, ignore_required, &mut candidates)?;
        }
        debug!(receiver = %receiver, name, count = candidates.len(), "probe");
        Ok(candidates)
    }

    fn probe_inherent(
        &mut self,
        receiver: &TypeNode,
        name: &str,
        out: &mut Vec<Candidate>,
    ) -> ResolveResult<()> {
        for imp in self.program.impls() {
            if imp.is_trait_impl() && !self.options.probe_trait_impl_items {
                continue;
            }
            let Some(self_ty) = self.ctx.lookup_type(imp.self_ty.id) else {
                trace!(impl_id = %imp.id, "impl Self type not resolved, skipping");
                continue;
            };
            let generics: Vec<HirId> = imp.generics.iter().map(|g| g.id).collect();
            if !self_ty.as_match_pattern(&generics).can_eq(receiver) {
                continue;
            }

            for item in imp.items.iter().filter(|it| it.name() == name) {
                let ty = self.ctx.lookup_type(item.id())
                    .cloned()
                    .ok_or(InternalError::MissingType(item.id()))?;
                out.push(Candidate {
                    origin: CandidateOrigin::Inherent { item: item.id(), kind: item.into(), impl_id: imp.id },
                    ty,
                    span: item.span(),
                });
            }
        }
        Ok(())
    }

    /// Probed impls and declared bounds, keyed by trait. A declared bound
    /// replaces a probed impl of the same trait.
    fn union_bounds(&self, receiver: &TypeNode) -> BTreeMap<HirId, Option<HirId>> {
        let mut union = BTreeMap::new();
        for probed in self.oracle.probe_implemented_traits(self.ctx, receiver) {
            union.entry(probed.trait_id).or_insert(Some(probed.impl_id));
        }
        for bound in receiver.specified_bounds() {
            if let Some(Some(impl_id)) = union.insert(bound.trait_id, None) {
                if self.options.warn_on_bound_shadowing {
                    warn!(
                        receiver = %receiver,
                        bound = %bound.name,
                        impl_id = %impl_id,
                        "declared bound shadows a probed impl of the same trait"
                    );
                }
            }
        }
        union
    }

    fn probe_bounds(
        &mut self,
        receiver: &TypeNode,
        name: &str,
        ignore_required: bool,
        out: &mut Vec<Candidate>,
    ) -> ResolveResult<()> {
        let union = self.union_bounds(receiver);
        let rigid_root = matches!(receiver.root().kind(), TyKind::Param(_) | TyKind::Dynamic(_));

        for (trait_id, impl_id) in union {
            let trait_ref = self.program.lookup_trait(trait_id).ok_or(InternalError::UnknownTrait(trait_id))?;
            let Some(item) = trait_ref.lookup_item(name) else {
                continue;
            };
            if ignore_required && !item.is_optional() {
                trace!(item = %item.name, "skipping required trait item");
                continue;
            }
            // already found as an item of the same impl
            if impl_id.is_some() && out.iter().any(|c| c.impl_id() == impl_id) {
                continue;
            }

            let mut ty = self.ctx.lookup_type(item.id)
                .cloned()
                .ok_or(InternalError::MissingType(item.id))?;

            if let Some(impl_id) = impl_id {
                if !rigid_root {
                    setup_associated_types(self.ctx, self.program, impl_id)?;
                }
            }
            if item.kind == TraitItemKind::Function {
                ty = subst_self(self.ctx, &ty, receiver, item.id)?;
            }
            if let Some(impl_id) = impl_id {
                ty = project_through_impl(self.ctx, &ty, impl_id);
            }

            out.push(Candidate {
                origin: CandidateOrigin::Trait { trait_id, item: item.id, kind: item.kind.into(), impl_id },
                ty,
                span: item.span,
            });
        }
        Ok(())
    }
}

/// Report one ambiguity for a segment, pointing at every candidate
pub fn report_multiple_candidates(
    candidates: &[Candidate],
    name: &str,
    span: Span,
    sink: &mut dyn DiagnosticSink,
) {
    let mut diag = Diagnostic::error(
        ErrorCode::AmbiguousCandidates,
        format!("multiple applicable items in scope for: {}", name),
        span,
    );
    for candidate in candidates {
        let note = match candidate.origin {
            CandidateOrigin::Inherent { .. } => "candidate defined in an impl",
            CandidateOrigin::Trait { .. } => "candidate defined in a trait",
        };
        diag = diag.with_label(candidate.span, Some(note.to_string()));
    }
    sink.report(diag);
}
