//! Bound satisfaction: which traits a type implements

use tyres_hir::{HirId, Program};

use crate::context::TypeContext;
use crate::types::TypeNode;

/// A trait concretely implemented for a type, and the impl doing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedBound {
    pub trait_id: HirId,
    pub impl_id: HirId,
}

/// Answers questions about trait implementations
pub trait BoundsOracle {
    /// Every trait impl whose Self type matches `receiver`
    fn probe_implemented_traits(&self, ctx: &TypeContext, receiver: &TypeNode) -> Vec<ProbedBound>;

    /// Whether `receiver` implements `trait_id`, concretely or through a declared bound
    fn is_bound_satisfied(&self, ctx: &TypeContext, receiver: &TypeNode, trait_id: HirId) -> bool;
}

/// Oracle backed by the impl blocks of a program
pub struct ImplBoundsProbe<'a> {
    program: &'a Program,
}

impl<'a> ImplBoundsProbe<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }
}

impl BoundsOracle for ImplBoundsProbe<'_> {
    fn probe_implemented_traits(&self, ctx: &TypeContext, receiver: &TypeNode) -> Vec<ProbedBound> {
        let mut found = Vec::new();
        for imp in self.program.impls() {
            let Some(trait_id) = imp.trait_ref else {
                continue;
            };
            let Some(self_ty) = ctx.lookup_type(imp.self_ty.id) else {
                continue;
            };
            let generics: Vec<HirId> = imp.generics.iter().map(|g| g.id).collect();
            if self_ty.as_match_pattern(&generics).can_eq(receiver) {
                found.push(ProbedBound { trait_id, impl_id: imp.id });
            }
        }
        found
    }

    fn is_bound_satisfied(&self, ctx: &TypeContext, receiver: &TypeNode, trait_id: HirId) -> bool {
        receiver.specified_bounds().iter().any(|b| b.trait_id == trait_id)
            || self.probe_implemented_traits(ctx, receiver).iter().any(|p| p.trait_id == trait_id)
    }
}
