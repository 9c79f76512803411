//! Path and type resolution
//!
//! Resolves type expressions and `A::B::C` / `<T as Trait>::Item` paths to
//! type nodes: probing inherent and trait items on each receiver, binding
//! generic arguments along the way and projecting associated types through
//! trait impls.

mod assoc;
mod bounds;
mod config;
mod context;
mod error;
mod path;
mod probe;
mod subst;
mod types;

pub use assoc::{
    collect_associated_impls, project_through_impl, setup_associated_types, AssociatedImplTrait,
};
pub use bounds::{BoundsOracle, ImplBoundsProbe, ProbedBound};
pub use config::ResolveOptions;
pub use context::TypeContext;
pub use error::{InternalError, ResolveResult};
pub use path::TypeResolver;
pub use probe::{report_multiple_candidates, Candidate, CandidateOrigin, ItemKind, PathProbe};
pub use subst::{check_unconstrained, subst_self, ExplicitArgs, SubstMapper, SubstitutionMap};
pub use types::*;
