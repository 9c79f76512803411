//! Internal invariant violations
//!
//! User errors never show up here; they become diagnostics and an `Error`
//! type node. An `InternalError` means two phases disagree and the
//! compilation unit should be abandoned.

use thiserror::Error;
use tyres_hir::HirId;

pub type ResolveResult<T> = Result<T, InternalError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InternalError {
    #[error("path `{path}` was resolved to {recorded} earlier but now resolves to {computed}")]
    ResolutionMismatch {
        path: String,
        recorded: HirId,
        computed: HirId,
    },

    #[error("{id} already has type `{existing}`, refusing to overwrite it with `{new}`")]
    ConflictingType {
        id: HirId,
        existing: String,
        new: String,
    },

    #[error("no type was recorded for {0}")]
    MissingType(HirId),

    #[error("no impl block {0}")]
    UnknownImpl(HirId),

    #[error("no trait {0}")]
    UnknownTrait(HirId),

    #[error("trait function {0} has no `Self` parameter")]
    MissingSelfParam(HirId),

    #[error("qualified path {0} has no trait to resolve against")]
    UnresolvedQualifiedRoot(HirId),
}
