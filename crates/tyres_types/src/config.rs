//! Resolver configuration

/// Knobs for [`crate::TypeResolver`] and [`crate::PathProbe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Log a warning when a declared bound replaces a probed impl of the same trait
    pub warn_on_bound_shadowing: bool,
    /// Let the inherent pass also look at items of trait impls whose Self type
    /// matches, so concrete implementations win over trait defaults
    pub probe_trait_impl_items: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            warn_on_bound_shadowing: true,
            probe_trait_impl_items: true,
        }
    }
}
