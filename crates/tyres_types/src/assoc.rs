//! Associated types of trait impls
//!
//! A trait impl binds each of the trait's type items to one of its own type
//! aliases. The bindings are computed once, the first time something needs
//! them, and then projected into signatures that mention the trait's
//! placeholders.

use std::collections::BTreeMap;

use tracing::debug;
use tyres_hir::{HirId, ImplItem, Program, TraitItemKind};

use crate::context::TypeContext;
use crate::error::{InternalError, ResolveResult};
use crate::types::*;

/// A trait impl as seen by associated-type projection
#[derive(Debug, Clone)]
pub struct AssociatedImplTrait {
    pub trait_id: HirId,
    pub impl_id: HirId,
    pub self_ty: TypeNode,
    /// Trait type item -> bound type, once realized
    bindings: Option<BTreeMap<HirId, TypeNode>>,
}

impl AssociatedImplTrait {
    pub fn new(trait_id: HirId, impl_id: HirId, self_ty: TypeNode) -> Self {
        Self { trait_id, impl_id, self_ty, bindings: None }
    }

    pub fn is_realized(&self) -> bool {
        self.bindings.is_some()
    }

    pub fn binding(&self, item: HirId) -> Option<&TypeNode> {
        self.bindings.as_ref().and_then(|b| b.get(&item))
    }

    pub fn bindings(&self) -> impl Iterator<Item = (HirId, &TypeNode)> {
        self.bindings.iter().flat_map(|b| b.iter().map(|(id, ty)| (*id, ty)))
    }
}

/// Register every trait impl of the program with the context.
///
/// Impl Self types must already be resolved.
pub fn collect_associated_impls(program: &Program, ctx: &mut TypeContext) -> ResolveResult<()> {
    for imp in program.impls() {
        if imp.is_trait_impl() {
            register_associated_impl(program, ctx, imp.id)?;
        }
    }
    Ok(())
}

fn register_associated_impl(program: &Program, ctx: &mut TypeContext, impl_id: HirId) -> ResolveResult<()> {
    if ctx.lookup_associated_impl(impl_id).is_some() {
        return Ok(());
    }
    let imp = program.lookup_impl(impl_id).ok_or(InternalError::UnknownImpl(impl_id))?;
    let trait_id = imp.trait_ref.ok_or(InternalError::UnknownImpl(impl_id))?;
    let self_ty = ctx.lookup_type(imp.self_ty.id)
        .cloned()
        .ok_or(InternalError::MissingType(imp.self_ty.id))?;
    ctx.insert_associated_impl(AssociatedImplTrait::new(trait_id, impl_id, self_ty));
    Ok(())
}

/// Replace every `Self` parameter in `ty` with `self_ty`
pub(crate) fn replace_self(ctx: &mut TypeContext, ty: &TypeNode, self_ty: &TypeNode) -> TypeNode {
    ctx.fold(ty, &mut |node| match node.kind() {
        TyKind::Param(p) if p.symbol == "Self" => Some(self_ty.clone()),
        _ => None,
    })
}

/// Bind the trait's type items for `impl_id`. Does nothing if already done.
pub fn setup_associated_types(ctx: &mut TypeContext, program: &Program, impl_id: HirId) -> ResolveResult<()> {
    register_associated_impl(program, ctx, impl_id)?;
    let (trait_id, self_ty) = match ctx.lookup_associated_impl(impl_id) {
        Some(entry) if entry.is_realized() => return Ok(()),
        Some(entry) => (entry.trait_id, entry.self_ty.clone()),
        None => return Err(InternalError::UnknownImpl(impl_id)),
    };

    let trait_ref = program.lookup_trait(trait_id).ok_or(InternalError::UnknownTrait(trait_id))?;
    let imp = program.lookup_impl(impl_id).ok_or(InternalError::UnknownImpl(impl_id))?;

    let mut bindings = BTreeMap::new();
    for item in trait_ref.items.iter().filter(|i| i.kind == TraitItemKind::Type) {
        let alias = match imp.lookup_item(&item.name) {
            Some(ImplItem::TypeAlias(decl)) => Some(decl.id),
            _ => None,
        };
        let bound = match alias {
            Some(alias_id) => ctx.lookup_type(alias_id)
                .cloned()
                .ok_or(InternalError::MissingType(alias_id))?,
            // a defaulted type item the impl does not override
            None => match ctx.lookup_type(item.id) {
                Some(default) if item.has_default => match default.kind() {
                    TyKind::Placeholder { .. } => continue,
                    _ => default.clone(),
                },
                _ => continue,
            },
        };
        let bound = replace_self(ctx, &bound, &self_ty);
        debug!(impl_id = %impl_id, item = %item.name, ty = %bound, "bind associated type");
        bindings.insert(item.id, bound);
    }

    if let Some(entry) = ctx.associated_impl_mut(impl_id) {
        entry.bindings = Some(bindings);
    }
    Ok(())
}

/// Dereference every placeholder in `ty` that `impl_id` binds
pub fn project_through_impl(ctx: &mut TypeContext, ty: &TypeNode, impl_id: HirId) -> TypeNode {
    let Some(entry) = ctx.lookup_associated_impl(impl_id) else {
        return ty.clone();
    };
    if !entry.is_realized() {
        return ty.clone();
    }
    let bindings: BTreeMap<HirId, TypeNode> = entry.bindings().map(|(id, t)| (id, t.clone())).collect();
    ctx.fold(ty, &mut |node| match node.kind() {
        TyKind::Placeholder { item, .. } => bindings.get(item).cloned(),
        _ => None,
    })
}
