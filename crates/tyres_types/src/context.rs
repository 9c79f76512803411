//! The type context: the single store of resolved types

use std::collections::{BTreeMap, HashMap};

use tyres_hir::HirId;

use crate::assoc::AssociatedImplTrait;
use crate::error::{InternalError, ResolveResult};
use crate::types::*;

/// Maps HIR ids to resolved type nodes and hands out type identities
#[derive(Debug, Default)]
pub struct TypeContext {
    next_id: u32,
    /// Resolved type of each declaration or type expression
    types: HashMap<HirId, TypeNode>,
    /// Receiver of the last segment of each resolved path
    receivers: HashMap<HirId, TypeNode>,
    /// Trait impls by impl id
    associated_impls: BTreeMap<HirId, AssociatedImplTrait>,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> TypeId {
        let id = TypeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn mk(&mut self, kind: TyKind) -> TypeNode {
        let id = self.fresh_id();
        TypeNode::new(id, kind)
    }

    pub fn mk_generic(&mut self, kind: TyKind, substs: Vec<SubstParam>) -> TypeNode {
        let id = self.fresh_id();
        TypeNode::new_generic(id, kind, substs)
    }

    pub fn mk_error(&mut self) -> TypeNode {
        self.mk(TyKind::Error)
    }

    pub fn mk_infer(&mut self, kind: InferKind) -> TypeNode {
        self.mk(TyKind::Infer(kind))
    }

    pub fn mk_unit(&mut self) -> TypeNode {
        self.mk(TyKind::Tuple(Vec::new()))
    }

    /// Same type under a new identity
    pub fn clone_fresh(&mut self, ty: &TypeNode) -> TypeNode {
        let id = self.fresh_id();
        ty.with_id(id)
    }

    pub fn lookup_type(&self, id: HirId) -> Option<&TypeNode> {
        self.types.get(&id)
    }

    /// Record the type of `id` and return the stored node.
    ///
    /// Each id is written once. Inserting an equal type again returns the node
    /// already stored, so repeated resolution keeps its identity; inserting a
    /// different type is an error.
    pub fn insert_type(&mut self, id: HirId, ty: TypeNode) -> ResolveResult<TypeNode> {
        if let Some(existing) = self.types.get(&id) {
            if *existing == ty {
                return Ok(existing.clone());
            }
            return Err(InternalError::ConflictingType {
                id,
                existing: existing.to_string(),
                new: ty.to_string(),
            });
        }
        tracing::trace!(%id, ty = %ty, "insert type");
        self.types.insert(id, ty.clone());
        Ok(ty)
    }

    pub fn insert_receiver(&mut self, id: HirId, receiver: TypeNode) {
        self.receivers.insert(id, receiver);
    }

    pub fn lookup_receiver(&self, id: HirId) -> Option<&TypeNode> {
        self.receivers.get(&id)
    }

    pub fn insert_associated_impl(&mut self, entry: AssociatedImplTrait) {
        self.associated_impls.entry(entry.impl_id).or_insert(entry);
    }

    pub fn lookup_associated_impl(&self, impl_id: HirId) -> Option<&AssociatedImplTrait> {
        self.associated_impls.get(&impl_id)
    }

    pub(crate) fn associated_impl_mut(&mut self, impl_id: HirId) -> Option<&mut AssociatedImplTrait> {
        self.associated_impls.get_mut(&impl_id)
    }

    /// Rebuild `ty` bottom-up with fresh identities. Wherever `f` returns a
    /// replacement, that replacement is used instead of the node and its children.
    pub fn fold(&mut self, ty: &TypeNode, f: &mut dyn FnMut(&TypeNode) -> Option<TypeNode>) -> TypeNode {
        if let Some(replacement) = f(ty) {
            return self.clone_fresh(&replacement);
        }

        let kind = match ty.kind() {
            TyKind::FnDef { def, name, params, ret } => TyKind::FnDef {
                def: *def,
                name: name.clone(),
                params: params.iter().map(|p| self.fold(p, f)).collect(),
                ret: Box::new(self.fold(ret, f)),
            },
            TyKind::FnPtr { params, ret } => TyKind::FnPtr {
                params: params.iter().map(|p| self.fold(p, f)).collect(),
                ret: Box::new(self.fold(ret, f)),
            },
            TyKind::Tuple(elems) => TyKind::Tuple(elems.iter().map(|e| self.fold(e, f)).collect()),
            TyKind::Reference { base, mutability } => TyKind::Reference {
                base: Box::new(self.fold(base, f)),
                mutability: *mutability,
            },
            TyKind::RawPointer { base, mutability } => TyKind::RawPointer {
                base: Box::new(self.fold(base, f)),
                mutability: *mutability,
            },
            TyKind::Array { elem, len } => TyKind::Array {
                elem: Box::new(self.fold(elem, f)),
                len: *len,
            },
            other => other.clone(),
        };

        let substs = ty.substs().iter()
            .map(|s| SubstParam {
                param: s.param.clone(),
                arg: s.arg.as_ref().map(|a| self.fold(a, f)),
            })
            .collect();

        self.mk_generic(kind, substs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyres_diag::Span;

    fn param(id: u32, symbol: &str) -> ParamTy {
        ParamTy {
            id: HirId(id),
            symbol: symbol.to_string(),
            bounds: Vec::new(),
            default: None,
            span: Span::default(),
        }
    }

    #[test]
    fn test_identities_are_unique() {
        let mut ctx = TypeContext::new();
        let a = ctx.mk(TyKind::Bool);
        let b = ctx.mk(TyKind::Bool);
        let c = ctx.clone_fresh(&a);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a, c);
    }

    #[test]
    fn test_insert_is_once_per_id() {
        let mut ctx = TypeContext::new();
        let first = ctx.mk(TyKind::Char);
        let stored = ctx.insert_type(HirId(1), first.clone()).unwrap();
        assert_eq!(stored.id(), first.id());

        // equal type again: the stored node comes back
        let again = ctx.mk(TyKind::Char);
        let stored = ctx.insert_type(HirId(1), again).unwrap();
        assert_eq!(stored.id(), first.id());

        let other = ctx.mk(TyKind::Bool);
        let err = ctx.insert_type(HirId(1), other).unwrap_err();
        assert!(matches!(err, InternalError::ConflictingType { id: HirId(1), .. }));
    }

    #[test]
    fn test_fold_replaces_params() {
        let mut ctx = TypeContext::new();
        let t = ctx.mk(TyKind::Param(param(7, "T")));
        let ptr = ctx.mk(TyKind::RawPointer { base: Box::new(t), mutability: tyres_hir::Mutability::Not });
        let tuple = ctx.mk(TyKind::Tuple(vec![ptr.clone(), ptr]));
        let int = ctx.mk(TyKind::Int(IntTy::I64));

        let folded = ctx.fold(&tuple, &mut |node| match node.kind() {
            TyKind::Param(p) if p.symbol == "T" => Some(int.clone()),
            _ => None,
        });

        assert_eq!(folded.to_string(), "(*const i64, *const i64)");
        assert_ne!(folded.id(), tuple.id());
    }

    #[test]
    fn test_receivers() {
        let mut ctx = TypeContext::new();
        let unit = ctx.mk_unit();
        ctx.insert_receiver(HirId(3), unit);
        assert!(ctx.lookup_receiver(HirId(3)).is_some_and(|t| t.is_unit()));
        assert!(ctx.lookup_receiver(HirId(4)).is_none());
    }
}
