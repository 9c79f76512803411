//! Path and type-expression resolution
//!
//! A path is resolved in up to three stages:
//! 1. The root: the longest prefix name resolution already bound, walking
//!    through modules. A qualified `<T as Trait>::Item` root is projected
//!    through the trait instead.
//! 2. Each remaining segment is probed on the current receiver type.
//! 3. Leftover generic parameters are bound from the previous receiver, or
//!    inferred.

use tracing::{debug, instrument};
use tyres_diag::{Diagnostic, DiagnosticSink, ErrorCode, Span};
use tyres_hir::*;

use crate::assoc::{project_through_impl, setup_associated_types};
use crate::bounds::BoundsOracle;
use crate::config::ResolveOptions;
use crate::context::TypeContext;
use crate::error::{InternalError, ResolveResult};
use crate::probe::{report_multiple_candidates, CandidateOrigin, PathProbe};
use crate::subst::{check_unconstrained, subst_self, ExplicitArgs, SubstMapper};
use crate::types::*;

/// Where the root walk of a path stopped
struct RootPath {
    ty: TypeNode,
    /// Segments consumed
    offset: usize,
    /// Declaration named by the last consumed segment
    def: HirId,
}

/// Resolves type expressions and paths to type nodes
pub struct TypeResolver<'a> {
    ctx: &'a mut TypeContext,
    program: &'a Program,
    names: &'a mut NameResolution,
    oracle: &'a dyn BoundsOracle,
    sink: &'a mut dyn DiagnosticSink,
    options: ResolveOptions,
    /// Generic parameters of the enclosing declaration
    generics: Vec<ParamTy>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        ctx: &'a mut TypeContext,
        program: &'a Program,
        names: &'a mut NameResolution,
        oracle: &'a dyn BoundsOracle,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            ctx,
            program,
            names,
            oracle,
            sink,
            options: ResolveOptions::default(),
            generics: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_generics(mut self, generics: Vec<ParamTy>) -> Self {
        self.generics = generics;
        self
    }

    fn error(&mut self, code: ErrorCode, message: String, span: Span) -> TypeNode {
        debug!(?code, %message, "resolution error");
        self.sink.report(Diagnostic::error(code, message, span));
        self.ctx.mk_error()
    }

    fn unresolved_root(&mut self, span: Span) {
        self.error(ErrorCode::UnresolvedRoot, "failed to resolve root segment".to_string(), span);
    }

    fn mapper(&mut self) -> SubstMapper<'_> {
        SubstMapper::new(self.ctx, self.sink)
    }

    fn prober(&mut self) -> PathProbe<'_> {
        PathProbe::new(self.ctx, self.program, self.oracle, self.options)
    }

    // === Type expressions ===

    /// Resolve a type expression and record it at its id
    pub fn resolve_type(&mut self, ty: &HirType) -> ResolveResult<TypeNode> {
        let node = match &ty.kind {
            HirTypeKind::Path(path) => self.resolve_path(path)?,
            HirTypeKind::QualifiedPath(qualified) => self.resolve_qualified_path(qualified)?,
            HirTypeKind::Reference { mutability, base } => {
                let base = self.resolve_type(base)?;
                self.ctx.mk(TyKind::Reference { base: Box::new(base), mutability: *mutability })
            }
            HirTypeKind::RawPointer { mutability, base } => {
                let base = self.resolve_type(base)?;
                self.ctx.mk(TyKind::RawPointer { base: Box::new(base), mutability: *mutability })
            }
            HirTypeKind::Tuple(elems) => {
                let elems = elems.iter()
                    .map(|e| self.resolve_type(e))
                    .collect::<ResolveResult<Vec<_>>>()?;
                self.ctx.mk(TyKind::Tuple(elems))
            }
            HirTypeKind::BareFunction { params, ret } => {
                let params = params.iter()
                    .map(|p| self.resolve_type(p))
                    .collect::<ResolveResult<Vec<_>>>()?;
                let ret = match ret {
                    Some(ret) => self.resolve_type(ret)?,
                    None => self.ctx.mk_unit(),
                };
                self.ctx.mk(TyKind::FnPtr { params, ret: Box::new(ret) })
            }
            HirTypeKind::Array { elem, len } => {
                let elem = self.resolve_type(elem)?;
                self.ctx.mk(TyKind::Array { elem: Box::new(elem), len: *len })
            }
            HirTypeKind::Inferred => self.ctx.mk_infer(InferKind::General),
            HirTypeKind::TraitObject(path) => match self.resolve_trait_path(path)? {
                Some(bound) => {
                    // TODO: reject traits that are not object safe
                    debug!(bound = %bound.name, "trait object, object safety not checked");
                    self.ctx.mk(TyKind::Dynamic(vec![bound]))
                }
                None => self.ctx.mk_error(),
            },
        };
        self.ctx.insert_type(ty.id, node)
    }

    /// Turn a declared generic parameter into a `Param` type, recorded at the
    /// parameter's id
    pub fn resolve_generic_param(&mut self, param: &GenericParam) -> ResolveResult<TypeNode> {
        let mut bounds = Vec::new();
        for bound in &param.bounds {
            if let Some(b) = self.resolve_trait_path(bound)? {
                bounds.push(b);
            }
        }
        let default = match &param.default {
            Some(d) => Some(Box::new(self.resolve_type(d)?)),
            None => None,
        };
        let node = self.ctx.mk(TyKind::Param(ParamTy {
            id: param.id,
            symbol: param.name.clone(),
            bounds,
            default,
            span: param.span,
        }));
        self.ctx.insert_type(param.id, node)
    }

    /// Resolve an impl block's generics and Self type, checking that every
    /// generic parameter is used by the Self type
    pub fn resolve_impl_header(&mut self, imp: &ImplBlock) -> ResolveResult<TypeNode> {
        let mut params = Vec::with_capacity(imp.generics.len());
        for g in &imp.generics {
            if let TyKind::Param(p) = self.resolve_generic_param(g)?.kind() {
                params.push(p.clone());
            }
        }
        let outer = std::mem::replace(&mut self.generics, params);
        let self_ty = self.resolve_type(&imp.self_ty);
        self.generics = outer;
        self_ty
    }

    /// Resolve a path naming a trait. Reports and returns `None` when it does not.
    pub fn resolve_trait_path(&mut self, path: &TypePath) -> ResolveResult<Option<TraitBound>> {
        let def = self.names.lookup_resolved_type(path.id)
            .or_else(|| path.final_segment().and_then(|s| self.names.lookup_resolved_type(s.id)));
        let Some(def) = def else {
            self.error(ErrorCode::UnresolvedRoot, format!("failed to resolve trait `{}`", path), path.span);
            return Ok(None);
        };
        let Some(trait_ref) = self.program.lookup_trait(def) else {
            self.error(ErrorCode::ExpectedTrait, format!("expected trait, found `{}`", path), path.span);
            return Ok(None);
        };
        Ok(Some(TraitBound {
            trait_id: trait_ref.id,
            name: trait_ref.name.clone(),
            span: path.span,
        }))
    }

    /// Resolve explicit generic arguments to types
    pub fn resolve_generic_args(&mut self, args: &GenericArgs) -> ResolveResult<ExplicitArgs> {
        let mut explicit = ExplicitArgs { span: args.span, ..ExplicitArgs::default() };
        for ty in &args.types {
            let node = self.resolve_type(ty)?;
            explicit.positional.push((node, ty.span));
        }
        for binding in &args.bindings {
            let node = self.resolve_type(&binding.ty)?;
            explicit.named.push((binding.name.clone(), node, binding.span));
        }
        Ok(explicit)
    }

    /// Report each of `declared` that no argument mentions
    pub fn check_for_unconstrained(&mut self, declared: &[ParamTy], args: &GenericArgs) -> Vec<String> {
        if args.is_empty() {
            return Vec::new();
        }
        let mut used = Vec::new();
        for ty in &args.types {
            collect_idents(ty, &mut used);
        }
        for binding in &args.bindings {
            collect_idents(&binding.ty, &mut used);
        }
        check_unconstrained(declared, &used, self.sink)
    }

    // === Paths ===

    /// Resolve a type path and record it at the path's id
    #[instrument(level = "debug", skip_all, fields(path = %path))]
    pub fn resolve_path(&mut self, path: &TypePath) -> ResolveResult<TypeNode> {
        if path.segments.is_empty() {
            let err = self.error(ErrorCode::UnresolvedRoot, "empty path".to_string(), path.span);
            return self.ctx.insert_type(path.id, err);
        }

        let ty = match self.names.lookup_resolved_type(path.id) {
            Some(def) => self.resolve_fully_resolved(path, def)?,
            None => match self.resolve_root_path(path)? {
                Some(root) => {
                    let text = path.to_string();
                    let rest = &path.segments[root.offset..];
                    self.resolve_segments(path.id, &text, rest, root.ty, Some(root.def), path.span)?
                }
                None => self.ctx.mk_error(),
            },
        };
        self.ctx.insert_type(path.id, ty)
    }

    /// The whole path names one declaration
    fn resolve_fully_resolved(&mut self, path: &TypePath, def: HirId) -> ResolveResult<TypeNode> {
        let lookup = self.ctx.lookup_type(def).cloned().ok_or(InternalError::MissingType(def))?;
        let seg = &path.segments[path.segments.len() - 1];
        if path.segments.len() == 1 && seg.ident == "Self" {
            return Ok(lookup);
        }

        let ty = self.ctx.clone_fresh(&lookup);
        let args = seg.generic_args.as_ref().filter(|a| !a.is_empty());
        if !ty.can_substitute() {
            return Ok(match args {
                Some(args) => self.error(
                    ErrorCode::UnsupportedSubstitution,
                    format!("substitutions not supported for {}", ty),
                    args.span,
                ),
                None => ty,
            });
        }
        if !ty.needs_generic_substitutions() {
            // every parameter is already bound, so any argument is one too many
            return Ok(match args {
                Some(args) => {
                    let explicit = self.resolve_generic_args(args)?;
                    self.mapper().resolve(&ty, &explicit)
                }
                None => ty,
            });
        }

        match args {
            Some(args) => {
                let explicit = self.resolve_generic_args(args)?;
                let ty = self.mapper().resolve(&ty, &explicit);
                if !self.generics.is_empty() {
                    let declared = self.generics.clone();
                    self.check_for_unconstrained(&declared, args);
                }
                Ok(ty)
            }
            None => Ok(self.mapper().infer_subst(&ty, path.span)),
        }
    }

    /// Find the root type of `path` and how many segments it consumed.
    /// `None` once an error has been reported.
    fn resolve_root_path(&mut self, path: &TypePath) -> ResolveResult<Option<RootPath>> {
        let mut root: Option<TypeNode> = None;
        let mut root_def: Option<HirId> = None;
        let mut offset = 0;

        for (i, seg) in path.segments.iter().enumerate() {
            let is_root = root.is_none();
            let have_more = i + 1 < path.segments.len();

            let def = match self.names.lookup_resolved_name(seg.id) {
                // value names go through their binding to the definition
                Some(binding) => match self.names.lookup_definition(binding) {
                    Some(d) => Some(d.parent),
                    None => {
                        self.unresolved_root(seg.span);
                        return Ok(None);
                    }
                },
                None => self.names.lookup_resolved_type(seg.id),
            };

            let Some(def) = def else {
                if is_root {
                    self.unresolved_root(seg.span);
                    return Ok(None);
                }
                return Ok(root.zip(root_def).map(|(ty, def)| RootPath { ty, offset, def }));
            };

            if self.program.is_module(def) {
                if !have_more {
                    let message = format!("expected type, found module `{}`", seg.ident);
                    self.error(ErrorCode::ExpectedType, message, seg.span);
                    return Ok(None);
                }
                offset = i + 1;
                continue;
            }

            let Some(lookup) = self.ctx.lookup_type(def).cloned() else {
                if is_root {
                    self.unresolved_root(seg.span);
                    return Ok(None);
                }
                return Ok(root.zip(root_def).map(|(ty, def)| RootPath { ty, offset, def }));
            };
            let mut lookup = self.ctx.clone_fresh(&lookup);

            // GenericStruct::<_>::new
            if let Some(prev) = &root {
                if lookup.needs_generic_substitutions() {
                    if let Some(t) = self.mapper().propagate_from_previous(&lookup, prev) {
                        lookup = t;
                    }
                }
            }

            if let Some(args) = seg.generic_args.as_ref().filter(|a| !a.is_empty()) {
                if !lookup.can_substitute() {
                    self.error(
                        ErrorCode::UnsupportedSubstitution,
                        format!("substitutions not supported for {}", lookup),
                        args.span,
                    );
                    return Ok(None);
                }
                let explicit = self.resolve_generic_args(args)?;
                lookup = self.mapper().resolve(&lookup, &explicit);
                if lookup.is_error() {
                    return Ok(None);
                }
            } else if lookup.needs_generic_substitutions() {
                lookup = self.mapper().infer_subst(&lookup, seg.span);
            }

            debug!(segment = %seg.ident, ty = %lookup, "root segment");
            root = Some(lookup);
            root_def = Some(def);
            offset = i + 1;
        }

        Ok(root.zip(root_def).map(|(ty, def)| RootPath { ty, offset, def }))
    }

    /// Probe each segment on the receiver left by the one before it.
    /// `root_def` is what the path names when no segment is left to probe.
    fn resolve_segments(
        &mut self,
        path_id: HirId,
        path_text: &str,
        segments: &[PathSegment],
        root: TypeNode,
        root_def: Option<HirId>,
        span: Span,
    ) -> ResolveResult<TypeNode> {
        let mut receiver = root;
        let mut prev = receiver.clone();
        let mut resolved = root_def;

        for seg in segments {
            prev = receiver.clone();
            // concrete receivers prefer concrete implementations over trait defaults
            let ignore_required = !receiver.is_param();

            let mut candidates = self.prober().probe(&receiver, &seg.ident, true, false, ignore_required)?;
            if candidates.is_empty() {
                candidates = self.prober().probe(&receiver, &seg.ident, false, true, ignore_required)?;
            }

            if candidates.is_empty() {
                return Ok(self.error(
                    ErrorCode::UnresolvedSegment,
                    format!("failed to resolve path segment `{}` on type `{}`", seg.ident, receiver),
                    seg.span,
                ));
            }
            if candidates.len() > 1 {
                report_multiple_candidates(&candidates, &seg.ident, seg.span, self.sink);
                return Ok(self.ctx.mk_error());
            }

            let candidate = candidates.swap_remove(0);
            resolved = Some(candidate.item());
            let mut ty = candidate.ty;

            if let CandidateOrigin::Trait { impl_id: Some(impl_id), .. } = candidate.origin {
                setup_associated_types(self.ctx, self.program, impl_id)?;
                ty = project_through_impl(self.ctx, &ty, impl_id);
                ty = self.ctx.clone_fresh(&ty);
            }

            // bindings of the receiver first, so the segment's own arguments
            // go to the parameters it declares
            if ty.needs_generic_substitutions() {
                if let Some(t) = self.mapper().propagate_from_previous(&ty, &prev) {
                    ty = t;
                }
            }

            if let Some(args) = seg.generic_args.as_ref().filter(|a| !a.is_empty()) {
                if !ty.can_substitute() {
                    return Ok(self.error(
                        ErrorCode::UnsupportedSubstitution,
                        format!("substitutions not supported for {}", ty),
                        args.span,
                    ));
                }
                let explicit = self.resolve_generic_args(args)?;
                ty = self.mapper().resolve(&ty, &explicit);
                if ty.is_error() {
                    return Ok(ty);
                }
            }

            debug!(segment = %seg.ident, ty = %ty, "resolved segment");
            receiver = ty;
        }

        if receiver.needs_generic_substitutions() {
            if let Some(t) = self.mapper().propagate_from_previous(&receiver, &prev) {
                receiver = t;
            }
            if receiver.needs_generic_substitutions() {
                receiver = self.mapper().infer_subst(&receiver, span);
            }
        }

        self.ctx.insert_receiver(path_id, prev);
        if let Some(computed) = resolved {
            self.record_resolution(path_id, path_text, computed)?;
        }
        Ok(receiver)
    }

    /// An earlier phase may already know what the path refers to; it must agree
    fn record_resolution(&mut self, node: HirId, path_text: &str, computed: HirId) -> ResolveResult<()> {
        let recorded = self.names.lookup_resolved_name(node)
            .or_else(|| self.names.lookup_resolved_type(node));
        match recorded {
            Some(recorded) if recorded != computed => Err(InternalError::ResolutionMismatch {
                path: path_text.to_string(),
                recorded,
                computed,
            }),
            Some(_) => Ok(()),
            None => {
                self.names.insert_resolved_name(node, computed);
                Ok(())
            }
        }
    }

    /// `<T as Trait>::Item::rest` or `<T>::rest`
    #[instrument(level = "debug", skip_all, fields(path = %qualified))]
    pub fn resolve_qualified_path(&mut self, qualified: &QualifiedPath) -> ResolveResult<TypeNode> {
        let ty = self.resolve_qualified_inner(qualified)?;
        self.ctx.insert_type(qualified.id, ty)
    }

    fn resolve_qualified_inner(&mut self, qualified: &QualifiedPath) -> ResolveResult<TypeNode> {
        let program = self.program;
        let text = qualified.to_string();
        let root = self.resolve_type(&qualified.self_ty)?;
        if root.is_error() {
            return Ok(self.ctx.mk_error());
        }

        let Some(trait_path) = &qualified.trait_path else {
            let root_def = self.resolved_target(&qualified.self_ty);
            let segments = &qualified.segments;
            return self.resolve_segments(qualified.id, &text, segments, root, root_def, qualified.span);
        };

        let Some(bound) = self.resolve_trait_path(trait_path)? else {
            return Ok(self.ctx.mk_error());
        };

        if !self.oracle.is_bound_satisfied(self.ctx, &root, bound.trait_id) {
            return Ok(self.error(
                ErrorCode::BoundNotSatisfied,
                format!("the trait bound `{}: {}` is not satisfied", root, bound.name),
                trait_path.span,
            ));
        }

        let item_seg = qualified.segments.first()
            .ok_or(InternalError::UnresolvedQualifiedRoot(qualified.id))?;
        let trait_ref = program.lookup_trait(bound.trait_id)
            .ok_or(InternalError::UnknownTrait(bound.trait_id))?;
        let Some(item) = trait_ref.lookup_item(&item_seg.ident) else {
            return Ok(self.error(
                ErrorCode::UnknownAssociatedItem,
                format!("cannot find associated item `{}` in trait `{}`", item_seg.ident, bound.name),
                item_seg.span,
            ));
        };

        // a parameter or trait object only has the declared bound, no impl
        let impl_id = match root.root().kind() {
            TyKind::Param(_) | TyKind::Dynamic(_) => None,
            _ => self.oracle.probe_implemented_traits(self.ctx, &root)
                .into_iter()
                .find(|p| p.trait_id == bound.trait_id)
                .map(|p| p.impl_id),
        };

        let mut ty = self.ctx.lookup_type(item.id).cloned().ok_or(InternalError::MissingType(item.id))?;
        if let Some(impl_id) = impl_id {
            setup_associated_types(self.ctx, program, impl_id)?;
        }
        if item.kind == TraitItemKind::Function {
            ty = subst_self(self.ctx, &ty, &root, item.id)?;
        }
        ty = match impl_id {
            Some(impl_id) => project_through_impl(self.ctx, &ty, impl_id),
            None => self.ctx.clone_fresh(&ty),
        };

        if let Some(args) = item_seg.generic_args.as_ref().filter(|a| !a.is_empty()) {
            if !ty.can_substitute() {
                return Ok(self.error(
                    ErrorCode::UnsupportedSubstitution,
                    format!("substitutions not supported for {}", ty),
                    args.span,
                ));
            }
            let explicit = self.resolve_generic_args(args)?;
            ty = self.mapper().resolve(&ty, &explicit);
            if ty.is_error() {
                return Ok(ty);
            }
        }

        debug!(item = %item.name, ty = %ty, ?impl_id, "projected through trait");
        let rest = &qualified.segments[1..];
        if rest.is_empty() {
            self.ctx.insert_receiver(qualified.id, root);
            self.record_resolution(qualified.id, &text, item.id)?;
            return Ok(ty);
        }
        self.resolve_segments(qualified.id, &text, rest, ty, Some(item.id), qualified.span)
    }

    /// The declaration a resolved type expression names, if it is a path
    fn resolved_target(&self, ty: &HirType) -> Option<HirId> {
        match &ty.kind {
            HirTypeKind::Path(path) => self.names.lookup_resolved_type(path.id)
                .or_else(|| self.names.lookup_resolved_name(path.id)),
            HirTypeKind::QualifiedPath(q) => self.names.lookup_resolved_name(q.id),
            _ => None,
        }
    }
}

/// Every identifier a type expression mentions, in order
fn collect_idents(ty: &HirType, out: &mut Vec<String>) {
    match &ty.kind {
        HirTypeKind::Path(path) | HirTypeKind::TraitObject(path) => collect_path_idents(path, out),
        HirTypeKind::QualifiedPath(q) => {
            collect_idents(&q.self_ty, out);
            if let Some(t) = &q.trait_path {
                collect_path_idents(t, out);
            }
        }
        HirTypeKind::Reference { base, .. } | HirTypeKind::RawPointer { base, .. } => {
            collect_idents(base, out)
        }
        HirTypeKind::Tuple(elems) => elems.iter().for_each(|e| collect_idents(e, out)),
        HirTypeKind::BareFunction { params, ret } => {
            params.iter().for_each(|p| collect_idents(p, out));
            if let Some(r) = ret {
                collect_idents(r, out);
            }
        }
        HirTypeKind::Array { elem, .. } => collect_idents(elem, out),
        HirTypeKind::Inferred => {}
    }
}

fn collect_path_idents(path: &TypePath, out: &mut Vec<String>) {
    for seg in &path.segments {
        out.push(seg.ident.clone());
        if let Some(args) = &seg.generic_args {
            args.types.iter().for_each(|t| collect_idents(t, out));
            args.bindings.iter().for_each(|b| collect_idents(&b.ty, out));
        }
    }
}
