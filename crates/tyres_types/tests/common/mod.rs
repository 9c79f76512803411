//! Shared fixture: a small program with declarations already resolved the
//! way earlier phases would leave them

#![allow(dead_code)]

use tyres_diag::{Diagnostics, Span};
use tyres_hir::*;
use tyres_types::*;

pub enum ItemShape {
    RequiredFn(&'static str),
    ProvidedFn(&'static str),
    /// A provided function returning one of the trait's associated types
    ProvidedFnReturning(&'static str, &'static str),
    AssocType(&'static str),
    Const(&'static str),
}

impl ItemShape {
    fn parts(&self) -> (&'static str, TraitItemKind, bool) {
        match *self {
            ItemShape::RequiredFn(n) => (n, TraitItemKind::Function, false),
            ItemShape::ProvidedFn(n) | ItemShape::ProvidedFnReturning(n, _) => {
                (n, TraitItemKind::Function, true)
            }
            ItemShape::AssocType(n) => (n, TraitItemKind::Type, false),
            ItemShape::Const(n) => (n, TraitItemKind::Const, true),
        }
    }
}

pub struct TraitDecl {
    pub id: HirId,
    pub items: Vec<HirId>,
}

pub struct Fixture {
    pub program: Program,
    pub names: NameResolution,
    pub ctx: TypeContext,
    /// Diagnostics from resolving impl headers and standalone parameters
    pub reported: Diagnostics,
    next_offset: usize,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            program: Program::new(),
            names: NameResolution::new(),
            ctx: TypeContext::new(),
            reported: Diagnostics::new(),
            next_offset: 0,
        }
    }

    /// A span no other node shares
    pub fn span(&mut self, len: usize) -> Span {
        let span = Span::new(self.next_offset, self.next_offset + len);
        self.next_offset += len + 1;
        span
    }

    pub fn builtin(&mut self, name: &str) -> HirId {
        let span = self.span(name.len());
        let id = self.program.define(name, DefKind::Builtin, span, None);
        let kind = parse_primitive(name).expect("primitive type name");
        let node = self.ctx.mk(kind);
        self.ctx.insert_type(id, node).unwrap();
        id
    }

    pub fn module(&mut self, name: &str) -> HirId {
        let span = self.span(name.len());
        self.program.define(name, DefKind::Module, span, None)
    }

    /// A struct with unbound generic parameters
    pub fn adt(&mut self, name: &str, params: &[&str]) -> HirId {
        let span = self.span(name.len());
        let id = self.program.define(name, DefKind::Struct, span, None);
        let mut substs = Vec::new();
        for p in params {
            let pspan = self.span(p.len());
            let pid = self.program.define(p, DefKind::TypeParam, pspan, Some(id));
            let param = ParamTy {
                id: pid,
                symbol: p.to_string(),
                bounds: Vec::new(),
                default: None,
                span: pspan,
            };
            let node = self.ctx.mk(TyKind::Param(param.clone()));
            self.ctx.insert_type(pid, node).unwrap();
            substs.push(SubstParam::unbound(param));
        }
        let node = self.ctx.mk_generic(TyKind::Adt { def: id, name: name.to_string() }, substs);
        self.ctx.insert_type(id, node).unwrap();
        id
    }

    pub fn generic_param(&mut self, name: &str, bounds: Vec<TypePath>) -> GenericParam {
        let span = self.span(name.len());
        let id = self.program.define(name, DefKind::TypeParam, span, None);
        GenericParam {
            id,
            name: name.to_string(),
            bounds,
            default: None,
            span,
        }
    }

    /// Resolve a generic parameter that belongs to no impl, e.g. a function's
    pub fn resolve_param(&mut self, param: &GenericParam) -> TypeNode {
        let oracle = ImplBoundsProbe::new(&self.program);
        TypeResolver::new(&mut self.ctx, &self.program, &mut self.names, &oracle, &mut self.reported)
            .resolve_generic_param(param)
            .unwrap()
    }

    pub fn seg(&mut self, ident: &str, args: Vec<HirType>) -> PathSegment {
        let span = self.span(ident.len());
        let generic_args = if args.is_empty() {
            None
        } else {
            Some(GenericArgs {
                types: args,
                bindings: Vec::new(),
                span,
            })
        };
        self.program.new_segment(ident, generic_args, span)
    }

    pub fn path(&mut self, segments: Vec<PathSegment>) -> TypePath {
        self.program.new_type_path(segments)
    }

    /// A one-segment type path that name resolution bound to `def`
    pub fn named_type(&mut self, ident: &str, def: HirId) -> HirType {
        self.named_type_with_args(ident, def, Vec::new())
    }

    pub fn named_type_with_args(&mut self, ident: &str, def: HirId, args: Vec<HirType>) -> HirType {
        let seg = self.seg(ident, args);
        let path = self.path(vec![seg]);
        self.names.insert_resolved_type(path.id, def);
        self.program.path_type(path)
    }

    pub fn trait_path(&mut self, ident: &str, def: HirId) -> TypePath {
        let seg = self.seg(ident, Vec::new());
        let path = self.path(vec![seg]);
        self.names.insert_resolved_type(path.id, def);
        path
    }

    pub fn new_type(&mut self, kind: HirTypeKind) -> HirType {
        let span = self.span(1);
        self.program.new_type(kind, span)
    }

    /// Declare a trait. Functions take `&Self` and return unit unless they
    /// return an associated type.
    pub fn trait_decl(&mut self, name: &str, items: &[ItemShape]) -> TraitDecl {
        let span = self.span(name.len());
        let id = self.program.define(name, DefKind::Trait, span, None);
        let self_span = self.span(4);
        let self_id = self.program.define("Self", DefKind::TypeParam, self_span, Some(id));
        let self_param = ParamTy {
            id: self_id,
            symbol: "Self".to_string(),
            bounds: vec![TraitBound { trait_id: id, name: name.to_string(), span }],
            default: None,
            span: self_span,
        };

        let mut decls = Vec::new();
        for spec in items {
            let (item_name, kind, has_default) = spec.parts();
            let ispan = self.span(item_name.len());
            let item_id = self.program.define(item_name, DefKind::TraitItem, ispan, Some(id));
            decls.push(TraitItem {
                id: item_id,
                name: item_name.to_string(),
                kind,
                has_default,
                span: ispan,
            });
        }

        for (spec, decl) in items.iter().zip(decls.iter()) {
            let ty = match spec {
                ItemShape::AssocType(n) => {
                    self.ctx.mk(TyKind::Placeholder { symbol: n.to_string(), item: decl.id })
                }
                ItemShape::Const(_) => self.ctx.mk(TyKind::Int(IntTy::I32)),
                _ => {
                    let ret = match spec {
                        ItemShape::ProvidedFnReturning(_, assoc) => {
                            let target = decls.iter()
                                .find(|d| d.name == *assoc)
                                .expect("associated type declared");
                            self.ctx.mk(TyKind::Placeholder { symbol: assoc.to_string(), item: target.id })
                        }
                        _ => self.ctx.mk_unit(),
                    };
                    let self_ty = self.ctx.mk(TyKind::Param(self_param.clone()));
                    let receiver = self.ctx.mk(TyKind::Reference {
                        base: Box::new(self_ty),
                        mutability: Mutability::Not,
                    });
                    self.ctx.mk_generic(
                        TyKind::FnDef {
                            def: decl.id,
                            name: decl.name.clone(),
                            params: vec![receiver],
                            ret: Box::new(ret),
                        },
                        vec![SubstParam::unbound(self_param.clone())],
                    )
                }
            };
            self.ctx.insert_type(decl.id, ty).unwrap();
        }

        let ids = decls.iter().map(|d| d.id).collect();
        self.program.add_trait(Trait { id, name: name.to_string(), items: decls, span });
        TraitDecl { id, items: ids }
    }

    pub fn decl_fn(&mut self, name: &str) -> ImplItem {
        let span = self.span(name.len());
        let id = self.program.define(name, DefKind::Function, span, None);
        ImplItem::Function(ItemDecl { id, name: name.to_string(), span })
    }

    pub fn decl_alias(&mut self, name: &str) -> ImplItem {
        let span = self.span(name.len());
        let id = self.program.define(name, DefKind::TypeAlias, span, None);
        ImplItem::TypeAlias(ItemDecl { id, name: name.to_string(), span })
    }

    /// Add an impl block and resolve its generics and Self type
    pub fn impl_block(
        &mut self,
        generics: Vec<GenericParam>,
        self_ty: HirType,
        trait_ref: Option<HirId>,
        items: Vec<ImplItem>,
    ) -> HirId {
        let span = self.span(4);
        let id = self.program.define("impl", DefKind::Impl, span, None);
        self.program.add_impl(ImplBlock { id, generics, self_ty, trait_ref, items, span });

        let oracle = ImplBoundsProbe::new(&self.program);
        let imp = self.program.lookup_impl(id).unwrap();
        TypeResolver::new(&mut self.ctx, &self.program, &mut self.names, &oracle, &mut self.reported)
            .resolve_impl_header(imp)
            .unwrap();
        id
    }

    pub fn param_ty(&self, id: HirId) -> ParamTy {
        match self.type_of(id).kind() {
            TyKind::Param(p) => p.clone(),
            other => panic!("{} is not a parameter: {:?}", id, other),
        }
    }

    pub fn type_of(&self, id: HirId) -> TypeNode {
        self.ctx.lookup_type(id).cloned().expect("type recorded")
    }

    pub fn set_type(&mut self, id: HirId, kind: TyKind) -> TypeNode {
        let node = self.ctx.mk(kind);
        self.ctx.insert_type(id, node).unwrap()
    }

    /// Record the signature of an impl function generic over `generics`
    pub fn set_fn_type(
        &mut self,
        item: HirId,
        name: &str,
        generics: &[HirId],
        params: Vec<TypeNode>,
        ret: TypeNode,
    ) -> TypeNode {
        let substs: Vec<SubstParam> = generics.iter()
            .map(|g| SubstParam::unbound(self.param_ty(*g)))
            .collect();
        let node = self.ctx.mk_generic(
            TyKind::FnDef { def: item, name: name.to_string(), params, ret: Box::new(ret) },
            substs,
        );
        self.ctx.insert_type(item, node).unwrap()
    }

    pub fn resolve(&mut self, ty: &HirType) -> (ResolveResult<TypeNode>, Diagnostics) {
        self.resolve_with(ty, ResolveOptions::default())
    }

    pub fn resolve_with(
        &mut self,
        ty: &HirType,
        options: ResolveOptions,
    ) -> (ResolveResult<TypeNode>, Diagnostics) {
        let oracle = ImplBoundsProbe::new(&self.program);
        let mut sink = Diagnostics::new();
        let result = TypeResolver::new(&mut self.ctx, &self.program, &mut self.names, &oracle, &mut sink)
            .with_options(options)
            .resolve_type(ty);
        (result, sink)
    }

    pub fn probe(
        &mut self,
        receiver: &TypeNode,
        name: &str,
        inherent: bool,
        bounds: bool,
        ignore_required: bool,
    ) -> Vec<Candidate> {
        let oracle = ImplBoundsProbe::new(&self.program);
        PathProbe::new(&mut self.ctx, &self.program, &oracle, ResolveOptions::default())
            .probe(receiver, name, inherent, bounds, ignore_required)
            .unwrap()
    }
}
