//! Generic substitution: explicit, inferred and propagated bindings

use tracing::{debug, trace};
use tyres_diag::{Diagnostic, DiagnosticSink, ErrorCode, Span};
use tyres_hir::HirId;

use crate::assoc::replace_self;
use crate::context::TypeContext;
use crate::error::{InternalError, ResolveResult};
use crate::types::*;

/// Parameter symbol -> argument, in parameter order
#[derive(Debug, Clone)]
pub struct SubstitutionMap {
    entries: Vec<(String, TypeNode)>,
    pub span: Span,
}

impl SubstitutionMap {
    pub fn new(entries: Vec<(String, TypeNode)>, span: Span) -> Self {
        Self { entries, span }
    }

    pub fn get(&self, symbol: &str) -> Option<&TypeNode> {
        self.entries.iter().find(|(s, _)| s == symbol).map(|(_, t)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Resolved explicit generic arguments of one segment
#[derive(Debug, Clone, Default)]
pub struct ExplicitArgs {
    pub positional: Vec<(TypeNode, Span)>,
    /// `Name = Type` bindings
    pub named: Vec<(String, TypeNode, Span)>,
    pub span: Span,
}

impl ExplicitArgs {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Instantiates generic type nodes. Never changes its input; every result is
/// a new node.
pub struct SubstMapper<'a> {
    ctx: &'a mut TypeContext,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> SubstMapper<'a> {
    pub fn new(ctx: &'a mut TypeContext, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { ctx, sink }
    }

    fn error(&mut self, code: ErrorCode, message: String, span: Span) -> TypeNode {
        self.sink.report(Diagnostic::error(code, message, span));
        self.ctx.mk_error()
    }

    /// Bind the unbound parameters of `ty` to `args`: positional arguments
    /// first, in parameter order, then named ones. Parameters left over take
    /// their default, or a fresh inference variable.
    pub fn resolve(&mut self, ty: &TypeNode, args: &ExplicitArgs) -> TypeNode {
        if !ty.can_substitute() {
            if args.is_empty() {
                return ty.clone();
            }
            return self.error(
                ErrorCode::UnsupportedSubstitution,
                format!("substitutions not supported for {}", ty),
                args.span,
            );
        }

        let unbound: Vec<ParamTy> = ty.unbound_params().cloned().collect();
        if args.positional.len() > unbound.len() {
            let span = args.positional[unbound.len()].1;
            return self.error(
                ErrorCode::MalformedArguments,
                format!(
                    "generic item takes at most {} type arguments but {} were supplied",
                    unbound.len(),
                    args.positional.len()
                ),
                span,
            );
        }

        let mut bound: Vec<Option<TypeNode>> = vec![None; unbound.len()];
        for (slot, (arg, _)) in bound.iter_mut().zip(args.positional.iter()) {
            *slot = Some(arg.clone());
        }

        for (name, arg, span) in &args.named {
            let Some(index) = unbound.iter().position(|p| &p.symbol == name) else {
                return self.error(
                    ErrorCode::MalformedArguments,
                    format!("unknown generic parameter `{}`", name),
                    *span,
                );
            };
            if bound[index].is_some() {
                return self.error(
                    ErrorCode::MalformedArguments,
                    format!("generic parameter `{}` is bound more than once", name),
                    *span,
                );
            }
            bound[index] = Some(arg.clone());
        }

        let mut entries = Vec::with_capacity(unbound.len());
        for (param, arg) in unbound.into_iter().zip(bound) {
            let arg = match (arg, &param.default) {
                (Some(arg), _) => arg,
                (None, Some(default)) => self.ctx.clone_fresh(default),
                (None, None) => self.ctx.mk_infer(InferKind::General),
            };
            entries.push((param.symbol, arg));
        }

        let map = SubstitutionMap::new(entries, args.span);
        debug!(ty = %ty, bindings = map.len(), "substitute explicit arguments");
        self.apply(ty, &map)
    }

    /// Bind every unbound parameter of `ty` to a fresh inference variable
    pub fn infer_subst(&mut self, ty: &TypeNode, span: Span) -> TypeNode {
        let entries: Vec<(String, TypeNode)> = ty.unbound_params()
            .map(|p| p.symbol.clone())
            .collect::<Vec<_>>()
            .into_iter()
            .map(|symbol| (symbol, self.ctx.mk_infer(InferKind::General)))
            .collect();
        trace!(ty = %ty, count = entries.len(), "infer substitutions");
        self.apply(ty, &SubstitutionMap::new(entries, span))
    }

    /// Reuse the bindings `prior` already carries for the unbound parameters
    /// of `ty`, matched by symbol. `None` when `prior` binds none of them.
    pub fn propagate_from_previous(&mut self, ty: &TypeNode, prior: &TypeNode) -> Option<TypeNode> {
        let entries: Vec<(String, TypeNode)> = prior.used_subst_args()
            .into_iter()
            .filter(|(symbol, arg)| !arg.is_error() && ty.unbound_params().any(|p| &p.symbol == symbol))
            .collect();
        if entries.is_empty() {
            return None;
        }
        debug!(ty = %ty, prior = %prior, "propagate bindings from previous segment");
        Some(self.apply(ty, &SubstitutionMap::new(entries, Span::default())))
    }

    /// Apply `map` to `ty`, binding its unbound parameters and replacing
    /// parameter occurrences in its structure and existing arguments
    pub fn apply(&mut self, ty: &TypeNode, map: &SubstitutionMap) -> TypeNode {
        let mut replace = |node: &TypeNode| match node.kind() {
            TyKind::Param(p) => map.get(&p.symbol).cloned(),
            _ => None,
        };
        let folded = self.ctx.fold(ty, &mut replace);

        let substs = folded.substs().iter()
            .map(|s| match (&s.arg, map.get(&s.param.symbol)) {
                (None, Some(arg)) => SubstParam { param: s.param.clone(), arg: Some(arg.clone()) },
                _ => s.clone(),
            })
            .collect();
        folded.with_substs(substs)
    }
}

/// Bind the `Self` parameter of a trait function to `receiver`
pub fn subst_self(
    ctx: &mut TypeContext,
    ty: &TypeNode,
    receiver: &TypeNode,
    item: HirId,
) -> ResolveResult<TypeNode> {
    let Some(index) = ty.substs().iter().position(|s| s.param.symbol == "Self") else {
        return Err(InternalError::MissingSelfParam(item));
    };
    let replaced = replace_self(ctx, ty, receiver);
    let mut substs = replaced.substs().to_vec();
    substs[index].arg = Some(receiver.clone());
    Ok(replaced.with_substs(substs))
}

/// Report each declared parameter whose symbol never occurs in `supplied`.
/// Returns the unconstrained symbols in declaration order.
pub fn check_unconstrained(
    declared: &[ParamTy],
    supplied: &[String],
    sink: &mut dyn DiagnosticSink,
) -> Vec<String> {
    let mut unconstrained = Vec::new();
    for param in declared {
        if supplied.iter().any(|s| s == &param.symbol) {
            continue;
        }
        sink.report(Diagnostic::error(
            ErrorCode::UnconstrainedParameter,
            format!("unconstrained type parameter `{}`", param.symbol),
            param.span,
        ));
        unconstrained.push(param.symbol.clone());
    }
    unconstrained
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyres_diag::Diagnostics;

    fn param(id: u32, symbol: &str) -> ParamTy {
        ParamTy {
            id: HirId(id),
            symbol: symbol.to_string(),
            bounds: Vec::new(),
            default: None,
            span: Span::new(id as usize, id as usize + 1),
        }
    }

    /// `Pair<A, B>` with both parameters unbound
    fn pair(ctx: &mut TypeContext) -> TypeNode {
        ctx.mk_generic(
            TyKind::Adt { def: HirId(50), name: "Pair".to_string() },
            vec![SubstParam::unbound(param(1, "A")), SubstParam::unbound(param(2, "B"))],
        )
    }

    fn positional(tys: Vec<TypeNode>) -> ExplicitArgs {
        ExplicitArgs {
            positional: tys.into_iter().map(|t| (t, Span::new(10, 12))).collect(),
            named: Vec::new(),
            span: Span::new(9, 20),
        }
    }

    #[test]
    fn test_positional_then_infer() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let ty = pair(&mut ctx);
        let b = ctx.mk(TyKind::Bool);

        let result = SubstMapper::new(&mut ctx, &mut sink).resolve(&ty, &positional(vec![b]));
        assert_eq!(result.to_string(), "Pair<bool, _>");
        assert!(!result.needs_generic_substitutions());
        assert_ne!(result.id(), ty.id());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_named_binding() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let ty = pair(&mut ctx);
        let c = ctx.mk(TyKind::Char);
        let args = ExplicitArgs {
            positional: Vec::new(),
            named: vec![("B".to_string(), c, Span::new(3, 4))],
            span: Span::new(0, 5),
        };

        let result = SubstMapper::new(&mut ctx, &mut sink).resolve(&ty, &args);
        assert_eq!(result.to_string(), "Pair<_, char>");
    }

    #[test]
    fn test_too_many_arguments() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let ty = pair(&mut ctx);
        let args: Vec<TypeNode> = (0..3).map(|_| ctx.mk(TyKind::Bool)).collect();

        let result = SubstMapper::new(&mut ctx, &mut sink).resolve(&ty, &positional(args));
        assert!(result.is_error());
        assert_eq!(sink.with_code(ErrorCode::MalformedArguments).len(), 1);
    }

    #[test]
    fn test_unknown_and_duplicate_names() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let ty = pair(&mut ctx);
        let b = ctx.mk(TyKind::Bool);

        let unknown = ExplicitArgs {
            positional: Vec::new(),
            named: vec![("C".to_string(), b.clone(), Span::new(1, 2))],
            span: Span::new(0, 3),
        };
        let dup = ExplicitArgs {
            positional: vec![(b.clone(), Span::new(1, 2))],
            named: vec![("A".to_string(), b, Span::new(3, 4))],
            span: Span::new(0, 5),
        };

        let mut mapper = SubstMapper::new(&mut ctx, &mut sink);
        assert!(mapper.resolve(&ty, &unknown).is_error());
        assert!(mapper.resolve(&ty, &dup).is_error());
        assert_eq!(sink.with_code(ErrorCode::MalformedArguments).len(), 2);
    }

    #[test]
    fn test_not_generic() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let ty = ctx.mk(TyKind::Str);
        let b = ctx.mk(TyKind::Bool);

        let result = SubstMapper::new(&mut ctx, &mut sink).resolve(&ty, &positional(vec![b]));
        assert!(result.is_error());
        assert_eq!(sink.with_code(ErrorCode::UnsupportedSubstitution).len(), 1);
    }

    #[test]
    fn test_default_fills_missing_argument() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let u8_ty = ctx.mk(TyKind::Uint(UintTy::U8));
        let mut b = param(2, "B");
        b.default = Some(Box::new(u8_ty));
        let ty = ctx.mk_generic(
            TyKind::Adt { def: HirId(50), name: "Pair".to_string() },
            vec![SubstParam::unbound(param(1, "A")), SubstParam::unbound(b)],
        );
        let s = ctx.mk(TyKind::Str);

        let result = SubstMapper::new(&mut ctx, &mut sink).resolve(&ty, &positional(vec![s]));
        assert_eq!(result.to_string(), "Pair<str, u8>");
    }

    #[test]
    fn test_propagation_matches_by_symbol() {
        let mut ctx = TypeContext::new();
        let mut sink = Diagnostics::new();
        let pair_ty = pair(&mut ctx);
        let i = ctx.mk(TyKind::Int(IntTy::I32));
        let f = ctx.mk(TyKind::Float(FloatTy::F64));
        let prior = SubstMapper::new(&mut ctx, &mut sink).resolve(&pair_ty, &positional(vec![i, f]));

        // fn first<A>() -> A
        let a = ctx.mk(TyKind::Param(param(1, "A")));
        let first = ctx.mk_generic(
            TyKind::FnDef { def: HirId(60), name: "first".to_string(), params: Vec::new(), ret: Box::new(a) },
            vec![SubstParam::unbound(param(1, "A"))],
        );

        let mut mapper = SubstMapper::new(&mut ctx, &mut sink);
        let result = mapper.propagate_from_previous(&first, &prior).unwrap();
        assert_eq!(result.to_string(), "fn first<i32>() -> i32");

        let unrelated = mapper.ctx.mk(TyKind::Bool);
        assert!(mapper.propagate_from_previous(&first, &unrelated).is_none());
    }

    #[test]
    fn test_subst_self() {
        let mut ctx = TypeContext::new();
        let self_param = ctx.mk(TyKind::Param(param(9, "Self")));
        let reference = ctx.mk(TyKind::Reference {
            base: Box::new(self_param),
            mutability: tyres_hir::Mutability::Not,
        });
        let unit = ctx.mk_unit();
        let fmt = ctx.mk_generic(
            TyKind::FnDef {
                def: HirId(70),
                name: "fmt".to_string(),
                params: vec![reference],
                ret: Box::new(unit),
            },
            vec![SubstParam::unbound(param(9, "Self"))],
        );
        let foo = ctx.mk(TyKind::Adt { def: HirId(80), name: "Foo".to_string() });

        let result = subst_self(&mut ctx, &fmt, &foo, HirId(70)).unwrap();
        assert_eq!(result.to_string(), "fn fmt<Foo>(&Foo) -> ()");

        let err = subst_self(&mut ctx, &foo, &foo, HirId(80)).unwrap_err();
        assert_eq!(err, InternalError::MissingSelfParam(HirId(80)));
    }

    #[test]
    fn test_check_unconstrained() {
        let mut sink = Diagnostics::new();
        let declared = vec![param(1, "X"), param(2, "Y")];
        let unconstrained = check_unconstrained(&declared, &["X".to_string()], &mut sink);
        assert_eq!(unconstrained, vec!["Y".to_string()]);
        let diags = sink.with_code(ErrorCode::UnconstrainedParameter);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].span, Span::new(2, 3));
    }
}
