//! Type representation for path resolution

use std::fmt;
use tyres_diag::Span;
use tyres_hir::{HirId, Mutability};

/// Identity of a type node. Every node created by the context gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ty#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferKind {
    General,
    Integral,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    Isize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintTy {
    U8,
    U16,
    U32,
    U64,
    Usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatTy {
    F32,
    F64,
}

/// A trait named as a bound on a parameter or trait object
#[derive(Debug, Clone)]
pub struct TraitBound {
    pub trait_id: HirId,
    pub name: String,
    pub span: Span,
}

impl PartialEq for TraitBound {
    fn eq(&self, other: &Self) -> bool {
        self.trait_id == other.trait_id
    }
}

/// A generic parameter as a type
#[derive(Debug, Clone)]
pub struct ParamTy {
    /// Declaration of the parameter
    pub id: HirId,
    pub symbol: String,
    pub bounds: Vec<TraitBound>,
    pub default: Option<Box<TypeNode>>,
    /// Where the parameter is declared
    pub span: Span,
}

impl PartialEq for ParamTy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.symbol == other.symbol
    }
}

/// One generic parameter of a generic node and what it is bound to, if anything
#[derive(Debug, Clone, PartialEq)]
pub struct SubstParam {
    pub param: ParamTy,
    pub arg: Option<TypeNode>,
}

impl SubstParam {
    pub fn unbound(param: ParamTy) -> Self {
        Self { param, arg: None }
    }

    pub fn is_bound(&self) -> bool {
        self.arg.is_some()
    }
}

/// The kind of a type node. Never changes once a node exists.
#[derive(Debug, Clone, PartialEq)]
pub enum TyKind {
    /// Error type (for recovery)
    Error,
    /// Inference variable
    Infer(InferKind),
    /// Generic parameter
    Param(ParamTy),
    /// Associated type of a trait, bound once an impl realizes it
    Placeholder { symbol: String, item: HirId },
    /// Trait object
    Dynamic(Vec<TraitBound>),
    /// A function item
    FnDef { def: HirId, name: String, params: Vec<TypeNode>, ret: Box<TypeNode> },
    /// Function pointer
    FnPtr { params: Vec<TypeNode>, ret: Box<TypeNode> },
    /// Tuple; the empty tuple is unit
    Tuple(Vec<TypeNode>),
    Reference { base: Box<TypeNode>, mutability: Mutability },
    RawPointer { base: Box<TypeNode>, mutability: Mutability },
    Array { elem: Box<TypeNode>, len: usize },
    /// User-defined struct or enum; type arguments live in the node's substitutions
    Adt { def: HirId, name: String },
    Bool,
    Char,
    Str,
    Int(IntTy),
    Uint(UintTy),
    Float(FloatTy),
    Never,
}

/// A node of the type graph
///
/// Equality compares structure and ignores identity; compare [`TypeNode::id`]
/// when identity matters.
#[derive(Debug, Clone)]
pub struct TypeNode {
    id: TypeId,
    kind: TyKind,
    substs: Vec<SubstParam>,
}

impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.substs == other.substs
    }
}

impl TypeNode {
    pub fn new(id: TypeId, kind: TyKind) -> Self {
        Self { id, kind, substs: Vec::new() }
    }

    pub fn new_generic(id: TypeId, kind: TyKind, substs: Vec<SubstParam>) -> Self {
        Self { id, kind, substs }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn kind(&self) -> &TyKind {
        &self.kind
    }

    pub fn substs(&self) -> &[SubstParam] {
        &self.substs
    }

    /// Same node under another identity
    pub(crate) fn with_id(&self, id: TypeId) -> TypeNode {
        TypeNode { id, kind: self.kind.clone(), substs: self.substs.clone() }
    }

    pub(crate) fn with_substs(mut self, substs: Vec<SubstParam>) -> TypeNode {
        self.substs = substs;
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TyKind::Error)
    }

    pub fn is_param(&self) -> bool {
        matches!(self.kind, TyKind::Param(_))
    }

    pub fn is_unit(&self) -> bool {
        matches!(&self.kind, TyKind::Tuple(elems) if elems.is_empty())
    }

    /// Has generic parameters at all
    pub fn can_substitute(&self) -> bool {
        !self.substs.is_empty()
    }

    /// Has at least one generic parameter with nothing bound to it
    pub fn needs_generic_substitutions(&self) -> bool {
        self.substs.iter().any(|s| !s.is_bound())
    }

    pub fn unbound_params(&self) -> impl Iterator<Item = &ParamTy> {
        self.substs.iter().filter(|s| !s.is_bound()).map(|s| &s.param)
    }

    /// The type under any references and raw pointers
    pub fn root(&self) -> &TypeNode {
        match &self.kind {
            TyKind::Reference { base, .. } | TyKind::RawPointer { base, .. } => base.root(),
            _ => self,
        }
    }

    /// Bounds written on this type itself (parameters and trait objects)
    pub fn specified_bounds(&self) -> &[TraitBound] {
        match &self.kind {
            TyKind::Param(p) => &p.bounds,
            TyKind::Dynamic(bounds) => bounds,
            _ => &[],
        }
    }

    /// Symbol -> argument pairs for every bound parameter
    pub fn used_subst_args(&self) -> Vec<(String, TypeNode)> {
        self.substs.iter()
            .filter_map(|s| s.arg.as_ref().map(|a| (s.param.symbol.clone(), a.clone())))
            .collect()
    }

    /// Structural match where inference variables unify with anything.
    /// Binds nothing.
    pub fn can_eq(&self, other: &TypeNode) -> bool {
        match (&self.kind, &other.kind) {
            (TyKind::Error, _) | (_, TyKind::Error) => false,

            (TyKind::Infer(InferKind::General), _) | (_, TyKind::Infer(InferKind::General)) => true,
            (TyKind::Infer(InferKind::Integral), k) | (k, TyKind::Infer(InferKind::Integral)) => {
                matches!(k, TyKind::Int(_) | TyKind::Uint(_) | TyKind::Infer(InferKind::Integral))
            }
            (TyKind::Infer(InferKind::Float), k) | (k, TyKind::Infer(InferKind::Float)) => {
                matches!(k, TyKind::Float(_) | TyKind::Infer(InferKind::Float))
            }

            (TyKind::Param(a), TyKind::Param(b)) => a == b,
            (TyKind::Placeholder { item: a, .. }, TyKind::Placeholder { item: b, .. }) => a == b,
            (TyKind::Dynamic(a), TyKind::Dynamic(b)) => {
                a.len() == b.len() && a.iter().all(|bound| b.contains(bound))
            }

            (TyKind::Adt { def: d1, .. }, TyKind::Adt { def: d2, .. }) => {
                d1 == d2 && self.substs_can_eq(other)
            }
            (TyKind::FnDef { def: d1, .. }, TyKind::FnDef { def: d2, .. }) => d1 == d2,
            (TyKind::FnPtr { params: p1, ret: r1 }, TyKind::FnPtr { params: p2, ret: r2 }) => {
                p1.len() == p2.len()
                    && p1.iter().zip(p2.iter()).all(|(a, b)| a.can_eq(b))
                    && r1.can_eq(r2)
            }
            (TyKind::Tuple(a), TyKind::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.can_eq(y))
            }
            (TyKind::Reference { base: b1, mutability: m1 }, TyKind::Reference { base: b2, mutability: m2 }) => {
                m1 == m2 && b1.can_eq(b2)
            }
            (TyKind::RawPointer { base: b1, mutability: m1 }, TyKind::RawPointer { base: b2, mutability: m2 }) => {
                m1 == m2 && b1.can_eq(b2)
            }
            (TyKind::Array { elem: e1, len: l1 }, TyKind::Array { elem: e2, len: l2 }) => {
                l1 == l2 && e1.can_eq(e2)
            }

            (a, b) => a == b,
        }
    }

    fn substs_can_eq(&self, other: &TypeNode) -> bool {
        if self.substs.len() != other.substs.len() {
            return false;
        }
        self.substs.iter().zip(other.substs.iter()).all(|(a, b)| match (&a.arg, &b.arg) {
            (Some(x), Some(y)) => x.can_eq(y),
            // an unbound parameter matches any argument
            _ => true,
        })
    }

    /// Replace the listed parameters with general inference variables, for
    /// matching an impl's Self type against a receiver. The result is never
    /// stored, so identities are reused.
    pub fn as_match_pattern(&self, params: &[HirId]) -> TypeNode {
        if params.is_empty() {
            return self.clone();
        }
        let pattern = |t: &TypeNode| t.as_match_pattern(params);
        let kind = match &self.kind {
            TyKind::Param(p) if params.contains(&p.id) => TyKind::Infer(InferKind::General),
            TyKind::FnDef { def, name, params: ps, ret } => TyKind::FnDef {
                def: *def,
                name: name.clone(),
                params: ps.iter().map(pattern).collect(),
                ret: Box::new(pattern(&**ret)),
            },
            TyKind::FnPtr { params: ps, ret } => TyKind::FnPtr {
                params: ps.iter().map(pattern).collect(),
                ret: Box::new(pattern(&**ret)),
            },
            TyKind::Tuple(elems) => TyKind::Tuple(elems.iter().map(pattern).collect()),
            TyKind::Reference { base, mutability } => TyKind::Reference {
                base: Box::new(pattern(&**base)),
                mutability: *mutability,
            },
            TyKind::RawPointer { base, mutability } => TyKind::RawPointer {
                base: Box::new(pattern(&**base)),
                mutability: *mutability,
            },
            TyKind::Array { elem, len } => TyKind::Array { elem: Box::new(pattern(&**elem)), len: *len },
            other => other.clone(),
        };
        let substs = self.substs.iter()
            .map(|s| SubstParam { param: s.param.clone(), arg: s.arg.as_ref().map(pattern) })
            .collect();
        TypeNode::new_generic(self.id, kind, substs)
    }

    fn fmt_args(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.substs.is_empty() {
            return Ok(());
        }
        let args: Vec<String> = self.substs.iter()
            .map(|s| match &s.arg {
                Some(arg) => arg.to_string(),
                None => s.param.symbol.clone(),
            })
            .collect();
        write!(f, "<{}>", args.join(", "))
    }
}

fn join(types: &[TypeNode]) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TyKind::Error => f.write_str("<error>"),
            TyKind::Infer(InferKind::General) => f.write_str("_"),
            TyKind::Infer(InferKind::Integral) => f.write_str("{integer}"),
            TyKind::Infer(InferKind::Float) => f.write_str("{float}"),
            TyKind::Param(p) => f.write_str(&p.symbol),
            TyKind::Placeholder { symbol, .. } => f.write_str(symbol),
            TyKind::Dynamic(bounds) => {
                let names: Vec<&str> = bounds.iter().map(|b| b.name.as_str()).collect();
                write!(f, "dyn {}", names.join(" + "))
            }
            TyKind::FnDef { name, params, ret, .. } => {
                write!(f, "fn {}", name)?;
                self.fmt_args(f)?;
                write!(f, "({}) -> {}", join(params), ret)
            }
            TyKind::FnPtr { params, ret } => write!(f, "fn({}) -> {}", join(params), ret),
            TyKind::Tuple(elems) if elems.len() == 1 => write!(f, "({},)", elems[0]),
            TyKind::Tuple(elems) => write!(f, "({})", join(elems)),
            TyKind::Reference { base, mutability } => {
                let m = if mutability.is_mut() { "mut " } else { "" };
                write!(f, "&{}{}", m, base)
            }
            TyKind::RawPointer { base, mutability } => {
                let m = if mutability.is_mut() { "mut" } else { "const" };
                write!(f, "*{} {}", m, base)
            }
            TyKind::Array { elem, len } => write!(f, "[{}; {}]", elem, len),
            TyKind::Adt { name, .. } => {
                f.write_str(name)?;
                self.fmt_args(f)
            }
            TyKind::Bool => f.write_str("bool"),
            TyKind::Char => f.write_str("char"),
            TyKind::Str => f.write_str("str"),
            TyKind::Int(i) => f.write_str(match i {
                IntTy::I8 => "i8",
                IntTy::I16 => "i16",
                IntTy::I32 => "i32",
                IntTy::I64 => "i64",
                IntTy::Isize => "isize",
            }),
            TyKind::Uint(u) => f.write_str(match u {
                UintTy::U8 => "u8",
                UintTy::U16 => "u16",
                UintTy::U32 => "u32",
                UintTy::U64 => "u64",
                UintTy::Usize => "usize",
            }),
            TyKind::Float(FloatTy::F32) => f.write_str("f32"),
            TyKind::Float(FloatTy::F64) => f.write_str("f64"),
            TyKind::Never => f.write_str("!"),
        }
    }
}

/// Parse a primitive type name to its kind
pub fn parse_primitive(name: &str) -> Option<TyKind> {
    match name {
        "i8" => Some(TyKind::Int(IntTy::I8)),
        "i16" => Some(TyKind::Int(IntTy::I16)),
        "i32" => Some(TyKind::Int(IntTy::I32)),
        "i64" => Some(TyKind::Int(IntTy::I64)),
        "isize" => Some(TyKind::Int(IntTy::Isize)),
        "u8" => Some(TyKind::Uint(UintTy::U8)),
        "u16" => Some(TyKind::Uint(UintTy::U16)),
        "u32" => Some(TyKind::Uint(UintTy::U32)),
        "u64" => Some(TyKind::Uint(UintTy::U64)),
        "usize" => Some(TyKind::Uint(UintTy::Usize)),
        "f32" => Some(TyKind::Float(FloatTy::F32)),
        "f64" => Some(TyKind::Float(FloatTy::F64)),
        "bool" => Some(TyKind::Bool),
        "char" => Some(TyKind::Char),
        "str" => Some(TyKind::Str),
        _ => None,
    }
}
