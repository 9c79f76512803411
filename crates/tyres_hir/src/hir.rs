//! HIR declarations and path syntax consumed by type resolution

use std::fmt;
use tyres_diag::Span;

/// Identity of a HIR node: a declaration, a type expression, or a path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HirId(pub u32);

impl HirId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for HirId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Module,
    /// Primitive types such as `i32` and `bool`
    Builtin,
    Struct,
    Enum,
    Trait,
    TraitItem,
    Impl,
    Function,
    Const,
    TypeAlias,
    TypeParam,
    /// A pattern binding; its definition parent is the item it stands for
    Local,
}

/// Information about a definition
#[derive(Debug, Clone)]
pub struct DefInfo {
    pub id: HirId,
    pub name: String,
    pub kind: DefKind,
    pub span: Span,
    /// Parent definition (e.g., trait for a trait item, impl for a method)
    pub parent: Option<HirId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Not,
    Mut,
}

impl Mutability {
    pub fn is_mut(self) -> bool {
        self == Mutability::Mut
    }
}

// === Declarations ===

/// A declared generic parameter, e.g. `T: Display = i32`
#[derive(Debug, Clone)]
pub struct GenericParam {
    pub id: HirId,
    pub name: String,
    /// Trait bounds, each a path naming a trait
    pub bounds: Vec<TypePath>,
    pub default: Option<HirType>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitItemKind {
    Function,
    Const,
    Type,
}

/// One item of a trait's contract
#[derive(Debug, Clone)]
pub struct TraitItem {
    pub id: HirId,
    pub name: String,
    pub kind: TraitItemKind,
    /// Has a default body, so implementations may omit it
    pub has_default: bool,
    pub span: Span,
}

impl TraitItem {
    pub fn is_optional(&self) -> bool {
        self.has_default
    }
}

/// A trait declaration
#[derive(Debug, Clone)]
pub struct Trait {
    pub id: HirId,
    pub name: String,
    pub items: Vec<TraitItem>,
    pub span: Span,
}

impl Trait {
    pub fn lookup_item(&self, name: &str) -> Option<&TraitItem> {
        self.items.iter().find(|item| item.name == name)
    }
}

/// A named declaration inside an impl block
#[derive(Debug, Clone)]
pub struct ItemDecl {
    pub id: HirId,
    pub name: String,
    pub span: Span,
}

/// The closed set of items an impl block can declare
#[derive(Debug, Clone)]
pub enum ImplItem {
    Function(ItemDecl),
    Constant(ItemDecl),
    TypeAlias(ItemDecl),
}

impl ImplItem {
    pub fn decl(&self) -> &ItemDecl {
        match self {
            ImplItem::Function(d) | ImplItem::Constant(d) | ImplItem::TypeAlias(d) => d,
        }
    }

    pub fn id(&self) -> HirId {
        self.decl().id
    }

    pub fn name(&self) -> &str {
        &self.decl().name
    }

    pub fn span(&self) -> Span {
        self.decl().span
    }
}

/// `impl<..> Trait for Type { .. }` or `impl<..> Type { .. }`
#[derive(Debug, Clone)]
pub struct ImplBlock {
    pub id: HirId,
    pub generics: Vec<GenericParam>,
    /// The Self type; its resolved type lives in the type context at `self_ty.id`
    pub self_ty: HirType,
    /// The implemented trait, already resolved by name resolution
    pub trait_ref: Option<HirId>,
    pub items: Vec<ImplItem>,
    pub span: Span,
}

impl ImplBlock {
    pub fn is_trait_impl(&self) -> bool {
        self.trait_ref.is_some()
    }

    pub fn lookup_item(&self, name: &str) -> Option<&ImplItem> {
        self.items.iter().find(|item| item.name() == name)
    }
}

// === Paths and type expressions ===

/// Associated-type style binding inside generic args: `Name = Type`
#[derive(Debug, Clone)]
pub struct GenericArgBinding {
    pub name: String,
    pub ty: HirType,
    pub span: Span,
}

/// Explicit generic arguments on a path segment (turbofish)
#[derive(Debug, Clone)]
pub struct GenericArgs {
    pub types: Vec<HirType>,
    pub bindings: Vec<GenericArgBinding>,
    pub span: Span,
}

impl GenericArgs {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.bindings.is_empty()
    }
}

/// One `::`-separated component of a path
#[derive(Debug, Clone)]
pub struct PathSegment {
    pub id: HirId,
    pub ident: String,
    pub generic_args: Option<GenericArgs>,
    pub span: Span,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ident)?;
        if let Some(args) = &self.generic_args {
            let mut parts: Vec<String> = args.types.iter().map(|t| t.to_string()).collect();
            parts.extend(args.bindings.iter().map(|b| format!("{} = {}", b.name, b.ty)));
            write!(f, "::<{}>", parts.join(", "))?;
        }
        Ok(())
    }
}

/// `A::B::<T>::C`
#[derive(Debug, Clone)]
pub struct TypePath {
    pub id: HirId,
    pub segments: Vec<PathSegment>,
    pub span: Span,
}

impl TypePath {
    pub fn final_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join("::"))
    }
}

/// `<Type as Trait>::Item::rest` or `<Type>::rest`
#[derive(Debug, Clone)]
pub struct QualifiedPath {
    pub id: HirId,
    pub self_ty: Box<HirType>,
    pub trait_path: Option<TypePath>,
    /// With an `as` clause the first segment is the associated item
    pub segments: Vec<PathSegment>,
    pub span: Span,
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.trait_path {
            Some(t) => write!(f, "<{} as {}>", self.self_ty, t)?,
            None => write!(f, "<{}>", self.self_ty)?,
        }
        for seg in &self.segments {
            write!(f, "::{}", seg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum HirTypeKind {
    Path(TypePath),
    QualifiedPath(QualifiedPath),
    Reference { mutability: Mutability, base: Box<HirType> },
    RawPointer { mutability: Mutability, base: Box<HirType> },
    /// The empty tuple is the unit type
    Tuple(Vec<HirType>),
    BareFunction { params: Vec<HirType>, ret: Option<Box<HirType>> },
    Array { elem: Box<HirType>, len: usize },
    /// `_`
    Inferred,
    /// `dyn Trait`
    TraitObject(TypePath),
}

/// A type expression as written
#[derive(Debug, Clone)]
pub struct HirType {
    pub id: HirId,
    pub kind: HirTypeKind,
    pub span: Span,
}

impl fmt::Display for HirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HirTypeKind::Path(p) => write!(f, "{}", p),
            HirTypeKind::QualifiedPath(q) => write!(f, "{}", q),
            HirTypeKind::Reference { mutability, base } => {
                let m = if mutability.is_mut() { "mut " } else { "" };
                write!(f, "&{}{}", m, base)
            }
            HirTypeKind::RawPointer { mutability, base } => {
                let m = if mutability.is_mut() { "mut" } else { "const" };
                write!(f, "*{} {}", m, base)
            }
            HirTypeKind::Tuple(elems) => {
                let parts: Vec<String> = elems.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            HirTypeKind::BareFunction { params, ret } => {
                let parts: Vec<String> = params.iter().map(|t| t.to_string()).collect();
                match ret {
                    Some(r) => write!(f, "fn({}) -> {}", parts.join(", "), r),
                    None => write!(f, "fn({})", parts.join(", ")),
                }
            }
            HirTypeKind::Array { elem, len } => write!(f, "[{}; {}]", elem, len),
            HirTypeKind::Inferred => f.write_str("_"),
            HirTypeKind::TraitObject(p) => write!(f, "dyn {}", p),
        }
    }
}
