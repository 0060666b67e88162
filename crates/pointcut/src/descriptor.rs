//! Read-only descriptions of candidate program elements.
//!
//! The matcher never inspects live objects or bytecode: callers supply an
//! [`ElementDescriptor`] per match call, built from whatever reflection layer
//! they own. The core never mutates a descriptor.

/// JVM-style modifier bitmask.
///
/// Bit values follow `java.lang.reflect.Modifier` so callers holding a raw
/// modifier `int` can pass it through [`Modifiers::from_bits`] unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    /// `public`.
    pub const PUBLIC: Self = Self(0x0001);
    /// `private`.
    pub const PRIVATE: Self = Self(0x0002);
    /// `protected`.
    pub const PROTECTED: Self = Self(0x0004);
    /// `static`.
    pub const STATIC: Self = Self(0x0008);
    /// `final`.
    pub const FINAL: Self = Self(0x0010);
    /// `synchronized`.
    pub const SYNCHRONIZED: Self = Self(0x0020);
    /// `volatile`.
    pub const VOLATILE: Self = Self(0x0040);
    /// `transient`.
    pub const TRANSIENT: Self = Self(0x0080);
    /// `native`.
    pub const NATIVE: Self = Self(0x0100);
    /// `abstract`.
    pub const ABSTRACT: Self = Self(0x0400);

    /// The empty bitmask.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap a raw modifier bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bitmask value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Bitwise union of two masks.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag in `other` is set in `self`.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether the `static` flag is set.
    #[must_use]
    pub const fn is_static(self) -> bool {
        self.intersects(Self::STATIC)
    }

    /// Map a modifier keyword to its flag.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Self::PUBLIC),
            "private" => Some(Self::PRIVATE),
            "protected" => Some(Self::PROTECTED),
            "static" => Some(Self::STATIC),
            "final" => Some(Self::FINAL),
            "synchronized" => Some(Self::SYNCHRONIZED),
            "volatile" => Some(Self::VOLATILE),
            "transient" => Some(Self::TRANSIENT),
            "native" => Some(Self::NATIVE),
            "abstract" => Some(Self::ABSTRACT),
            _ => None,
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// What sort of program element a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A type declaration.
    Type,
    /// A method.
    Method,
    /// A constructor.
    Constructor,
    /// A field.
    Field,
    /// A static initializer block.
    StaticInitializer,
    /// An exception handler (catch clause).
    Handler,
}

/// The kind of join point being tested, as opposed to the kind of element.
///
/// The same method descriptor can stand for its execution (tested by
/// `execution(...)`) or for a call site invoking it (tested by `call(...)`);
/// the context's join-point kind tells the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinPointKind {
    /// A method or constructor body executing.
    Execution,
    /// A call site invoking a method or constructor.
    Call,
    /// A field read.
    Get,
    /// A field write.
    Set,
    /// An exception handler entry.
    Handler,
    /// A static initializer running.
    StaticInitialization,
}

impl JoinPointKind {
    /// The default join-point kind for an element kind. Methods,
    /// constructors and types default to execution; fields default to a
    /// read. Callers override the default for call sites and field writes.
    #[must_use]
    pub fn for_element(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Type | ElementKind::Method | ElementKind::Constructor => Self::Execution,
            ElementKind::Field => Self::Get,
            ElementKind::StaticInitializer => Self::StaticInitialization,
            ElementKind::Handler => Self::Handler,
        }
    }
}

/// A member listed by a type descriptor, for `hasmethod`/`hasfield`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberDescriptor {
    /// The member name.
    pub name: String,
    /// The member's modifiers.
    pub modifiers: Modifiers,
    /// Fully-qualified annotation names present on the member.
    pub annotations: Vec<String>,
    /// Ordered parameter type names (methods only).
    pub parameter_types: Vec<String>,
    /// Return type for methods, field type for fields.
    pub value_type: Option<String>,
}

impl MemberDescriptor {
    /// Create a member with a name; everything else defaults to empty.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the member's modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Append an annotation's fully-qualified name.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    /// Set the ordered parameter type names.
    #[must_use]
    pub fn with_parameter_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the return or field type name.
    #[must_use]
    pub fn with_value_type(mut self, name: impl Into<String>) -> Self {
        self.value_type = Some(name.into());
        self
    }
}

/// A type seen through the caller's reflection layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeDescriptor {
    /// Fully-qualified type name.
    pub name: String,
    /// Ancestor names (superclasses and interfaces, transitively), nearest
    /// first.
    pub ancestors: Vec<String>,
    /// Fully-qualified annotation names present on the type.
    pub annotations: Vec<String>,
    /// The type's modifiers.
    pub modifiers: Modifiers,
    /// Declared methods, consulted by `hasmethod`.
    pub methods: Vec<MemberDescriptor>,
    /// Declared fields, consulted by `hasfield`.
    pub fields: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Create a type descriptor with a name; everything else defaults to
    /// empty.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the ancestor chain, nearest first.
    #[must_use]
    pub fn with_ancestors<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    /// Append an annotation's fully-qualified name.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    /// Set the type's modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Append a declared method.
    #[must_use]
    pub fn with_method(mut self, member: MemberDescriptor) -> Self {
        self.methods.push(member);
        self
    }

    /// Append a declared field.
    #[must_use]
    pub fn with_field(mut self, member: MemberDescriptor) -> Self {
        self.fields.push(member);
        self
    }
}

/// A candidate join point: reflective facts about one program element.
///
/// For exception handlers the declaring type is the exception type being
/// caught, and the catch site's method is supplied via
/// [`ElementDescriptor::with_enclosing`]; `within`/`withincode` then test the
/// enclosing member, while `handler(...)` tests the exception type itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// What sort of element this is.
    pub kind: ElementKind,
    /// Member name (`new` is conventional for constructors; ignored for
    /// static initializers and handlers).
    pub name: String,
    /// The element's modifiers.
    pub modifiers: Modifiers,
    /// Fully-qualified annotation names present on the element.
    pub annotations: Vec<String>,
    /// The type the element belongs to.
    pub declaring_type: TypeDescriptor,
    /// For inherited members: the ancestor the member is declared on, when
    /// that differs from `declaring_type`. Consulted by `#` patterns.
    pub declared_on: Option<String>,
    /// Ordered parameter type names (methods and constructors).
    pub parameter_types: Vec<String>,
    /// Return type for methods, field type for fields.
    pub return_type: Option<String>,
    /// The member whose body lexically contains this join point, when the
    /// join point is nested (call sites, field accesses, handlers).
    pub enclosing: Option<Box<ElementDescriptor>>,
}

impl ElementDescriptor {
    /// Create a descriptor for a named element of `kind` declared by
    /// `declaring_type`.
    #[must_use]
    pub fn new(kind: ElementKind, name: impl Into<String>, declaring_type: TypeDescriptor) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            declaring_type,
            declared_on: None,
            parameter_types: Vec::new(),
            return_type: None,
            enclosing: None,
        }
    }

    /// Set the element's modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Append an annotation's fully-qualified name.
    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    /// Record the ancestor type this member is declared on.
    #[must_use]
    pub fn with_declared_on(mut self, name: impl Into<String>) -> Self {
        self.declared_on = Some(name.into());
        self
    }

    /// Set the ordered parameter type names.
    #[must_use]
    pub fn with_parameter_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the return or field type name.
    #[must_use]
    pub fn with_return_type(mut self, name: impl Into<String>) -> Self {
        self.return_type = Some(name.into());
        self
    }

    /// Set the member lexically containing this join point.
    #[must_use]
    pub fn with_enclosing(mut self, enclosing: ElementDescriptor) -> Self {
        self.enclosing = Some(Box::new(enclosing));
        self
    }
}
