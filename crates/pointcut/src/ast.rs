//! The immutable expression tree built by the parser.
//!
//! [`ExpressionNode`] is a closed sum type: the matcher matches it
//! exhaustively, so adding a pointcut kind is a compile-time-checked
//! exercise. Nodes own every compiled pattern beneath them and are never
//! mutated after construction, which is what makes a compiled expression
//! shareable across threads.

use pointcut_patterns::{NamePattern, TypePattern};

use crate::descriptor::Modifiers;

/// Accumulated modifier constraints, each flag optionally negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierFilter {
    /// Flags the candidate must carry.
    pub required: Modifiers,
    /// Flags the candidate must not carry.
    pub forbidden: Modifiers,
}

impl ModifierFilter {
    /// Whether the filter constrains nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required == Modifiers::empty() && self.forbidden == Modifiers::empty()
    }

    /// Test a candidate's modifier mask.
    #[must_use]
    pub fn matches(&self, candidate: Modifiers) -> bool {
        candidate.contains(self.required) && !candidate.intersects(self.forbidden)
    }

    pub(crate) fn require(&mut self, flag: Modifiers) {
        self.required = self.required.union(flag);
    }

    pub(crate) fn forbid(&mut self, flag: Modifiers) {
        self.forbidden = self.forbidden.union(flag);
    }
}

/// A required (or, negated, forbidden) annotation, compared by
/// fully-qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFilter {
    /// Fully-qualified annotation name.
    pub name: String,
    /// Whether the annotation must be absent instead of present.
    pub negated: bool,
}

impl AnnotationFilter {
    /// Test a candidate's annotation set.
    #[must_use]
    pub fn matches(&self, annotations: &[String]) -> bool {
        let present = annotations.iter().any(|a| a == &self.name);
        present != self.negated
    }
}

/// One entry of a parameter or argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterPattern {
    /// A type pattern matching exactly one parameter.
    Type(TypePattern),
    /// `..`: any number (including zero) of parameters of any type. Legal
    /// only in first or last position; the parser rejects it elsewhere.
    Eager,
}

/// An ordered parameter list with optional leading/trailing eager wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterList {
    /// The entries in source order.
    pub entries: Vec<ParameterPattern>,
}

/// A compiled method pattern: `modifiers return declaring.name(params)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPattern {
    /// Modifier constraints.
    pub modifiers: ModifierFilter,
    /// Annotation constraints.
    pub annotations: Vec<AnnotationFilter>,
    /// Return type pattern.
    pub return_type: TypePattern,
    /// Declaring type pattern.
    pub declaring_type: TypePattern,
    /// Member name pattern.
    pub name: NamePattern,
    /// Parameter list pattern.
    pub parameters: ParameterList,
}

/// A compiled constructor pattern: `modifiers declaring.new(params)`.
///
/// The member name is the literal `new`; the grammar enforces this, so no
/// name pattern is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorPattern {
    /// Modifier constraints.
    pub modifiers: ModifierFilter,
    /// Annotation constraints.
    pub annotations: Vec<AnnotationFilter>,
    /// Declaring type pattern.
    pub declaring_type: TypePattern,
    /// Parameter list pattern.
    pub parameters: ParameterList,
}

/// Either shape accepted by `execution`, `call`, `withincode`, `hasmethod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberPattern {
    /// A method pattern.
    Method(MethodPattern),
    /// A constructor pattern.
    Constructor(ConstructorPattern),
    /// The annotation/modifier-only form (`execution(@Tx)`): only the
    /// filters constrain the candidate, and methods and constructors are
    /// accepted alike.
    Any {
        /// Modifier constraints.
        modifiers: ModifierFilter,
        /// Annotation constraints.
        annotations: Vec<AnnotationFilter>,
    },
}

/// A compiled field pattern: `modifiers fieldType declaring.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPattern {
    /// Modifier constraints.
    pub modifiers: ModifierFilter,
    /// Annotation constraints.
    pub annotations: Vec<AnnotationFilter>,
    /// Field type pattern.
    pub field_type: TypePattern,
    /// Declaring type pattern.
    pub declaring_type: TypePattern,
    /// Field name pattern.
    pub name: NamePattern,
}

/// A compiled class-level filter: annotations, modifiers, type pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    /// Modifier constraints.
    pub modifiers: ModifierFilter,
    /// Annotation constraints.
    pub annotations: Vec<AnnotationFilter>,
    /// The type pattern itself.
    pub type_pattern: TypePattern,
}

/// What `withincode(...)` encloses in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithinCodeTarget {
    /// A method or constructor body.
    Member(MemberPattern),
    /// A static initializer of a matching type:
    /// `withincode(staticinitialization(<class pattern>))`.
    StaticInitialization(ClassFilter),
}

/// A named, externally-resolved sub-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointcutReference {
    /// The reference name; resolution is the caller's responsibility.
    pub name: String,
    /// Bound argument patterns, when the reference was written with an
    /// argument list.
    pub arguments: Vec<ParameterPattern>,
}

/// One node of a compiled pointcut expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionNode {
    /// Short-circuit conjunction.
    And(Box<ExpressionNode>, Box<ExpressionNode>),
    /// Short-circuit disjunction.
    Or(Box<ExpressionNode>, Box<ExpressionNode>),
    /// Negation.
    Not(Box<ExpressionNode>),
    /// `execution(...)`: a method or constructor body executing.
    Execution(MemberPattern),
    /// `call(...)`: a call site invoking a matching member.
    Call(MemberPattern),
    /// `get(...)`: a field read.
    Get(FieldPattern),
    /// `set(...)`: a field write.
    Set(FieldPattern),
    /// `within(...)`: the join point is lexically inside a matching type.
    Within(ClassFilter),
    /// `withincode(...)`: the join point is lexically inside a matching
    /// member body.
    WithinCode(WithinCodeTarget),
    /// `handler(...)`: an exception handler for a matching exception type.
    Handler(ClassFilter),
    /// `staticinitialization(...)`: a static initializer of a matching type.
    StaticInitialization(ClassFilter),
    /// `cflow(...)`: a frame of the supplied call stack, the current frame
    /// included, matches the nested expression.
    Cflow(Box<ExpressionNode>),
    /// `cflowbelow(...)`: like `cflow` but the top-of-stack frame is
    /// excluded.
    CflowBelow(Box<ExpressionNode>),
    /// `args(...)`: the join point's argument types match positionally.
    Args(Vec<ParameterPattern>),
    /// `target(...)`: the join point's target is-a matching type. False for
    /// static members.
    Target(TypePattern),
    /// `this(...)`: the enclosing instance is-a matching type. False when
    /// the enclosing member is static.
    This(TypePattern),
    /// `if()`: a runtime-condition marker. It has no intrinsic truth value;
    /// this engine evaluates it as `true` and external runtime evaluators
    /// locate it via [`ExpressionNode::walk`].
    If,
    /// `hasmethod(...)`: the candidate's type declares a matching method.
    HasMethod(MemberPattern),
    /// `hasfield(...)`: the candidate's type declares a matching field.
    HasField(FieldPattern),
    /// A named reference to another compiled expression.
    Reference(PointcutReference),
}

impl ExpressionNode {
    /// Visit this node and every descendant, preorder.
    pub fn walk(&self, visit: &mut impl FnMut(&ExpressionNode)) {
        visit(self);
        match self {
            Self::And(a, b) | Self::Or(a, b) => {
                a.walk(visit);
                b.walk(visit);
            }
            Self::Not(a) | Self::Cflow(a) | Self::CflowBelow(a) => a.walk(visit),
            Self::Execution(_)
            | Self::Call(_)
            | Self::Get(_)
            | Self::Set(_)
            | Self::Within(_)
            | Self::WithinCode(_)
            | Self::Handler(_)
            | Self::StaticInitialization(_)
            | Self::Args(_)
            | Self::Target(_)
            | Self::This(_)
            | Self::If
            | Self::HasMethod(_)
            | Self::HasField(_)
            | Self::Reference(_) => {}
        }
    }
}
