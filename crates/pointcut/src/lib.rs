//! A pointcut expression language for selecting join points.
//!
//! Expressions combine pointcut primitives (`execution`, `call`, `get`,
//! `set`, `within`, `withincode`, `handler`, `staticinitialization`,
//! `cflow`, `cflowbelow`, `args`, `target`, `this`, `if`, `hasmethod`,
//! `hasfield`, and named references) with `&&`, `||` and `!`. [`compile`]
//! turns expression text into an immutable [`CompiledExpression`]; matching
//! evaluates it against a caller-supplied [`ElementDescriptor`] and returns
//! a boolean.
//!
//! Compilation is reentrant (all parser state is per-call) and a compiled
//! expression is `Send + Sync`: many threads may match against the same
//! expression concurrently, each with its own [`MatchContext`].
//!
//! ```
//! use pointcut::{ElementDescriptor, ElementKind, MatchContext, TypeDescriptor, compile};
//!
//! let expr = compile("execution(* foo.Bar.*(..))")?;
//! let element = ElementDescriptor::new(
//!     ElementKind::Method,
//!     "baz",
//!     TypeDescriptor::new("foo.Bar"),
//! )
//! .with_return_type("void")
//! .with_parameter_types(["int", "java.lang.String"]);
//! assert!(expr.matches(&MatchContext::new(&element))?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

mod ast;
mod descriptor;
mod errors;
mod lexer;
mod matcher;
mod parser;
mod token;

pub use ast::{
    AnnotationFilter, ClassFilter, ConstructorPattern, ExpressionNode, FieldPattern,
    MemberPattern, MethodPattern, ModifierFilter, ParameterList, ParameterPattern,
    PointcutReference, WithinCodeTarget,
};
pub use descriptor::{
    ElementDescriptor, ElementKind, JoinPointKind, MemberDescriptor, Modifiers, TypeDescriptor,
};
pub use errors::{
    ExpressionError, LexicalError, ParseError, PatternError, ResolutionError, SyntaxErrorInfo,
    UnexpectedTokenInfo,
};
pub use matcher::{MatchContext, ReferenceResolver};
pub use pointcut_patterns::{HierarchyMode, NamePattern, TypePattern};
pub use token::{Token, TokenKind};

/// An immutable, compiled pointcut expression.
///
/// The tree owns every compiled pattern beneath it and is never mutated
/// after construction, so it may be cached and shared across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpression {
    source: String,
    root: ExpressionNode,
}

impl CompiledExpression {
    /// The expression text as supplied to [`compile`].
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The root of the expression tree.
    #[must_use]
    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }

    /// Whether the tree contains an `if()` marker.
    ///
    /// The marker always evaluates as `true` here; runtime condition
    /// evaluation belongs to external collaborators, which use this (or
    /// [`ExpressionNode::walk`]) to find the markers.
    #[must_use]
    pub fn has_if_marker(&self) -> bool {
        let mut found = false;
        self.root.walk(&mut |node| {
            if matches!(node, ExpressionNode::If) {
                found = true;
            }
        });
        found
    }

    /// Evaluate the expression against one candidate join point.
    ///
    /// # Errors
    /// Returns [`ResolutionError`] when the expression contains a pointcut
    /// reference the context's resolver cannot supply. The error aborts
    /// only this match call; the expression stays usable.
    pub fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool, ResolutionError> {
        log::trace!(
            "matching `{}` against `{}.{}`",
            self.source,
            ctx.element.declaring_type.name,
            ctx.element.name,
        );
        matcher::evaluate(&self.root, ctx)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile expression text into a [`CompiledExpression`].
///
/// Compilation either succeeds wholly or fails wholly; no partial tree is
/// returned on error.
///
/// # Errors
/// Returns [`ExpressionError`] for an unrecognized character, an unexpected
/// token, or a malformed wildcard pattern.
pub fn compile(text: &str) -> Result<CompiledExpression, ExpressionError> {
    let tokens = lexer::tokenize(text)?;
    log::debug!("lexed pointcut expression into {} tokens", tokens.len());
    let root = parser::parse(tokens)?;
    Ok(CompiledExpression {
        source: text.to_owned(),
        root,
    })
}

/// Pre-flight check that every pointcut reference in `expr` resolves.
///
/// Optional: an unresolved reference is otherwise reported by
/// [`CompiledExpression::matches`] when it is first needed. Only the
/// references of this tree are checked, not those of the expressions the
/// resolver returns.
///
/// # Errors
/// Returns [`ResolutionError`] naming the first reference the resolver
/// cannot supply.
pub fn resolve_references(
    expr: &CompiledExpression,
    resolver: &dyn ReferenceResolver,
) -> Result<(), ResolutionError> {
    let mut missing: Option<String> = None;
    expr.root.walk(&mut |node| {
        if let ExpressionNode::Reference(reference) = node {
            if missing.is_none() && resolver.resolve(&reference.name).is_none() {
                missing = Some(reference.name.clone());
            }
        }
    });
    missing.map_or(Ok(()), |name| Err(ResolutionError::new(name)))
}
