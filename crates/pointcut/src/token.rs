//! Tokens produced by the expression lexer.

use std::fmt;

/// Classification of a lexed token.
///
/// Pointcut keywords are lexed together with their opening parenthesis
/// (`execution(` is one token, distinct from an identifier `execution`
/// followed by `(`), preserving the maximal-munch behaviour the grammar
/// relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
pub enum TokenKind {
    /// `execution(` — method or constructor execution join points.
    Execution,
    /// `call(` — method or constructor call join points.
    Call,
    /// `get(` — field read join points.
    Get,
    /// `set(` — field write join points.
    Set,
    /// `within(` — lexical containment in a type.
    Within,
    /// `withincode(` — lexical containment in a member body.
    WithinCode,
    /// `handler(` — exception handler join points.
    Handler,
    /// `staticinitialization(` — static initializer join points, also the
    /// nested form inside `withincode(...)`.
    StaticInitialization,
    /// `cflow(` — control-flow containment.
    Cflow,
    /// `cflowbelow(` — control-flow containment below the current frame.
    CflowBelow,
    /// `args(` — argument type constraints.
    Args,
    /// `target(` — join-point target type constraint.
    Target,
    /// `this(` — enclosing instance type constraint.
    This,
    /// `if(` — runtime-condition marker.
    If,
    /// `hasmethod(` — type-declares-a-matching-method constraint.
    HasMethod,
    /// `hasfield(` — type-declares-a-matching-field constraint.
    HasField,
    /// A bare name in the logical grammar: a pointcut reference.
    Identifier,
    /// A wildcard pattern chunk inside a pattern or argument context.
    Pattern,
    /// A modifier keyword (`public`, `static`, ...) inside a pattern context.
    Modifier,
    /// An `@Name` annotation filter inside a pattern context; the token text
    /// carries the name without the `@`.
    Annotation,
    /// `!` inside a pattern context, negating the following filter.
    Bang,
    /// `&&`, `&`, `AND`, `and`.
    And,
    /// `||`, `|`, `OR`, `or`.
    Or,
    /// `!`, `NOT`, `not` in the logical grammar.
    Not,
    /// `(` in the logical grammar or opening a parameter list.
    LeftParen,
    /// `)` closing a group, pattern, parameter list, or argument list.
    RightParen,
    /// `,` separating parameters or arguments.
    Comma,
}

impl TokenKind {
    /// Human-readable description used in parse diagnostics.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Execution => "`execution(`",
            Self::Call => "`call(`",
            Self::Get => "`get(`",
            Self::Set => "`set(`",
            Self::Within => "`within(`",
            Self::WithinCode => "`withincode(`",
            Self::Handler => "`handler(`",
            Self::StaticInitialization => "`staticinitialization(`",
            Self::Cflow => "`cflow(`",
            Self::CflowBelow => "`cflowbelow(`",
            Self::Args => "`args(`",
            Self::Target => "`target(`",
            Self::This => "`this(`",
            Self::If => "`if(`",
            Self::HasMethod => "`hasmethod(`",
            Self::HasField => "`hasfield(`",
            Self::Identifier => "an identifier",
            Self::Pattern => "a pattern",
            Self::Modifier => "a modifier",
            Self::Annotation => "an annotation",
            Self::Bang => "`!`",
            Self::And => "`&&`",
            Self::Or => "`||`",
            Self::Not => "`!`",
            Self::LeftParen => "`(`",
            Self::RightParen => "`)`",
            Self::Comma => "`,`",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One lexed token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
pub struct Token {
    /// Token classification.
    pub kind: TokenKind,
    /// The source text of the token. For [`TokenKind::Annotation`] this is
    /// the annotation name without the leading `@`.
    pub text: String,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub column: u32,
}

impl Token {
    /// Create a token at a source position.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}
