//! Recursive-descent parser building [`ExpressionNode`] trees.
//!
//! Precedence, highest to lowest: `!` (prefix), parenthesized groups and
//! pointcut primitives, `&&`, `||`. Both binary operators are
//! left-associative, so `a && b || c && d` groups as `(a && b) || (c && d)`.
//!
//! The parser owns a token cursor with explicit save/restore, used to
//! disambiguate constructor patterns from method patterns: both start with
//! the same modifier/annotation prefix, and only the shape after the first
//! pattern chunk (a parameter list directly, or a second pattern chunk
//! first) tells them apart. All parser state lives in this per-call value,
//! so compilation is reentrant.

use pointcut_patterns::{NamePattern, TypePattern};

use crate::ast::{
    AnnotationFilter, ClassFilter, ConstructorPattern, ExpressionNode, FieldPattern,
    MemberPattern, MethodPattern, ModifierFilter, ParameterList, ParameterPattern,
    PointcutReference, WithinCodeTarget,
};
use crate::descriptor::Modifiers;
use crate::errors::{ExpressionError, ParseError, UnexpectedTokenInfo};
use crate::token::{Token, TokenKind};

pub(crate) fn parse(tokens: Vec<Token>) -> Result<ExpressionNode, ExpressionError> {
    let mut parser = Parser::new(tokens);
    let root = parser.expression()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected(&["`&&`", "`||`", "end of input"]).into());
    }
    Ok(root)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn save(&self) -> usize {
        self.index
    }

    fn restore(&mut self, mark: usize) {
        self.index = mark;
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek_kind() == Some(kind) {
            self.bump()
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.eat(kind).ok_or_else(|| self.unexpected(&[kind.describe()]))
    }

    fn unexpected(&self, expected: &[&str]) -> ParseError {
        let (found, line, column) = self.peek().map_or_else(
            || {
                let (line, column) = self.tokens.last().map_or((1, 1), |t| {
                    let width = u32::try_from(t.text.chars().count()).unwrap_or(0);
                    (t.line, t.column.saturating_add(width))
                });
                ("end of input".to_owned(), line, column)
            },
            |t| (format!("`{}`", t.text), t.line, t.column),
        );
        ParseError::UnexpectedToken(UnexpectedTokenInfo {
            found,
            expected: expected.iter().map(|s| (*s).to_owned()).collect(),
            line,
            column,
        })
    }

    // expression := and ( OR and )*
    fn expression(&mut self) -> Result<ExpressionNode, ExpressionError> {
        let mut node = self.conjunction()?;
        while self.eat(TokenKind::Or).is_some() {
            let rhs = self.conjunction()?;
            node = ExpressionNode::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // and := unary ( AND unary )*
    fn conjunction(&mut self) -> Result<ExpressionNode, ExpressionError> {
        let mut node = self.unary()?;
        while self.eat(TokenKind::And).is_some() {
            let rhs = self.unary()?;
            node = ExpressionNode::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<ExpressionNode, ExpressionError> {
        if self.eat(TokenKind::Not).is_some() {
            let inner = self.unary()?;
            return Ok(ExpressionNode::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<ExpressionNode, ExpressionError> {
        let Some(kind) = self.peek_kind() else {
            return Err(self.unexpected(&["a pointcut", "`(`", "`!`"]).into());
        };
        match kind {
            TokenKind::LeftParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Execution => {
                self.bump();
                Ok(ExpressionNode::Execution(self.member_pattern()?))
            }
            TokenKind::Call => {
                self.bump();
                Ok(ExpressionNode::Call(self.member_pattern()?))
            }
            TokenKind::WithinCode => {
                self.bump();
                Ok(ExpressionNode::WithinCode(self.withincode_target()?))
            }
            TokenKind::HasMethod => {
                self.bump();
                Ok(ExpressionNode::HasMethod(self.member_pattern()?))
            }
            TokenKind::Get => {
                self.bump();
                Ok(ExpressionNode::Get(self.field_pattern()?))
            }
            TokenKind::Set => {
                self.bump();
                Ok(ExpressionNode::Set(self.field_pattern()?))
            }
            TokenKind::HasField => {
                self.bump();
                Ok(ExpressionNode::HasField(self.field_pattern()?))
            }
            TokenKind::Within => {
                self.bump();
                Ok(ExpressionNode::Within(self.class_filter()?))
            }
            TokenKind::Handler => {
                self.bump();
                Ok(ExpressionNode::Handler(self.class_filter()?))
            }
            TokenKind::StaticInitialization => {
                self.bump();
                Ok(ExpressionNode::StaticInitialization(self.class_filter()?))
            }
            TokenKind::Target => {
                self.bump();
                Ok(ExpressionNode::Target(self.single_type_pattern()?))
            }
            TokenKind::This => {
                self.bump();
                Ok(ExpressionNode::This(self.single_type_pattern()?))
            }
            TokenKind::Args => {
                self.bump();
                Ok(ExpressionNode::Args(self.pattern_entries()?))
            }
            TokenKind::Cflow => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(ExpressionNode::Cflow(Box::new(inner)))
            }
            TokenKind::CflowBelow => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(ExpressionNode::CflowBelow(Box::new(inner)))
            }
            TokenKind::If => {
                self.bump();
                self.expect(TokenKind::RightParen)?;
                Ok(ExpressionNode::If)
            }
            TokenKind::Identifier => self.reference(),
            _ => Err(self.unexpected(&["a pointcut", "`(`", "`!`"]).into()),
        }
    }

    fn reference(&mut self) -> Result<ExpressionNode, ExpressionError> {
        let token = self.expect(TokenKind::Identifier)?;
        let arguments = if self.eat(TokenKind::LeftParen).is_some() {
            self.pattern_entries()?
        } else {
            Vec::new()
        };
        Ok(ExpressionNode::Reference(PointcutReference {
            name: token.text,
            arguments,
        }))
    }

    /// Zero or more `!`-prefixable modifier and annotation filters.
    fn filters(&mut self) -> Result<(ModifierFilter, Vec<AnnotationFilter>), ExpressionError> {
        let mut modifiers = ModifierFilter::default();
        let mut annotations = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Bang) => {
                    self.bump();
                    match self.peek_kind() {
                        Some(TokenKind::Modifier) => {
                            let token = self.expect(TokenKind::Modifier)?;
                            modifiers.forbid(modifier_flag(&token)?);
                        }
                        Some(TokenKind::Annotation) => {
                            let token = self.expect(TokenKind::Annotation)?;
                            annotations.push(AnnotationFilter {
                                name: token.text,
                                negated: true,
                            });
                        }
                        _ => return Err(self.unexpected(&["a modifier", "an annotation"]).into()),
                    }
                }
                Some(TokenKind::Modifier) => {
                    let token = self.expect(TokenKind::Modifier)?;
                    modifiers.require(modifier_flag(&token)?);
                }
                Some(TokenKind::Annotation) => {
                    let token = self.expect(TokenKind::Annotation)?;
                    annotations.push(AnnotationFilter {
                        name: token.text,
                        negated: false,
                    });
                }
                _ => break,
            }
        }
        Ok((modifiers, annotations))
    }

    /// Method-or-constructor pattern, consuming through the closing `)`.
    fn member_pattern(&mut self) -> Result<MemberPattern, ExpressionError> {
        let (modifiers, annotations) = self.filters()?;
        match self.peek_kind() {
            Some(TokenKind::RightParen) => {
                // Annotation/modifier-only form, e.g. `execution(@Tx)`.
                if modifiers.is_empty() && annotations.is_empty() {
                    return Err(self
                        .unexpected(&["a pattern", "an annotation", "a modifier"])
                        .into());
                }
                self.bump();
                Ok(MemberPattern::Any {
                    modifiers,
                    annotations,
                })
            }
            Some(TokenKind::Pattern) => {
                let mark = self.save();
                let first = self.expect(TokenKind::Pattern)?;
                if self.peek_kind() == Some(TokenKind::LeftParen) {
                    // One pattern chunk directly followed by a parameter
                    // list: constructor shape. The name segment must be the
                    // literal `new`; anything else is fatal here, never a
                    // fallback to the method grammar.
                    let declaring_type = self.constructor_declaring_type(&first)?;
                    self.bump();
                    let parameters = self.parameter_list()?;
                    self.expect(TokenKind::RightParen)?;
                    return Ok(MemberPattern::Constructor(ConstructorPattern {
                        modifiers,
                        annotations,
                        declaring_type,
                        parameters,
                    }));
                }
                self.restore(mark);
                let return_token = self.expect(TokenKind::Pattern)?;
                let return_type = TypePattern::compile(&return_token.text)?;
                let member_token = self.expect(TokenKind::Pattern)?;
                let (declaring_type, name) = split_member_pattern(&member_token.text)?;
                self.expect(TokenKind::LeftParen)?;
                let parameters = self.parameter_list()?;
                self.expect(TokenKind::RightParen)?;
                Ok(MemberPattern::Method(MethodPattern {
                    modifiers,
                    annotations,
                    return_type,
                    declaring_type,
                    name,
                    parameters,
                }))
            }
            _ => Err(self.unexpected(&["a pattern", "`)`"]).into()),
        }
    }

    fn constructor_declaring_type(&self, token: &Token) -> Result<TypePattern, ExpressionError> {
        let (declaring, name) = match token.text.rsplit_once('.') {
            None => (None, token.text.as_str()),
            Some((left, name)) => (Some(left), name),
        };
        if name != "new" {
            return Err(ParseError::ConstructorName {
                name: name.to_owned(),
                line: token.line,
                column: token.column,
            }
            .into());
        }
        match declaring {
            None => Ok(TypePattern::any()),
            Some(left) => Ok(TypePattern::compile(&rejoin_declaring(left))?),
        }
    }

    fn withincode_target(&mut self) -> Result<WithinCodeTarget, ExpressionError> {
        if self.eat(TokenKind::StaticInitialization).is_some() {
            let filter = self.class_filter()?;
            self.expect(TokenKind::RightParen)?;
            return Ok(WithinCodeTarget::StaticInitialization(filter));
        }
        Ok(WithinCodeTarget::Member(self.member_pattern()?))
    }

    /// Field pattern, consuming through the closing `)`.
    fn field_pattern(&mut self) -> Result<FieldPattern, ExpressionError> {
        let (modifiers, annotations) = self.filters()?;
        match self.peek_kind() {
            Some(TokenKind::RightParen) => {
                if modifiers.is_empty() && annotations.is_empty() {
                    return Err(self
                        .unexpected(&["a pattern", "an annotation", "a modifier"])
                        .into());
                }
                self.bump();
                Ok(FieldPattern {
                    modifiers,
                    annotations,
                    field_type: TypePattern::any(),
                    declaring_type: TypePattern::any(),
                    name: NamePattern::any(),
                })
            }
            Some(TokenKind::Pattern) => {
                let type_token = self.expect(TokenKind::Pattern)?;
                let field_type = TypePattern::compile(&type_token.text)?;
                let member_token = self.expect(TokenKind::Pattern)?;
                let (declaring_type, name) = split_member_pattern(&member_token.text)?;
                self.expect(TokenKind::RightParen)?;
                Ok(FieldPattern {
                    modifiers,
                    annotations,
                    field_type,
                    declaring_type,
                    name,
                })
            }
            _ => Err(self.unexpected(&["a pattern", "`)`"]).into()),
        }
    }

    /// Class filter, consuming through the closing `)`.
    fn class_filter(&mut self) -> Result<ClassFilter, ExpressionError> {
        let (modifiers, annotations) = self.filters()?;
        let type_pattern = match self.eat(TokenKind::Pattern) {
            Some(token) => TypePattern::compile(&token.text)?,
            None if modifiers.is_empty() && annotations.is_empty() => {
                return Err(self
                    .unexpected(&["a pattern", "an annotation", "a modifier"])
                    .into());
            }
            None => TypePattern::any(),
        };
        self.expect(TokenKind::RightParen)?;
        Ok(ClassFilter {
            modifiers,
            annotations,
            type_pattern,
        })
    }

    /// A single type pattern and the closing `)`, for `target`/`this`.
    fn single_type_pattern(&mut self) -> Result<TypePattern, ExpressionError> {
        let token = self.expect(TokenKind::Pattern)?;
        let pattern = TypePattern::compile(&token.text)?;
        self.expect(TokenKind::RightParen)?;
        Ok(pattern)
    }

    fn parameter_list(&mut self) -> Result<ParameterList, ExpressionError> {
        Ok(ParameterList {
            entries: self.pattern_entries()?,
        })
    }

    /// Comma-separated pattern entries up to and including the closing `)`.
    /// `..` entries are legal only in first or last position.
    fn pattern_entries(&mut self) -> Result<Vec<ParameterPattern>, ExpressionError> {
        let mut entries = Vec::new();
        let mut positions = Vec::new();
        if self.eat(TokenKind::RightParen).is_some() {
            return Ok(entries);
        }
        loop {
            let token = self.expect(TokenKind::Pattern)?;
            positions.push((token.line, token.column));
            if token.text == ".." {
                entries.push(ParameterPattern::Eager);
            } else {
                entries.push(ParameterPattern::Type(TypePattern::compile(&token.text)?));
            }
            if self.eat(TokenKind::Comma).is_some() {
                continue;
            }
            self.expect(TokenKind::RightParen)?;
            break;
        }
        let last = entries.len().saturating_sub(1);
        for (i, (entry, &(line, column))) in entries.iter().zip(&positions).enumerate() {
            if matches!(entry, ParameterPattern::Eager) && i != 0 && i != last {
                return Err(ParseError::MisplacedEagerWildcard { line, column }.into());
            }
        }
        Ok(entries)
    }
}

fn modifier_flag(token: &Token) -> Result<Modifiers, ParseError> {
    Modifiers::from_keyword(&token.text).ok_or_else(|| {
        ParseError::UnexpectedToken(UnexpectedTokenInfo {
            found: format!("`{}`", token.text),
            expected: vec!["a modifier keyword".to_owned()],
            line: token.line,
            column: token.column,
        })
    })
}

/// Split a member pattern like `pkg.Class.method` into its declaring-type
/// and member-name patterns at the last `.`. A pattern without a dot gets
/// the any-type declaring pattern. When the split lands directly after a
/// `..` gap (`foo..save`), the gap stays with the declaring pattern.
fn split_member_pattern(text: &str) -> Result<(TypePattern, NamePattern), ExpressionError> {
    match text.rsplit_once('.') {
        None => Ok((TypePattern::any(), NamePattern::compile(text)?)),
        Some((left, name)) => {
            let declaring = TypePattern::compile(&rejoin_declaring(left))?;
            Ok((declaring, NamePattern::compile(name)?))
        }
    }
}

/// Restore the trailing `..` that `rsplit_once` halved, if there was one.
fn rejoin_declaring(left: &str) -> String {
    if left.ends_with('.') {
        format!("{left}.")
    } else {
        left.to_owned()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap lexing and parsing results")]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_text(text: &str) -> ExpressionNode {
        parse(tokenize(text).unwrap()).unwrap()
    }

    fn parse_err(text: &str) -> ExpressionError {
        parse(tokenize(text).unwrap()).unwrap_err()
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let node = parse_text("a && b || c && d");
        let ExpressionNode::Or(lhs, rhs) = node else {
            panic!("expected Or at the root");
        };
        assert!(matches!(*lhs, ExpressionNode::And(_, _)));
        assert!(matches!(*rhs, ExpressionNode::And(_, _)));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let node = parse_text("a || b || c");
        let ExpressionNode::Or(lhs, rhs) = node else {
            panic!("expected Or at the root");
        };
        assert!(matches!(*lhs, ExpressionNode::Or(_, _)));
        assert!(matches!(*rhs, ExpressionNode::Reference(_)));
    }

    #[test]
    fn parentheses_override_precedence() {
        let node = parse_text("a && (b || c)");
        let ExpressionNode::And(_, rhs) = node else {
            panic!("expected And at the root");
        };
        assert!(matches!(*rhs, ExpressionNode::Or(_, _)));
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let node = parse_text("!a && b");
        let ExpressionNode::And(lhs, _) = node else {
            panic!("expected And at the root");
        };
        assert!(matches!(*lhs, ExpressionNode::Not(_)));
    }

    #[test]
    fn execution_builds_a_method_pattern() {
        let node = parse_text("execution(* foo.Bar.*(..))");
        let ExpressionNode::Execution(MemberPattern::Method(method)) = node else {
            panic!("expected a method execution pointcut");
        };
        assert!(method.return_type.matches_name("void"));
        assert_eq!(method.declaring_type.source(), "foo.Bar");
        assert!(method.name.is_any());
        assert_eq!(method.parameters.entries, vec![ParameterPattern::Eager]);
    }

    #[test]
    fn constructor_pattern_requires_the_new_name() {
        let node = parse_text("execution(foo.Bar.new(..))");
        let ExpressionNode::Execution(MemberPattern::Constructor(ctor)) = node else {
            panic!("expected a constructor execution pointcut");
        };
        assert_eq!(ctor.declaring_type.source(), "foo.Bar");

        let err = parse_err("execution(foo.Bar.create(..))");
        let ExpressionError::Parse(ParseError::ConstructorName { name, .. }) = err else {
            panic!("expected constructor-name error, got {err}");
        };
        assert_eq!(name, "create");
    }

    #[test]
    fn method_pattern_with_explicit_parameters() {
        let node = parse_text("execution(public void foo.Bar.baz(int, java.lang.String))");
        let ExpressionNode::Execution(MemberPattern::Method(method)) = node else {
            panic!("expected a method execution pointcut");
        };
        assert!(method.modifiers.matches(Modifiers::PUBLIC));
        assert!(!method.modifiers.matches(Modifiers::PRIVATE));
        assert_eq!(method.parameters.entries.len(), 2);
    }

    #[test]
    fn annotation_only_pointcut_parses_as_the_filter_form() {
        let node = parse_text("execution(@Tx)");
        let ExpressionNode::Execution(MemberPattern::Any {
            modifiers,
            annotations,
        }) = node
        else {
            panic!("expected the annotation-only execution form");
        };
        assert!(modifiers.is_empty());
        assert_eq!(annotations.len(), 1);
        assert!(annotations.iter().all(|a| !a.negated));
    }

    #[test]
    fn empty_pointcut_body_is_rejected() {
        let err = parse_err("execution()");
        assert!(err.to_string().contains("expected a pattern"));
    }

    #[test]
    fn negated_filters_parse() {
        let node = parse_text("set(!transient !@Audited * *.*)");
        let ExpressionNode::Set(field) = node else {
            panic!("expected a set pointcut");
        };
        assert!(!field.modifiers.matches(Modifiers::TRANSIENT));
        assert!(field.modifiers.matches(Modifiers::PRIVATE));
        assert_eq!(field.annotations.len(), 1);
        assert!(field.annotations.iter().all(|a| a.negated));
    }

    #[test]
    fn withincode_accepts_the_staticinitialization_form() {
        let node = parse_text("withincode(staticinitialization(foo.Bar))");
        let ExpressionNode::WithinCode(WithinCodeTarget::StaticInitialization(filter)) = node
        else {
            panic!("expected the static-initialization form");
        };
        assert_eq!(filter.type_pattern.source(), "foo.Bar");
    }

    #[test]
    fn middle_eager_wildcard_is_rejected() {
        let err = parse_err("execution(* foo.Bar.baz(int, .., long))");
        assert!(matches!(
            err,
            ExpressionError::Parse(ParseError::MisplacedEagerWildcard { .. })
        ));
        // Leading, trailing and both-ends forms stay legal.
        parse_text("execution(* foo.Bar.baz(.., int))");
        parse_text("execution(* foo.Bar.baz(int, ..))");
        parse_text("execution(* foo.Bar.baz(.., int, ..))");
    }

    #[test]
    fn reference_with_bound_arguments() {
        let node = parse_text("txPoints(x, int)");
        let ExpressionNode::Reference(reference) = node else {
            panic!("expected a pointcut reference");
        };
        assert_eq!(reference.name, "txPoints");
        assert_eq!(reference.arguments.len(), 2);
    }

    #[test]
    fn cflow_wraps_a_sub_expression() {
        let node = parse_text("cflowbelow(execution(* foo.Bar.baz(..)))");
        let ExpressionNode::CflowBelow(inner) = node else {
            panic!("expected a cflowbelow pointcut");
        };
        assert!(matches!(*inner, ExpressionNode::Execution(_)));
    }

    #[test]
    fn if_marker_parses_to_the_marker_node() {
        assert!(matches!(parse_text("if()"), ExpressionNode::If));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_err("a b");
        let ExpressionError::Parse(ParseError::UnexpectedToken(info)) = err else {
            panic!("expected an unexpected-token error");
        };
        assert_eq!(info.found, "`b`");
        assert!(info.expected.iter().any(|e| e == "end of input"));
    }

    #[test]
    fn unexpected_token_reports_position_and_expectations() {
        let err = parse_err("execution(* foo.Bar.baz(..)) &&");
        let ExpressionError::Parse(ParseError::UnexpectedToken(info)) = err else {
            panic!("expected an unexpected-token error");
        };
        assert_eq!(info.found, "end of input");
        assert!(!info.expected.is_empty());
    }

    #[test]
    fn declaring_type_defaults_to_any() {
        let node = parse_text("execution(* save(..))");
        let ExpressionNode::Execution(MemberPattern::Method(method)) = node else {
            panic!("expected a method execution pointcut");
        };
        assert!(method.declaring_type.is_any());
        assert!(method.name.matches("save"));
    }

    #[test]
    fn declaring_gap_survives_the_member_split() {
        let node = parse_text("execution(* foo..save(..))");
        let ExpressionNode::Execution(MemberPattern::Method(method)) = node else {
            panic!("expected a method execution pointcut");
        };
        assert_eq!(method.declaring_type.source(), "foo..");
        assert!(method.declaring_type.matches_name("foo.web.Service"));
        assert!(method.name.matches("save"));
    }
}
