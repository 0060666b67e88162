//! Context-sensitive lexer for pointcut expressions.
//!
//! The same characters mean different things depending on where in the
//! grammar they appear: `*` is a wildcard inside a pattern but illegal in the
//! logical grammar, `+` is a hierarchy suffix inside a pattern, and a word
//! like `public` is a modifier only where modifiers are legal. The lexer
//! therefore runs a stack of [`LexState`]s: consuming a pointcut keyword
//! pushes the state for that keyword's pattern sub-grammar, and the closing
//! `)` pops back.
//!
//! Tokenization is maximal-munch within each state: `execution(` is one
//! token, and a word run is classified as a modifier only when the whole run
//! equals a modifier keyword for the current state.

use crate::errors::LexicalError;
use crate::token::{Token, TokenKind};

/// Lexical state, one per pattern sub-grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// The boolean expression grammar: keywords, operators, references.
    Logical,
    /// Inside `within(`, `handler(`, `staticinitialization(`, `target(`,
    /// `this(`: a type pattern with optional filters.
    ClassPattern,
    /// Inside `execution(`, `call(`, `withincode(`, `hasmethod(`: a method
    /// or constructor pattern.
    MethodPattern,
    /// Inside `get(`, `set(`, `hasfield(`: a field pattern.
    FieldPattern,
    /// Inside the `(`...`)` parameter list of a method pattern.
    ParamList,
    /// Inside `args(`, `if(`, or a pointcut reference's argument list.
    ArgList,
}

const CLASS_MODIFIERS: &[&str] = &["public", "protected", "private", "static", "abstract", "final"];
const METHOD_MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "abstract",
    "final",
    "native",
    "synchronized",
];
const FIELD_MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "transient",
    "volatile",
];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_pattern_char(c: char) -> bool {
    is_word_char(c) || matches!(c, '.' | '*' | '?' | '+' | '#' | '[' | ']')
}

/// Pointcut keywords, each lexed together with its opening parenthesis. The
/// second element is the lexical state the keyword's body is lexed in;
/// `cflow`/`cflowbelow` bodies are full sub-expressions and stay logical.
fn keyword(word: &str) -> Option<(TokenKind, Option<LexState>)> {
    match word {
        "execution" => Some((TokenKind::Execution, Some(LexState::MethodPattern))),
        "call" => Some((TokenKind::Call, Some(LexState::MethodPattern))),
        "withincode" => Some((TokenKind::WithinCode, Some(LexState::MethodPattern))),
        "hasmethod" => Some((TokenKind::HasMethod, Some(LexState::MethodPattern))),
        "get" => Some((TokenKind::Get, Some(LexState::FieldPattern))),
        "set" => Some((TokenKind::Set, Some(LexState::FieldPattern))),
        "hasfield" => Some((TokenKind::HasField, Some(LexState::FieldPattern))),
        "within" => Some((TokenKind::Within, Some(LexState::ClassPattern))),
        "handler" => Some((TokenKind::Handler, Some(LexState::ClassPattern))),
        "staticinitialization" => Some((
            TokenKind::StaticInitialization,
            Some(LexState::ClassPattern),
        )),
        "target" => Some((TokenKind::Target, Some(LexState::ClassPattern))),
        "this" => Some((TokenKind::This, Some(LexState::ClassPattern))),
        "args" => Some((TokenKind::Args, Some(LexState::ArgList))),
        "if" => Some((TokenKind::If, Some(LexState::ArgList))),
        "cflow" => Some((TokenKind::Cflow, None)),
        "cflowbelow" => Some((TokenKind::CflowBelow, None)),
        _ => None,
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_here(&self, character: char) -> LexicalError {
        LexicalError {
            character,
            line: self.line,
            column: self.column,
        }
    }

    /// Consume a maximal run of characters satisfying `accept`.
    fn take_while(&mut self, accept: fn(char) -> bool) -> String {
        let mut run = String::new();
        while let Some(c) = self.peek() {
            if !accept(c) {
                break;
            }
            run.push(c);
            self.advance();
        }
        run
    }
}

struct Lexer {
    cursor: Cursor,
    states: Vec<LexState>,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(text: &str) -> Self {
        Self {
            cursor: Cursor::new(text),
            states: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn state(&self) -> LexState {
        self.states.last().copied().unwrap_or(LexState::Logical)
    }

    fn push_token(&mut self, kind: TokenKind, text: impl Into<String>, line: u32, column: u32) {
        self.tokens.push(Token::new(kind, text, line, column));
    }

    fn run(mut self) -> Result<Vec<Token>, LexicalError> {
        while let Some(c) = self.cursor.peek() {
            if c.is_whitespace() {
                self.cursor.advance();
                continue;
            }
            match self.state() {
                LexState::Logical => self.lex_logical(c)?,
                LexState::ClassPattern | LexState::MethodPattern | LexState::FieldPattern => {
                    self.lex_pattern(c)?;
                }
                LexState::ParamList => self.lex_param_list(c)?,
                LexState::ArgList => self.lex_arg_list(c)?,
            }
        }
        Ok(self.tokens)
    }

    fn lex_logical(&mut self, c: char) -> Result<(), LexicalError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        match c {
            '(' => {
                self.cursor.advance();
                self.push_token(TokenKind::LeftParen, "(", line, column);
            }
            ')' => {
                self.cursor.advance();
                self.push_token(TokenKind::RightParen, ")", line, column);
            }
            '!' => {
                self.cursor.advance();
                self.push_token(TokenKind::Not, "!", line, column);
            }
            '&' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('&') {
                    self.cursor.advance();
                    self.push_token(TokenKind::And, "&&", line, column);
                } else {
                    self.push_token(TokenKind::And, "&", line, column);
                }
            }
            '|' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('|') {
                    self.cursor.advance();
                    self.push_token(TokenKind::Or, "||", line, column);
                } else {
                    self.push_token(TokenKind::Or, "|", line, column);
                }
            }
            c if is_word_char(c) => self.lex_logical_word(line, column),
            other => return Err(self.cursor.error_here(other)),
        }
        Ok(())
    }

    fn lex_logical_word(&mut self, line: u32, column: u32) {
        let word = self.cursor.take_while(is_word_char);
        match word.as_str() {
            "AND" | "and" => return self.push_token(TokenKind::And, word, line, column),
            "OR" | "or" => return self.push_token(TokenKind::Or, word, line, column),
            "NOT" | "not" => return self.push_token(TokenKind::Not, word, line, column),
            _ => {}
        }
        if self.cursor.peek() == Some('(') {
            if let Some((kind, entered)) = keyword(&word) {
                self.cursor.advance();
                self.push_token(kind, format!("{word}("), line, column);
                if let Some(state) = entered {
                    self.states.push(state);
                }
                return;
            }
            // A reference with bound arguments: `myPointcut(x, int)`.
            self.push_token(TokenKind::Identifier, word, line, column);
            let (paren_line, paren_column) = (self.cursor.line, self.cursor.column);
            self.cursor.advance();
            self.push_token(TokenKind::LeftParen, "(", paren_line, paren_column);
            self.states.push(LexState::ArgList);
            return;
        }
        self.push_token(TokenKind::Identifier, word, line, column);
    }

    fn lex_pattern(&mut self, c: char) -> Result<(), LexicalError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        match c {
            ')' => {
                self.cursor.advance();
                self.push_token(TokenKind::RightParen, ")", line, column);
                self.states.pop();
            }
            '(' if self.state() == LexState::MethodPattern => {
                self.cursor.advance();
                self.push_token(TokenKind::LeftParen, "(", line, column);
                self.states.push(LexState::ParamList);
            }
            '!' => {
                self.cursor.advance();
                self.push_token(TokenKind::Bang, "!", line, column);
            }
            '@' => {
                self.cursor.advance();
                let name = self.cursor.take_while(is_pattern_char);
                if name.is_empty() {
                    let found = self.cursor.peek().unwrap_or('@');
                    return Err(self.cursor.error_here(found));
                }
                self.push_token(TokenKind::Annotation, name, line, column);
            }
            c if is_pattern_char(c) => {
                let run = self.cursor.take_while(is_pattern_char);
                self.classify_pattern_run(run, line, column);
            }
            other => return Err(self.cursor.error_here(other)),
        }
        Ok(())
    }

    fn classify_pattern_run(&mut self, run: String, line: u32, column: u32) {
        // `withincode(staticinitialization(<class pattern>))`: the nested
        // keyword re-enters class-pattern lexing for its body.
        if self.state() == LexState::MethodPattern
            && run == "staticinitialization"
            && self.cursor.peek() == Some('(')
        {
            self.cursor.advance();
            self.push_token(
                TokenKind::StaticInitialization,
                "staticinitialization(",
                line,
                column,
            );
            self.states.push(LexState::ClassPattern);
            return;
        }
        let modifiers = match self.state() {
            LexState::ClassPattern => CLASS_MODIFIERS,
            LexState::MethodPattern => METHOD_MODIFIERS,
            LexState::FieldPattern => FIELD_MODIFIERS,
            LexState::Logical | LexState::ParamList | LexState::ArgList => &[],
        };
        if modifiers.contains(&run.as_str()) {
            self.push_token(TokenKind::Modifier, run, line, column);
        } else {
            self.push_token(TokenKind::Pattern, run, line, column);
        }
    }

    fn lex_param_list(&mut self, c: char) -> Result<(), LexicalError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        match c {
            ')' => {
                self.cursor.advance();
                self.push_token(TokenKind::RightParen, ")", line, column);
                self.states.pop();
            }
            ',' => {
                self.cursor.advance();
                self.push_token(TokenKind::Comma, ",", line, column);
            }
            c if is_pattern_char(c) => {
                let run = self.cursor.take_while(is_pattern_char);
                self.push_token(TokenKind::Pattern, run, line, column);
            }
            other => return Err(self.cursor.error_here(other)),
        }
        Ok(())
    }

    fn lex_arg_list(&mut self, c: char) -> Result<(), LexicalError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        match c {
            ')' => {
                self.cursor.advance();
                self.push_token(TokenKind::RightParen, ")", line, column);
                self.states.pop();
            }
            ',' => {
                self.cursor.advance();
                self.push_token(TokenKind::Comma, ",", line, column);
            }
            c if is_pattern_char(c) => {
                let run = self.cursor.take_while(is_pattern_char);
                self.push_token(TokenKind::Pattern, run, line, column);
            }
            other => return Err(self.cursor.error_here(other)),
        }
        Ok(())
    }
}

/// Tokenize an expression into a flat token vector.
///
/// All lexer state is local to this call; tokenization is reentrant and may
/// run concurrently on any number of threads.
///
/// # Errors
/// Returns [`LexicalError`] with the offending character and its 1-based
/// position when a character is not recognized in the current lexical state.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, LexicalError> {
    Lexer::new(text).run()
}
