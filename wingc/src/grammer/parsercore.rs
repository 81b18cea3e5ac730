use super::ast::AstNode;
use super::reducer::{parse_expression, Rules};
use super::token::{Token, TokenKind};
use crate::error::Error;

/// Token cursor with backtracking
pub struct Parser<'r> {
    tokens: Vec<Token>,
    index: usize,
    rules: &'r Rules,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, rules: &'r Rules) -> Self {
        Parser {
            tokens,
            index: 0,
            rules,
        }
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            message: message.into(),
            token: self.tokens.get(self.index).cloned(),
        }
    }
}

impl<'r> Parser<'r> {
    /// Peek : Watch next token without consuming it
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    /// Next : Consume next token and return it
    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Peek and check next token is match with condition
    pub fn check_if<F: Fn(&Token) -> bool>(&self, cond: F) -> bool {
        self.peek().is_some_and(cond)
    }

    /// Consume if next token is match with condition
    pub fn consume_if<F: Fn(&Token) -> bool>(&mut self, cond: F) -> Option<Token> {
        if self.check_if(cond) {
            self.next()
        } else {
            None
        }
    }

    /// Next token must be match with condition
    pub fn expect_tobe<F: Fn(&Token) -> bool>(&mut self, cond: F, what: &str) -> Result<Token, Error> {
        match self.peek() {
            Some(token) if cond(token) => self.next().ok_or_else(|| self.error(what)),
            Some(token) => Err(self.error(format!("Expected {what}, found {}", token.kind))),
            None => Err(self.error(format!("Expected {what}, found end of file"))),
        }
    }

    pub fn expect_ident(&mut self) -> Result<String, Error> {
        match self.expect_tobe(|t| matches!(t.kind, TokenKind::Ident(_)), "identifier")? {
            Token {
                kind: TokenKind::Ident(name),
                ..
            } => Ok(name),
            _ => Err(self.error("Expected identifier")),
        }
    }

    /// Run an alternative. On error the position is restored and `None`
    /// returned so the next alternative can be tried.
    pub fn try_parse<T, F>(&mut self, alternative: F) -> Option<T>
    where
        F: FnOnce(&mut Self) -> Result<T, Error>,
    {
        let saved = self.index;
        match alternative(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.index = saved;
                None
            }
        }
    }

    /// Reduce the tokens up to (not including) the first token at nesting
    /// depth zero that `stop` accepts.
    pub fn expression_until<F: Fn(&TokenKind) -> bool>(&mut self, stop: F) -> Result<AstNode, Error> {
        let start = self.index;
        let mut depth = 0i32;
        while let Some(token) = self.peek() {
            if depth == 0 && stop(&token.kind) {
                break;
            }
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::EOL => break,
                _ => {}
            }
            self.index += 1;
        }
        if self.index == start {
            return Err(self.error("Expected an expression"));
        }
        parse_expression(&self.tokens[start..self.index], self.rules)
    }
}

#[macro_export]
macro_rules! check {
    ($parser:expr, $kind:pat) => {
        $parser.check_if(|token| matches!(&token.kind, $kind))
    };
}

#[macro_export]
macro_rules! expect {
    ($parser:expr, $kind:pat) => {
        $parser.expect_tobe(|token| matches!(&token.kind, $kind), stringify!($kind))
    };
}

#[macro_export]
macro_rules! optional {
    ($parser:expr, $trigger:pat, $following:expr) => {
        if check!($parser, $trigger) {
            expect!($parser, $trigger)?;
            Some($following)
        } else {
            None
        }
    };
    ($parser:expr, $trigger:pat) => {
        $parser.consume_if(|token| matches!(&token.kind, $trigger))
    };
}

/// Parse repeated elements with optional delimiters
/// 3 args: { element } terminal (no delimiter)
/// 4 args: [ element { delimiter element } ] terminal (with delimiter)
#[macro_export]
macro_rules! repeat {
    ($parser:expr, $elem:expr, $terminal:pat) => {{
        let mut items = Vec::new();
        while !check!($parser, $terminal) {
            items.push($elem?);
        }
        items
    }};

    ($parser:expr, $elem:expr, $delimiter:pat, $terminal:pat) => {{
        let mut items = Vec::new();
        if !check!($parser, $terminal) {
            items.push($elem?);
            while check!($parser, $delimiter) {
                expect!($parser, $delimiter)?;
                items.push($elem?);
            }
        }
        items
    }};
}
