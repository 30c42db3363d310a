// Modular parser for the Cotton language.
// Statement parsing lives in `statements`, expression parsing in
// `expressions`; this module owns the token cursor and shared helpers.

use crate::ParseError;
use cotton_ast::{NameTable, Program, Span};
use cotton_lexer::{Lexer, Token, TokenSpan};

mod expressions;
mod statements;

pub struct Parser<'a> {
    pub(crate) tokens: Vec<TokenSpan>,
    pub(crate) current: usize,
    pub(crate) source: &'a str,
    pub(crate) names: &'a mut NameTable,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, names: &'a mut NameTable) -> Result<Self, ParseError> {
        let lexer = Lexer::new(source);
        let tokens: Result<Vec<_>, _> = lexer.collect();
        let tokens = tokens.map_err(|e| ParseError::LexerError(e.to_string()))?;

        Ok(Self {
            tokens,
            current: 0,
            source,
            names,
        })
    }

    /// Parses the whole input as a statement list.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        self.skip_semicolons();
        while !self.is_at_end() {
            statements.push(self.parse_stmt()?);
            self.skip_semicolons();
        }
        Ok(Program { statements })
    }

    // ==================== Helper Methods ====================

    pub(crate) fn check(&self, kind: &Token) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
        }
    }

    pub(crate) fn match_token(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current].token
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| &t.token)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current - 1].token
    }

    pub(crate) fn consume(&mut self, kind: &Token, message: &str) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    pub(crate) fn error(&self, message: &str) -> ParseError {
        if self.is_at_end() {
            ParseError::UnexpectedEof {
                message: format!("{} (unexpected end of input)", message),
            }
        } else {
            let span = self.tokens[self.current].span.clone();
            ParseError::UnexpectedToken {
                message: format!("{}, found {:?}", message, self.peek()),
                span,
            }
        }
    }

    pub(crate) fn skip_semicolons(&mut self) {
        while self.match_token(&Token::Semicolon) {}
    }

    /// Span of the current token (or an empty span at end of input).
    pub(crate) fn current_span(&self) -> Span {
        match self.tokens.get(self.current) {
            Some(t) => Span::new(t.span.start, t.span.end),
            None => {
                let end = self.source.len();
                Span::new(end, end)
            }
        }
    }

    /// Span of the most recently consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        let t = &self.tokens[self.current - 1];
        Span::new(t.span.start, t.span.end)
    }

    /// Interns the raw source text under `span`.
    pub(crate) fn intern_span(&mut self, span: Span) -> cotton_ast::NameId {
        self.names.intern(&self.source[span.start..span.end])
    }
}
