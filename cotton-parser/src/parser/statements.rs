// Statement-level grammar.

use super::Parser;
use crate::ParseError;
use cotton_ast::*;
use cotton_lexer::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.skip_semicolons();

        if self.is_at_end() {
            return Err(self.error("Expected a statement"));
        }

        if self.check(&Token::While) {
            return self.parse_while();
        }
        if self.check(&Token::For) {
            return self.parse_for();
        }
        if self.check(&Token::If) {
            return self.parse_if();
        }
        if self.match_token(&Token::Continue) {
            let span = self.previous_span();
            return Ok(Stmt { kind: StmtKind::Continue, span });
        }
        if self.match_token(&Token::Break) {
            let span = self.previous_span();
            return Ok(Stmt { kind: StmtKind::Break, span });
        }
        if self.check(&Token::Return) {
            return self.parse_return();
        }
        if self.check(&Token::Unscoped) || self.check(&Token::LBrace) {
            return self.parse_block();
        }

        // the only case left is an expression statement
        let expr = self.parse_expr()?;
        self.consume(
            &Token::Semicolon,
            "Expression statement must end with a semicolon",
        )?;
        let span = expr.span;
        Ok(Stmt { kind: StmtKind::Expr { expr }, span })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&Token::While, "Expected 'while'")?;
        let start = self.previous_span();
        let cond = self.parse_expr()?;
        let body = Box::new(self.parse_stmt()?);
        let span = start.join(body.span);
        Ok(Stmt { kind: StmtKind::While { cond, body }, span })
    }

    /// `for [init]; [cond]; [step]; body` — each clause may be empty.
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&Token::For, "Expected 'for'")?;
        let start = self.previous_span();

        let init = self.parse_for_clause("initialization")?;
        let cond = self.parse_for_clause("condition")?;
        let step = self.parse_for_clause("step")?;
        let body = Box::new(self.parse_stmt()?);

        let span = start.join(body.span);
        Ok(Stmt { kind: StmtKind::For { init, cond, step, body }, span })
    }

    fn parse_for_clause(&mut self, what: &str) -> Result<Option<Expr>, ParseError> {
        if self.match_token(&Token::Semicolon) {
            return Ok(None);
        }
        let expr = self.parse_expr()?;
        self.consume(
            &Token::Semicolon,
            &format!("For loop's {} must end with a semicolon", what),
        )?;
        Ok(Some(expr))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&Token::If, "Expected 'if'")?;
        let start = self.previous_span();
        let cond = self.parse_expr()?;
        let body = Box::new(self.parse_stmt()?);

        self.skip_semicolons();
        if self.match_token(&Token::Else) {
            let else_body = Box::new(self.parse_stmt()?);
            let span = start.join(else_body.span);
            return Ok(Stmt {
                kind: StmtKind::If { cond, body, else_body: Some(else_body) },
                span,
            });
        }

        let span = start.join(body.span);
        Ok(Stmt { kind: StmtKind::If { cond, body, else_body: None }, span })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.consume(&Token::Return, "Expected 'return'")?;
        let start = self.previous_span();

        if self.match_token(&Token::Semicolon) {
            return Ok(Stmt { kind: StmtKind::Return { value: None }, span: start });
        }

        // the trailing semicolon stays for the enclosing statement
        let value = self.parse_expr()?;
        let span = start.join(value.span);
        Ok(Stmt { kind: StmtKind::Return { value: Some(value) }, span })
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let unscoped = self.match_token(&Token::Unscoped);
        let start = if unscoped {
            let s = self.previous_span();
            self.consume(
                &Token::LBrace,
                "'unscoped' must be followed by an open curly bracket",
            )?;
            s
        } else {
            self.consume(&Token::LBrace, "Expected '{'")?;
            self.previous_span()
        };

        let mut list = Vec::new();
        loop {
            self.skip_semicolons();
            if self.match_token(&Token::RBrace) {
                let span = start.join(self.previous_span());
                return Ok(Stmt { kind: StmtKind::Block { unscoped, list }, span });
            }
            if self.is_at_end() {
                return Err(self.error("Block statement must end with a close curly bracket"));
            }
            list.push(self.parse_stmt()?);
        }
    }
}
