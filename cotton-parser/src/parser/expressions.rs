// Expression grammar: precedence climbing with postfix call/index/dot
// handled in a tight inner loop.

use super::Parser;
use crate::ParseError;
use cotton_ast::*;
use cotton_lexer::Token;

/// Loosest priority; `parse_expr` starts here so comma chains are included.
const LOWEST: u8 = 14;

/// (operator, priority, right-associative) for binary tokens.
/// Lower priority binds tighter. Dot is not listed: it binds like a postfix.
fn binary_op_info(token: &Token) -> Option<(OpId, u8, bool)> {
    Some(match token {
        Token::Star => (OpId::Mult, 3, false),
        Token::Slash => (OpId::Div, 3, false),
        Token::Percent => (OpId::Rem, 3, false),
        Token::RShift => (OpId::RightShift, 4, false),
        Token::LShift => (OpId::LeftShift, 4, false),
        Token::Plus => (OpId::Plus, 5, false),
        Token::Minus => (OpId::Minus, 5, false),
        Token::Lt => (OpId::Less, 6, false),
        Token::LtEq => (OpId::LessEq, 6, false),
        Token::Gt => (OpId::Greater, 6, false),
        Token::GtEq => (OpId::GreaterEq, 6, false),
        Token::EqEq => (OpId::Eq, 7, false),
        Token::NotEq => (OpId::NotEq, 7, false),
        Token::Ampersand => (OpId::BitAnd, 8, false),
        Token::Caret => (OpId::BitXor, 9, false),
        Token::Pipe => (OpId::BitOr, 10, false),
        Token::And => (OpId::And, 11, false),
        Token::Or => (OpId::Or, 12, false),
        Token::Eq => (OpId::Assign, 13, true),
        Token::PlusEq => (OpId::PlusAssign, 13, true),
        Token::MinusEq => (OpId::MinusAssign, 13, true),
        Token::StarEq => (OpId::MultAssign, 13, true),
        Token::SlashEq => (OpId::DivAssign, 13, true),
        Token::PercentEq => (OpId::RemAssign, 13, true),
        Token::Comma => (OpId::Comma, 14, true),
        _ => return None,
    })
}

fn prefix_op(token: &Token) -> Option<OpId> {
    Some(match token {
        Token::Increment => OpId::PreInc,
        Token::Decrement => OpId::PreDec,
        Token::Plus => OpId::Positive,
        Token::Minus => OpId::Negative,
        Token::Not => OpId::Not,
        Token::Tilde => OpId::Inverse,
        Token::At => OpId::At,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(LOWEST)
    }

    /// Expression without top-level commas (call/index argument elements and
    /// everything tighter still parse normally through `parse_expr`).
    fn parse_binary(&mut self, limit: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;

        while let Some((id, priority, right_assoc)) =
            self.peek_at(0).and_then(binary_op_info)
        {
            if priority > limit {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(if right_assoc { priority } else { priority - 1 })?;
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Operator(Box::new(OperatorExpr {
                    id,
                    first: lhs,
                    second: Some(rhs),
                    span,
                })),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if let Some(id) = self.peek_at(0).and_then(prefix_op) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.join(operand.span);
            return Ok(Expr {
                kind: ExprKind::Operator(Box::new(OperatorExpr {
                    id,
                    first: operand,
                    second: None,
                    span,
                })),
                span,
            });
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            if self.is_at_end() {
                return Ok(expr);
            }
            match self.peek() {
                Token::Increment => {
                    self.advance();
                    expr = postfix_operator(OpId::PostInc, expr, self.previous_span());
                }
                Token::Decrement => {
                    self.advance();
                    expr = postfix_operator(OpId::PostDec, expr, self.previous_span());
                }
                Token::Dot => {
                    self.advance();
                    let field = self.parse_ident("Expected a selector after '.'")?;
                    let field_expr = Expr {
                        kind: ExprKind::Atom(Atom {
                            kind: AtomKind::Identifier,
                            id: field.id,
                            span: field.span,
                        }),
                        span: field.span,
                    };
                    let span = expr.span.join(field.span);
                    expr = Expr {
                        kind: ExprKind::Operator(Box::new(OperatorExpr {
                            id: OpId::Dot,
                            first: expr,
                            second: Some(field_expr),
                            span,
                        })),
                        span,
                    };
                }
                Token::LParen => {
                    self.advance();
                    expr = self.parse_args(expr, OpId::Call, &Token::RParen)?;
                }
                Token::LBracket => {
                    self.advance();
                    expr = self.parse_args(expr, OpId::Index, &Token::RBracket)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Call/index tail: the argument list stays a right-leaning comma chain,
    /// which is how the evaluator walks it.
    fn parse_args(&mut self, callee: Expr, id: OpId, close: &Token) -> Result<Expr, ParseError> {
        if self.match_token(close) {
            let span = callee.span.join(self.previous_span());
            return Ok(Expr {
                kind: ExprKind::Operator(Box::new(OperatorExpr {
                    id,
                    first: callee,
                    second: None,
                    span,
                })),
                span,
            });
        }

        let args = self.parse_expr()?;
        self.consume(close, "Expected a closing bracket after arguments")?;
        let span = callee.span.join(self.previous_span());
        Ok(Expr {
            kind: ExprKind::Operator(Box::new(OperatorExpr {
                id,
                first: callee,
                second: Some(args),
                span,
            })),
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if self.is_at_end() {
            return Err(self.error("Expected an expression"));
        }

        let span = self.current_span();
        match self.peek().clone() {
            Token::True => {
                self.advance();
                Ok(self.atom(AtomKind::Boolean(true), span))
            }
            Token::False => {
                self.advance();
                Ok(self.atom(AtomKind::Boolean(false), span))
            }
            Token::Nothing => {
                self.advance();
                Ok(self.atom(AtomKind::Nothing, span))
            }
            Token::IntLiteral(v) => {
                self.advance();
                Ok(self.atom(AtomKind::Integer(v), span))
            }
            Token::RealLiteral(v) => {
                self.advance();
                Ok(self.atom(AtomKind::Real(v), span))
            }
            Token::CharLiteral(v) => {
                self.advance();
                Ok(self.atom(AtomKind::Character(v), span))
            }
            Token::StringLiteral(v) => {
                self.advance();
                Ok(self.atom(AtomKind::String(v), span))
            }
            Token::Ident(name) => {
                self.advance();
                let id = self.names.intern(&name);
                Ok(Expr {
                    kind: ExprKind::Atom(Atom { kind: AtomKind::Identifier, id, span }),
                    span,
                })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.consume(&Token::RParen, "Expected a close bracket")?;
                let span = span.join(self.previous_span());
                Ok(Expr {
                    kind: ExprKind::Paren(Box::new(inner)),
                    span,
                })
            }
            Token::LBracket => {
                // `[a, b, c]` is sugar for calling the Array constructor
                self.advance();
                let array_id = self.names.intern("Array");
                let callee = Expr {
                    kind: ExprKind::Atom(Atom {
                        kind: AtomKind::Identifier,
                        id: array_id,
                        span,
                    }),
                    span,
                };
                self.parse_args(callee, OpId::Call, &Token::RBracket)
            }
            Token::Function => self.parse_func_def(),
            Token::Type => self.parse_type_def(),
            _ => Err(self.error("Expected an expression")),
        }
    }

    fn atom(&mut self, kind: AtomKind, span: Span) -> Expr {
        let id = self.intern_span(span);
        Expr {
            kind: ExprKind::Atom(Atom { kind, id, span }),
            span,
        }
    }

    fn parse_ident(&mut self, message: &str) -> Result<Ident, ParseError> {
        match self.peek_at(0).cloned() {
            Some(Token::Ident(name)) => {
                self.advance();
                let span = self.previous_span();
                let id = self.names.intern(&name);
                Ok(Ident { id, span })
            }
            _ => Err(self.error(message)),
        }
    }

    fn parse_func_def(&mut self) -> Result<Expr, ParseError> {
        self.consume(&Token::Function, "Expected 'function'")?;
        let start = self.previous_span();

        let name = if matches!(self.peek_at(0), Some(Token::Ident(_))) {
            Some(self.parse_ident("Expected a function name")?)
        } else {
            None
        };

        let params = self.parse_param_list()?;
        let body = std::rc::Rc::new(self.parse_stmt()?);
        let span = start.join(body.span);

        Ok(Expr {
            kind: ExprKind::FuncDef(std::rc::Rc::new(FuncDef { name, params, body, span })),
            span,
        })
    }

    fn parse_param_list(&mut self) -> Result<Vec<Ident>, ParseError> {
        self.consume(&Token::LParen, "Expected '(' before parameter list")?;
        let mut params = Vec::new();
        if self.match_token(&Token::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_ident("Expected a parameter name")?);
            if self.match_token(&Token::Comma) {
                continue;
            }
            self.consume(&Token::RParen, "Expected ')' after parameter list")?;
            return Ok(params);
        }
    }

    /// `type Name { field; ...; method m(self) body ... }` — fields and
    /// methods may be interleaved.
    fn parse_type_def(&mut self) -> Result<Expr, ParseError> {
        self.consume(&Token::Type, "Expected 'type'")?;
        let start = self.previous_span();
        let name = self.parse_ident("Expected a type name")?;
        self.consume(&Token::LBrace, "Expected '{' after type name")?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_semicolons();
            if self.match_token(&Token::RBrace) {
                break;
            }
            if self.match_token(&Token::Method) {
                let method_start = self.previous_span();
                let method_name = self.parse_ident("Expected a method name")?;
                let params = self.parse_param_list()?;
                let body = std::rc::Rc::new(self.parse_stmt()?);
                let span = method_start.join(body.span);
                methods.push(std::rc::Rc::new(FuncDef {
                    name: Some(method_name),
                    params,
                    body,
                    span,
                }));
                continue;
            }
            let field = self.parse_ident("Expected a field or method in type definition")?;
            self.consume(&Token::Semicolon, "Expected ';' after field name")?;
            fields.push(field);
        }

        let span = start.join(self.previous_span());
        Ok(Expr {
            kind: ExprKind::TypeDef(TypeDef { name, fields, methods, span }),
            span,
        })
    }
}

fn postfix_operator(id: OpId, operand: Expr, op_span: Span) -> Expr {
    let span = operand.span.join(op_span);
    Expr {
        kind: ExprKind::Operator(Box::new(OperatorExpr {
            id,
            first: operand,
            second: None,
            span,
        })),
        span,
    }
}
