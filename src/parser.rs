// ABOUTME: Recursive-descent parser with panic-mode error recovery

use crate::ast::{
    Block, ClassDecl, ClassMember, CondBlock, Decl, Expr, FunDecl, FunItem, MemberKind, Param,
    PassMode, ProcDecl, Program, Stmt, Visibility,
};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

/// Result of a parse: a (possibly partial) program plus every diagnostic
/// hit along the way. Callers must not evaluate when `errors` is non-empty.
#[derive(Debug)]
pub struct ParseOutput<'s> {
    pub program: Program<'s>,
    pub errors: Vec<ParseError>,
}

/// Parse a token stream (which must end in `Eof`). On error the parser
/// records a diagnostic and skips ahead to the next top-level anchor
/// keyword, so one mistake yields one message rather than a cascade.
pub fn parse(tokens: Vec<Token<'_>>) -> ParseOutput<'_> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        errors: Vec::new(),
    };
    let mut decls = Vec::new();
    while !parser.is_at_end() {
        match parser.declaration() {
            Ok(decl) => decls.push(decl),
            Err(err) => {
                parser.errors.push(err);
                parser.synchronize();
            }
        }
    }
    ParseOutput {
        program: Program { decls },
        errors: parser.errors,
    }
}

struct Parser<'s> {
    tokens: Vec<Token<'s>>,
    pos: usize,
    errors: Vec<ParseError>,
}

/// Tokens that can open a top-level construct; panic-mode recovery skips
/// forward to one of these.
fn is_anchor(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Global | For | While | Do | If | Switch | Array | Function | Procedure | Class
    )
}

fn is_assign_op(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Equal | PlusEqual | MinusEqual | StarEqual | SlashEqual | CaretEqual
    )
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Token<'s> {
        self.tokens[self.pos]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token<'s> {
        let token = self.peek();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token<'s>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: &str) -> ParseError {
        error_at(self.peek(), message)
    }

    fn synchronize(&mut self) {
        if !self.is_at_end() {
            self.advance();
        }
        while !self.is_at_end() && !is_anchor(self.peek().kind) {
            self.advance();
        }
    }

    // ===== Declarations =====

    fn declaration(&mut self) -> Result<Decl<'s>, ParseError> {
        match self.peek().kind {
            TokenKind::Function => Ok(Decl::Function(self.function()?)),
            TokenKind::Procedure => Ok(Decl::Procedure(self.procedure()?)),
            TokenKind::Class => Ok(Decl::Class(self.class_decl()?)),
            _ => Ok(Decl::Stmt(self.statement()?)),
        }
    }

    fn function(&mut self) -> Result<FunDecl<'s>, ParseError> {
        self.consume(TokenKind::Function, "Expected 'function'")?;
        let name = self.consume(TokenKind::Identifier, "Expected function name")?;
        let params = self.params()?;
        let mut body = Vec::new();
        while !self.match_kind(TokenKind::EndFunction) {
            if self.is_at_end() {
                return Err(self.error_here("Expected 'endfunction'"));
            }
            if self.match_kind(TokenKind::Return) {
                body.push(FunItem::Return(self.expression()?));
            } else {
                body.push(FunItem::Decl(self.declaration()?));
            }
        }
        Ok(FunDecl { name, params, body })
    }

    fn procedure(&mut self) -> Result<ProcDecl<'s>, ParseError> {
        self.consume(TokenKind::Procedure, "Expected 'procedure'")?;
        let name = self.consume(TokenKind::Identifier, "Expected procedure name")?;
        let params = self.params()?;
        let body = self.block(TokenKind::EndProcedure, "Expected 'endprocedure'")?;
        Ok(ProcDecl { name, params, body })
    }

    fn class_decl(&mut self) -> Result<ClassDecl<'s>, ParseError> {
        self.consume(TokenKind::Class, "Expected 'class'")?;
        let name = self.consume(TokenKind::Identifier, "Expected class name")?;
        let parent = if self.match_kind(TokenKind::Inherits) {
            Some(self.consume(TokenKind::Identifier, "Expected parent class name")?)
        } else {
            None
        };
        let mut members = Vec::new();
        while !self.match_kind(TokenKind::EndClass) {
            if self.is_at_end() {
                return Err(self.error_here("Expected 'endclass'"));
            }
            let vis = if self.match_kind(TokenKind::Private) {
                Visibility::Private
            } else {
                self.match_kind(TokenKind::Public);
                Visibility::Public
            };
            let kind = match self.peek().kind {
                TokenKind::Function => MemberKind::Function(self.function()?),
                TokenKind::Procedure => MemberKind::Procedure(self.procedure()?),
                _ => return Err(self.error_here("Expected a class member")),
            };
            members.push(ClassMember { vis, kind });
        }
        Ok(ClassDecl {
            name,
            parent,
            members,
        })
    }

    fn params(&mut self) -> Result<Vec<Param<'s>>, ParseError> {
        self.consume(TokenKind::LParen, "Expected '('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(self.param()?);
            while self.match_kind(TokenKind::Comma) {
                params.push(self.param()?);
            }
        }
        self.consume(TokenKind::RParen, "Expected ')'")?;
        Ok(params)
    }

    fn param(&mut self) -> Result<Param<'s>, ParseError> {
        let name = self.consume(TokenKind::Identifier, "Expected parameter name")?;
        let mode = if self.match_kind(TokenKind::Colon) {
            if self.match_kind(TokenKind::ByRef) {
                PassMode::ByRef
            } else if self.match_kind(TokenKind::ByVal) {
                PassMode::ByVal
            } else {
                return Err(self.error_here("Expected 'byRef' or 'byVal'"));
            }
        } else {
            PassMode::ByVal
        };
        Ok(Param { name, mode })
    }

    // ===== Statements =====

    fn statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        match self.peek().kind {
            TokenKind::Global => self.global_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Do => self.do_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Array => self.array_statement(),
            _ => Ok(Stmt::Expr(self.expression()?)),
        }
    }

    fn global_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        self.consume(TokenKind::Global, "Expected 'global'")?;
        let name = self.consume(TokenKind::Identifier, "Expected global name")?;
        self.consume(TokenKind::Equal, "Expected '='")?;
        let init = self.expression()?;
        Ok(Stmt::Global { name, init })
    }

    fn for_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        self.consume(TokenKind::For, "Expected 'for'")?;
        let iter = self.consume(TokenKind::Identifier, "Expected iterator name")?;
        self.consume(TokenKind::Equal, "Expected '='")?;
        let from = self.expression()?;
        self.consume(TokenKind::To, "Expected 'to'")?;
        let to = self.expression()?;
        let body = self.block(TokenKind::Next, "Expected 'next'")?;
        let check = self.consume(TokenKind::Identifier, "Expected iterator name")?;
        // Catching the mismatch here saves carrying both names around for
        // a later checker.
        if check.lexeme != iter.lexeme {
            return Err(error_at(check, "Differing iterator names!"));
        }
        Ok(Stmt::For {
            iter,
            from,
            to,
            body,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        self.consume(TokenKind::While, "Expected 'while'")?;
        let cond = self.expression()?;
        let body = self.block(TokenKind::EndWhile, "Expected 'endwhile'")?;
        Ok(Stmt::While { cond, body })
    }

    fn do_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        self.consume(TokenKind::Do, "Expected 'do'")?;
        let body = self.block(TokenKind::Until, "Expected 'until'")?;
        let cond = self.expression()?;
        Ok(Stmt::DoUntil { body, cond })
    }

    fn if_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        use TokenKind::{Else, ElseIf, EndIf};
        self.consume(TokenKind::If, "Expected 'if'")?;
        let cond = self.expression()?;
        self.consume(TokenKind::Then, "Expected 'then'")?;
        let body = self.block_until(&[ElseIf, Else, EndIf], "Expected 'endif'")?;
        let mut arms = vec![CondBlock { cond, body }];
        let mut else_body = None;
        loop {
            if self.match_kind(ElseIf) {
                let cond = self.expression()?;
                self.consume(TokenKind::Then, "Expected 'then'")?;
                let body = self.block_until(&[ElseIf, Else, EndIf], "Expected 'endif'")?;
                arms.push(CondBlock { cond, body });
            } else if self.match_kind(Else) {
                else_body = Some(self.block(EndIf, "Expected 'endif'")?);
                break;
            } else {
                self.consume(EndIf, "Expected 'endif'")?;
                break;
            }
        }
        Ok(Stmt::If { arms, else_body })
    }

    fn switch_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        use TokenKind::{Case, Default, EndSwitch};
        self.consume(TokenKind::Switch, "Expected 'switch'")?;
        let scrutinee = self.expression()?;
        let mut cases = Vec::new();
        let mut default = None;
        while !self.match_kind(EndSwitch) {
            if self.is_at_end() {
                return Err(self.error_here("Expected 'endswitch'"));
            }
            if default.is_some() {
                return Err(
                    self.error_here("'default' must be the last case in a switch statement!")
                );
            }
            if self.match_kind(Case) {
                let cond = self.expression()?;
                self.consume(TokenKind::Colon, "Expected ':'")?;
                let body =
                    self.block_until(&[Case, Default, EndSwitch], "Expected 'endswitch'")?;
                cases.push(CondBlock { cond, body });
            } else if self.match_kind(Default) {
                self.consume(TokenKind::Colon, "Expected ':'")?;
                default =
                    Some(self.block_until(&[Case, Default, EndSwitch], "Expected 'endswitch'")?);
            } else {
                return Err(self.error_here("Expected 'case' or 'default'"));
            }
        }
        Ok(Stmt::Switch {
            scrutinee,
            cases,
            default,
        })
    }

    fn array_statement(&mut self) -> Result<Stmt<'s>, ParseError> {
        self.consume(TokenKind::Array, "Expected 'array'")?;
        let name = self.consume(TokenKind::Identifier, "Expected array name")?;
        self.consume(TokenKind::LSquare, "Expected '['")?;
        let mut dims = vec![self.expression()?];
        while self.match_kind(TokenKind::Comma) {
            dims.push(self.expression()?);
        }
        self.consume(TokenKind::RSquare, "Expected ']'")?;
        Ok(Stmt::Array { name, dims })
    }

    /// Parse declarations up to and including the terminator.
    fn block(&mut self, end: TokenKind, missing: &str) -> Result<Block<'s>, ParseError> {
        let mut decls = Vec::new();
        while !self.match_kind(end) {
            if self.is_at_end() {
                return Err(self.error_here(missing));
            }
            decls.push(self.declaration()?);
        }
        Ok(decls)
    }

    /// Parse declarations until one of the stop tokens is next, leaving it
    /// unconsumed. Used for the multi-terminator blocks of if and switch.
    fn block_until(
        &mut self,
        stops: &[TokenKind],
        missing: &str,
    ) -> Result<Block<'s>, ParseError> {
        let mut decls = Vec::new();
        while !stops.iter().any(|&k| self.check(k)) {
            if self.is_at_end() {
                return Err(self.error_here(missing));
            }
            decls.push(self.declaration()?);
        }
        Ok(decls)
    }

    // ===== Expressions, lowest precedence first =====

    fn expression(&mut self) -> Result<Expr<'s>, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr<'s>, ParseError> {
        let lhs = self.add_assignment()?;
        if self.check(TokenKind::Equal) {
            let op = self.advance();
            let rhs = self.assignment()?;
            return Ok(binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn add_assignment(&mut self) -> Result<Expr<'s>, ParseError> {
        let lhs = self.mul_assignment()?;
        if self.check(TokenKind::PlusEqual) || self.check(TokenKind::MinusEqual) {
            let op = self.advance();
            let rhs = self.add_assignment()?;
            return Ok(binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn mul_assignment(&mut self) -> Result<Expr<'s>, ParseError> {
        let lhs = self.exp_assignment()?;
        if self.check(TokenKind::StarEqual) || self.check(TokenKind::SlashEqual) {
            let op = self.advance();
            let rhs = self.mul_assignment()?;
            return Ok(binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn exp_assignment(&mut self) -> Result<Expr<'s>, ParseError> {
        let lhs = self.or_expr()?;
        if self.check(TokenKind::CaretEqual) {
            let op = self.advance();
            let rhs = self.exp_assignment()?;
            return Ok(binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn or_expr(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(&[TokenKind::Or], Self::and_expr)
    }

    fn and_expr(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(&[TokenKind::And], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(
            &[TokenKind::EqualEqual, TokenKind::BangEqual],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(
            &[
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(&[TokenKind::Plus, TokenKind::Minus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(
            &[
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Mod,
                TokenKind::Div,
            ],
            Self::exponent,
        )
    }

    fn exponent(&mut self) -> Result<Expr<'s>, ParseError> {
        self.left_assoc(&[TokenKind::Caret], Self::unary)
    }

    fn left_assoc(
        &mut self,
        ops: &[TokenKind],
        next: fn(&mut Self) -> Result<Expr<'s>, ParseError>,
    ) -> Result<Expr<'s>, ParseError> {
        let mut expr = next(self)?;
        while ops.iter().any(|&k| self.check(k)) {
            let op = self.advance();
            let rhs = next(self)?;
            expr = binary(op, expr, rhs);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'s>, ParseError> {
        if self.check(TokenKind::Not)
            || self.check(TokenKind::Minus)
            || self.check(TokenKind::New)
        {
            let op = self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.call_expr()
    }

    fn call_expr(&mut self) -> Result<Expr<'s>, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.match_kind(TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    args.push(self.expression()?);
                    while self.match_kind(TokenKind::Comma) {
                        args.push(self.expression()?);
                    }
                }
                self.consume(TokenKind::RParen, "Expected ')'")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.match_kind(TokenKind::LSquare) {
                let mut indices = vec![self.expression()?];
                while self.match_kind(TokenKind::Comma) {
                    indices.push(self.expression()?);
                }
                self.consume(TokenKind::RSquare, "Expected ']'")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    indices,
                };
            } else if self.match_kind(TokenKind::Dot) {
                let name = self.consume(TokenKind::Identifier, "Expected member name")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr<'s>, ParseError> {
        use TokenKind::*;
        if self.match_kind(LParen) {
            let inner = self.expression()?;
            self.consume(RParen, "Expected ')'")?;
            return Ok(Expr::Grouping(Box::new(inner)));
        }
        if self.match_kind(Super) {
            self.consume(Dot, "Expected '.'")?;
            let name = self.consume(Identifier, "Expected member name")?;
            return Ok(Expr::Super { name });
        }
        match self.peek().kind {
            Identifier | IntLit | FloatLit | StringLit | Nil | True | False | SelfKw => {
                Ok(Expr::Primary(self.advance()))
            }
            _ => Err(self.error_here("Unexpected token!")),
        }
    }
}

fn error_at(token: Token<'_>, message: &str) -> ParseError {
    ParseError {
        line: token.line,
        col: token.col,
        message: message.to_string(),
    }
}

fn binary<'s>(op: Token<'s>, lhs: Expr<'s>, rhs: Expr<'s>) -> Expr<'s> {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

// Exposed so the evaluator can recognise chained assignments as lvalues.
pub fn is_assignment(expr: &Expr<'_>) -> bool {
    matches!(expr, Expr::Binary { op, .. } if is_assign_op(op.kind))
}
