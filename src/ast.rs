// ABOUTME: Typed AST produced by the parser and walked by the evaluator

use crate::lexer::Token;

/// A whole source file: an ordered list of top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program<'s> {
    pub decls: Vec<Decl<'s>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl<'s> {
    Function(FunDecl<'s>),
    Procedure(ProcDecl<'s>),
    Class(ClassDecl<'s>),
    Stmt(Stmt<'s>),
}

/// Functions must return; their body items interleave declarations with
/// top-level `return` expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl<'s> {
    pub name: Token<'s>,
    pub params: Vec<Param<'s>>,
    pub body: Vec<FunItem<'s>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunItem<'s> {
    Decl(Decl<'s>),
    Return(Expr<'s>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcDecl<'s> {
    pub name: Token<'s>,
    pub params: Vec<Param<'s>>,
    pub body: Block<'s>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param<'s> {
    pub name: Token<'s>,
    pub mode: PassMode,
}

/// Parameters pass by value unless annotated `: byRef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    ByVal,
    ByRef,
}

/// Classes parse but do not evaluate yet.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl<'s> {
    pub name: Token<'s>,
    pub parent: Option<Token<'s>>,
    pub members: Vec<ClassMember<'s>>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember<'s> {
    pub vis: Visibility,
    pub kind: MemberKind<'s>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind<'s> {
    Function(FunDecl<'s>),
    Procedure(ProcDecl<'s>),
}

pub type Block<'s> = Vec<Decl<'s>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'s> {
    Expr(Expr<'s>),
    Global {
        name: Token<'s>,
        init: Expr<'s>,
    },
    For {
        iter: Token<'s>,
        from: Expr<'s>,
        to: Expr<'s>,
        body: Block<'s>,
    },
    While {
        cond: Expr<'s>,
        body: Block<'s>,
    },
    /// Post-test loop that stops once the condition turns truthy.
    DoUntil {
        body: Block<'s>,
        cond: Expr<'s>,
    },
    If {
        /// The `if` arm followed by any `elseif` arms, in order.
        arms: Vec<CondBlock<'s>>,
        else_body: Option<Block<'s>>,
    },
    Switch {
        scrutinee: Expr<'s>,
        cases: Vec<CondBlock<'s>>,
        default: Option<Block<'s>>,
    },
    /// `array name[d1, d2, ...]` dimensions a nested nil-filled array.
    Array {
        name: Token<'s>,
        dims: Vec<Expr<'s>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondBlock<'s> {
    pub cond: Expr<'s>,
    pub body: Block<'s>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'s> {
    Unary {
        op: Token<'s>,
        operand: Box<Expr<'s>>,
    },
    Binary {
        op: Token<'s>,
        lhs: Box<Expr<'s>>,
        rhs: Box<Expr<'s>>,
    },
    Call {
        callee: Box<Expr<'s>>,
        args: Vec<Expr<'s>>,
    },
    Index {
        target: Box<Expr<'s>>,
        indices: Vec<Expr<'s>>,
    },
    Member {
        object: Box<Expr<'s>>,
        name: Token<'s>,
    },
    Super {
        name: Token<'s>,
    },
    Grouping(Box<Expr<'s>>),
    Primary(Token<'s>),
}
