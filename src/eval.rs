// ABOUTME: Tree-walking evaluator executing parsed programs

use std::borrow::Cow;
use std::io::{self, Write};

use crate::ast::{Block, Decl, Expr, FunDecl, FunItem, Param, PassMode, ProcDecl, Program, Stmt};
use crate::builtins;
use crate::env::{ScopeStack, Slot, GLOBAL};
use crate::error::Fault;
use crate::lexer::{Token, TokenKind};
use crate::parser::is_assignment;
use crate::value::Value;

/// The interpreter context: the scope stack, a pointer to the scope
/// currently executing, and the stream `print` writes to. Constructing
/// one sets up the global scope with the native library bound.
pub struct Interp<'a> {
    scopes: ScopeStack<'a>,
    current: usize,
    out: Box<dyn Write + 'a>,
}

impl<'a> Interp<'a> {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Build an interpreter writing program output to `out`; tests hand
    /// in a buffer here to observe what a program printed.
    pub fn with_output(out: Box<dyn Write + 'a>) -> Self {
        let mut interp = Interp {
            scopes: ScopeStack::new(),
            current: GLOBAL,
            out,
        };
        builtins::register(&mut interp);
        interp
    }

    /// Execute a whole program. The first fault aborts execution.
    pub fn run(&mut self, program: &'a Program<'a>) -> Result<(), Fault> {
        for decl in &program.decls {
            self.exec_decl(decl)?;
        }
        Ok(())
    }

    /// Evaluate one expression to a concrete (dereferenced) value. The
    /// REPL uses this to echo results.
    pub fn eval_expression(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>, Fault> {
        self.eval_deref(expr)
    }

    pub(crate) fn define_global(&mut self, name: &'a str, value: Value<'a>) {
        self.scopes.define(GLOBAL, name, value);
    }

    pub(crate) fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    // ===== Declarations and statements =====

    fn exec_decl(&mut self, decl: &'a Decl<'a>) -> Result<(), Fault> {
        match decl {
            Decl::Function(f) => {
                self.set_var(f.name.lexeme, Value::Func(f));
                Ok(())
            }
            Decl::Procedure(p) => {
                self.set_var(p.name.lexeme, Value::Proc(p));
                Ok(())
            }
            // Classes parse but have no runtime behaviour yet.
            Decl::Class(_) => Ok(()),
            Decl::Stmt(stmt) => self.exec_stmt(stmt),
        }
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<(), Fault> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(())
            }
            Stmt::Global { name, init } => {
                let value = self.eval_deref(init)?;
                self.scopes.define(GLOBAL, name.lexeme, value);
                Ok(())
            }
            Stmt::For {
                iter,
                from,
                to,
                body,
            } => {
                let start = self.eval_deref(from)?;
                self.with_scope(|interp| {
                    let slot = interp.scopes.define(interp.current, iter.lexeme, start);
                    interp.run_for(slot, to, body)
                })
            }
            Stmt::While { cond, body } => self.with_scope(|interp| {
                while interp.eval_truthy(cond)? {
                    interp.exec_block(body)?;
                }
                Ok(())
            }),
            Stmt::DoUntil { body, cond } => self.with_scope(|interp| loop {
                interp.exec_block(body)?;
                if interp.eval_truthy(cond)? {
                    return Ok(());
                }
            }),
            Stmt::If { arms, else_body } => {
                for arm in arms {
                    if self.eval_truthy(&arm.cond)? {
                        return self.exec_block(&arm.body);
                    }
                }
                if let Some(body) = else_body {
                    self.exec_block(body)?;
                }
                Ok(())
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
            } => {
                let subject = self.eval_deref(scrutinee)?;
                for case in cases {
                    let candidate = self.eval_deref(&case.cond)?;
                    if equal(&subject, &candidate)? {
                        return self.exec_block(&case.body);
                    }
                }
                if let Some(body) = default {
                    self.exec_block(body)?;
                }
                Ok(())
            }
            Stmt::Array { name, dims } => {
                let mut sizes = Vec::with_capacity(dims.len());
                for dim in dims {
                    match self.eval_deref(dim)? {
                        Value::Int(n) if n >= 0 => sizes.push(n as usize),
                        _ => return Err(Fault::BadDimension),
                    }
                }
                self.set_var(name.lexeme, dim_array(&sizes));
                Ok(())
            }
        }
    }

    fn exec_block(&mut self, block: &'a Block<'a>) -> Result<(), Fault> {
        for decl in block {
            self.exec_decl(decl)?;
        }
        Ok(())
    }

    /// The header's upper bound is exclusive and re-evaluated before each
    /// iteration; the iterator steps by one afterwards.
    fn run_for(&mut self, slot: Slot, to: &'a Expr<'a>, body: &'a Block<'a>) -> Result<(), Fault> {
        loop {
            let max = self.eval_deref(to)?;
            let current = self.scopes.get(slot).clone();
            if !less(&current, &max)? {
                return Ok(());
            }
            self.exec_block(body)?;
            let current = self.scopes.get(slot).clone();
            let next = arith(TokenKind::Plus, &current, &Value::Int(1))?;
            self.scopes.set(slot, next);
        }
    }

    /// Run `f` inside a fresh scope chained onto the current one,
    /// restoring the previous scope pointer afterwards even on a fault.
    fn with_scope<F>(&mut self, f: F) -> Result<(), Fault>
    where
        F: FnOnce(&mut Self) -> Result<(), Fault>,
    {
        let scope = self.scopes.push(self.current);
        let saved = self.current;
        self.current = scope;
        let result = f(self);
        self.current = saved;
        self.scopes.pop();
        result
    }

    fn set_var(&mut self, name: &'a str, value: Value<'a>) {
        self.scopes.set_var(self.current, name, value);
    }

    // ===== Expressions =====

    fn eval(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>, Fault> {
        match expr {
            Expr::Primary(token) => self.eval_primary(token),
            Expr::Grouping(inner) => self.eval(inner),
            Expr::Unary { op, operand } => self.eval_unary(op, operand),
            Expr::Binary { op, lhs, rhs } => self.eval_binary(op.kind, lhs, rhs),
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Index { target, indices } => self.eval_index(target, indices),
            Expr::Member { .. } | Expr::Super { .. } => Err(Fault::ClassesUnsupported),
        }
    }

    fn eval_deref(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>, Fault> {
        let value = self.eval(expr)?;
        Ok(self.deref(value))
    }

    /// Chase a `Ref` down to a concrete value, cloning it out of its slot.
    fn deref(&self, value: Value<'a>) -> Value<'a> {
        match value {
            Value::Ref(slot) => self.scopes.get(self.scopes.resolve(slot)).clone(),
            other => other,
        }
    }

    fn eval_primary(&mut self, token: &Token<'a>) -> Result<Value<'a>, Fault> {
        match token.kind {
            TokenKind::Nil => Ok(Value::Nil),
            TokenKind::True => Ok(Value::Bool(true)),
            TokenKind::False => Ok(Value::Bool(false)),
            TokenKind::IntLit => token
                .lexeme
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Fault::BadLiteral(token.lexeme.to_string())),
            TokenKind::FloatLit => token
                .lexeme
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Fault::BadLiteral(token.lexeme.to_string())),
            TokenKind::StringLit => Ok(Value::Str(Cow::Borrowed(token.lexeme))),
            // An identifier evaluates to the identity of its slot, so
            // every lvalue position works off the same representation.
            TokenKind::Identifier => match self.scopes.find(self.current, token.lexeme) {
                Some(slot) => Ok(Value::Ref(slot)),
                None => Err(Fault::UnknownVar(token.lexeme.to_string())),
            },
            TokenKind::SelfKw => Err(Fault::ClassesUnsupported),
            kind => unreachable!("not a primary token: {kind:?}"),
        }
    }

    fn eval_unary(&mut self, op: &Token<'a>, operand: &'a Expr<'a>) -> Result<Value<'a>, Fault> {
        match op.kind {
            TokenKind::Not => Ok(Value::Bool(!self.eval_truthy(operand)?)),
            TokenKind::Minus => match self.eval_deref(operand)? {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(Fault::NotNegatable(other.type_name())),
            },
            TokenKind::New => Err(Fault::ClassesUnsupported),
            kind => unreachable!("not a unary operator: {kind:?}"),
        }
    }

    fn eval_binary(
        &mut self,
        op: TokenKind,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    ) -> Result<Value<'a>, Fault> {
        use TokenKind::*;
        match op {
            Equal => {
                let value = self.eval_deref(rhs)?;
                self.assign(lhs, value)
            }
            // x op= e desugars to x = x op e
            PlusEqual | MinusEqual | StarEqual | SlashEqual | CaretEqual => {
                let base = match op {
                    PlusEqual => Plus,
                    MinusEqual => Minus,
                    StarEqual => Star,
                    SlashEqual => Slash,
                    CaretEqual => Caret,
                    _ => unreachable!(),
                };
                let value = self.eval_binary(base, lhs, rhs)?;
                let value = self.deref(value);
                self.assign(lhs, value)
            }
            // Short-circuit: the right operand only runs when needed.
            Or => {
                let result = self.eval_truthy(lhs)? || self.eval_truthy(rhs)?;
                Ok(Value::Bool(result))
            }
            And => {
                let result = self.eval_truthy(lhs)? && self.eval_truthy(rhs)?;
                Ok(Value::Bool(result))
            }
            EqualEqual => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                Ok(Value::Bool(equal(&a, &b)?))
            }
            BangEqual => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                Ok(Value::Bool(!equal(&a, &b)?))
            }
            // The derived comparisons combine < and ==.
            Less => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                Ok(Value::Bool(less(&a, &b)?))
            }
            LessEqual => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                Ok(Value::Bool(less(&a, &b)? || equal(&a, &b)?))
            }
            Greater => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                Ok(Value::Bool(!(less(&a, &b)? || equal(&a, &b)?)))
            }
            GreaterEqual => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                Ok(Value::Bool(!less(&a, &b)?))
            }
            Plus => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                add(a, b)
            }
            Minus | Star | Slash | Caret | Mod | Div => {
                let (a, b) = self.eval_pair(lhs, rhs)?;
                arith(op, &a, &b)
            }
            kind => unreachable!("not a binary operator: {kind:?}"),
        }
    }

    fn eval_pair(
        &mut self,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    ) -> Result<(Value<'a>, Value<'a>), Fault> {
        let a = self.eval_deref(lhs)?;
        let b = self.eval_deref(rhs)?;
        Ok((a, b))
    }

    /// Store `value` into the place `target` names and return a `Ref` to
    /// the written slot (so chained assignment stays an lvalue). Writing
    /// resolves through any `Ref` chain in the slot, which is what makes
    /// assignment to a byRef parameter mutate the caller's variable.
    fn assign(&mut self, target: &'a Expr<'a>, value: Value<'a>) -> Result<Value<'a>, Fault> {
        match target {
            Expr::Primary(token) if token.kind == TokenKind::Identifier => {
                let slot = match self.scopes.find(self.current, token.lexeme) {
                    Some(slot) => self.scopes.resolve(slot),
                    // The one recoverable lookup miss: assignment to an
                    // unknown name creates the binding right here.
                    None => self.scopes.define(self.current, token.lexeme, Value::Nil),
                };
                self.scopes.set(slot, value);
                Ok(Value::Ref(slot))
            }
            Expr::Binary { .. } if is_assignment(target) => match self.eval(target)? {
                Value::Ref(slot) => {
                    let slot = self.scopes.resolve(slot);
                    self.scopes.set(slot, value);
                    Ok(Value::Ref(slot))
                }
                _ => Err(Fault::NotAnLvalue),
            },
            Expr::Grouping(inner) => self.assign(inner, value),
            Expr::Member { .. } => Err(Fault::ClassesUnsupported),
            _ => Err(Fault::NotAnLvalue),
        }
    }

    fn eval_truthy(&mut self, expr: &'a Expr<'a>) -> Result<bool, Fault> {
        let value = self.eval_deref(expr)?;
        self.truthy(&value)
    }

    pub(crate) fn truthy(&self, value: &Value<'a>) -> Result<bool, Fault> {
        match value {
            Value::Nil => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n > 0),
            Value::Float(x) => Ok(*x > 0.0),
            Value::Str(s) => Ok(!s.is_empty()),
            Value::Array(items) => Ok(!items.is_empty()),
            Value::Ref(slot) => {
                let target = self.scopes.get(self.scopes.resolve(*slot)).clone();
                self.truthy(&target)
            }
            other => Err(Fault::NotABoolean(other.type_name())),
        }
    }

    // ===== Calls =====

    fn eval_call(
        &mut self,
        callee: &'a Expr<'a>,
        args: &'a [Expr<'a>],
    ) -> Result<Value<'a>, Fault> {
        match self.eval_deref(callee)? {
            Value::Func(decl) => self.call_function(decl, args),
            Value::Proc(decl) => self.call_procedure(decl, args),
            Value::NativeFunc(_, f) => {
                let argv = self.native_args(args)?;
                f(self, argv)
            }
            Value::NativeProc(_, f) => {
                let argv = self.native_args(args)?;
                f(self, argv)?;
                Ok(Value::Nil)
            }
            _ => Err(Fault::NotCallable),
        }
    }

    fn call_function(
        &mut self,
        decl: &'a FunDecl<'a>,
        args: &'a [Expr<'a>],
    ) -> Result<Value<'a>, Fault> {
        let bindings = self.bind_params("function", decl.name.lexeme, &decl.params, args)?;
        // The frame parents straight onto the global floor: a callee sees
        // its own locals and globals, never the caller's scope.
        let frame = self.scopes.push(GLOBAL);
        for (name, value) in bindings {
            self.scopes.define(frame, name, value);
        }
        let saved = self.current;
        self.current = frame;
        let result = self.run_function_body(decl);
        self.current = saved;
        self.scopes.pop();
        result
    }

    fn run_function_body(&mut self, decl: &'a FunDecl<'a>) -> Result<Value<'a>, Fault> {
        for item in &decl.body {
            match item {
                FunItem::Decl(d) => self.exec_decl(d)?,
                FunItem::Return(expr) => return self.eval_deref(expr),
            }
        }
        Err(Fault::MissingReturn(decl.name.lexeme.to_string()))
    }

    fn call_procedure(
        &mut self,
        decl: &'a ProcDecl<'a>,
        args: &'a [Expr<'a>],
    ) -> Result<Value<'a>, Fault> {
        let bindings = self.bind_params("procedure", decl.name.lexeme, &decl.params, args)?;
        let frame = self.scopes.push(GLOBAL);
        for (name, value) in bindings {
            self.scopes.define(frame, name, value);
        }
        let saved = self.current;
        self.current = frame;
        let result = self.exec_block(&decl.body);
        self.current = saved;
        self.scopes.pop();
        result.map(|()| Value::Nil)
    }

    /// Evaluate the arguments in the caller's scope and pair them with
    /// parameter names: byVal gets a dereferenced copy, byRef gets the
    /// `Ref` the argument evaluated to (so only lvalues pass).
    fn bind_params(
        &mut self,
        kind: &'static str,
        name: &str,
        params: &'a [Param<'a>],
        args: &'a [Expr<'a>],
    ) -> Result<Vec<(&'a str, Value<'a>)>, Fault> {
        if args.len() != params.len() {
            return Err(Fault::Arity {
                kind,
                name: name.to_string(),
                got: args.len(),
                expected: params.len(),
            });
        }
        let mut bindings = Vec::with_capacity(args.len());
        for (param, arg) in params.iter().zip(args) {
            let value = self.eval(arg)?;
            let bound = match param.mode {
                PassMode::ByVal => self.deref(value),
                PassMode::ByRef => match value {
                    Value::Ref(_) => value,
                    other => return Err(Fault::NotByRef(other.type_name())),
                },
            };
            bindings.push((param.name.lexeme, bound));
        }
        Ok(bindings)
    }

    fn native_args(&mut self, args: &'a [Expr<'a>]) -> Result<Vec<Value<'a>>, Fault> {
        args.iter().map(|arg| self.eval_deref(arg)).collect()
    }

    // ===== Subscripts =====

    fn eval_index(
        &mut self,
        target: &'a Expr<'a>,
        indices: &'a [Expr<'a>],
    ) -> Result<Value<'a>, Fault> {
        let mut value = self.eval_deref(target)?;
        for index in indices {
            let idx = match self.eval_deref(index)? {
                Value::Int(n) => n,
                other => return Err(Fault::BadIndex(other.type_name())),
            };
            value = match value {
                Value::Array(items) => {
                    if idx < 0 || idx as usize >= items.len() {
                        return Err(Fault::IndexOutOfBounds(idx, items.len()));
                    }
                    items[idx as usize].clone()
                }
                other => return Err(Fault::NotIndexable(other.type_name())),
            };
        }
        Ok(value)
    }
}

impl Default for Interp<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ===== Operator kernels (already-dereferenced operands) =====

/// Numeric rule: all-Int stays Int, any Float makes Float; everything
/// else is an invalid-operator fault. MOD and DIV are Int-only.
fn arith<'a>(op: TokenKind, a: &Value<'a>, b: &Value<'a>) -> Result<Value<'a>, Fault> {
    use TokenKind::*;
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            let (x, y) = (*x, *y);
            match op {
                Plus => Ok(Value::Int(x.wrapping_add(y))),
                Minus => Ok(Value::Int(x.wrapping_sub(y))),
                Star => Ok(Value::Int(x.wrapping_mul(y))),
                Slash | Div => {
                    if y == 0 {
                        Err(Fault::DivisionByZero)
                    } else {
                        Ok(Value::Int(x.wrapping_div(y)))
                    }
                }
                Mod => {
                    if y == 0 {
                        Err(Fault::DivisionByZero)
                    } else {
                        Ok(Value::Int(x.wrapping_rem(y)))
                    }
                }
                // Int ^ Int truncates the float power back to Int.
                Caret => Ok(Value::Int((x as f64).powf(y as f64) as i64)),
                kind => unreachable!("not an arithmetic operator: {kind:?}"),
            }
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let x = as_f64(a);
            let y = as_f64(b);
            match op {
                Plus => Ok(Value::Float(x + y)),
                Minus => Ok(Value::Float(x - y)),
                Star => Ok(Value::Float(x * y)),
                Slash => {
                    if y == 0.0 {
                        Err(Fault::DivisionByZero)
                    } else {
                        Ok(Value::Float(x / y))
                    }
                }
                Caret => Ok(Value::Float(x.powf(y))),
                Mod | Div => Err(Fault::InvalidOperands(a.type_name(), b.type_name())),
                kind => unreachable!("not an arithmetic operator: {kind:?}"),
            }
        }
        _ => Err(Fault::InvalidOperands(a.type_name(), b.type_name())),
    }
}

/// `+` has two overloads on top of the numeric rule: string
/// concatenation (the result owns its buffer) and array concatenation.
fn add<'a>(a: Value<'a>, b: Value<'a>) -> Result<Value<'a>, Fault> {
    match (&a, &b) {
        (Value::Str(x), Value::Str(y)) => {
            let mut joined = String::with_capacity(x.len() + y.len());
            joined.push_str(x);
            joined.push_str(y);
            Ok(Value::Str(Cow::Owned(joined)))
        }
        (Value::Array(x), Value::Array(y)) => {
            let mut joined = Vec::with_capacity(x.len() + y.len());
            joined.extend(x.iter().cloned());
            joined.extend(y.iter().cloned());
            Ok(Value::Array(joined))
        }
        _ => arith(TokenKind::Plus, &a, &b),
    }
}

/// Strict ordering, numeric only, with Int/Float promotion.
fn less(a: &Value<'_>, b: &Value<'_>) -> Result<bool, Fault> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x < y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(as_f64(a) < as_f64(b))
        }
        _ => Err(Fault::InvalidOperands(a.type_name(), b.type_name())),
    }
}

/// Equality requires matching tags: mixed tags are unequal, never a
/// fault. Comparing callables or class values is a fault.
fn equal(a: &Value<'_>, b: &Value<'_>) -> Result<bool, Fault> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Float(x), Value::Float(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (Value::Array(x), Value::Array(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            for (xi, yi) in x.iter().zip(y) {
                if !equal(xi, yi)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Func(_), Value::Func(_))
        | (Value::Proc(_), Value::Proc(_))
        | (Value::NativeFunc(..), Value::NativeFunc(..))
        | (Value::NativeProc(..), Value::NativeProc(..))
        | (Value::Class, Value::Class)
        | (Value::Instance, Value::Instance) => Err(Fault::NotComparable(a.type_name())),
        _ => Ok(false),
    }
}

fn as_f64(value: &Value<'_>) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        other => unreachable!("not numeric: {}", other.type_name()),
    }
}

fn dim_array<'a>(sizes: &[usize]) -> Value<'a> {
    match sizes.split_first() {
        None => Value::Nil,
        Some((&len, rest)) => {
            if rest.is_empty() {
                Value::Array(vec![Value::Nil; len])
            } else {
                Value::Array(vec![dim_array(rest); len])
            }
        }
    }
}
