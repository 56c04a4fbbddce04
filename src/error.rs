// ABOUTME: Error taxonomy for parse errors and runtime faults

use thiserror::Error;

/// The subsystem a failure belongs to; the discriminant doubles as the
/// process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Main = 1,
    Parser = 2,
    Interpreter = 3,
    NativeLib = 4,
}

impl Subsystem {
    pub fn exit_code(self) -> i32 {
        self as i32
    }
}

/// A recoverable parse diagnostic. The parser accumulates these and keeps
/// going; a non-empty list means the program never runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[line {line}:{col}] {message}")]
pub struct ParseError {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

/// A runtime fault. All faults are fatal except `UnknownVar`, which the
/// assignment path converts into creating a fresh binding.
#[allow(dead_code)]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
    #[error("Unknown variable {0}!")]
    UnknownVar(String),

    #[error("Can't assign - not an lvalue!")]
    NotAnLvalue,

    #[error("Invalid operator between {0} and {1}")]
    InvalidOperands(&'static str, &'static str),

    #[error("Can't negate a {0}!")]
    NotNegatable(&'static str),

    #[error("Division by zero!")]
    DivisionByZero,

    #[error("Invalid numeric literal {0}!")]
    BadLiteral(String),

    #[error("Can't call this object!")]
    NotCallable,

    #[error("Called {kind} {name} with {got} args instead of {expected}")]
    Arity {
        kind: &'static str,
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("Function {0} must return a value!")]
    MissingReturn(String),

    #[error("Can't pass a {0} by reference!")]
    NotByRef(&'static str),

    #[error("Can't use a {0} as a boolean!")]
    NotABoolean(&'static str),

    #[error("Can't compare {0} values for equality!")]
    NotComparable(&'static str),

    #[error("Can't index a {0}!")]
    NotIndexable(&'static str),

    #[error("Array index must be an Int, not a {0}!")]
    BadIndex(&'static str),

    #[error("Array index {0} is out of bounds (length {1})")]
    IndexOutOfBounds(i64, usize),

    #[error("Array dimensions must be non-negative Ints!")]
    BadDimension,

    #[error("Classes aren't supported yet!")]
    ClassesUnsupported,

    // Native-library faults
    #[error("{name}: expected {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    NativeArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{name}: expected {expected}, got {actual}")]
    NativeType {
        name: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{name}: can't convert {what:?} to {target}")]
    NativeConvert {
        name: &'static str,
        what: String,
        target: &'static str,
    },

    #[error("{0}")]
    Io(String),
}

impl Fault {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            Fault::NativeArity { .. }
            | Fault::NativeType { .. }
            | Fault::NativeConvert { .. }
            | Fault::Io(_) => Subsystem::NativeLib,
            _ => Subsystem::Interpreter,
        }
    }
}

/// Every diagnostic the interpreter shows goes to stdout in red.
pub fn report(message: &str) {
    println!("\x1b[31m{message}\x1b[0m");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_exit_codes() {
        assert_eq!(Subsystem::Main.exit_code(), 1);
        assert_eq!(Subsystem::Parser.exit_code(), 2);
        assert_eq!(Subsystem::Interpreter.exit_code(), 3);
        assert_eq!(Subsystem::NativeLib.exit_code(), 4);
    }

    #[test]
    fn test_fault_subsystems() {
        assert_eq!(
            Fault::UnknownVar("x".to_string()).subsystem(),
            Subsystem::Interpreter
        );
        assert_eq!(
            Fault::NativeArity {
                name: "typeof",
                expected: 1,
                got: 0
            }
            .subsystem(),
            Subsystem::NativeLib
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            line: 3,
            col: 7,
            message: "Expected ')'".to_string(),
        };
        assert_eq!(err.to_string(), "[line 3:7] Expected ')'");
    }

    #[test]
    fn test_native_arity_pluralization() {
        let one = Fault::NativeArity {
            name: "typeof",
            expected: 1,
            got: 2,
        };
        assert_eq!(one.to_string(), "typeof: expected 1 argument, got 2");

        let two = Fault::NativeArity {
            name: "swap",
            expected: 2,
            got: 1,
        };
        assert_eq!(two.to_string(), "swap: expected 2 arguments, got 1");
    }

    #[test]
    fn test_fault_messages() {
        assert_eq!(
            Fault::Arity {
                kind: "function",
                name: "add".to_string(),
                got: 3,
                expected: 2
            }
            .to_string(),
            "Called function add with 3 args instead of 2"
        );
        assert_eq!(
            Fault::MissingReturn("add".to_string()).to_string(),
            "Function add must return a value!"
        );
        assert_eq!(
            Fault::InvalidOperands("String", "Int").to_string(),
            "Invalid operator between String and Int"
        );
    }
}
