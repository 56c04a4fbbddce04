//! # Native library
//!
//! The handful of builtin functions and procedures every program sees,
//! bound into the global scope when the interpreter is constructed.
//!
//! - **[console]**: `print`
//! - **[types]**: `typeof`
//! - **[convert]**: `bool`, `string`, `float`, `int`
//!
//! Natives receive their arguments eagerly dereferenced and copied;
//! procedures always yield nil at the call site.

use crate::eval::Interp;
use crate::value::Value;

pub mod console;
pub mod convert;
pub mod types;

/// Bind the whole native library into the global scope.
pub fn register<'a>(interp: &mut Interp<'a>) {
    interp.define_global("print", Value::NativeProc("print", console::native_print));
    interp.define_global("typeof", Value::NativeFunc("typeof", types::native_typeof));
    interp.define_global("bool", Value::NativeFunc("bool", convert::native_bool));
    interp.define_global("string", Value::NativeFunc("string", convert::native_string));
    interp.define_global("float", Value::NativeFunc("float", convert::native_float));
    interp.define_global("int", Value::NativeFunc("int", convert::native_int));
}
