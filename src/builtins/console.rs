//! Console output: print
//!
//! `print` renders every argument with the canonical rendering,
//! concatenated with no separator, then writes a single newline.

use std::io::Write;

use crate::error::Fault;
use crate::eval::Interp;
use crate::value::Value;

/// Writes the stringified arguments to the interpreter's output stream.
pub fn native_print<'a>(interp: &mut Interp<'a>, args: Vec<Value<'a>>) -> Result<Value<'a>, Fault> {
    for arg in &args {
        write!(interp.out(), "{arg}").map_err(|e| Fault::Io(e.to_string()))?;
    }
    writeln!(interp.out()).map_err(|e| Fault::Io(e.to_string()))?;
    Ok(Value::Nil)
}
