//! Type inspection: typeof
//!
//! Returns the name of a value's runtime variant ("Int", "String", ...).

use std::borrow::Cow;

use crate::error::Fault;
use crate::eval::Interp;
use crate::value::Value;

pub fn native_typeof<'a>(
    _interp: &mut Interp<'a>,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault> {
    if args.len() != 1 {
        return Err(Fault::NativeArity {
            name: "typeof",
            expected: 1,
            got: args.len(),
        });
    }
    Ok(Value::Str(Cow::Borrowed(args[0].type_name())))
}
