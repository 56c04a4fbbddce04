//! Coercion builtins: bool, string, float, int
//!
//! `bool` reports truthiness, `string` produces the canonical rendering,
//! `float` and `int` coerce from String (parsed), Int, Float and nil
//! (which coerces to zero). Anything else is a fault.

use std::borrow::Cow;

use crate::error::Fault;
use crate::eval::Interp;
use crate::value::Value;

fn single<'a>(name: &'static str, args: Vec<Value<'a>>) -> Result<Value<'a>, Fault> {
    if args.len() != 1 {
        return Err(Fault::NativeArity {
            name,
            expected: 1,
            got: args.len(),
        });
    }
    Ok(args.into_iter().next().expect("length checked above"))
}

pub fn native_bool<'a>(interp: &mut Interp<'a>, args: Vec<Value<'a>>) -> Result<Value<'a>, Fault> {
    let arg = single("bool", args)?;
    Ok(Value::Bool(interp.truthy(&arg)?))
}

pub fn native_string<'a>(
    _interp: &mut Interp<'a>,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault> {
    let arg = single("string", args)?;
    Ok(Value::Str(Cow::Owned(arg.to_string())))
}

pub fn native_float<'a>(
    _interp: &mut Interp<'a>,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault> {
    match single("float", args)? {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Fault::NativeConvert {
                name: "float",
                what: s.into_owned(),
                target: "Float",
            }),
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Float(x) => Ok(Value::Float(x)),
        Value::Nil => Ok(Value::Float(0.0)),
        other => Err(Fault::NativeType {
            name: "float",
            expected: "a String, Int, Float or nil",
            actual: other.type_name(),
        }),
    }
}

pub fn native_int<'a>(_interp: &mut Interp<'a>, args: Vec<Value<'a>>) -> Result<Value<'a>, Fault> {
    match single("int", args)? {
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Fault::NativeConvert {
                name: "int",
                what: s.into_owned(),
                target: "Int",
            }),
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Float(x) => Ok(Value::Int(x as i64)),
        Value::Nil => Ok(Value::Int(0)),
        other => Err(Fault::NativeType {
            name: "int",
            expected: "a String, Int, Float or nil",
            actual: other.type_name(),
        }),
    }
}
