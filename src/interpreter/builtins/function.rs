//! Function built-in methods (call, apply, bind) and the Function constructor

use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::scope::Scope;
use crate::value::{FunctionKind, JsFunction, JsValue};

use super::{arg, create_constructor, register_method};

/// Initialize the function method table with call, apply and bind
pub fn init_function_prototype(interp: &mut Interpreter) {
    let proto = interp.function_prototype.clone();

    register_method(&proto, "call", function_call, 1);
    register_method(&proto, "apply", function_apply, 2);
    register_method(&proto, "bind", function_bind, 1);
    register_method(&proto, "toString", function_to_string, 0);
}

/// Create the global Function constructor
pub fn create_function_constructor() -> JsValue {
    JsValue::Function(create_constructor(
        "Function",
        1,
        function_constructor_fn,
        function_constructor_fn,
    ))
}

/// `new Function([p1[, p2[, ...pN]],] body)`
///
/// The last argument is the body, every preceding argument holds one or more
/// comma-separated parameters. The function closes over an empty scope,
/// so only globals are visible from its body.
fn function_constructor_fn(interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let Some((body, params)) = args.split_last() else {
        return interp.build_function("", &[], &Scope::new());
    };

    let params: Vec<String> = params.iter().map(|param| param.to_js_string().to_string()).collect();
    interp.build_function(&body.to_js_string(), &params, &Scope::new())
}

fn this_function(this: &JsValue, method: &str) -> Result<Rc<JsFunction>, JsError> {
    match this {
        JsValue::Function(func) => Ok(func.clone()),
        other => Err(JsError::type_error(format!(
            "Function.prototype.{} called on {}",
            method,
            other.type_of()
        ))),
    }
}

/// Function.prototype.call(thisArg, ...args)
pub fn function_call(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    this_function(this, "call")?;
    let rest = args.get(1..).unwrap_or_default();
    interp.call_function(this, arg(args, 0), rest)
}

/// Function.prototype.apply(thisArg, argsArray)
pub fn function_apply(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    this_function(this, "apply")?;
    let call_args = match arg(args, 1) {
        JsValue::Undefined | JsValue::Null => Vec::new(),
        JsValue::Array(items) => items.borrow().clone(),
        // `arguments`-like objects are not array-like here
        _ => {
            return Err(JsError::type_error(
                "CreateListFromArrayLike called on non-object",
            ));
        }
    };
    interp.call_function(this, arg(args, 0), &call_args)
}

/// Function.prototype.bind(thisArg, ...args)
pub fn function_bind(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let target = this_function(this, "bind")?;
    Ok(JsValue::Function(Rc::new(JsFunction::new(FunctionKind::Bound {
        target,
        this: arg(args, 0),
        args: args.get(1..).unwrap_or_default().to_vec(),
    }))))
}

pub fn function_to_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let func = this_function(this, "toString")?;
    Ok(JsValue::from(func.source_text()))
}
