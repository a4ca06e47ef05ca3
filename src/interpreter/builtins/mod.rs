//! Built-in function implementations for the JavaScript standard library

pub mod array;
pub mod date;
pub mod function;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod regexp;
pub mod string;

use std::rc::Rc;

use indexmap::IndexMap;

use crate::interpreter::Interpreter;
use crate::value::{FunctionKind, JsFunction, JsString, JsValue, NativeFn, NativeFunction, ObjectRef};

/// Install every global and method table into a fresh interpreter
pub fn install(interp: &mut Interpreter) {
    object::init_object_prototype(interp);
    function::init_function_prototype(interp);
    array::init_array_prototype(interp);
    string::init_string_prototype(interp);
    number::init_number_prototype(interp);
    regexp::init_regexp_prototype(interp);
    date::init_date_prototype(interp);

    global::register_global_functions(interp);
    define_global(interp, "Object", object::create_object_constructor());
    define_global(interp, "Function", function::create_function_constructor());
    define_global(interp, "Array", array::create_array_constructor());
    define_global(interp, "String", string::create_string_constructor());
    define_global(interp, "Number", number::create_number_constructor());
    define_global(interp, "RegExp", regexp::create_regexp_constructor());
    define_global(interp, "Date", date::create_date_constructor());
    define_global(interp, "Math", math::create_math_object());
    define_global(interp, "JSON", json::create_json_object());
}

pub fn define_global(interp: &mut Interpreter, name: &str, value: JsValue) {
    interp.globals.insert(JsString::from(name), value);
}

/// Add a native method to a method table or namespace object
pub fn register_method(target: &ObjectRef, name: &'static str, func: NativeFn, arity: u32) {
    target
        .borrow_mut()
        .insert(JsString::from(name), JsValue::Function(Rc::new(JsFunction::native(name, arity, func))));
}

/// A native function that behaves differently under `new`
pub fn create_constructor(name: &'static str, arity: u32, func: NativeFn, constructor: NativeFn) -> Rc<JsFunction> {
    Rc::new(JsFunction::new(FunctionKind::Native(NativeFunction {
        name,
        func,
        constructor: Some(constructor),
        arity,
    })))
}

/// A plain namespace object such as `Math` or `JSON`
pub fn create_namespace() -> ObjectRef {
    ObjectRef::new(std::cell::RefCell::new(IndexMap::new()))
}

/// The argument at `index`, or `undefined`
pub fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}

/// Relative index resolution shared by `slice`-like methods
pub fn relative_index(value: &JsValue, length: usize, default: usize) -> usize {
    if matches!(value, JsValue::Undefined) {
        return default;
    }
    let n = value.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (length as f64 + n).max(0.0) as usize
    } else {
        n.min(length as f64) as usize
    }
}
