//! Array built-in methods

use std::cmp::Ordering;

use crate::error::JsError;
use crate::interpreter::{Interpreter, MAX_ARRAY_LENGTH};
use crate::value::{ArrayRef, JsValue, join_values};

use super::{arg, create_constructor, register_method, relative_index};

/// Initialize the array method table
pub fn init_array_prototype(interp: &mut Interpreter) {
    let proto = interp.array_prototype.clone();

    // Mutating methods
    register_method(&proto, "push", array_push, 1);
    register_method(&proto, "pop", array_pop, 0);
    register_method(&proto, "shift", array_shift, 0);
    register_method(&proto, "unshift", array_unshift, 1);
    register_method(&proto, "splice", array_splice, 2);
    register_method(&proto, "reverse", array_reverse, 0);
    register_method(&proto, "sort", array_sort, 1);
    register_method(&proto, "fill", array_fill, 3);

    // Accessor methods
    register_method(&proto, "concat", array_concat, 1);
    register_method(&proto, "slice", array_slice, 2);
    register_method(&proto, "join", array_join, 1);
    register_method(&proto, "toString", array_to_string, 0);
    register_method(&proto, "indexOf", array_index_of, 1);
    register_method(&proto, "lastIndexOf", array_last_index_of, 1);
    register_method(&proto, "includes", array_includes, 1);

    // Iteration methods
    register_method(&proto, "forEach", array_foreach, 1);
    register_method(&proto, "map", array_map, 1);
    register_method(&proto, "filter", array_filter, 1);
    register_method(&proto, "reduce", array_reduce, 1);
    register_method(&proto, "find", array_find, 1);
    register_method(&proto, "findIndex", array_find_index, 1);
    register_method(&proto, "every", array_every, 1);
    register_method(&proto, "some", array_some, 1);
}

/// Create the Array constructor with `Array.isArray`
pub fn create_array_constructor() -> JsValue {
    let constructor = create_constructor("Array", 1, array_constructor_fn, array_constructor_fn);
    register_method(&constructor.properties, "isArray", array_is_array, 1);
    JsValue::Function(constructor)
}

pub fn array_constructor_fn(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    if let [JsValue::Number(n)] = args {
        if n.fract() != 0.0 || *n < 0.0 || *n > MAX_ARRAY_LENGTH as f64 {
            return Err(JsError::range_error("Invalid array length"));
        }
        return Ok(JsValue::new_array(vec![JsValue::Undefined; *n as usize]));
    }
    Ok(JsValue::new_array(args.to_vec()))
}

pub fn array_is_array(_interp: &mut Interpreter, _this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(args.first(), Some(JsValue::Array(_)))))
}

fn this_array(this: &JsValue) -> Result<&ArrayRef, JsError> {
    match this {
        JsValue::Array(items) => Ok(items),
        other => Err(JsError::type_error(format!(
            "Array.prototype method called on {}",
            other.type_of()
        ))),
    }
}

fn callback(args: &[JsValue], method: &str) -> Result<JsValue, JsError> {
    let func = arg(args, 0);
    if !func.is_callable() {
        return Err(JsError::type_error(format!(
            "{} is not a function (in Array.prototype.{})",
            func, method
        )));
    }
    Ok(func)
}

/// Call `func(element, index, array)` for every index present when the
/// iteration started. Elements removed by the callback are skipped.
fn for_each_element(
    interp: &mut Interpreter,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
    mut visit: impl FnMut(usize, JsValue, JsValue) -> bool,
) -> Result<(), JsError> {
    let items = this_array(this)?;
    let func = callback(args, method)?;
    let this_arg = arg(args, 1);
    let length = items.borrow().len();
    for index in 0..length {
        let Some(element) = items.borrow().get(index).cloned() else {
            break;
        };
        let result = interp.call_function(
            &func,
            this_arg.clone(),
            &[element.clone(), JsValue::from(index), this.clone()],
        )?;
        if !visit(index, element, result) {
            break;
        }
    }
    Ok(())
}

pub fn array_push(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    items.extend(args.iter().cloned());
    Ok(JsValue::from(items.len()))
}

pub fn array_pop(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(this_array(this)?.borrow_mut().pop().unwrap_or_default())
}

pub fn array_shift(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    if items.is_empty() {
        return Ok(JsValue::Undefined);
    }
    Ok(items.remove(0))
}

pub fn array_unshift(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    items.splice(0..0, args.iter().cloned());
    Ok(JsValue::from(items.len()))
}

pub fn array_splice(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let length = items.len();
    let start = relative_index(&arg(args, 0), length, 0);
    let delete_count = match args.len() {
        0 => 0,
        1 => length - start,
        _ => {
            let n = arg(args, 1).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            n.clamp(0.0, (length - start) as f64) as usize
        }
    };
    let inserted = args.get(2..).unwrap_or_default().iter().cloned();
    let removed: Vec<JsValue> = items.splice(start..start + delete_count, inserted).collect();
    Ok(JsValue::new_array(removed))
}

pub fn array_reverse(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    this_array(this)?.borrow_mut().reverse();
    Ok(this.clone())
}

/// Default sort order: `undefined` last, everything else by string value
fn default_compare(a: &JsValue, b: &JsValue) -> Ordering {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => Ordering::Equal,
        (JsValue::Undefined, _) => Ordering::Greater,
        (_, JsValue::Undefined) => Ordering::Less,
        _ => a
            .to_js_string()
            .encode_utf16()
            .cmp(b.to_js_string().encode_utf16()),
    }
}

fn compare_with(interp: &mut Interpreter, comparator: &JsValue, a: &JsValue, b: &JsValue) -> Result<Ordering, JsError> {
    // The comparator never sees `undefined`
    if matches!(comparator, JsValue::Undefined) || matches!(a, JsValue::Undefined) || matches!(b, JsValue::Undefined) {
        return Ok(default_compare(a, b));
    }
    let result = interp
        .call_function(comparator, JsValue::Undefined, &[a.clone(), b.clone()])?
        .to_number();
    Ok(result.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
}

/// Stable merge sort whose comparator may fail
fn merge_sort(interp: &mut Interpreter, items: Vec<JsValue>, comparator: &JsValue) -> Result<Vec<JsValue>, JsError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(interp, left, comparator)?;
    let right = merge_sort(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        let next = if compare_with(interp, comparator, a, b)? == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

pub fn array_sort(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let comparator = arg(args, 0);
    if !matches!(comparator, JsValue::Undefined) && !comparator.is_callable() {
        return Err(JsError::type_error(
            "The comparison function must be either a function or undefined",
        ));
    }
    let snapshot = items.borrow().clone();
    let sorted = merge_sort(interp, snapshot, &comparator)?;
    *items.borrow_mut() = sorted;
    Ok(this.clone())
}

pub fn array_fill(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let mut items = items.borrow_mut();
    let length = items.len();
    let start = relative_index(&arg(args, 1), length, 0);
    let end = relative_index(&arg(args, 2), length, length);
    let value = arg(args, 0);
    for slot in items.iter_mut().take(end).skip(start) {
        *slot = value.clone();
    }
    drop(items);
    Ok(this.clone())
}

pub fn array_concat(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut result = this_array(this)?.borrow().clone();
    for value in args {
        match value {
            JsValue::Array(other) => result.extend(other.borrow().iter().cloned()),
            other => result.push(other.clone()),
        }
    }
    Ok(JsValue::new_array(result))
}

pub fn array_slice(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?.borrow();
    let length = items.len();
    let start = relative_index(&arg(args, 0), length, 0);
    let end = relative_index(&arg(args, 1), length, length);
    let slice = items.get(start..end.max(start)).unwrap_or_default();
    Ok(JsValue::new_array(slice.to_vec()))
}

pub fn array_join(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?.borrow();
    let separator = match arg(args, 0) {
        JsValue::Undefined => ",".into(),
        value => value.to_js_string(),
    };
    Ok(JsValue::from(join_values(&items, &separator)))
}

pub fn array_to_string(_interp: &mut Interpreter, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?.borrow();
    Ok(JsValue::from(join_values(&items, ",")))
}

pub fn array_index_of(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?.borrow();
    let target = arg(args, 0);
    let start = relative_index(&arg(args, 1), items.len(), 0);
    let found = items
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, item)| item.strict_equals(&target))
        .map(|(index, _)| index as f64);
    Ok(JsValue::Number(found.unwrap_or(-1.0)))
}

pub fn array_last_index_of(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?.borrow();
    let target = arg(args, 0);
    let last = match args.get(1) {
        None => items.len(),
        Some(from) => relative_index(from, items.len(), 0).saturating_add(1),
    };
    let found = items
        .iter()
        .enumerate()
        .take(last)
        .rev()
        .find(|(_, item)| item.strict_equals(&target))
        .map(|(index, _)| index as f64);
    Ok(JsValue::Number(found.unwrap_or(-1.0)))
}

pub fn array_includes(_interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?.borrow();
    let target = arg(args, 0);
    let start = relative_index(&arg(args, 1), items.len(), 0);
    // SameValueZero: NaN finds NaN
    let found = items.iter().skip(start).any(|item| match (item, &target) {
        (JsValue::Number(a), JsValue::Number(b)) if a.is_nan() && b.is_nan() => true,
        _ => item.strict_equals(&target),
    });
    Ok(JsValue::Boolean(found))
}

pub fn array_foreach(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    for_each_element(interp, this, args, "forEach", |_, _, _| true)?;
    Ok(JsValue::Undefined)
}

pub fn array_map(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut mapped = Vec::new();
    for_each_element(interp, this, args, "map", |_, _, result| {
        mapped.push(result);
        true
    })?;
    Ok(JsValue::new_array(mapped))
}

pub fn array_filter(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut kept = Vec::new();
    for_each_element(interp, this, args, "filter", |_, element, result| {
        if result.to_boolean() {
            kept.push(element);
        }
        true
    })?;
    Ok(JsValue::new_array(kept))
}

pub fn array_find(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut found = JsValue::Undefined;
    for_each_element(interp, this, args, "find", |_, element, result| {
        if result.to_boolean() {
            found = element;
            return false;
        }
        true
    })?;
    Ok(found)
}

pub fn array_find_index(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut found = -1.0;
    for_each_element(interp, this, args, "findIndex", |index, _, result| {
        if result.to_boolean() {
            found = index as f64;
            return false;
        }
        true
    })?;
    Ok(JsValue::Number(found))
}

pub fn array_every(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut all = true;
    for_each_element(interp, this, args, "every", |_, _, result| {
        all = result.to_boolean();
        all
    })?;
    Ok(JsValue::Boolean(all))
}

pub fn array_some(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut any = false;
    for_each_element(interp, this, args, "some", |_, _, result| {
        any = result.to_boolean();
        !any
    })?;
    Ok(JsValue::Boolean(any))
}

pub fn array_reduce(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = this_array(this)?;
    let func = callback(args, "reduce")?;
    let length = items.borrow().len();

    let mut index = 0;
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => {
            let Some(first) = items.borrow().first().cloned() else {
                return Err(JsError::type_error("Reduce of empty array with no initial value"));
            };
            index = 1;
            first
        }
    };

    while index < length {
        let Some(element) = items.borrow().get(index).cloned() else {
            break;
        };
        accumulator = interp.call_function(
            &func,
            JsValue::Undefined,
            &[accumulator, element, JsValue::from(index), this.clone()],
        )?;
        index += 1;
    }
    Ok(accumulator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> JsValue {
        JsValue::new_array(values.iter().map(|n| JsValue::Number(*n)).collect())
    }

    #[test]
    fn test_splice_returns_removed() {
        let mut interp = Interpreter::new();
        let array = numbers(&[1.0, 2.0, 3.0, 4.0]);
        let removed = array_splice(
            &mut interp,
            &array,
            &[JsValue::from(1), JsValue::from(2), JsValue::from("x")],
        )
        .unwrap();
        assert_eq!(removed.to_string(), "2,3");
        assert_eq!(array.to_string(), "1,x,4");
    }

    #[test]
    fn test_default_sort_is_lexicographic() {
        let mut interp = Interpreter::new();
        let array = numbers(&[10.0, 9.0, 1.0]);
        array_sort(&mut interp, &array, &[]).unwrap();
        assert_eq!(array.to_string(), "1,10,9");
    }

    #[test]
    fn test_sort_keeps_undefined_last() {
        let mut interp = Interpreter::new();
        let array = JsValue::new_array(vec![JsValue::Undefined, JsValue::from("b"), JsValue::from("a")]);
        array_sort(&mut interp, &array, &[]).unwrap();
        assert_eq!(array.to_string(), "a,b,");
    }

    #[test]
    fn test_new_array_with_length() {
        let mut interp = Interpreter::new();
        let array = array_constructor_fn(&mut interp, &JsValue::Undefined, &[JsValue::from(3)]).unwrap();
        assert_eq!(array.to_string(), ",,");
        assert!(array_constructor_fn(&mut interp, &JsValue::Undefined, &[JsValue::from(-1)]).is_err());
    }

    #[test]
    fn test_includes_nan() {
        let mut interp = Interpreter::new();
        let array = numbers(&[f64::NAN]);
        let found = array_includes(&mut interp, &array, &[JsValue::Number(f64::NAN)]).unwrap();
        assert_eq!(found, JsValue::Boolean(true));
        let index = array_index_of(&mut interp, &array, &[JsValue::Number(f64::NAN)]).unwrap();
        assert_eq!(index, JsValue::from(-1));
    }
}
