//! Layered lexical namespace
//!
//! A [`Scope`] is a list of binding layers, innermost first. Layers are
//! shared by reference, so a closure that captured a scope observes later
//! writes made through any other scope sharing the same layers.
//!
//! Freezing a scope makes all of its current layers read-only. Scopes
//! extended from a frozen scope can bind new names in their own layers but
//! still cannot write through to the frozen ones.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::JsError;
use crate::value::{JsString, JsValue};

pub type Layer = Rc<RefCell<FxHashMap<JsString, JsValue>>>;

#[derive(Clone, Default)]
pub struct Scope {
    layers: Vec<Layer>,
    /// Index of the first read-only layer
    frozen_from: Option<usize>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::default()],
            frozen_from: None,
        }
    }

    /// A scope whose single layer holds `bindings`
    pub fn with_bindings(bindings: impl IntoIterator<Item = (JsString, JsValue)>) -> Self {
        let layer: FxHashMap<JsString, JsValue> = bindings.into_iter().collect();
        Self {
            layers: vec![Rc::new(RefCell::new(layer))],
            frozen_from: None,
        }
    }

    /// A new mutable scope with a fresh innermost layer on top of this one
    pub fn extend(&self) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(Layer::default());
        layers.extend(self.layers.iter().cloned());
        Self {
            layers,
            frozen_from: self.frozen_from.map(|index| index + 1),
        }
    }

    /// A view of the same layers that rejects every mutation
    pub fn frozen(&self) -> Self {
        Self {
            layers: self.layers.clone(),
            frozen_from: Some(0),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_from == Some(0)
    }

    pub fn get(&self, name: &str) -> Option<JsValue> {
        self.layers
            .iter()
            .find_map(|layer| layer.borrow().get(name).cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.borrow().contains_key(name))
    }

    /// Bind `name` in the innermost layer, shadowing outer bindings
    pub fn declare(&self, name: JsString, value: JsValue) -> Result<(), JsError> {
        self.check_writable(0, &name)?;
        if let Some(layer) = self.layers.first() {
            layer.borrow_mut().insert(name, value);
        }
        Ok(())
    }

    /// Assign to the first layer that owns `name`, or create it in the
    /// innermost layer
    pub fn set(&self, name: JsString, value: JsValue) -> Result<(), JsError> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.borrow().contains_key(name.as_str()))
            .unwrap_or(0);
        self.check_writable(index, &name)?;
        if let Some(layer) = self.layers.get(index) {
            layer.borrow_mut().insert(name, value);
        }
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<(), JsError> {
        Err(JsError::usage(format!(
            "Cannot delete binding {:?}: scopes do not support deletion",
            name
        )))
    }

    fn check_writable(&self, index: usize, name: &str) -> Result<(), JsError> {
        if self.frozen_from.is_some_and(|frozen| index >= frozen) {
            return Err(JsError::usage(format!(
                "Cannot assign to {:?} in an immutable scope",
                name
            )));
        }
        Ok(())
    }
}
