//! Tree-walking evaluator
//!
//! Statements produce a [`Completion`] that every compound construct checks
//! explicitly. Host errors (`JsError`) travel separately through `Result`;
//! a guest `throw` becomes `JsError::Thrown` only when it leaves a function.

pub mod builtins;
pub mod extract;
pub mod operators;

use std::rc::Rc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::ast::{
    ArrayElement, AssignmentExpression, AssignmentOp, CallExpression, Declaration, Expression,
    ForBinding, ForInit, FunctionBody, FunctionNode, LiteralValue, LogicalOp,
    Loop, LoopHead, MemberProperty, Program, Property, PropertyKey, Statement, SwitchCase,
    TryStatement, UnaryOp, UpdateOp, VariableKind,
};
use crate::error::JsError;
use crate::parser::Parser;
use crate::scope::Scope;
use crate::value::{FunctionKind, JsFunction, JsRegExp, JsString, JsValue, ObjectRef};

use self::operators::binary_operation;

/// Nested calls beyond this depth raise a RangeError
pub const MAX_CALL_DEPTH: usize = 400;

/// Longest dense array the evaluator allocates
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

/// Longest string built by `repeat` and padding, in UTF-16 units
pub const MAX_STRING_LENGTH: usize = 1 << 26;

/// Completion record for control flow
#[derive(Debug)]
pub enum Completion {
    Normal(JsValue),
    /// Declarations and empty statements leave the running value alone
    Empty,
    Return(JsValue),
    Break(Option<JsString>),
    Continue(Option<JsString>),
    Throw(JsValue),
}

/// Assignment target with its subexpressions already evaluated
enum Reference<'e> {
    Binding(&'e JsString),
    Member(JsValue, JsValue),
}

/// What a loop does after one execution of its body
enum LoopFlow {
    Next,
    Exit,
    Propagate(Completion),
}

/// The interpreter state
pub struct Interpreter {
    /// Built-ins and definitions resolved lazily from `full_code`
    pub globals: FxHashMap<JsString, JsValue>,
    /// Method tables consulted for member access on each kind of value
    pub object_prototype: ObjectRef,
    pub function_prototype: ObjectRef,
    pub array_prototype: ObjectRef,
    pub string_prototype: ObjectRef,
    pub number_prototype: ObjectRef,
    pub regexp_prototype: ObjectRef,
    pub date_prototype: ObjectRef,
    /// Text written through `console.log`
    pub output: String,
    full_code: Option<Rc<str>>,
    /// Names whose lazy resolution is in progress
    resolving: Vec<JsString>,
    deadline: Option<(Instant, Duration)>,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create a new interpreter with the built-in globals installed
    pub fn new() -> Self {
        let mut interp = Self {
            globals: FxHashMap::default(),
            object_prototype: ObjectRef::default(),
            function_prototype: ObjectRef::default(),
            array_prototype: ObjectRef::default(),
            string_prototype: ObjectRef::default(),
            number_prototype: ObjectRef::default(),
            regexp_prototype: ObjectRef::default(),
            date_prototype: ObjectRef::default(),
            output: String::new(),
            full_code: None,
            resolving: Vec::new(),
            deadline: None,
            depth: 0,
        };
        builtins::install(&mut interp);
        interp
    }

    /// Source searched for definitions of otherwise unknown names
    pub fn with_full_code(mut self, source: &str) -> Self {
        self.full_code = Some(Rc::from(source));
        self
    }

    /// Start the execution clock. `None` disables the limit.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.deadline = timeout.map(|limit| (Instant::now() + limit, limit));
    }

    /// Locate a named function in `source` and return its body and parameters
    pub fn extract_function_code(
        name: &str,
        source: &str,
    ) -> Result<(String, Vec<String>), JsError> {
        extract::extract_function_code(name, source)
    }

    /// Build a callable from a function body and parameter source texts,
    /// closing over `scope`. Parameters may carry defaults or a rest marker.
    pub fn build_function(
        &mut self,
        code: &str,
        params: &[String],
        scope: &Scope,
    ) -> Result<JsValue, JsError> {
        let source = format!("(function({}) {{\n{}\n}})", params.join(", "), code);
        let program = Parser::new(&source).parse_program()?;
        let node = match program.body.as_slice() {
            [Statement::Expression(expr)] => match &**expr {
                Expression::Parenthesized(inner, _) => match &**inner {
                    Expression::Function(node) => Some(node.clone()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        let Some(node) = node else {
            return Err(JsError::syntax_error("function body does not close where it started", 1, 1));
        };
        Ok(self.create_function(node, scope))
    }

    /// Parse and run `source` as a program, returning its completion value
    pub fn eval(&mut self, source: &str, scope: &Scope) -> Result<JsValue, JsError> {
        let program = Parser::new(source).parse_program()?;
        self.execute_program(&program, scope)
    }

    pub fn execute_program(&mut self, program: &Program, scope: &Scope) -> Result<JsValue, JsError> {
        self.hoist_declarations(&program.body, scope)?;
        let mut result = JsValue::Undefined;
        for stmt in &program.body {
            match self.execute_statement(stmt, scope)? {
                Completion::Normal(value) => result = value,
                Completion::Empty => {}
                Completion::Return(value) => return Ok(value),
                Completion::Throw(value) => return Err(JsError::Thrown(value)),
                Completion::Break(_) => {
                    return Err(JsError::syntax_error("Illegal break statement", 0, 0));
                }
                Completion::Continue(_) => {
                    return Err(JsError::syntax_error("Illegal continue statement", 0, 0));
                }
            }
        }
        Ok(result)
    }

    pub fn create_function(&self, node: Rc<FunctionNode>, scope: &Scope) -> JsValue {
        JsValue::Function(Rc::new(JsFunction::new(FunctionKind::Interpreted {
            node,
            closure: scope.clone(),
        })))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    /// Execute a statement
    pub fn execute_statement(&mut self, stmt: &Statement, scope: &Scope) -> Result<Completion, JsError> {
        crate::with_stack(|| self.execute_step(stmt, scope))
    }

    fn execute_step(&mut self, stmt: &Statement, scope: &Scope) -> Result<Completion, JsError> {
        let value = match stmt {
            Statement::Expression(expr) => self.evaluate(expr, scope)?,
            Statement::Declaration(decl) => {
                self.declare(decl, scope)?;
                return Ok(Completion::Empty);
            }
            Statement::Function(_) | Statement::Empty => return Ok(Completion::Empty),
            Statement::Block(body) => return self.execute_statements(body, scope),
            Statement::If {
                test,
                then,
                otherwise,
            } => {
                if self.evaluate(test, scope)?.to_boolean() {
                    return self.execute_statement(then, scope);
                }
                match otherwise {
                    Some(otherwise) => return self.execute_statement(otherwise, scope),
                    None => JsValue::Undefined,
                }
            }
            Statement::Loop(each) => return self.execute_loop(each, None, scope),
            Statement::Switch {
                discriminant,
                cases,
            } => return self.execute_switch(discriminant, cases, scope),
            Statement::Try(try_stmt) => return self.execute_try(try_stmt, scope),
            Statement::Return(argument) => {
                let value = match argument {
                    Some(arg) => self.evaluate(arg, scope)?,
                    None => JsValue::Undefined,
                };
                return Ok(Completion::Return(value));
            }
            Statement::Break(label) => return Ok(Completion::Break(label.clone())),
            Statement::Continue(label) => return Ok(Completion::Continue(label.clone())),
            Statement::Throw(argument) => return Ok(Completion::Throw(self.evaluate(argument, scope)?)),
            Statement::Labeled { label, body } => {
                let completion = match body.as_ref() {
                    Statement::Loop(each) => self.execute_loop(each, Some(label), scope)?,
                    other => self.execute_statement(other, scope)?,
                };
                return Ok(match completion {
                    Completion::Break(Some(target)) if target == *label => {
                        Completion::Normal(JsValue::Undefined)
                    }
                    other => other,
                });
            }
        };
        Ok(Completion::Normal(value))
    }

    fn declare(&mut self, decl: &Declaration, scope: &Scope) -> Result<(), JsError> {
        for (name, init) in &decl.bindings {
            let value = match init {
                Some(init) => self.evaluate(init, scope)?,
                // `var x;` does not reset an existing binding
                None if decl.kind == VariableKind::Var && scope.contains(name) => continue,
                None => JsValue::Undefined,
            };
            scope.declare(name.clone(), value)?;
        }
        Ok(())
    }

    /// Bind every function declared directly in `statements`
    fn hoist_declarations(&mut self, statements: &[Statement], scope: &Scope) -> Result<(), JsError> {
        let declared = statements.iter().filter_map(|stmt| match stmt {
            Statement::Function(node) => node.name.as_ref().map(|name| (name, node)),
            _ => None,
        });
        for (name, node) in declared {
            let func = self.create_function(node.clone(), scope);
            scope.declare(name.clone(), func)?;
        }
        Ok(())
    }

    fn execute_statements(&mut self, statements: &[Statement], scope: &Scope) -> Result<Completion, JsError> {
        self.hoist_declarations(statements, scope)?;
        let mut result = None;
        for stmt in statements {
            match self.execute_statement(stmt, scope)? {
                Completion::Normal(value) => result = Some(value),
                Completion::Empty => {}
                other => return Ok(other),
            }
        }
        Ok(result.map_or(Completion::Empty, Completion::Normal))
    }

    /// Decide how a loop proceeds after its body completed with `completion`
    fn loop_flow(completion: Completion, label: Option<&JsString>) -> LoopFlow {
        match completion {
            Completion::Normal(_) | Completion::Empty | Completion::Continue(None) => LoopFlow::Next,
            Completion::Break(None) => LoopFlow::Exit,
            Completion::Continue(Some(target)) if label == Some(&target) => LoopFlow::Next,
            Completion::Break(Some(target)) if label == Some(&target) => LoopFlow::Exit,
            other => LoopFlow::Propagate(other),
        }
    }

    fn execute_loop(&mut self, each: &Loop, label: Option<&JsString>, scope: &Scope) -> Result<Completion, JsError> {
        let (test, update) = match &each.head {
            LoopHead::While(test) => (Some(test), None),
            LoopHead::DoWhile(test) => {
                // The first pass runs before the test
                match Self::loop_flow(self.execute_statement(&each.body, scope)?, label) {
                    LoopFlow::Next => {}
                    LoopFlow::Exit => return Ok(Completion::Normal(JsValue::Undefined)),
                    LoopFlow::Propagate(completion) => return Ok(completion),
                }
                (Some(test), None)
            }
            LoopHead::For { init, test, update } => {
                match init {
                    Some(ForInit::Declaration(decl)) => self.declare(decl, scope)?,
                    Some(ForInit::Expression(expr)) => {
                        self.evaluate(expr, scope)?;
                    }
                    None => {}
                }
                (test.as_ref(), update.as_ref())
            }
            LoopHead::ForIn(binding, right) => {
                let keys = self.enumerate_keys(right, scope)?;
                return self.iterate(binding, keys, &each.body, label, scope);
            }
            LoopHead::ForOf(binding, right) => {
                let values = self.enumerate_values(right, scope)?;
                return self.iterate(binding, values, &each.body, label, scope);
            }
        };

        loop {
            self.check_deadline()?;
            if let Some(test) = test {
                if !self.evaluate(test, scope)?.to_boolean() {
                    break;
                }
            }
            match Self::loop_flow(self.execute_statement(&each.body, scope)?, label) {
                LoopFlow::Next => {}
                LoopFlow::Exit => break,
                LoopFlow::Propagate(completion) => return Ok(completion),
            }
            if let Some(update) = update {
                self.evaluate(update, scope)?;
            }
        }
        Ok(Completion::Normal(JsValue::Undefined))
    }

    /// The keys `for (k in right)` walks
    fn enumerate_keys(&mut self, right: &Expression, scope: &Scope) -> Result<Vec<JsValue>, JsError> {
        let index_keys = |len: usize| -> Vec<JsValue> { (0..len).map(|i| JsValue::from(i.to_string())).collect() };
        Ok(match self.evaluate(right, scope)? {
            JsValue::Object(entries) => entries.borrow().keys().cloned().map(JsValue::String).collect(),
            JsValue::Function(func) => func.properties.borrow().keys().cloned().map(JsValue::String).collect(),
            JsValue::Array(items) => index_keys(items.borrow().len()),
            JsValue::String(s) => index_keys(s.utf16_len()),
            _ => Vec::new(),
        })
    }

    /// The values `for (v of right)` walks
    fn enumerate_values(&mut self, right: &Expression, scope: &Scope) -> Result<Vec<JsValue>, JsError> {
        match self.evaluate(right, scope)? {
            JsValue::Array(items) => Ok(items.borrow().clone()),
            JsValue::String(s) => Ok(s.chars().map(|c| JsValue::from(c.to_string())).collect()),
            other => Err(JsError::type_error(format!("{} is not iterable", other.type_of()))),
        }
    }

    fn iterate(
        &mut self,
        binding: &ForBinding,
        items: Vec<JsValue>,
        body: &Statement,
        label: Option<&JsString>,
        scope: &Scope,
    ) -> Result<Completion, JsError> {
        for item in items {
            self.check_deadline()?;
            if binding.declared {
                scope.declare(binding.name.clone(), item)?;
            } else {
                self.assign_identifier(&binding.name, item, scope)?;
            }
            match Self::loop_flow(self.execute_statement(body, scope)?, label) {
                LoopFlow::Next => {}
                LoopFlow::Exit => break,
                LoopFlow::Propagate(completion) => return Ok(completion),
            }
        }
        Ok(Completion::Normal(JsValue::Undefined))
    }

    fn execute_switch(
        &mut self,
        discriminant: &Expression,
        cases: &[SwitchCase],
        scope: &Scope,
    ) -> Result<Completion, JsError> {
        let discriminant = self.evaluate(discriminant, scope)?;

        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            let Some(test) = &case.test else {
                continue;
            };
            if discriminant.strict_equals(&self.evaluate(test, scope)?) {
                start = Some(i);
                break;
            }
        }
        // `default` takes part in fallthrough from its own position
        let Some(start) = start.or_else(|| cases.iter().position(|case| case.test.is_none())) else {
            return Ok(Completion::Normal(JsValue::Undefined));
        };

        for case in cases.iter().skip(start) {
            match self.execute_statements(&case.body, scope)? {
                Completion::Normal(_) | Completion::Empty => {}
                Completion::Break(None) => break,
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal(JsValue::Undefined))
    }

    /// Run a block, turning catchable errors into a `Throw` completion
    fn execute_guarded(&mut self, body: &[Statement], scope: &Scope) -> Result<Completion, JsError> {
        match self.execute_statements(body, scope) {
            Err(err) if err.is_catchable() => Ok(Completion::Throw(err.to_value())),
            other => other,
        }
    }

    fn execute_try(&mut self, try_stmt: &TryStatement, scope: &Scope) -> Result<Completion, JsError> {
        let mut completion = self.execute_guarded(&try_stmt.block, scope)?;

        let caught = match (&completion, &try_stmt.catch) {
            (Completion::Throw(thrown), Some(catch)) => Some((thrown.clone(), catch)),
            _ => None,
        };
        if let Some((thrown, (param, body))) = caught {
            let catch_scope = scope.extend();
            if let Some(param) = param {
                catch_scope.declare(param.clone(), thrown)?;
            }
            completion = self.execute_guarded(body, &catch_scope)?;
        }

        if let Some(finally) = &try_stmt.finally {
            // An abrupt finally discards whatever was pending
            match self.execute_guarded(finally, scope)? {
                Completion::Normal(_) | Completion::Empty => {}
                abrupt => return Ok(abrupt),
            }
        }

        Ok(completion)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression
    pub fn evaluate(&mut self, expr: &Expression, scope: &Scope) -> Result<JsValue, JsError> {
        crate::with_stack(|| self.evaluate_expression(expr, scope))
    }

    fn evaluate_expression(&mut self, expr: &Expression, scope: &Scope) -> Result<JsValue, JsError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Null => JsValue::Null,
                LiteralValue::Boolean(b) => JsValue::Boolean(*b),
                LiteralValue::Number(n) => JsValue::Number(*n),
                LiteralValue::String(s) => JsValue::String(s.clone()),
                LiteralValue::RegExp { pattern, flags } => {
                    JsValue::RegExp(Rc::new(JsRegExp::new(pattern.clone(), flags.clone())))
                }
            }),

            Expression::Identifier(id) => self.lookup(&id.name, scope),

            Expression::This(_) => Ok(scope.get("this").unwrap_or_default()),

            Expression::Array(array) => {
                let items = self.evaluate_elements(&array.elements, scope)?;
                Ok(JsValue::new_array(items))
            }

            Expression::Object(object) => {
                let mut entries = IndexMap::new();
                for prop in &object.properties {
                    match prop {
                        Property::KeyValue { key, value } => {
                            let key = match key {
                                PropertyKey::Static(name) => name.clone(),
                                PropertyKey::Computed(expr) => self.evaluate(expr, scope)?.to_js_string(),
                            };
                            let value = self.evaluate(value, scope)?;
                            entries.insert(key, value);
                        }
                        Property::Spread(expr) => match self.evaluate(expr, scope)? {
                            JsValue::Object(source) => {
                                for (k, v) in source.borrow().iter() {
                                    entries.insert(k.clone(), v.clone());
                                }
                            }
                            JsValue::Array(source) => {
                                for (i, v) in source.borrow().iter().enumerate() {
                                    entries.insert(JsString::from(i.to_string()), v.clone());
                                }
                            }
                            _ => {}
                        },
                    }
                }
                Ok(JsValue::new_object(entries))
            }

            Expression::Function(node) => Ok(self.create_function(node.clone(), scope)),

            Expression::Template(template) => {
                let mut result = String::new();
                for (i, quasi) in template.quasis.iter().enumerate() {
                    result.push_str(quasi);
                    if let Some(expr) = template.expressions.get(i) {
                        let value = self.evaluate(expr, scope)?;
                        result.push_str(&value.to_primitive(false).to_js_string());
                    }
                }
                Ok(JsValue::from(result))
            }

            Expression::Unary(unary) => self.evaluate_unary(unary.operator, &unary.argument, scope),

            Expression::Update(update) => {
                let delta = match update.operator {
                    UpdateOp::Increment => 1.0,
                    UpdateOp::Decrement => -1.0,
                };
                let target = self.resolve_reference(&update.argument, scope)?;
                let old = self.read_reference(&target, scope)?.to_number();
                let new = old + delta;
                self.write_reference(&target, JsValue::Number(new), scope)?;
                Ok(JsValue::Number(if update.prefix { new } else { old }))
            }

            Expression::Binary(binary) => {
                let left = self.evaluate(&binary.left, scope)?;
                let right = self.evaluate(&binary.right, scope)?;
                binary_operation(binary.operator, &left, &right)
            }

            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left, scope)?;
                if Self::short_circuits(logical.operator, &left) {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right, scope)
                }
            }

            Expression::Conditional(cond) => {
                if self.evaluate(&cond.test, scope)?.to_boolean() {
                    self.evaluate(&cond.consequent, scope)
                } else {
                    self.evaluate(&cond.alternate, scope)
                }
            }

            Expression::Assignment(assign) => self.evaluate_assignment(assign, scope),

            Expression::Sequence(seq) => {
                let mut result = JsValue::Undefined;
                for expr in &seq.expressions {
                    result = self.evaluate(expr, scope)?;
                }
                Ok(result)
            }

            Expression::Member(_) | Expression::Call(_) => {
                Ok(self.evaluate_chain(expr, scope)?.unwrap_or_default())
            }

            Expression::New(new) => self.evaluate_new(new, scope),

            Expression::Parenthesized(inner, _) => self.evaluate(inner, scope),
        }
    }

    /// Whether a logical operator returns its left operand without
    /// evaluating the right one
    fn short_circuits(operator: LogicalOp, left: &JsValue) -> bool {
        match operator {
            LogicalOp::And => !left.to_boolean(),
            LogicalOp::Or => left.to_boolean(),
            LogicalOp::NullishCoalescing => !left.is_null_or_undefined(),
        }
    }

    /// Resolve an identifier: lexical scope, then globals, then a lazy
    /// lookup in the full source
    pub fn lookup(&mut self, name: &JsString, scope: &Scope) -> Result<JsValue, JsError> {
        if let Some(value) = scope.get(name) {
            return Ok(value);
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        match self.resolve_global(name)? {
            Some(value) => Ok(value),
            None => Err(JsError::reference_error(name.as_str())),
        }
    }

    fn resolve_global(&mut self, name: &JsString) -> Result<Option<JsValue>, JsError> {
        let Some(source) = self.full_code.clone() else {
            return Ok(None);
        };
        if self.resolving.contains(name) {
            return Ok(None);
        }

        self.resolving.push(name.clone());
        let resolved = self.resolve_from_source(name, &source);
        self.resolving.pop();

        let resolved = resolved?;
        if let Some(value) = &resolved {
            log::trace!("resolved global {} from full source", name);
            self.globals.insert(name.clone(), value.clone());
        }
        Ok(resolved)
    }

    fn resolve_from_source(&mut self, name: &str, source: &str) -> Result<Option<JsValue>, JsError> {
        match extract::extract_function_code(name, source) {
            Ok((code, params)) => return self.build_function(&code, &params, &Scope::new()).map(Some),
            Err(JsError::NotFound { .. }) => {}
            Err(err) => return Err(err),
        }
        match extract::extract_definition(name, source)? {
            Some(definition) => {
                let value = self.eval(&format!("({})", definition), &Scope::new())?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn evaluate_elements(&mut self, elements: &[ArrayElement], scope: &Scope) -> Result<Vec<JsValue>, JsError> {
        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                ArrayElement::Expression(expr) => items.push(self.evaluate(expr, scope)?),
                ArrayElement::Hole => items.push(JsValue::Undefined),
                ArrayElement::Spread(expr) => match self.evaluate(expr, scope)? {
                    JsValue::Array(source) => items.extend(source.borrow().iter().cloned()),
                    JsValue::String(s) => items.extend(s.chars().map(|c| JsValue::from(c.to_string()))),
                    other => {
                        return Err(JsError::type_error(format!("{} is not iterable", other.type_of())));
                    }
                },
            }
        }
        Ok(items)
    }

    fn evaluate_unary(&mut self, operator: UnaryOp, argument: &Expression, scope: &Scope) -> Result<JsValue, JsError> {
        match operator {
            UnaryOp::Typeof => {
                // typeof tolerates undeclared names
                let value = match argument {
                    Expression::Identifier(id) => match self.lookup(&id.name, scope) {
                        Err(JsError::ReferenceError { .. }) => JsValue::Undefined,
                        other => other?,
                    },
                    other => self.evaluate(other, scope)?,
                };
                Ok(JsValue::from(value.type_of()))
            }
            UnaryOp::Delete => self.evaluate_delete(argument, scope),
            _ => {
                let value = self.evaluate(argument, scope)?;
                Ok(match operator {
                    UnaryOp::Minus => JsValue::Number(-value.to_number()),
                    UnaryOp::Plus => JsValue::Number(value.to_number()),
                    UnaryOp::Not => JsValue::Boolean(!value.to_boolean()),
                    UnaryOp::BitNot => JsValue::Number(f64::from(!crate::value::to_int32(value.to_number()))),
                    _ => JsValue::Undefined,
                })
            }
        }
    }

    fn evaluate_delete(&mut self, argument: &Expression, scope: &Scope) -> Result<JsValue, JsError> {
        match argument {
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, scope)?;
                let key = self.property_key(&member.property, scope)?;
                match &object {
                    JsValue::Object(entries) => {
                        entries.borrow_mut().shift_remove(key.to_js_string().as_str());
                    }
                    JsValue::Array(items) => {
                        if let Some(index) = key.as_index() {
                            if let Some(slot) = items.borrow_mut().get_mut(index) {
                                *slot = JsValue::Undefined;
                            }
                        }
                    }
                    JsValue::Function(func) => {
                        func.properties.borrow_mut().shift_remove(key.to_js_string().as_str());
                    }
                    JsValue::Undefined | JsValue::Null => {
                        return Err(JsError::type_error(format!(
                            "Cannot convert {} to object",
                            object.type_of()
                        )));
                    }
                    _ => {}
                }
                Ok(JsValue::Boolean(true))
            }
            Expression::Identifier(id) => {
                scope.delete(&id.name)?;
                Ok(JsValue::Boolean(false))
            }
            Expression::Parenthesized(inner, _) => self.evaluate_delete(inner, scope),
            other => {
                self.evaluate(other, scope)?;
                Ok(JsValue::Boolean(true))
            }
        }
    }

    fn evaluate_assignment(&mut self, assign: &AssignmentExpression, scope: &Scope) -> Result<JsValue, JsError> {
        let target = self.resolve_reference(&assign.target, scope)?;
        let value = match assign.operator {
            AssignmentOp::Assign => self.evaluate(&assign.value, scope)?,
            AssignmentOp::Binary(op) => {
                let current = self.read_reference(&target, scope)?;
                let right = self.evaluate(&assign.value, scope)?;
                binary_operation(op, &current, &right)?
            }
            AssignmentOp::Logical(op) => {
                let current = self.read_reference(&target, scope)?;
                if Self::short_circuits(op, &current) {
                    return Ok(current);
                }
                self.evaluate(&assign.value, scope)?
            }
        };
        self.write_reference(&target, value.clone(), scope)?;
        Ok(value)
    }

    /// Evaluate the object and key of an assignment target exactly once
    fn resolve_reference<'e>(&mut self, target: &'e Expression, scope: &Scope) -> Result<Reference<'e>, JsError> {
        match target {
            Expression::Identifier(id) => Ok(Reference::Binding(&id.name)),
            Expression::Member(member) => {
                let object = self.evaluate(&member.object, scope)?;
                let key = self.property_key(&member.property, scope)?;
                Ok(Reference::Member(object, key))
            }
            Expression::Parenthesized(inner, _) => self.resolve_reference(inner, scope),
            other => Err(JsError::syntax_error(
                "Invalid left-hand side in assignment",
                other.span().line,
                other.span().column,
            )),
        }
    }

    fn read_reference(&mut self, target: &Reference<'_>, scope: &Scope) -> Result<JsValue, JsError> {
        match target {
            Reference::Binding(name) => self.lookup(name, scope),
            Reference::Member(object, key) => self.get_member(object, key),
        }
    }

    fn write_reference(&mut self, target: &Reference<'_>, value: JsValue, scope: &Scope) -> Result<(), JsError> {
        match target {
            Reference::Binding(name) => self.assign_identifier(name, value, scope),
            Reference::Member(object, key) => self.set_member(object, key, value),
        }
    }

    fn assign_identifier(&mut self, name: &JsString, value: JsValue, scope: &Scope) -> Result<(), JsError> {
        if !scope.contains(name) {
            if let Some(slot) = self.globals.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        scope.set(name.clone(), value)
    }

    fn property_key(&mut self, property: &MemberProperty, scope: &Scope) -> Result<JsValue, JsError> {
        match property {
            MemberProperty::Identifier(name) => Ok(JsValue::String(name.clone())),
            MemberProperty::Expression(expr) => self.evaluate(expr, scope),
        }
    }

    /// Evaluate a member/call chain. `None` means an optional link met a
    /// nullish base and the rest of the chain was skipped.
    fn evaluate_chain(&mut self, expr: &Expression, scope: &Scope) -> Result<Option<JsValue>, JsError> {
        match expr {
            Expression::Member(member) => {
                let Some(object) = self.evaluate_chain(&member.object, scope)? else {
                    return Ok(None);
                };
                if member.optional && object.is_null_or_undefined() {
                    return Ok(None);
                }
                let key = self.property_key(&member.property, scope)?;
                self.get_member(&object, &key).map(Some)
            }
            Expression::Call(call) => self.evaluate_call(call, scope),
            other => self.evaluate(other, scope).map(Some),
        }
    }

    fn evaluate_call(&mut self, call: &CallExpression, scope: &Scope) -> Result<Option<JsValue>, JsError> {
        let (func, this) = match call.callee.as_ref() {
            Expression::Member(member) => {
                let Some(object) = self.evaluate_chain(&member.object, scope)? else {
                    return Ok(None);
                };
                if member.optional && object.is_null_or_undefined() {
                    return Ok(None);
                }
                let key = self.property_key(&member.property, scope)?;
                (self.get_member(&object, &key)?, object)
            }
            callee => match self.evaluate_chain(callee, scope)? {
                Some(func) => (func, JsValue::Undefined),
                None => return Ok(None),
            },
        };

        if call.optional && func.is_null_or_undefined() {
            return Ok(None);
        }
        if !func.is_callable() {
            return Err(JsError::type_error(format!("{} is not a function", describe(&call.callee))));
        }

        let args = self.evaluate_elements(&call.arguments, scope)?;
        self.call_function(&func, this, &args).map(Some)
    }

    fn evaluate_new(&mut self, new: &CallExpression, scope: &Scope) -> Result<JsValue, JsError> {
        let constructor = self.evaluate(&new.callee, scope)?;
        let args = self.evaluate_elements(&new.arguments, scope)?;
        match &constructor {
            JsValue::Function(func) => self.construct(func, &args),
            _ => Err(JsError::type_error(format!("{} is not a constructor", describe(&new.callee)))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Members
    // ═══════════════════════════════════════════════════════════════════════

    fn prototype_for(&self, value: &JsValue) -> Option<&ObjectRef> {
        match value {
            JsValue::Undefined | JsValue::Null => None,
            JsValue::String(_) => Some(&self.string_prototype),
            JsValue::Number(_) => Some(&self.number_prototype),
            JsValue::Array(_) => Some(&self.array_prototype),
            JsValue::RegExp(_) => Some(&self.regexp_prototype),
            JsValue::Date(_) => Some(&self.date_prototype),
            JsValue::Function(_) => Some(&self.function_prototype),
            JsValue::Boolean(_) | JsValue::Object(_) => Some(&self.object_prototype),
        }
    }

    /// Read `object[key]`
    pub fn get_member(&mut self, object: &JsValue, key: &JsValue) -> Result<JsValue, JsError> {
        let index = key.as_index();
        match object {
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    object,
                    key.to_js_string()
                )));
            }
            JsValue::String(s) => {
                if let Some(index) = index {
                    return Ok(builtins::string::code_unit_string(s, index)
                        .map(JsValue::String)
                        .unwrap_or_default());
                }
                if key.to_js_string() == "length" {
                    return Ok(JsValue::from(s.utf16_len()));
                }
            }
            JsValue::Array(items) => {
                if let Some(index) = index {
                    return Ok(items.borrow().get(index).cloned().unwrap_or_default());
                }
                if key.to_js_string() == "length" {
                    return Ok(JsValue::from(items.borrow().len()));
                }
            }
            JsValue::Object(entries) => {
                if let Some(value) = entries.borrow().get(key.to_js_string().as_str()) {
                    return Ok(value.clone());
                }
            }
            JsValue::Function(func) => {
                let name = key.to_js_string();
                if let Some(value) = func.properties.borrow().get(name.as_str()) {
                    return Ok(value.clone());
                }
                match name.as_str() {
                    "name" => return Ok(JsValue::from(func.name())),
                    "length" => return Ok(JsValue::from(func.length())),
                    _ => {}
                }
            }
            JsValue::RegExp(re) => match key.to_js_string().as_str() {
                "source" => return Ok(JsValue::String(re.source.clone())),
                "flags" => return Ok(JsValue::String(re.flags.clone())),
                "global" => return Ok(JsValue::Boolean(re.global())),
                "ignoreCase" => return Ok(JsValue::Boolean(re.flags.contains('i'))),
                "multiline" => return Ok(JsValue::Boolean(re.flags.contains('m'))),
                "lastIndex" => return Ok(JsValue::from(re.last_index.get())),
                _ => {}
            },
            JsValue::Boolean(_) | JsValue::Number(_) | JsValue::Date(_) => {}
        }

        let name = key.to_js_string();
        Ok(self
            .prototype_for(object)
            .and_then(|proto| proto.borrow().get(name.as_str()).cloned())
            .unwrap_or_default())
    }

    /// Write `object[key] = value`
    pub fn set_member(&mut self, object: &JsValue, key: &JsValue, value: JsValue) -> Result<(), JsError> {
        match object {
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                object,
                key.to_js_string()
            ))),
            JsValue::Array(items) => {
                let mut items = items.borrow_mut();
                if let Some(index) = key.as_index() {
                    if index >= items.len() {
                        if index >= MAX_ARRAY_LENGTH {
                            return Err(JsError::range_error("Invalid array length"));
                        }
                        items.resize(index + 1, JsValue::Undefined);
                    }
                    if let Some(slot) = items.get_mut(index) {
                        *slot = value;
                    }
                } else if key.to_js_string() == "length" {
                    let length = value.to_number();
                    if length < 0.0 || length.fract() != 0.0 || length > MAX_ARRAY_LENGTH as f64 {
                        return Err(JsError::range_error("Invalid array length"));
                    }
                    items.resize(length as usize, JsValue::Undefined);
                }
                Ok(())
            }
            JsValue::Object(entries) => {
                entries.borrow_mut().insert(key.to_js_string(), value);
                Ok(())
            }
            JsValue::Function(func) => {
                func.properties.borrow_mut().insert(key.to_js_string(), value);
                Ok(())
            }
            JsValue::RegExp(re) => {
                if key.to_js_string() == "lastIndex" {
                    re.last_index.set(value.to_number().max(0.0) as usize);
                }
                Ok(())
            }
            // Writes to primitives are silently dropped
            _ => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════════════

    fn check_deadline(&self) -> Result<(), JsError> {
        match self.deadline {
            Some((deadline, limit)) if Instant::now() >= deadline => Err(JsError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }

    /// Call `func` with an explicit `this`
    pub fn call_function(&mut self, func: &JsValue, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        let JsValue::Function(func) = func else {
            return Err(JsError::type_error(format!("{} is not a function", func.type_of())));
        };
        self.check_deadline()?;
        if self.depth >= MAX_CALL_DEPTH {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }

        self.depth += 1;
        let result = self.invoke(func, this, args);
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, func: &Rc<JsFunction>, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        match &func.kind {
            FunctionKind::Native(native) => (native.func)(self, &this, args),
            FunctionKind::Bound {
                target,
                this: bound_this,
                args: bound_args,
            } => {
                let mut full_args = bound_args.clone();
                full_args.extend_from_slice(args);
                self.invoke(target, bound_this.clone(), &full_args)
            }
            FunctionKind::Interpreted { node, closure } => {
                let scope = closure.extend();
                self.bind_parameters(func, node, &scope, this, args)?;

                match &node.body {
                    FunctionBody::Expression(expr) => self.evaluate(expr, &scope),
                    FunctionBody::Block(body) => match self.execute_statements(body, &scope)? {
                        Completion::Normal(_) | Completion::Empty => Ok(JsValue::Undefined),
                        Completion::Return(value) => Ok(value),
                        Completion::Throw(value) => Err(JsError::Thrown(value)),
                        Completion::Break(_) => Err(JsError::syntax_error("Illegal break statement", node.span.line, node.span.column)),
                        Completion::Continue(_) => Err(JsError::syntax_error(
                            "Illegal continue statement",
                            node.span.line,
                            node.span.column,
                        )),
                    },
                }
            }
        }
    }

    fn bind_parameters(
        &mut self,
        func: &Rc<JsFunction>,
        node: &FunctionNode,
        scope: &Scope,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<(), JsError> {
        if !node.arrow {
            // A named function expression can refer to itself
            if let Some(name) = &node.name {
                scope.declare(name.clone(), JsValue::Function(func.clone()))?;
            }
            scope.declare(JsString::from("this"), this)?;
            scope.declare(JsString::from("arguments"), JsValue::new_array(args.to_vec()))?;
        }

        for (i, param) in node.params.iter().enumerate() {
            let value = if param.rest {
                JsValue::new_array(args.get(i..).map(|rest| rest.to_vec()).unwrap_or_default())
            } else {
                match (args.get(i), &param.default) {
                    (Some(JsValue::Undefined) | None, Some(default)) => self.evaluate(default, scope)?,
                    (Some(arg), _) => arg.clone(),
                    (None, None) => JsValue::Undefined,
                }
            };
            scope.declare(param.name.clone(), value)?;
        }
        Ok(())
    }

    /// `new func(...args)`
    pub fn construct(&mut self, func: &Rc<JsFunction>, args: &[JsValue]) -> Result<JsValue, JsError> {
        match &func.kind {
            FunctionKind::Native(native) => match native.constructor {
                Some(constructor) => constructor(self, &JsValue::Undefined, args),
                None => (native.func)(self, &JsValue::Undefined, args),
            },
            FunctionKind::Bound {
                target,
                args: bound_args,
                ..
            } => {
                let mut full_args = bound_args.clone();
                full_args.extend_from_slice(args);
                self.construct(target, &full_args)
            }
            FunctionKind::Interpreted { node, .. } if node.arrow => Err(JsError::type_error(format!(
                "{} is not a constructor",
                func.name()
            ))),
            FunctionKind::Interpreted { .. } => {
                let instance = JsValue::new_object(IndexMap::new());
                let result = self.call_function(&JsValue::Function(func.clone()), instance.clone(), args)?;
                Ok(match result {
                    JsValue::Object(_) | JsValue::Array(_) | JsValue::Function(_) => result,
                    _ => instance,
                })
            }
        }
    }
}

/// Short source-like description of a callee for error messages
fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(id) => id.name.to_string(),
        Expression::This(_) => "this".to_string(),
        Expression::Member(member) => match &member.property {
            MemberProperty::Identifier(name) => format!("{}.{}", describe(&member.object), name),
            MemberProperty::Expression(_) => format!("{}[...]", describe(&member.object)),
        },
        Expression::Call(call) => format!("{}(...)", describe(&call.callee)),
        Expression::Parenthesized(inner, _) => describe(inner),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> JsValue {
        Interpreter::new().eval(source, &Scope::new()).unwrap()
    }

    #[test]
    fn test_completion_value() {
        assert_eq!(eval("1 + 2 * 3"), JsValue::from(7));
        assert_eq!(eval("var x = 5; x * 2"), JsValue::from(10));
    }

    #[test]
    fn test_hoisted_function() {
        assert_eq!(eval("f(); function f() { return 3 }"), JsValue::from(3));
    }

    #[test]
    fn test_compound_targets_evaluate_once() {
        assert_eq!(eval("var i = 0; var a = [10, 20, 30]; a[i++]++; [i, a[0], a[1]].join(',')").to_string(), "1,11,20");
        assert_eq!(eval("var i = 0; var a = [1, 2]; a[i++] += 5; [i, a[0], a[1]].join(',')").to_string(), "1,6,2");
        let source = "var n = 0; var o = {v: 1}; function get() { n++; return o; } get().v *= 3; get().v ||= 9; [n, o.v].join(',')";
        assert_eq!(eval(source).to_string(), "2,3");
        assert_eq!(eval("var k = 0; var a = []; a[k++] = k; [k, a[0]].join(',')").to_string(), "1,1");
    }

    #[test]
    fn test_array_growth_is_bounded() {
        let err = Interpreter::new().eval("var a = []; a[4e9 - 2] = 1", &Scope::new()).unwrap_err();
        assert!(matches!(err, JsError::RangeError { .. }));
        let err = Interpreter::new().eval("var a = [1]; a.length = 3e9", &Scope::new()).unwrap_err();
        assert!(matches!(err, JsError::RangeError { .. }));
        assert_eq!(eval("var a = []; a[99] = 1; a.length"), JsValue::from(100));
        assert_eq!(eval("var a = [1, 2, 3]; a.length = 1; a.join()"), JsValue::from("1"));
    }

    #[test]
    fn test_declarations_keep_completion_value() {
        assert_eq!(eval("1; var x = 2;"), JsValue::from(1));
        assert_eq!(eval("{ 5; ; function g() {} }"), JsValue::from(5));
        assert_eq!(eval("var y = 1;"), JsValue::Undefined);
    }

    #[test]
    fn test_closure_observes_later_writes() {
        let source = "var n = 1; var get = function() { return n }; n = 2; get()";
        assert_eq!(eval(source), JsValue::from(2));
    }

    #[test]
    fn test_labeled_continue() {
        let source = "
            var out = 0;
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j == 1) continue outer;
                    out++;
                }
            }
            out";
        assert_eq!(eval(source), JsValue::from(3));
    }

    #[test]
    fn test_optional_chain_short_circuits() {
        assert_eq!(eval("var a = null; a?.b.c.d"), JsValue::Undefined);
        assert_eq!(eval("var a = {b: null}; a.b?.()"), JsValue::Undefined);
    }

    #[test]
    fn test_call_depth_limit() {
        let err = Interpreter::new()
            .eval("function f(n) { return f(n + 1) } f(0)", &Scope::new())
            .unwrap_err();
        assert!(matches!(err, JsError::RangeError { .. }));
    }

    #[test]
    fn test_call_depth_limit_on_small_stacks() {
        let recurse = || {
            let result = Interpreter::new().eval("function f(n) { return f(n + 1) } f(0)", &Scope::new());
            matches!(result, Err(JsError::RangeError { .. }))
        };
        assert!(std::thread::spawn(recurse).join().unwrap());
        let small = std::thread::Builder::new().stack_size(512 * 1024).spawn(recurse).unwrap();
        assert!(small.join().unwrap());
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 2000;
        let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        let nested = std::thread::spawn(move || Interpreter::new().eval(&source, &Scope::new()).map(|v| v.to_string()).ok());
        assert_eq!(nested.join().unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_timeout() {
        let mut interp = Interpreter::new();
        interp.set_timeout(Some(Duration::from_millis(20)));
        let err = interp.eval("while (true) {}", &Scope::new()).unwrap_err();
        assert!(matches!(err, JsError::Timeout { timeout_ms: 20 }));
    }

    #[test]
    fn test_lazy_global_resolution() {
        let full = "var helper = {double: function(x) { return x * 2 }}; function twice(x) { return helper.double(x) }";
        let mut interp = Interpreter::new().with_full_code(full);
        assert_eq!(interp.eval("twice(21)", &Scope::new()).unwrap(), JsValue::from(42));
        assert!(interp.globals.contains_key("helper"));
    }

    #[test]
    fn test_uncaught_throw() {
        let err = Interpreter::new().eval("throw 'boom'", &Scope::new()).unwrap_err();
        assert!(matches!(err, JsError::Thrown(JsValue::String(ref s)) if s == "boom"));
    }

    #[test]
    fn test_unknown_name_is_reference_error() {
        let err = Interpreter::new().eval("missing + 1", &Scope::new()).unwrap_err();
        assert!(matches!(err, JsError::ReferenceError { ref name } if name == "missing"));
        assert_eq!(eval("typeof missing"), JsValue::from("undefined"));
    }
}
