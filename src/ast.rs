//! Abstract Syntax Tree types for JavaScript

use std::rc::Rc;

use crate::lexer::Span;
use crate::value::JsString;

/// A complete program or function body
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Statement>,
}

/// Statements carry no spans of their own. Runtime errors point at the
/// expression or function that raised them.
#[derive(Debug, Clone)]
pub enum Statement {
    Expression(Rc<Expression>),
    Declaration(Declaration),
    /// Bound up front when the enclosing body is entered
    Function(Rc<FunctionNode>),
    Block(Vec<Statement>),
    If {
        test: Rc<Expression>,
        then: Box<Statement>,
        otherwise: Option<Box<Statement>>,
    },
    Loop(Loop),
    Switch {
        discriminant: Rc<Expression>,
        cases: Vec<SwitchCase>,
    },
    Try(Box<TryStatement>),
    Return(Option<Rc<Expression>>),
    Break(Option<JsString>),
    Continue(Option<JsString>),
    Throw(Rc<Expression>),
    Labeled {
        label: JsString,
        body: Box<Statement>,
    },
    Empty,
}

/// `var`, `let` or `const` with one or more bindings
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: VariableKind,
    pub bindings: Vec<(JsString, Option<Rc<Expression>>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

/// Every loop form shares a body and differs only in its head
#[derive(Debug, Clone)]
pub struct Loop {
    pub head: LoopHead,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone)]
pub enum LoopHead {
    While(Rc<Expression>),
    DoWhile(Rc<Expression>),
    For {
        init: Option<ForInit>,
        test: Option<Rc<Expression>>,
        update: Option<Rc<Expression>>,
    },
    /// Walks the keys of the right-hand side
    ForIn(ForBinding, Rc<Expression>),
    /// Walks the values of the right-hand side
    ForOf(ForBinding, Rc<Expression>),
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Declaration(Declaration),
    Expression(Rc<Expression>),
}

/// The loop variable of `for (name in ...)` and `for (let name of ...)`
#[derive(Debug, Clone)]
pub struct ForBinding {
    /// False when the loop assigns an existing binding
    pub declared: bool,
    pub name: JsString,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Rc<Expression>>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct TryStatement {
    pub block: Vec<Statement>,
    pub catch: Option<(Option<JsString>, Vec<Statement>)>,
    pub finally: Option<Vec<Statement>>,
}

/// A function declaration, function expression or arrow function
#[derive(Debug)]
pub struct FunctionNode {
    pub name: Option<JsString>,
    pub params: Vec<FunctionParam>,
    pub body: FunctionBody,
    pub arrow: bool,
    /// The function's own source text, used for `toString` and host conversion
    pub source: JsString,
    pub span: Span,
}

impl FunctionNode {
    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.to_string()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub name: JsString,
    pub default: Option<Rc<Expression>>,
    pub rest: bool,
}

#[derive(Debug)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body: `x => x + 1`
    Expression(Rc<Expression>),
}

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    This(Span),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(Rc<FunctionNode>),
    Template(TemplateLiteral),
    Unary(UnaryExpression),
    Update(UpdateExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Sequence(SequenceExpression),
    Member(MemberExpression),
    Call(CallExpression),
    New(CallExpression),
    /// Parentheses stop optional-chain short-circuiting: `(a?.b).c`
    Parenthesized(Rc<Expression>, Span),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(e) => e.span,
            Expression::Identifier(e) => e.span,
            Expression::This(span) => *span,
            Expression::Array(e) => e.span,
            Expression::Object(e) => e.span,
            Expression::Function(f) => f.span,
            Expression::Template(e) => e.span,
            Expression::Unary(e) => e.span,
            Expression::Update(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Logical(e) => e.span,
            Expression::Conditional(e) => e.span,
            Expression::Assignment(e) => e.span,
            Expression::Sequence(e) => e.span,
            Expression::Member(e) => e.span,
            Expression::Call(e) | Expression::New(e) => e.span,
            Expression::Parenthesized(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    RegExp { pattern: JsString, flags: JsString },
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: JsString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ArrayExpression {
    pub elements: Vec<ArrayElement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ArrayElement {
    Expression(Rc<Expression>),
    Spread(Rc<Expression>),
    Hole,
}

#[derive(Debug, Clone)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Property {
    KeyValue {
        key: PropertyKey,
        value: Rc<Expression>,
    },
    Spread(Rc<Expression>),
}

#[derive(Debug, Clone)]
pub enum PropertyKey {
    Static(JsString),
    Computed(Rc<Expression>),
}

#[derive(Debug, Clone)]
pub struct TemplateLiteral {
    /// Always one more quasi than expressions
    pub quasis: Vec<JsString>,
    pub expressions: Vec<Rc<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Rc<Expression>,
    pub right: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,

    // Comparison
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    URShift,

    // Other
    In,
    Instanceof,
}

#[derive(Debug, Clone)]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Rc<Expression>,
    pub right: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: Rc<Expression>,
    pub consequent: Rc<Expression>,
    pub alternate: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    /// An `Identifier` or `Member` expression
    pub target: Rc<Expression>,
    pub value: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,
    Binary(BinaryOp),
    Logical(LogicalOp),
}

#[derive(Debug, Clone)]
pub struct SequenceExpression {
    pub expressions: Vec<Rc<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Rc<Expression>,
    pub property: MemberProperty,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum MemberProperty {
    Identifier(JsString),
    Expression(Rc<Expression>),
}

/// A call or `new` expression
#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Rc<Expression>,
    pub arguments: Vec<ArrayElement>,
    pub optional: bool,
    pub span: Span,
}
