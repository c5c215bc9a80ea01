//! Syntax tree node types for ECMAScript scripts.
//!
//! The runtime never parses source text. An external front end (or the
//! [`builder`](crate::builder) helpers) produces these nodes, already checked
//! for early errors, and the interpreter walks them directly. Function and
//! class bodies are reference counted so that every closure created from the
//! same source node shares one copy of it.

use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Script {
    pub body: Vec<Statement>,
    /// Forces strict mode even without a `"use strict"` directive.
    pub strict: bool,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Empty,
    Expression(Expression),
    Block(Vec<Statement>),
    Variable(VariableDeclaration),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStatement),
    Switch(SwitchStatement),
    Labeled(String, Box<Statement>),
    With(Expression, Box<Statement>),
    Debugger,
    FunctionDeclaration(Rc<FunctionNode>),
    ClassDeclaration(Rc<ClassNode>),
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub kind: VarKind,
    pub declarations: Vec<VariableDeclarator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
    pub pattern: Pattern,
    pub init: Option<Expression>,
}

/// Binding and assignment targets.
///
/// `MemberExpression` only appears in assignment patterns; binding patterns
/// (declarations, parameters, catch clauses) use identifiers at the leaves.
#[derive(Clone, Debug)]
pub enum Pattern {
    Identifier(String),
    Array(Vec<Option<ArrayPatternElement>>),
    Object(Vec<ObjectPatternProperty>),
    Assign(Box<Pattern>, Box<Expression>),
    Rest(Box<Pattern>),
    MemberExpression(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum ArrayPatternElement {
    Pattern(Pattern),
    Rest(Pattern),
}

#[derive(Clone, Debug)]
pub enum ObjectPatternProperty {
    KeyValue(PropertyName, Pattern),
    Shorthand(String),
    Rest(Pattern),
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Option<Expression>>),
    Object(Vec<PropertyDefinition>),
    Function(Rc<FunctionNode>),
    ArrowFunction(Rc<FunctionNode>),
    Class(Rc<ClassNode>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Logical(LogicalOp, Box<Expression>, Box<Expression>),
    Update(UpdateOp, bool, Box<Expression>), // op, prefix, argument
    Assign(AssignOp, Box<Pattern>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    New(Box<Expression>, Vec<Expression>),
    Member(Box<Expression>, MemberProperty),
    SuperMember(MemberProperty),
    SuperCall(Vec<Expression>),
    /// Boundary of an optional chain: a short-circuit anywhere inside
    /// evaluates the whole chain to `undefined`.
    OptionalChain(Box<Expression>),
    OptionalMember(Box<Expression>, MemberProperty),
    OptionalCall(Box<Expression>, Vec<Expression>),
    Spread(Box<Expression>),
    Yield(Option<Box<Expression>>, bool), // expr, delegate
    TaggedTemplate(Box<Expression>, Rc<TemplateLiteral>),
    Template(Rc<TemplateLiteral>),
    Typeof(Box<Expression>),
    Void(Box<Expression>),
    Delete(Box<Expression>),
    Sequence(Vec<Expression>),
    NewTarget,
    /// `#name in object`
    PrivateIn(String, Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum MemberProperty {
    Dot(String),
    Computed(Box<Expression>),
    Private(String),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LShift,
    RShift,
    URShift,
    BitAnd,
    BitOr,
    BitXor,
    In,
    Instanceof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::ModAssign => BinaryOp::Mod,
            AssignOp::ExpAssign => BinaryOp::Exp,
            AssignOp::LShiftAssign => BinaryOp::LShift,
            AssignOp::RShiftAssign => BinaryOp::RShift,
            AssignOp::URShiftAssign => BinaryOp::URShift,
            AssignOp::BitAndAssign => BinaryOp::BitAnd,
            AssignOp::BitOrAssign => BinaryOp::BitOr,
            AssignOp::BitXorAssign => BinaryOp::BitXor,
            _ => return None,
        })
    }

    pub fn logical_op(self) -> Option<LogicalOp> {
        match self {
            AssignOp::LogicalAndAssign => Some(LogicalOp::And),
            AssignOp::LogicalOrAssign => Some(LogicalOp::Or),
            AssignOp::NullishAssign => Some(LogicalOp::NullishCoalescing),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum PropertyDefinition {
    KeyValue(PropertyName, Expression),
    Shorthand(String),
    Method(PropertyName, Rc<FunctionNode>, MethodKind),
    Spread(Expression),
}

#[derive(Clone, Debug)]
pub enum PropertyName {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
    /// Only valid as a class element name.
    Private(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct DoWhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct ForInStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForOfStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInOfLeft {
    /// `for (var x of ...)`, `for (let [a, b] of ...)`
    Variable(VarKind, Pattern),
    /// `for (x.y of ...)`, `for ([a, b] of ...)`
    Pattern(Pattern),
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: Vec<Statement>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Vec<Statement>>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Arrow,
    Method,
    Getter,
    Setter,
    ClassConstructor,
    DerivedConstructor,
    /// Synthesized for class field initializers and static blocks.
    ClassInitializer,
}

#[derive(Clone, Debug)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body; evaluates to the function's return value.
    Expression(Box<Expression>),
}

#[derive(Clone, Debug)]
pub struct FunctionNode {
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub body: FunctionBody,
    pub kind: FunctionKind,
    pub is_generator: bool,
    pub source_text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ClassNode {
    pub name: Option<String>,
    pub super_class: Option<Box<Expression>>,
    pub body: Vec<ClassElement>,
    pub source_text: Option<String>,
}

#[derive(Clone, Debug)]
pub enum ClassElement {
    /// The explicit `constructor(...) { ... }`; its node's kind is
    /// `ClassConstructor` or `DerivedConstructor`.
    Constructor(Rc<FunctionNode>),
    Method(ClassMethod),
    Field(ClassField),
    StaticBlock(Vec<Statement>),
}

#[derive(Clone, Debug)]
pub struct ClassMethod {
    pub key: PropertyName,
    pub kind: MethodKind,
    pub value: Rc<FunctionNode>,
    pub is_static: bool,
}

#[derive(Clone, Debug)]
pub struct ClassField {
    pub key: PropertyName,
    pub value: Option<Expression>,
    pub is_static: bool,
}

#[derive(Clone, Debug)]
pub struct TemplateLiteral {
    /// Cooked strings; `None` where an escape sequence is invalid.
    pub quasis: Vec<Option<String>>,
    pub raw_quasis: Vec<String>,
    pub expressions: Vec<Expression>,
}

impl Expression {
    /// §8.4.3 IsAnonymousFunctionDefinition: true only for function, class and arrow
    /// expressions with no binding name of their own.
    pub fn is_anonymous_function_definition(&self) -> bool {
        match self {
            Expression::Function(f) => f.name.as_ref().is_none_or(|n| n.is_empty()),
            Expression::ArrowFunction(_) => true,
            Expression::Class(c) => c.name.as_ref().is_none_or(|n| n.is_empty()),
            _ => false,
        }
    }
}

impl FunctionNode {
    pub fn is_arrow(&self) -> bool {
        self.kind == FunctionKind::Arrow
    }

    pub fn body_statements(&self) -> &[Statement] {
        match &self.body {
            FunctionBody::Block(stmts) => stmts,
            FunctionBody::Expression(_) => &[],
        }
    }
}
