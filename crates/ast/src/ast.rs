// Copyright (C) 2025 the pysrc authors. This program is free software: you
// can redistribute it and/or modify it under the terms of the GNU General
// Public License as published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The syntax tree rendered back to source by the unparser. Trees are built
//! externally (by a parser, a decompiler, or by hand in tests) and are
//! read-only to everything in this workspace.

use strum::EnumDiscriminants;

/// One node of the tree: a tagged construct plus the source line it was
/// recorded at, if any. Line numbers drive blank-line reconciliation during
/// unparsing; nodes without one simply flow onto the current output line.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub syntax: Syntax,
    pub line: Option<usize>,
}

impl Node {
    pub fn new(syntax: Syntax) -> Self {
        Node { syntax, line: None }
    }

    pub fn at(syntax: Syntax, line: usize) -> Self {
        Node {
            syntax,
            line: Some(line),
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from(&self.syntax)
    }
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum BoolOp {
    And,
    Or,
}

/// Binary operators: arithmetic, shifts, bitwise, power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    LShift,
    RShift,
    BitOr,
    BitAnd,
    BitXor,
    Pow,
}

/// Comparison operators: equality, ordering, membership, identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

/// Numeric literal payload. Kept as two variants rather than a string so
/// callers building synthetic trees don't have to think about formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// The named constants that became literal nodes in grammar version 3.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Singleton {
    None,
    True,
    False,
}

/// A callable's parameter list. `defaults` pairs with the tail of `params`:
/// with N params and D defaults, the last D params carry them. `vararg` and
/// `kwarg` are the single `*args` / `**kwargs` names, when present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    /// `Param` nodes, in declaration order.
    pub params: Vec<Node>,
    /// Default value expressions, tail-aligned to `params`.
    pub defaults: Vec<Node>,
    pub vararg: Option<String>,
    pub kwarg: Option<String>,
}

/// Every construct the grammar family can express, as one closed enum.
/// `NodeKind` is the fieldless discriminant mirror; the unparser's dialect
/// tables key on it, which makes an unsupported construct a deterministic
/// table miss instead of an open-hierarchy fallthrough.
///
/// The set is a union across grammar versions 2.6 through 3.6; whether a
/// given kind actually renders is decided by the dialect selected at unparse
/// time, not by the data model.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(NodeKind))]
#[strum_discriminants(derive(Hash, strum::EnumIter, strum::Display))]
pub enum Syntax {
    // Statements
    Module {
        body: Vec<Node>,
    },
    FunctionDef {
        name: String,
        args: Signature,
        body: Vec<Node>,
        decorators: Vec<Node>,
        returns: Option<Box<Node>>,
    },
    /// `async def`, grammar 3.5.
    AsyncFunctionDef {
        name: String,
        args: Signature,
        body: Vec<Node>,
        decorators: Vec<Node>,
        returns: Option<Box<Node>>,
    },
    ClassDef {
        name: String,
        bases: Vec<Node>,
        /// Keyword-style base entries (e.g. `metaclass=M`), grammar 3.0.
        keywords: Vec<Node>,
        body: Vec<Node>,
        decorators: Vec<Node>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    Delete {
        targets: Vec<Node>,
    },
    Assign {
        targets: Vec<Node>,
        value: Box<Node>,
    },
    AugAssign {
        target: Box<Node>,
        op: BinaryOp,
        value: Box<Node>,
    },
    /// The 2.x `print` statement.
    Print {
        dest: Option<Box<Node>>,
        values: Vec<Node>,
        trailing_newline: bool,
    },
    For {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    /// `async for`, grammar 3.5.
    AsyncFor {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    While {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    If {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    /// `with` over one or more `WithItem`s. Pre-3.3 dialects render only the
    /// single-item form.
    With {
        items: Vec<Node>,
        body: Vec<Node>,
    },
    /// Legacy `try`/`except` (2.x split form).
    TryExcept {
        body: Vec<Node>,
        handlers: Vec<Node>,
    },
    /// Legacy `try`/`finally` (2.x split form).
    TryFinally {
        body: Vec<Node>,
        finalbody: Vec<Node>,
    },
    /// The unified try statement, grammar 3.3.
    Try {
        body: Vec<Node>,
        handlers: Vec<Node>,
        orelse: Vec<Node>,
        finalbody: Vec<Node>,
    },
    Assert {
        test: Box<Node>,
        msg: Option<Box<Node>>,
    },
    Import {
        names: Vec<Node>,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<Node>,
        /// Relative import level: number of leading dots.
        level: usize,
    },
    Global {
        names: Vec<String>,
    },
    Nonlocal {
        names: Vec<String>,
    },
    /// An expression in statement position.
    Expr {
        value: Box<Node>,
    },
    Pass,
    Break,
    Continue,
    Raise {
        exc: Option<Box<Node>>,
        cause: Option<Box<Node>>,
    },

    // Expressions
    BoolOp {
        op: BoolOp,
        values: Vec<Node>,
    },
    BinOp {
        left: Box<Node>,
        op: BinaryOp,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Lambda {
        args: Signature,
        body: Box<Node>,
    },
    IfExp {
        test: Box<Node>,
        body: Box<Node>,
        orelse: Box<Node>,
    },
    /// A `None` key marks a `**mapping` spread entry.
    Dict {
        keys: Vec<Option<Node>>,
        values: Vec<Node>,
    },
    Set {
        elts: Vec<Node>,
    },
    ListComp {
        elt: Box<Node>,
        generators: Vec<Node>,
    },
    SetComp {
        elt: Box<Node>,
        generators: Vec<Node>,
    },
    DictComp {
        key: Box<Node>,
        value: Box<Node>,
        generators: Vec<Node>,
    },
    GeneratorExp {
        elt: Box<Node>,
        generators: Vec<Node>,
    },
    Yield {
        value: Option<Box<Node>>,
    },
    /// `yield from`, grammar 3.3.
    YieldFrom {
        value: Box<Node>,
    },
    /// `await`, grammar 3.5.
    Await {
        value: Option<Box<Node>>,
    },
    Compare {
        left: Box<Node>,
        ops: Vec<CmpOp>,
        comparators: Vec<Node>,
    },
    /// `starargs`/`kwargs` are the pre-3.5 spread fields; from 3.5 on,
    /// spreads travel as `Starred` entries in `args` and no-name `Keyword`
    /// entries in `keywords`.
    Call {
        func: Box<Node>,
        args: Vec<Node>,
        keywords: Vec<Node>,
        starargs: Option<Box<Node>>,
        kwargs: Option<Box<Node>>,
    },
    /// The 2.x backtick repr expression.
    Repr {
        value: Box<Node>,
    },
    Num {
        value: Number,
    },
    Str {
        value: String,
    },
    Bytes {
        value: Vec<u8>,
    },
    /// `None`/`True`/`False` as literal nodes, grammar 3.4.
    NameConstant {
        value: Singleton,
    },
    Ellipsis,
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    Subscript {
        value: Box<Node>,
        slice: Box<Node>,
    },
    Starred {
        value: Box<Node>,
    },
    Name {
        id: String,
    },
    List {
        elts: Vec<Node>,
    },
    Tuple {
        elts: Vec<Node>,
    },
    Slice {
        lower: Option<Box<Node>>,
        upper: Option<Box<Node>>,
        step: Option<Box<Node>>,
    },
    ExtSlice {
        dims: Vec<Node>,
    },
    /// Plain-subscript wrapper used by older tree producers.
    Index {
        value: Box<Node>,
    },
    /// F-string interpolation, grammar 3.6. Parts are `Str` runs and
    /// `FormattedValue` holes.
    JoinedStr {
        values: Vec<Node>,
    },
    FormattedValue {
        value: Option<Box<Node>>,
    },

    // Helper nodes
    Param {
        name: String,
        /// Type-annotation suffix, grammar 3.0.
        annotation: Option<Box<Node>>,
    },
    /// A `name=value` entry in a call or class header; no name means a
    /// `**mapping` spread.
    Keyword {
        arg: Option<String>,
        value: Box<Node>,
    },
    Alias {
        name: String,
        asname: Option<String>,
    },
    /// One `for target in iter if ...` clause of a comprehension.
    Comprehension {
        target: Box<Node>,
        iter: Box<Node>,
        ifs: Vec<Node>,
    },
    ExceptHandler {
        typ: Option<Box<Node>>,
        name: Option<Box<Node>>,
        body: Vec<Node>,
    },
    WithItem {
        context_expr: Box<Node>,
        optional_vars: Option<Box<Node>>,
    },
}
