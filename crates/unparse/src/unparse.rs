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

//! Reconstructs source text from a syntax tree. The writer keeps an explicit
//! cursor: an output accumulator, the current indentation depth, a count of
//! newlines emitted so far, and a pending-newline flag. Statement rules open
//! with `newline`, which materializes the pending break and then pads with
//! blank lines until the output has caught up to the node's recorded source
//! line. Nodes without a recorded line simply flow on from the cursor.

use pysrc_ast::{Node, NodeKind, Signature, Syntax};
use thiserror::Error;

use crate::dialect::{Dialect, PyVersion};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnparseError {
    /// The resolved dialect has no rendering rule for this node kind. Raised
    /// for constructs introduced by a later grammar generation than the one
    /// selected.
    #[error("node kind {kind} has no rendering under grammar version {version}")]
    UnsupportedNodeKind { kind: NodeKind, version: PyVersion },
    /// An operator with no token in its symbol table.
    #[error("no token for {op} in the {table} operator table")]
    UnsupportedOperator { table: &'static str, op: String },
    /// A node whose payload violates a structural invariant, such as a
    /// signature with more defaults than parameters.
    #[error("malformed {kind} node: {detail}")]
    MalformedNode { kind: NodeKind, detail: String },
}

/// Rendering knobs. `indent_unit` is the text emitted once per indentation
/// level, four spaces unless overridden.
#[derive(Debug, Clone)]
pub struct UnparseOptions {
    pub indent_unit: String,
}

impl Default for UnparseOptions {
    fn default() -> Self {
        UnparseOptions {
            indent_unit: "    ".to_owned(),
        }
    }
}

/// Renders `root` under the dialect resolved for `version`.
pub fn unparse(
    root: &Node,
    version: PyVersion,
    options: &UnparseOptions,
) -> Result<String, UnparseError> {
    let dialect = Dialect::resolve(version);
    unparse_with_dialect(root, &dialect, options)
}

/// Renders `root` under an already-resolved dialect. Useful when many trees
/// are unparsed for the same grammar version.
pub fn unparse_with_dialect(
    root: &Node,
    dialect: &Dialect,
    options: &UnparseOptions,
) -> Result<String, UnparseError> {
    tracing::debug!(version = %dialect.version(), "unparsing tree");
    let mut unparser = Unparser::new(dialect, options);
    unparser.render(root)?;
    Ok(unparser.finish())
}

pub(crate) struct Unparser<'a> {
    dialect: &'a Dialect,
    indent_unit: &'a str,
    fragments: Vec<String>,
    indentation: usize,
    emitted_newlines: usize,
    pending_newline: bool,
}

impl<'a> Unparser<'a> {
    fn new(dialect: &'a Dialect, options: &'a UnparseOptions) -> Self {
        Unparser {
            dialect,
            indent_unit: &options.indent_unit,
            fragments: vec![],
            indentation: 0,
            emitted_newlines: 0,
            pending_newline: false,
        }
    }

    /// The line the cursor is on: zero before anything has been written,
    /// then one more than the newlines emitted so far.
    fn lines(&self) -> usize {
        if self.fragments.is_empty() {
            0
        } else {
            1 + self.emitted_newlines
        }
    }

    /// Materializes a pending line break, then pads with blank lines until
    /// the cursor reaches the node's recorded line. A record behind the
    /// cursor is ignored rather than rewound.
    fn reconcile(&mut self, node: Option<&Node>) {
        if self.pending_newline {
            if !self.fragments.is_empty() {
                self.fragments.push("\n".to_owned());
                self.emitted_newlines += 1;
            }
            self.fragments.push(self.indent_unit.repeat(self.indentation));
            self.pending_newline = false;
        }
        if let Some(line) = node.and_then(|n| n.line) {
            let gap = line.saturating_sub(self.lines());
            // Each padded line carries the current indentation.
            for _ in 0..gap {
                self.fragments.push("\n".to_owned());
                self.fragments.push(self.indent_unit.repeat(self.indentation));
            }
            self.emitted_newlines += gap;
        }
    }

    fn write(&mut self, text: &str) {
        self.reconcile(None);
        self.fragments.push(text.to_owned());
    }

    /// Like `write`, but reconciles against the node's recorded line first,
    /// so a line record on an expression node pads mid-expression.
    fn write_at(&mut self, text: &str, node: &Node) {
        self.reconcile(Some(node));
        self.fragments.push(text.to_owned());
    }

    fn newline(&mut self, node: Option<&Node>) {
        self.pending_newline = true;
        self.reconcile(node);
    }

    /// Dispatches through the dialect's rule table. A miss is the
    /// unsupported-construct signal, not a bug.
    fn render(&mut self, node: &Node) -> Result<(), UnparseError> {
        let kind = node.kind();
        match self.dialect.rule(kind) {
            Some(rule) => rule(self, node),
            None => Err(UnparseError::UnsupportedNodeKind {
                kind,
                version: self.dialect.version(),
            }),
        }
    }

    fn body(&mut self, statements: &[Node]) -> Result<(), UnparseError> {
        self.pending_newline = true;
        self.indentation += 1;
        for stmt in statements {
            self.render(stmt)?;
        }
        self.indentation -= 1;
        Ok(())
    }

    fn body_or_else(&mut self, body: &[Node], orelse: &[Node]) -> Result<(), UnparseError> {
        self.body(body)?;
        if !orelse.is_empty() {
            self.newline(None);
            self.write("else:");
            self.body(orelse)?;
        }
        Ok(())
    }

    fn decorators(&mut self, decorators: &[Node]) -> Result<(), UnparseError> {
        for decorator in decorators {
            self.newline(Some(decorator));
            self.write("@");
            self.render(decorator)?;
        }
        Ok(())
    }

    /// Parameters, tail-paired defaults, then the spread names. With N
    /// parameters and D defaults, the last D parameters carry them.
    fn signature(&mut self, sig: &Signature, owner: NodeKind) -> Result<(), UnparseError> {
        if sig.defaults.len() > sig.params.len() {
            return Err(UnparseError::MalformedNode {
                kind: owner,
                detail: format!(
                    "{} defaults for {} parameters",
                    sig.defaults.len(),
                    sig.params.len()
                ),
            });
        }
        let padding = sig.params.len() - sig.defaults.len();
        let mut want_comma = false;
        for (idx, param) in sig.params.iter().enumerate() {
            if want_comma {
                self.write(", ");
            }
            want_comma = true;
            self.render(param)?;
            if idx >= padding {
                self.write("=");
                self.render(&sig.defaults[idx - padding])?;
            }
        }
        if let Some(vararg) = &sig.vararg {
            if want_comma {
                self.write(", ");
            }
            want_comma = true;
            self.write("*");
            self.write(vararg);
        }
        if let Some(kwarg) = &sig.kwarg {
            if want_comma {
                self.write(", ");
            }
            self.write("**");
            self.write(kwarg);
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.fragments.concat()
    }
}

/// Single-quoted string literal with the conventional escapes.
pub(crate) fn quote_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Bytes literal: printable ASCII passes through, everything else renders
/// as a `\xNN` escape.
pub(crate) fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

fn mismatch(node: &Node, expected: NodeKind) -> UnparseError {
    UnparseError::MalformedNode {
        kind: node.kind(),
        detail: format!("expected {expected} payload"),
    }
}

/// The rendering rules the dialect tables point at. Statement rules open
/// with `newline`; expression rules write from the cursor.
pub(crate) mod rules {
    use pysrc_ast::{Number, Singleton, UnaryOp};

    use super::*;
    use crate::symbols::{
        BINOP_SYMBOLS, BOOLOP_SYMBOLS, CMPOP_SYMBOLS, SymbolTable, UNARYOP_SYMBOLS,
    };

    fn token<T: PartialEq + Copy + std::fmt::Debug>(
        table: &SymbolTable<T>,
        op: T,
    ) -> Result<&'static str, UnparseError> {
        table.token(op).ok_or_else(|| UnparseError::UnsupportedOperator {
            table: table.name(),
            op: format!("{op:?}"),
        })
    }

    fn comma_list(this: &mut Unparser<'_>, items: &[Node]) -> Result<(), UnparseError> {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                this.write(", ");
            }
            this.render(item)?;
        }
        Ok(())
    }

    // -- statements ---------------------------------------------------------

    pub(crate) fn module(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Module { body } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Module));
        };
        for stmt in body {
            this.render(stmt)?;
        }
        Ok(())
    }

    fn function_header(
        this: &mut Unparser<'_>,
        node: &Node,
        prefix: &str,
        with_returns: bool,
    ) -> Result<(), UnparseError> {
        let (name, args, body, decorators, returns) = match &node.syntax {
            Syntax::FunctionDef {
                name,
                args,
                body,
                decorators,
                returns,
            }
            | Syntax::AsyncFunctionDef {
                name,
                args,
                body,
                decorators,
                returns,
            } => (name, args, body, decorators, returns),
            _ => return Err(mismatch(node, NodeKind::FunctionDef)),
        };
        if name.is_empty() {
            return Err(UnparseError::MalformedNode {
                kind: node.kind(),
                detail: "empty definition name".to_owned(),
            });
        }
        this.decorators(decorators)?;
        this.newline(Some(node));
        this.write(prefix);
        this.write("def ");
        this.write(name);
        this.write("(");
        this.signature(args, node.kind())?;
        this.write(")");
        if with_returns {
            if let Some(returns) = returns {
                this.write(" -> ");
                this.render(returns)?;
            }
        }
        this.write(":");
        this.body(body)
    }

    pub(crate) fn function_def(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        function_header(this, node, "", false)
    }

    pub(crate) fn function_def_annotated(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        function_header(this, node, "", true)
    }

    pub(crate) fn async_function_def(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        function_header(this, node, "async ", true)
    }

    fn class_header(
        this: &mut Unparser<'_>,
        node: &Node,
        allow_keywords: bool,
    ) -> Result<(), UnparseError> {
        let Syntax::ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::ClassDef));
        };
        if name.is_empty() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::ClassDef,
                detail: "empty definition name".to_owned(),
            });
        }
        if !allow_keywords && !keywords.is_empty() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::ClassDef,
                detail: "keyword base entries require grammar version 3.0".to_owned(),
            });
        }
        this.decorators(decorators)?;
        this.newline(Some(node));
        this.write("class ");
        this.write(name);
        let mut opened = false;
        for entry in bases.iter().chain(keywords.iter()) {
            this.write(if opened { ", " } else { "(" });
            opened = true;
            this.render(entry)?;
        }
        if opened {
            this.write(")");
        }
        this.write(":");
        this.body(body)
    }

    pub(crate) fn class_def(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        class_header(this, node, false)
    }

    pub(crate) fn class_def_keywords(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        class_header(this, node, true)
    }

    pub(crate) fn return_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Return { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Return));
        };
        this.newline(Some(node));
        this.write("return");
        if let Some(value) = value {
            this.write(" ");
            this.render(value)?;
        }
        Ok(())
    }

    pub(crate) fn delete(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Delete { targets } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Delete));
        };
        this.newline(Some(node));
        this.write("del ");
        comma_list(this, targets)
    }

    pub(crate) fn assign(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Assign { targets, value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Assign));
        };
        if targets.is_empty() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::Assign,
                detail: "no assignment targets".to_owned(),
            });
        }
        this.newline(Some(node));
        for target in targets {
            this.render(target)?;
            this.write(" = ");
        }
        this.render(value)
    }

    pub(crate) fn aug_assign(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::AugAssign { target, op, value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::AugAssign));
        };
        let op = token(&BINOP_SYMBOLS, *op)?;
        this.newline(Some(node));
        this.render(target)?;
        this.write(&format!(" {op}= "));
        this.render(value)
    }

    pub(crate) fn print_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Print {
            dest,
            values,
            trailing_newline,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::Print));
        };
        this.newline(Some(node));
        this.write("print ");
        let mut want_comma = false;
        if let Some(dest) = dest {
            this.write(">> ");
            this.render(dest)?;
            want_comma = true;
        }
        for value in values {
            if want_comma {
                this.write(", ");
            }
            want_comma = true;
            this.render(value)?;
        }
        if !trailing_newline {
            this.write(",");
        }
        Ok(())
    }

    fn for_header(
        this: &mut Unparser<'_>,
        node: &Node,
        prefix: &str,
    ) -> Result<(), UnparseError> {
        let (target, iter, body, orelse) = match &node.syntax {
            Syntax::For {
                target,
                iter,
                body,
                orelse,
            }
            | Syntax::AsyncFor {
                target,
                iter,
                body,
                orelse,
            } => (target, iter, body, orelse),
            _ => return Err(mismatch(node, NodeKind::For)),
        };
        this.newline(Some(node));
        this.write(prefix);
        this.write("for ");
        this.render(target)?;
        this.write(" in ");
        this.render(iter)?;
        this.write(":");
        this.body_or_else(body, orelse)
    }

    pub(crate) fn for_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        for_header(this, node, "")
    }

    pub(crate) fn async_for(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        for_header(this, node, "async ")
    }

    pub(crate) fn while_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::While { test, body, orelse } = &node.syntax else {
            return Err(mismatch(node, NodeKind::While));
        };
        this.newline(Some(node));
        this.write("while ");
        this.render(test)?;
        this.write(":");
        this.body_or_else(body, orelse)
    }

    pub(crate) fn if_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::If { test, body, orelse } = &node.syntax else {
            return Err(mismatch(node, NodeKind::If));
        };
        this.newline(Some(node));
        this.write("if ");
        this.render(test)?;
        this.write(":");
        this.body(body)?;
        // A lone nested if in the else branch folds into an elif clause.
        let mut tail = orelse.as_slice();
        while !tail.is_empty() {
            if let [only] = tail {
                if let Syntax::If { test, body, orelse } = &only.syntax {
                    this.newline(Some(only));
                    this.write("elif ");
                    this.render(test)?;
                    this.write(":");
                    this.body(body)?;
                    tail = orelse.as_slice();
                    continue;
                }
            }
            this.newline(None);
            this.write("else:");
            this.body(tail)?;
            break;
        }
        Ok(())
    }

    fn with_item(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::WithItem {
            context_expr,
            optional_vars,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::WithItem));
        };
        this.render(context_expr)?;
        if let Some(vars) = optional_vars {
            this.write(" as ");
            this.render(vars)?;
        }
        Ok(())
    }

    pub(crate) fn with_single(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::With { items, body } = &node.syntax else {
            return Err(mismatch(node, NodeKind::With));
        };
        let [item] = items.as_slice() else {
            let detail = if items.is_empty() {
                "no context items".to_owned()
            } else {
                "multiple context items require grammar version 3.3".to_owned()
            };
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::With,
                detail,
            });
        };
        this.newline(Some(node));
        this.write("with ");
        with_item(this, item)?;
        this.write(":");
        this.body(body)
    }

    pub(crate) fn with_items(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::With { items, body } = &node.syntax else {
            return Err(mismatch(node, NodeKind::With));
        };
        if items.is_empty() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::With,
                detail: "no context items".to_owned(),
            });
        }
        this.newline(Some(node));
        this.write("with ");
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                this.write(", ");
            }
            with_item(this, item)?;
        }
        this.write(":");
        this.body(body)
    }

    pub(crate) fn try_except(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::TryExcept { body, handlers } = &node.syntax else {
            return Err(mismatch(node, NodeKind::TryExcept));
        };
        this.newline(Some(node));
        this.write("try:");
        this.body(body)?;
        for handler in handlers {
            this.render(handler)?;
        }
        Ok(())
    }

    pub(crate) fn try_finally(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::TryFinally { body, finalbody } = &node.syntax else {
            return Err(mismatch(node, NodeKind::TryFinally));
        };
        this.newline(Some(node));
        this.write("try:");
        this.body(body)?;
        this.newline(Some(node));
        this.write("finally:");
        this.body(finalbody)
    }

    pub(crate) fn try_unified(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::Try));
        };
        this.newline(Some(node));
        this.write("try:");
        this.body(body)?;
        for handler in handlers {
            this.render(handler)?;
        }
        if !orelse.is_empty() {
            this.newline(None);
            this.write("else:");
            this.body(orelse)?;
        }
        if !finalbody.is_empty() {
            this.newline(None);
            this.write("finally:");
            this.body(finalbody)?;
        }
        Ok(())
    }

    pub(crate) fn except_handler(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        let Syntax::ExceptHandler { typ, name, body } = &node.syntax else {
            return Err(mismatch(node, NodeKind::ExceptHandler));
        };
        this.newline(Some(node));
        this.write("except");
        if let Some(typ) = typ {
            this.write(" ");
            this.render(typ)?;
            if let Some(name) = name {
                this.write(" as ");
                this.render(name)?;
            }
        }
        this.write(":");
        this.body(body)
    }

    pub(crate) fn assert_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Assert { test, msg } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Assert));
        };
        this.newline(Some(node));
        this.write("assert ");
        this.render(test)?;
        if let Some(msg) = msg {
            this.write(", ");
            this.render(msg)?;
        }
        Ok(())
    }

    pub(crate) fn import(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Import { names } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Import));
        };
        this.newline(Some(node));
        this.write("import ");
        comma_list(this, names)
    }

    pub(crate) fn import_from(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::ImportFrom {
            module,
            names,
            level,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::ImportFrom));
        };
        this.newline(Some(node));
        this.write(&format!(
            "from {}{} import ",
            ".".repeat(*level),
            module.as_deref().unwrap_or("")
        ));
        comma_list(this, names)
    }

    pub(crate) fn global_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Global { names } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Global));
        };
        this.newline(Some(node));
        this.write("global ");
        this.write(&names.join(", "));
        Ok(())
    }

    pub(crate) fn nonlocal_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Nonlocal { names } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Nonlocal));
        };
        this.newline(Some(node));
        this.write("nonlocal ");
        this.write(&names.join(", "));
        Ok(())
    }

    pub(crate) fn expr_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Expr { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Expr));
        };
        this.newline(Some(node));
        // A string in statement position is a docstring.
        if let Syntax::Str { value: text } = &value.syntax {
            this.write(&format!("\"\"\"{text}\"\"\""));
            Ok(())
        } else {
            this.render(value)
        }
    }

    pub(crate) fn pass_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        this.newline(Some(node));
        this.write("pass");
        Ok(())
    }

    pub(crate) fn break_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        this.newline(Some(node));
        this.write("break");
        Ok(())
    }

    pub(crate) fn continue_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        this.newline(Some(node));
        this.write("continue");
        Ok(())
    }

    pub(crate) fn raise_stmt(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Raise { exc, cause } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Raise));
        };
        if exc.is_none() && cause.is_some() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::Raise,
                detail: "a cause requires an exception".to_owned(),
            });
        }
        this.newline(Some(node));
        this.write("raise");
        if let Some(exc) = exc {
            this.write(" ");
            this.render(exc)?;
        }
        if let Some(cause) = cause {
            this.write(" from ");
            this.render(cause)?;
        }
        Ok(())
    }

    // -- expressions --------------------------------------------------------

    pub(crate) fn bool_op(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::BoolOp { op, values } = &node.syntax else {
            return Err(mismatch(node, NodeKind::BoolOp));
        };
        let op = token(&BOOLOP_SYMBOLS, *op)?;
        this.write("(");
        for (idx, value) in values.iter().enumerate() {
            if idx > 0 {
                this.write(&format!(" {op} "));
            }
            this.render(value)?;
        }
        this.write(")");
        Ok(())
    }

    pub(crate) fn bin_op(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::BinOp { left, op, right } = &node.syntax else {
            return Err(mismatch(node, NodeKind::BinOp));
        };
        let op = token(&BINOP_SYMBOLS, *op)?;
        this.render(left)?;
        this.write(&format!(" {op} "));
        this.render(right)
    }

    pub(crate) fn unary_op(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::UnaryOp { op, operand } = &node.syntax else {
            return Err(mismatch(node, NodeKind::UnaryOp));
        };
        let tok = token(&UNARYOP_SYMBOLS, *op)?;
        this.write("(");
        this.write(tok);
        if *op == UnaryOp::Not {
            this.write(" ");
        }
        this.render(operand)?;
        this.write(")");
        Ok(())
    }

    pub(crate) fn compare(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Compare {
            left,
            ops,
            comparators,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::Compare));
        };
        if ops.len() != comparators.len() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::Compare,
                detail: format!("{} operators for {} comparators", ops.len(), comparators.len()),
            });
        }
        this.render(left)?;
        for (op, comparator) in ops.iter().zip(comparators) {
            let op = token(&CMPOP_SYMBOLS, *op)?;
            this.write(&format!(" {op} "));
            this.render(comparator)?;
        }
        Ok(())
    }

    pub(crate) fn lambda(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Lambda { args, body } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Lambda));
        };
        this.write("lambda ");
        this.signature(args, NodeKind::Lambda)?;
        this.write(": ");
        this.render(body)
    }

    pub(crate) fn if_exp(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::IfExp { test, body, orelse } = &node.syntax else {
            return Err(mismatch(node, NodeKind::IfExp));
        };
        this.render(body)?;
        this.write(" if ");
        this.render(test)?;
        this.write(" else ");
        this.render(orelse)
    }

    pub(crate) fn dict(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Dict { keys, values } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Dict));
        };
        if keys.len() != values.len() {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::Dict,
                detail: format!("{} keys for {} values", keys.len(), values.len()),
            });
        }
        this.write("{");
        for (idx, (key, value)) in keys.iter().zip(values).enumerate() {
            if idx > 0 {
                this.write(", ");
            }
            match key {
                Some(key) => {
                    this.render(key)?;
                    this.write(": ");
                }
                None => this.write("**"),
            }
            this.render(value)?;
        }
        this.write("}");
        Ok(())
    }

    pub(crate) fn set(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Set { elts } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Set));
        };
        this.write("{");
        comma_list(this, elts)?;
        this.write("}");
        Ok(())
    }

    pub(crate) fn list_comp(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::ListComp { elt, generators } = &node.syntax else {
            return Err(mismatch(node, NodeKind::ListComp));
        };
        this.write("[");
        this.render(elt)?;
        for generator in generators {
            this.render(generator)?;
        }
        this.write("]");
        Ok(())
    }

    pub(crate) fn set_comp(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::SetComp { elt, generators } = &node.syntax else {
            return Err(mismatch(node, NodeKind::SetComp));
        };
        this.write("{");
        this.render(elt)?;
        for generator in generators {
            this.render(generator)?;
        }
        this.write("}");
        Ok(())
    }

    pub(crate) fn dict_comp(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::DictComp {
            key,
            value,
            generators,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::DictComp));
        };
        this.write("{");
        this.render(key)?;
        this.write(": ");
        this.render(value)?;
        for generator in generators {
            this.render(generator)?;
        }
        this.write("}");
        Ok(())
    }

    pub(crate) fn generator_exp(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::GeneratorExp { elt, generators } = &node.syntax else {
            return Err(mismatch(node, NodeKind::GeneratorExp));
        };
        this.write("(");
        this.render(elt)?;
        for generator in generators {
            this.render(generator)?;
        }
        this.write(")");
        Ok(())
    }

    pub(crate) fn comprehension(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Comprehension { target, iter, ifs } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Comprehension));
        };
        this.write(" for ");
        this.render(target)?;
        this.write(" in ");
        this.render(iter)?;
        for cond in ifs {
            this.write(" if ");
            this.render(cond)?;
        }
        Ok(())
    }

    pub(crate) fn yield_expr(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Yield { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Yield));
        };
        this.write("yield");
        if let Some(value) = value {
            this.write(" ");
            this.render(value)?;
        }
        Ok(())
    }

    pub(crate) fn yield_from(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::YieldFrom { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::YieldFrom));
        };
        this.write("yield from ");
        this.render(value)
    }

    pub(crate) fn await_expr(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Await { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Await));
        };
        let Some(value) = value else {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::Await,
                detail: "await without an operand".to_owned(),
            });
        };
        this.write("await ");
        this.render(value)
    }

    pub(crate) fn call_legacy_spreads(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        let Syntax::Call {
            func,
            args,
            keywords,
            starargs,
            kwargs,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::Call));
        };
        this.render(func)?;
        this.write("(");
        let mut want_comma = false;
        for arg in args {
            if want_comma {
                this.write(", ");
            }
            want_comma = true;
            this.render(arg)?;
        }
        for kw in keywords {
            if want_comma {
                this.write(", ");
            }
            want_comma = true;
            this.render(kw)?;
        }
        if let Some(star) = starargs {
            if want_comma {
                this.write(", ");
            }
            want_comma = true;
            this.write("*");
            this.render(star)?;
        }
        if let Some(kw) = kwargs {
            if want_comma {
                this.write(", ");
            }
            this.write("**");
            this.render(kw)?;
        }
        this.write(")");
        Ok(())
    }

    /// From grammar 3.5 on, spreads travel inside `args`/`keywords` and are
    /// rendered after every plain argument; the legacy spread fields no
    /// longer have a surface position.
    pub(crate) fn call_spreads_last(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        let Syntax::Call {
            func,
            args,
            keywords,
            starargs,
            kwargs,
        } = &node.syntax
        else {
            return Err(mismatch(node, NodeKind::Call));
        };
        if starargs.is_some() || kwargs.is_some() {
            tracing::warn!("legacy call spread fields are ignored from grammar version 3.5 on");
        }
        let is_starred = |n: &&Node| matches!(n.syntax, Syntax::Starred { .. });
        let is_named = |n: &&Node| matches!(&n.syntax, Syntax::Keyword { arg: Some(_), .. });
        this.render(func)?;
        this.write("(");
        let mut want_comma = false;
        let plain = args.iter().filter(|a| !is_starred(a));
        let named = keywords.iter().filter(is_named);
        let spreads = args
            .iter()
            .filter(is_starred)
            .chain(keywords.iter().filter(|k| !is_named(k)));
        for entry in plain.chain(named).chain(spreads) {
            if want_comma {
                this.write(", ");
            }
            want_comma = true;
            this.render(entry)?;
        }
        this.write(")");
        Ok(())
    }

    pub(crate) fn repr_expr(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Repr { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Repr));
        };
        this.write("`");
        this.render(value)?;
        this.write("`");
        Ok(())
    }

    pub(crate) fn num(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Num { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Num));
        };
        match value {
            Number::Int(n) => this.write(&n.to_string()),
            Number::Float(f) => this.write(&format!("{f:?}")),
        }
        Ok(())
    }

    pub(crate) fn str_literal(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Str { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Str));
        };
        this.write(&quote_str(value));
        Ok(())
    }

    pub(crate) fn bytes_literal(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Bytes { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Bytes));
        };
        this.write(&quote_bytes(value));
        Ok(())
    }

    pub(crate) fn name_constant(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::NameConstant { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::NameConstant));
        };
        this.write(match value {
            Singleton::None => "None",
            Singleton::True => "True",
            Singleton::False => "False",
        });
        Ok(())
    }

    pub(crate) fn ellipsis(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Ellipsis = &node.syntax else {
            return Err(mismatch(node, NodeKind::Ellipsis));
        };
        this.write("...");
        Ok(())
    }

    pub(crate) fn attribute(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Attribute { value, attr } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Attribute));
        };
        this.render(value)?;
        this.write(".");
        this.write(attr);
        Ok(())
    }

    pub(crate) fn subscript(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Subscript { value, slice } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Subscript));
        };
        this.render(value)?;
        this.write("[");
        this.render(slice)?;
        this.write("]");
        Ok(())
    }

    pub(crate) fn starred(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Starred { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Starred));
        };
        this.write("*");
        this.render(value)
    }

    pub(crate) fn name(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Name { id } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Name));
        };
        this.write_at(id, node);
        Ok(())
    }

    pub(crate) fn list(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::List { elts } = &node.syntax else {
            return Err(mismatch(node, NodeKind::List));
        };
        this.write("[");
        comma_list(this, elts)?;
        this.write("]");
        Ok(())
    }

    pub(crate) fn tuple(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Tuple { elts } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Tuple));
        };
        this.write("(");
        comma_list(this, elts)?;
        if elts.len() == 1 {
            this.write(",");
        }
        this.write(")");
        Ok(())
    }

    pub(crate) fn slice_expr(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Slice { lower, upper, step } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Slice));
        };
        if let Some(lower) = lower {
            this.render(lower)?;
        }
        this.write(":");
        if let Some(upper) = upper {
            this.render(upper)?;
        }
        if let Some(step) = step {
            this.write(":");
            // A step spelled as the name None is an artifact of older tree
            // producers and has no surface form.
            let skip = matches!(&step.syntax, Syntax::Name { id } if id == "None");
            if !skip {
                this.render(step)?;
            }
        }
        Ok(())
    }

    pub(crate) fn ext_slice(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::ExtSlice { dims } = &node.syntax else {
            return Err(mismatch(node, NodeKind::ExtSlice));
        };
        comma_list(this, dims)
    }

    pub(crate) fn index(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Index { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Index));
        };
        this.render(value)
    }

    pub(crate) fn joined_str(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::JoinedStr { values } = &node.syntax else {
            return Err(mismatch(node, NodeKind::JoinedStr));
        };
        this.write("f'");
        for part in values {
            // Literal runs are written as-is; holes dispatch normally.
            if let Syntax::Str { value } = &part.syntax {
                this.write(value);
            } else {
                this.render(part)?;
            }
        }
        this.write("'");
        Ok(())
    }

    pub(crate) fn formatted_value(
        this: &mut Unparser<'_>,
        node: &Node,
    ) -> Result<(), UnparseError> {
        let Syntax::FormattedValue { value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::FormattedValue));
        };
        let Some(value) = value else {
            return Err(UnparseError::MalformedNode {
                kind: NodeKind::FormattedValue,
                detail: "interpolation hole without an expression".to_owned(),
            });
        };
        this.write("{");
        this.render(value)?;
        this.write("}");
        Ok(())
    }

    // -- helper nodes -------------------------------------------------------

    pub(crate) fn param(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Param { name, .. } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Param));
        };
        // Annotations only have a surface form from grammar 3.0 on.
        this.write(name);
        Ok(())
    }

    pub(crate) fn param_annotated(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Param { name, annotation } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Param));
        };
        this.write(name);
        if let Some(annotation) = annotation {
            this.write(": ");
            this.render(annotation)?;
        }
        Ok(())
    }

    pub(crate) fn keyword(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Keyword { arg, value } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Keyword));
        };
        match arg {
            Some(arg) => this.write(&format!("{arg}=")),
            None => this.write("**"),
        }
        this.render(value)
    }

    pub(crate) fn alias(this: &mut Unparser<'_>, node: &Node) -> Result<(), UnparseError> {
        let Syntax::Alias { name, asname } = &node.syntax else {
            return Err(mismatch(node, NodeKind::Alias));
        };
        this.write(name);
        if let Some(asname) = asname {
            this.write(" as ");
            this.write(asname);
        }
        Ok(())
    }
}
