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

//! The dialect chain. Each grammar generation is the previous generation's
//! rule set plus a small delta: new node kinds, or replacement renderings for
//! constructs whose surface form changed. A dialect is resolved once, up
//! front, by folding the base table with every delta at or below the chosen
//! version; rendering then dispatches through the flat result and never walks
//! the chain again.

use std::collections::HashMap;

use pysrc_ast::NodeKind;
use strum::IntoEnumIterator;

use crate::unparse::{UnparseError, Unparser, rules};

/// A per-kind rendering rule. Rules are plain function pointers so a resolved
/// dialect is a value: immutable, cheaply shareable across threads, and
/// comparable in tests.
pub(crate) type RenderRule =
    for<'a, 'b, 'c> fn(&'a mut Unparser<'b>, &'c pysrc_ast::Node) -> Result<(), UnparseError>;

/// One generation of the grammar, in chain order. Ordering is meaningful:
/// resolving version V applies the deltas of every version <= V.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter, strum::Display)]
pub enum PyVersion {
    #[strum(serialize = "2.6")]
    Py26,
    #[strum(serialize = "2.7")]
    Py27,
    #[strum(serialize = "3.0")]
    Py30,
    #[strum(serialize = "3.1")]
    Py31,
    #[strum(serialize = "3.2")]
    Py32,
    #[strum(serialize = "3.3")]
    Py33,
    #[strum(serialize = "3.4")]
    Py34,
    #[strum(serialize = "3.5")]
    Py35,
    #[strum(serialize = "3.6")]
    Py36,
}

impl PyVersion {
    pub fn latest() -> Self {
        PyVersion::Py36
    }

    /// The rule additions/replacements this generation layers on top of the
    /// previous one. Several generations changed nothing that survives
    /// unparsing; their deltas are empty chain links.
    fn delta(self) -> &'static [(NodeKind, RenderRule)] {
        match self {
            PyVersion::Py26 | PyVersion::Py27 | PyVersion::Py31 | PyVersion::Py32 => &[],
            // 3.0: parameter/return annotations, keyword-style class bases.
            PyVersion::Py30 => &[
                (NodeKind::FunctionDef, rules::function_def_annotated),
                (NodeKind::ClassDef, rules::class_def_keywords),
                (NodeKind::Param, rules::param_annotated),
            ],
            // 3.3: the unified try statement, multi-item with, yield from.
            PyVersion::Py33 => &[
                (NodeKind::Try, rules::try_unified),
                (NodeKind::With, rules::with_items),
                (NodeKind::YieldFrom, rules::yield_from),
            ],
            // 3.4: named singletons became literal nodes.
            PyVersion::Py34 => &[(NodeKind::NameConstant, rules::name_constant)],
            // 3.5: async constructs, and call spreads deferred to the end.
            PyVersion::Py35 => &[
                (NodeKind::AsyncFunctionDef, rules::async_function_def),
                (NodeKind::AsyncFor, rules::async_for),
                (NodeKind::Await, rules::await_expr),
                (NodeKind::Call, rules::call_spreads_last),
            ],
            // 3.6: f-string interpolation.
            PyVersion::Py36 => &[
                (NodeKind::JoinedStr, rules::joined_str),
                (NodeKind::FormattedValue, rules::formatted_value),
            ],
        }
    }
}

/// The rendering rules shared by every generation, keyed by node kind. Kinds
/// absent here only render once some delta introduces them.
const BASE_RULES: &[(NodeKind, RenderRule)] = &[
    // Statements
    (NodeKind::Module, rules::module),
    (NodeKind::FunctionDef, rules::function_def),
    (NodeKind::ClassDef, rules::class_def),
    (NodeKind::Return, rules::return_stmt),
    (NodeKind::Delete, rules::delete),
    (NodeKind::Assign, rules::assign),
    (NodeKind::AugAssign, rules::aug_assign),
    (NodeKind::Print, rules::print_stmt),
    (NodeKind::For, rules::for_stmt),
    (NodeKind::While, rules::while_stmt),
    (NodeKind::If, rules::if_stmt),
    (NodeKind::With, rules::with_single),
    (NodeKind::TryExcept, rules::try_except),
    (NodeKind::TryFinally, rules::try_finally),
    (NodeKind::Assert, rules::assert_stmt),
    (NodeKind::Import, rules::import),
    (NodeKind::ImportFrom, rules::import_from),
    (NodeKind::Global, rules::global_stmt),
    (NodeKind::Nonlocal, rules::nonlocal_stmt),
    (NodeKind::Expr, rules::expr_stmt),
    (NodeKind::Pass, rules::pass_stmt),
    (NodeKind::Break, rules::break_stmt),
    (NodeKind::Continue, rules::continue_stmt),
    (NodeKind::Raise, rules::raise_stmt),
    // Expressions
    (NodeKind::BoolOp, rules::bool_op),
    (NodeKind::BinOp, rules::bin_op),
    (NodeKind::UnaryOp, rules::unary_op),
    (NodeKind::Lambda, rules::lambda),
    (NodeKind::IfExp, rules::if_exp),
    (NodeKind::Dict, rules::dict),
    (NodeKind::Set, rules::set),
    (NodeKind::ListComp, rules::list_comp),
    (NodeKind::SetComp, rules::set_comp),
    (NodeKind::DictComp, rules::dict_comp),
    (NodeKind::GeneratorExp, rules::generator_exp),
    (NodeKind::Yield, rules::yield_expr),
    (NodeKind::Compare, rules::compare),
    (NodeKind::Call, rules::call_legacy_spreads),
    (NodeKind::Repr, rules::repr_expr),
    (NodeKind::Num, rules::num),
    (NodeKind::Str, rules::str_literal),
    (NodeKind::Bytes, rules::bytes_literal),
    (NodeKind::Ellipsis, rules::ellipsis),
    (NodeKind::Attribute, rules::attribute),
    (NodeKind::Subscript, rules::subscript),
    (NodeKind::Starred, rules::starred),
    (NodeKind::Name, rules::name),
    (NodeKind::List, rules::list),
    (NodeKind::Tuple, rules::tuple),
    (NodeKind::Slice, rules::slice_expr),
    (NodeKind::ExtSlice, rules::ext_slice),
    (NodeKind::Index, rules::index),
    // Helper nodes
    (NodeKind::Param, rules::param),
    (NodeKind::Keyword, rules::keyword),
    (NodeKind::Alias, rules::alias),
    (NodeKind::Comprehension, rules::comprehension),
    (NodeKind::ExceptHandler, rules::except_handler),
];

/// A fully-resolved dialect: one grammar generation's complete rule set.
/// Immutable once resolved; a render call borrows it and never changes it.
#[derive(Debug)]
pub struct Dialect {
    version: PyVersion,
    rules: HashMap<NodeKind, RenderRule>,
}

impl Dialect {
    /// Folds the base table with every delta up to and including `version`,
    /// later deltas overriding earlier ones for the same node kind.
    pub fn resolve(version: PyVersion) -> Self {
        let mut rules: HashMap<NodeKind, RenderRule> = BASE_RULES.iter().copied().collect();
        for link in PyVersion::iter().filter(|v| *v <= version) {
            for (kind, rule) in link.delta() {
                rules.insert(*kind, *rule);
            }
        }
        Dialect { version, rules }
    }

    pub fn version(&self) -> PyVersion {
        self.version
    }

    /// Whether this dialect has a rendering rule for the given node kind.
    pub fn supports(&self, kind: NodeKind) -> bool {
        self.rules.contains_key(&kind)
    }

    pub(crate) fn rule(&self, kind: NodeKind) -> Option<RenderRule> {
        self.rules.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn versions_are_ordered_as_a_chain() {
        let chain: Vec<_> = PyVersion::iter().collect();
        let mut sorted = chain.clone();
        sorted.sort();
        assert_eq!(chain, sorted);
        assert_eq!(*chain.last().unwrap(), PyVersion::latest());
    }

    #[test]
    fn empty_deltas_change_nothing() {
        let base = Dialect::resolve(PyVersion::Py26);
        let next = Dialect::resolve(PyVersion::Py27);
        for kind in NodeKind::iter() {
            assert_eq!(base.supports(kind), next.supports(kind), "{kind}");
        }
    }

    #[test]
    fn later_dialects_only_ever_grow() {
        let chain: Vec<_> = PyVersion::iter().collect();
        for pair in chain.windows(2) {
            let earlier = Dialect::resolve(pair[0]);
            let later = Dialect::resolve(pair[1]);
            for kind in NodeKind::iter() {
                if earlier.supports(kind) {
                    assert!(later.supports(kind), "{} dropped {kind}", pair[1]);
                }
            }
        }
    }

    #[test_case(NodeKind::Try, PyVersion::Py33; "unified try")]
    #[test_case(NodeKind::YieldFrom, PyVersion::Py33; "yield from")]
    #[test_case(NodeKind::NameConstant, PyVersion::Py34; "named singletons")]
    #[test_case(NodeKind::AsyncFunctionDef, PyVersion::Py35; "async def")]
    #[test_case(NodeKind::AsyncFor, PyVersion::Py35; "async for")]
    #[test_case(NodeKind::Await, PyVersion::Py35; "await expression")]
    #[test_case(NodeKind::JoinedStr, PyVersion::Py36; "joined string")]
    #[test_case(NodeKind::FormattedValue, PyVersion::Py36; "formatted value")]
    fn kinds_appear_exactly_at_their_version(kind: NodeKind, introduced: PyVersion) {
        for version in PyVersion::iter() {
            let dialect = Dialect::resolve(version);
            assert_eq!(
                dialect.supports(kind),
                version >= introduced,
                "kind {kind} under version {version}"
            );
        }
    }

    #[test]
    fn call_rule_is_replaced_at_35() {
        let before = Dialect::resolve(PyVersion::Py34);
        let after = Dialect::resolve(PyVersion::Py35);
        assert!(before.supports(NodeKind::Call) && after.supports(NodeKind::Call));
        assert_ne!(
            before.rule(NodeKind::Call).unwrap() as usize,
            after.rule(NodeKind::Call).unwrap() as usize
        );
    }
}
