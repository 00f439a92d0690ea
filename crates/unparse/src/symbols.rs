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

//! Operator-to-token tables. A miss here is reported as an unsupported
//! operator at render time rather than at table construction, so a dialect
//! is free to carry a subset table if its grammar generation defines fewer
//! operators.

use pysrc_ast::{BinaryOp, BoolOp, CmpOp, UnaryOp};

/// A fixed mapping from operator kind to its surface token.
#[derive(Debug)]
pub struct SymbolTable<T: 'static> {
    name: &'static str,
    entries: &'static [(T, &'static str)],
}

impl<T: PartialEq + Copy> SymbolTable<T> {
    pub const fn new(name: &'static str, entries: &'static [(T, &'static str)]) -> Self {
        SymbolTable { name, entries }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn token(&self, op: T) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == op)
            .map(|(_, token)| *token)
    }
}

pub static BOOLOP_SYMBOLS: SymbolTable<BoolOp> =
    SymbolTable::new("boolean", &[(BoolOp::And, "and"), (BoolOp::Or, "or")]);

pub static BINOP_SYMBOLS: SymbolTable<BinaryOp> = SymbolTable::new(
    "binary",
    &[
        (BinaryOp::Add, "+"),
        (BinaryOp::Sub, "-"),
        (BinaryOp::Mul, "*"),
        (BinaryOp::Div, "/"),
        (BinaryOp::FloorDiv, "//"),
        (BinaryOp::Mod, "%"),
        (BinaryOp::LShift, "<<"),
        (BinaryOp::RShift, ">>"),
        (BinaryOp::BitOr, "|"),
        (BinaryOp::BitAnd, "&"),
        (BinaryOp::BitXor, "^"),
        (BinaryOp::Pow, "**"),
    ],
);

pub static CMPOP_SYMBOLS: SymbolTable<CmpOp> = SymbolTable::new(
    "comparison",
    &[
        (CmpOp::Eq, "=="),
        (CmpOp::NotEq, "!="),
        (CmpOp::Lt, "<"),
        (CmpOp::LtE, "<="),
        (CmpOp::Gt, ">"),
        (CmpOp::GtE, ">="),
        (CmpOp::In, "in"),
        (CmpOp::NotIn, "not in"),
        (CmpOp::Is, "is"),
        (CmpOp::IsNot, "is not"),
    ],
);

pub static UNARYOP_SYMBOLS: SymbolTable<UnaryOp> = SymbolTable::new(
    "unary",
    &[
        (UnaryOp::Invert, "~"),
        (UnaryOp::Not, "not"),
        (UnaryOp::UAdd, "+"),
        (UnaryOp::USub, "-"),
    ],
);

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    // The shipped tables cover every operator the grammar family defines;
    // subsetting is a dialect's prerogative, not an accident of these four.

    #[test]
    fn boolean_table_is_total() {
        for op in BoolOp::iter() {
            assert!(BOOLOP_SYMBOLS.token(op).is_some(), "{op:?} missing");
        }
    }

    #[test]
    fn binary_table_is_total() {
        for op in BinaryOp::iter() {
            assert!(BINOP_SYMBOLS.token(op).is_some(), "{op:?} missing");
        }
    }

    #[test]
    fn comparison_table_is_total() {
        for op in CmpOp::iter() {
            assert!(CMPOP_SYMBOLS.token(op).is_some(), "{op:?} missing");
        }
    }

    #[test]
    fn unary_table_is_total() {
        for op in UnaryOp::iter() {
            assert!(UNARYOP_SYMBOLS.token(op).is_some(), "{op:?} missing");
        }
    }

    #[test]
    fn membership_and_identity_tokens_are_spaced_words() {
        assert_eq!(CMPOP_SYMBOLS.token(CmpOp::NotIn), Some("not in"));
        assert_eq!(CMPOP_SYMBOLS.token(CmpOp::IsNot), Some("is not"));
    }
}
