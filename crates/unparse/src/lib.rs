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

//! Reconstruction of Python source text from syntax trees, versioned by
//! grammar generation. Pick a [`PyVersion`], hand [`unparse`] a tree, and
//! get back surface syntax in that generation's dialect; constructs the
//! generation does not know about come back as errors rather than
//! best-effort text.

mod dialect;
mod symbols;
mod unparse;

pub use dialect::{Dialect, PyVersion};
pub use symbols::{
    BINOP_SYMBOLS, BOOLOP_SYMBOLS, CMPOP_SYMBOLS, SymbolTable, UNARYOP_SYMBOLS,
};
pub use unparse::{UnparseError, UnparseOptions, unparse, unparse_with_dialect};

pub use pysrc_ast as ast;
