//! Newtypes for the three index spaces of an analyzed grammar. The analysis
//! passes cross-reference productions, definitions, and expressions by index
//! rather than by pointer, so the cyclic grammar graph needs no owning
//! cycles; the only operation the indices support is widening back to
//! `usize` for vector lookup. Construction always starts from a `usize` that
//! `EbnfGrammar::from_ast` has already checked against `StorageT`'s range,
//! which is why the widening below cannot lose bits.

use num_traits::{self, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a production: its position in the grammar file (with the
/// suppressed `c` production not counted).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PIdx<T>(pub T);

/// Identifies a definition: one `|`-separated alternative of some
/// production.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DIdx<T>(pub T);

/// Identifies one expression occurrence. Occurrences are not shared, with a
/// single exception: index 0 is the comma alias `c`, wherever it appears.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EIdx<T>(pub T);

impl<T: PrimInt + Unsigned> From<PIdx<T>> for usize {
    fn from(PIdx(v): PIdx<T>) -> usize {
        num_traits::cast(v).unwrap()
    }
}

impl<T: PrimInt + Unsigned> From<DIdx<T>> for usize {
    fn from(DIdx(v): DIdx<T>) -> usize {
        num_traits::cast(v).unwrap()
    }
}

impl<T: PrimInt + Unsigned> From<EIdx<T>> for usize {
    fn from(EIdx(v): EIdx<T>) -> usize {
        num_traits::cast(v).unwrap()
    }
}
