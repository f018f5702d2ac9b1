//! Numeric id newtypes and hash-container aliases shared across the crate.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<FxHasher>>;
pub(crate) type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Define a `u32`-backed newtype used as a typed index.
macro_rules! define_id {
    ($v:vis $name:ident, $doc:tt) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[doc = $doc]
        $v struct $name {
            rep: u32,
        }

        impl $name {
            $v const fn new(rep: u32) -> Self {
                $name { rep }
            }

            $v fn from_usize(index: usize) -> Self {
                assert!(
                    index <= u32::MAX as usize,
                    "overflowing id type {} with index {}",
                    stringify!($name),
                    index
                );
                $name::new(index as u32)
            }

            /// The id as a `usize`, for indexing into dense tables.
            $v fn index(self) -> usize {
                self.rep as usize
            }

            $v fn rep(self) -> u32 {
                self.rep
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(fmt, "{}({})", stringify!($name), self.rep)
            }
        }
    };
}

define_id!(pub AttrId, "a zero-based attribute (column) ordinal");
define_id!(pub RecordId, "a zero-based row ordinal");
define_id!(pub ValueId, "an interned cell value; ids are per-column");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_and_order() {
        let a = AttrId::from_usize(3);
        assert_eq!(a.index(), 3);
        assert_eq!(a.rep(), 3);
        assert!(AttrId::new(1) < AttrId::new(2));
        assert_eq!(format!("{:?}", RecordId::new(7)), "RecordId(7)");
    }
}
