//! Candidate-FD input and its normalization against a table header.

use crate::common::AttrId;
use crate::table::TableHeader;
use crate::{Error, Result};

/// One element of an FD side: a column, referenced by name or by ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> ColumnRef {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> ColumnRef {
        ColumnRef::Name(name)
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> ColumnRef {
        ColumnRef::Index(index)
    }
}

/// A candidate FD as supplied by the caller, sides in arbitrary order with
/// possible duplicates. [`FdInput::normalize`] resolves it into a
/// [`NormalizedFd`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FdInput {
    pub lhs: Vec<ColumnRef>,
    pub rhs: Vec<ColumnRef>,
}

impl FdInput {
    pub fn new<L, R>(lhs: L, rhs: R) -> FdInput
    where
        L: IntoIterator,
        L::Item: Into<ColumnRef>,
        R: IntoIterator,
        R::Item: Into<ColumnRef>,
    {
        FdInput {
            lhs: lhs.into_iter().map(Into::into).collect(),
            rhs: rhs.into_iter().map(Into::into).collect(),
        }
    }

    /// Build an input from raw index lists. Handy in tests.
    pub fn from_indices(lhs: &[usize], rhs: &[usize]) -> FdInput {
        FdInput::new(lhs.iter().copied(), rhs.iter().copied())
    }

    /// Resolve names to indices, bounds-check, then sort and deduplicate each
    /// side. Idempotent: normalizing an already-normalized input is a no-op.
    ///
    /// An empty RHS is rejected. An empty LHS is allowed and denotes the
    /// constant-column dependency `{} -> rhs`.
    pub fn normalize(&self, header: &TableHeader) -> Result<NormalizedFd> {
        if self.rhs.is_empty() {
            return Err(Error::EmptyRhs);
        }
        Ok(NormalizedFd {
            lhs: normalize_side(&self.lhs, header)?,
            rhs: normalize_side(&self.rhs, header)?,
        })
    }
}

impl From<&NormalizedFd> for FdInput {
    fn from(fd: &NormalizedFd) -> FdInput {
        FdInput::new(
            fd.lhs.iter().map(|a| a.index()),
            fd.rhs.iter().map(|a| a.index()),
        )
    }
}

/// A validated candidate FD: both sides deduplicated, ascending, in bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFd {
    pub lhs: Vec<AttrId>,
    pub rhs: Vec<AttrId>,
}

fn normalize_side(side: &[ColumnRef], header: &TableHeader) -> Result<Vec<AttrId>> {
    let mut indices = side
        .iter()
        .map(|col| resolve(col, header))
        .collect::<Result<Vec<AttrId>>>()?;
    indices.sort();
    indices.dedup();
    Ok(indices)
}

fn resolve(col: &ColumnRef, header: &TableHeader) -> Result<AttrId> {
    let names = &header.column_names;
    match col {
        ColumnRef::Name(name) => {
            let mut matches = names.iter().enumerate().filter(|(_, n)| *n == name);
            let (index, _) = matches
                .next()
                .ok_or_else(|| Error::NoSuchColumn(name.clone()))?;
            if matches.next().is_some() {
                return Err(Error::AmbiguousColumn(name.clone()));
            }
            Ok(AttrId::from_usize(index))
        }
        ColumnRef::Index(index) => {
            if *index >= names.len() {
                return Err(Error::IndexOutOfBounds {
                    index: *index,
                    num_columns: names.len(),
                });
            }
            Ok(AttrId::from_usize(*index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> TableHeader {
        TableHeader {
            table_name: "t".into(),
            column_names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn names_and_indices_mix() {
        let h = header(&["a", "b", "c"]);
        let fd = FdInput::new(vec![ColumnRef::from("c"), ColumnRef::from(0usize)], ["b"]);
        let norm = fd.normalize(&h).unwrap();
        assert_eq!(norm.lhs, vec![AttrId::new(0), AttrId::new(2)]);
        assert_eq!(norm.rhs, vec![AttrId::new(1)]);
    }

    #[test]
    fn sides_are_sorted_and_deduplicated() {
        let h = header(&["a", "b", "c"]);
        let norm = FdInput::from_indices(&[2, 0, 2, 0], &[1, 1]).normalize(&h).unwrap();
        assert_eq!(norm.lhs, vec![AttrId::new(0), AttrId::new(2)]);
        assert_eq!(norm.rhs, vec![AttrId::new(1)]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let h = header(&["a", "b", "c"]);
        let fd = FdInput::new(["c", "a", "c"], ["b"]);
        let once = fd.normalize(&h).unwrap();
        let twice = FdInput::from(&once).normalize(&h).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_lhs_is_allowed_empty_rhs_is_not() {
        let h = header(&["a", "b"]);
        let norm = FdInput::from_indices(&[], &[1]).normalize(&h).unwrap();
        assert!(norm.lhs.is_empty());
        assert!(matches!(
            FdInput::from_indices(&[0], &[]).normalize(&h),
            Err(Error::EmptyRhs)
        ));
    }

    #[test]
    fn resolution_errors() {
        let h = header(&["a", "b", "a"]);
        assert!(matches!(
            FdInput::new(["z"], ["b"]).normalize(&h),
            Err(Error::NoSuchColumn(_))
        ));
        assert!(matches!(
            FdInput::new(["a"], ["b"]).normalize(&h),
            Err(Error::AmbiguousColumn(_))
        ));
        assert!(matches!(
            FdInput::from_indices(&[3], &[1]).normalize(&h),
            Err(Error::IndexOutOfBounds { index: 3, num_columns: 3 })
        ));
    }
}
