//! Mining and verification of exact functional dependencies (FDs).
//!
//! The miner implements FDep: all disagreeing row pairs are folded into a
//! *negative cover* (the LHS-maximal attribute sets that fail to determine
//! some attribute), which is then inverted into the *positive cover*, the
//! minimal set of FDs that hold on the relation. Both covers live in
//! [`FdTree`], a prefix trie over ascending attribute indices whose nodes
//! carry RHS bitsets.
//!
//! The verifier decides a single candidate FD by intersecting stripped
//! position-list indexes ([`Pli`]) and, on violation, reports per-cluster
//! [`Highlight`] diagnostics.
//!
//! Attribute counts are capped at [`MAX_ATTRS`]; cell values are interned to
//! dense ids at load, so value equality is exact rather than hash-based.

use thiserror::Error;

pub(crate) mod algorithm;
pub(crate) mod bitset;
pub(crate) mod common;
pub(crate) mod fdep;
pub(crate) mod input;
pub(crate) mod pli;
pub(crate) mod relation;
pub(crate) mod storage;
pub(crate) mod table;
pub(crate) mod tree;
pub(crate) mod verify;

pub use algorithm::{Algorithm, Execution, OptionType, OptionValue};
pub use bitset::{AttrSet, MAX_ATTRS};
pub use common::{AttrId, RecordId, ValueId};
pub use fdep::FDep;
pub use input::{ColumnRef, FdInput, NormalizedFd};
pub use pli::Pli;
pub use relation::ColumnLayoutRelation;
pub use storage::{
    ConcurrentFdStorageBuilder, FdSink, FdStorage, FdStoragePtr, LhsCappedFdStorageBuilder,
    PlainFdStorageBuilder, StrippedFd,
};
pub use table::{Attribute, FunctionalDependency, MemoryRelation, RelationInput, TableHeader};
pub use tree::FdTree;
pub use verify::{verify_fd, FdVerifier, Highlight};

/// Errors surfaced by loading, configuration, and execution.
///
/// Every failure is reported synchronously to the caller of the operation
/// that triggered it; a failed instance becomes usable again after a
/// subsequent [`Algorithm::fit`]. Cancellation is not an error; see
/// [`Execution::Cancelled`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("no column named {0:?}")]
    NoSuchColumn(String),
    #[error("column name {0:?} is ambiguous, use its index instead")]
    AmbiguousColumn(String),
    #[error("column index {index} is out of bounds, the table has {num_columns} columns")]
    IndexOutOfBounds { index: usize, num_columns: usize },
    #[error("RHS is empty, there is nothing to check")]
    EmptyRhs,
    #[error("table has {0} columns, more than the supported maximum of {MAX_ATTRS}")]
    TooManyAttributes(usize),
    #[error("unknown option {0:?}")]
    UnknownOption(String),
    #[error("option {option:?} expects a {expected:?} value")]
    OptionTypeMismatch {
        option: &'static str,
        expected: OptionType,
    },
    #[error("the table is empty")]
    EmptyTable,
    #[error("row {row} has {got} cells, the header declares {expected} columns")]
    MalformedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("no table loaded, call fit first")]
    NotFitted,
    #[error("no results available, call execute first")]
    NotExecuted,
    #[error("required option {0:?} is not set")]
    OptionNotSet(&'static str),
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
