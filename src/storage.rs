//! Result containers for mined FDs.
//!
//! A [`StrippedFd`] is the bitset-only form: one record may carry several RHS
//! attributes for the same LHS. [`FdStorage`] pairs a deque of them with the
//! table header and materializes the human-readable
//! [`FunctionalDependency`] form lazily.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use fixedbitset::FixedBitSet;

use crate::common::AttrId;
use crate::table::{Attribute, FunctionalDependency, TableHeader};

/// An FD (or a bundle of FDs sharing an LHS) over column ordinals.
///
/// Invariants: `rhs` has at least one bit set, and `lhs` and `rhs` are
/// disjoint; trivial dependencies are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedFd {
    pub lhs: FixedBitSet,
    pub rhs: FixedBitSet,
}

impl StrippedFd {
    /// Materialize against a header, one [`Attribute`] per set bit.
    pub fn to_fd(&self, header: &TableHeader) -> FunctionalDependency {
        let attrs = |bits: &FixedBitSet| {
            bits.ones()
                .map(|i| Attribute {
                    name: header.column_names[i].clone(),
                    id: AttrId::from_usize(i),
                })
                .collect()
        };
        FunctionalDependency {
            table_name: header.table_name.clone(),
            lhs: attrs(&self.lhs),
            rhs: attrs(&self.rhs),
        }
    }
}

/// Read-only FD collection, shared as [`FdStoragePtr`] after building.
pub struct FdStorage {
    header: TableHeader,
    stripped: VecDeque<StrippedFd>,
}

/// Share the storage, don't copy it.
pub type FdStoragePtr = Arc<FdStorage>;

impl FdStorage {
    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn stripped(&self) -> &VecDeque<StrippedFd> {
        &self.stripped
    }

    /// Lazily materialized view of the collection.
    pub fn iter(&self) -> impl Iterator<Item = FunctionalDependency> + '_ {
        self.stripped.iter().map(|fd| fd.to_fd(&self.header))
    }

    /// Canonical serialization: one `{"lhs": [..], "rhs": i}` object per RHS
    /// bit, sorted lexicographically. Independent of discovery order, so it
    /// can be compared across runs and implementations.
    pub fn canonical_json(&self) -> String {
        let mut entries: Vec<String> = Vec::new();
        for fd in &self.stripped {
            let lhs: Vec<String> = fd.lhs.ones().map(|i| i.to_string()).collect();
            let prefix = format!("{{\"lhs\": [{}], \"rhs\": ", lhs.join(","));
            for rhs in fd.rhs.ones() {
                entries.push(format!("{prefix}{rhs}}}"));
            }
        }
        entries.sort();
        format!("{{\"fds\": [{}]}}", entries.join(","))
    }

    /// Fletcher-16 checksum of [`FdStorage::canonical_json`]. Stable across
    /// runs and builds for the same input table and options.
    pub fn fletcher16(&self) -> u16 {
        let mut sum1: u16 = 0;
        let mut sum2: u16 = 0;
        for byte in self.canonical_json().bytes() {
            sum1 = (sum1 + u16::from(byte)) % 255;
            sum2 = (sum2 + sum1) % 255;
        }
        (sum2 << 8) | sum1
    }
}

/// Anything that accepts a stream of stripped FDs. The cover tree emits
/// through this seam so that all builders share one contract.
pub trait FdSink {
    fn add_fd(&mut self, fd: StrippedFd);
}

/// Appends everything it is given.
#[derive(Default)]
pub struct PlainFdStorageBuilder {
    stripped: VecDeque<StrippedFd>,
}

impl PlainFdStorageBuilder {
    pub fn new() -> PlainFdStorageBuilder {
        PlainFdStorageBuilder::default()
    }

    pub fn build(self, header: TableHeader) -> FdStoragePtr {
        Arc::new(FdStorage {
            header,
            stripped: self.stripped,
        })
    }
}

impl FdSink for PlainFdStorageBuilder {
    fn add_fd(&mut self, fd: StrippedFd) {
        self.stripped.push_back(fd);
    }
}

/// Rejects FDs whose LHS is wider than `max_lhs` at insertion time.
pub struct LhsCappedFdStorageBuilder {
    stripped: VecDeque<StrippedFd>,
    max_lhs: usize,
}

impl LhsCappedFdStorageBuilder {
    pub fn new(max_lhs: usize) -> LhsCappedFdStorageBuilder {
        LhsCappedFdStorageBuilder {
            stripped: VecDeque::new(),
            max_lhs,
        }
    }

    pub fn build(self, header: TableHeader) -> FdStoragePtr {
        Arc::new(FdStorage {
            header,
            stripped: self.stripped,
        })
    }
}

impl FdSink for LhsCappedFdStorageBuilder {
    fn add_fd(&mut self, fd: StrippedFd) {
        if fd.lhs.count_ones(..) > self.max_lhs {
            return;
        }
        self.stripped.push_back(fd);
    }
}

/// A monitor object for feeding one storage from several workers. Appends
/// take a lock; no ordering is promised across threads.
pub struct ConcurrentFdStorageBuilder {
    header: TableHeader,
    stripped: Mutex<VecDeque<StrippedFd>>,
}

impl ConcurrentFdStorageBuilder {
    pub fn new(header: TableHeader) -> ConcurrentFdStorageBuilder {
        ConcurrentFdStorageBuilder {
            header,
            stripped: Mutex::new(VecDeque::new()),
        }
    }

    pub fn add_fd(&self, fd: StrippedFd) {
        self.stripped.lock().unwrap().push_back(fd);
    }

    /// Consume the builder, transferring ownership of the collection.
    pub fn build(self) -> FdStoragePtr {
        Arc::new(FdStorage {
            header: self.header,
            stripped: self.stripped.into_inner().unwrap(),
        })
    }
}

impl FdSink for ConcurrentFdStorageBuilder {
    fn add_fd(&mut self, fd: StrippedFd) {
        self.stripped.lock().unwrap().push_back(fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> TableHeader {
        TableHeader {
            table_name: "t".into(),
            column_names: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    fn fd(lhs: &[usize], rhs: &[usize]) -> StrippedFd {
        let mut l = FixedBitSet::with_capacity(3);
        let mut r = FixedBitSet::with_capacity(3);
        lhs.iter().for_each(|&i| l.insert(i));
        rhs.iter().for_each(|&i| r.insert(i));
        StrippedFd { lhs: l, rhs: r }
    }

    #[test]
    fn materialization_zips_names_and_ids() {
        let got = fd(&[0, 2], &[1]).to_fd(&header());
        assert_eq!(got.to_string(), "[a, c] -> [b]");
        assert_eq!(got.lhs[1].id, AttrId::new(2));
    }

    #[test]
    fn capped_builder_rejects_wide_lhs() {
        let mut builder = LhsCappedFdStorageBuilder::new(1);
        builder.add_fd(fd(&[0], &[1]));
        builder.add_fd(fd(&[0, 2], &[1]));
        let storage = builder.build(header());
        assert_eq!(storage.stripped().len(), 1);
    }

    #[test]
    fn canonical_json_ignores_discovery_order() {
        let mut first = PlainFdStorageBuilder::new();
        first.add_fd(fd(&[0], &[1, 2]));
        first.add_fd(fd(&[1], &[0]));
        let mut second = PlainFdStorageBuilder::new();
        second.add_fd(fd(&[1], &[0]));
        second.add_fd(fd(&[0], &[2]));
        second.add_fd(fd(&[0], &[1]));
        let first = first.build(header());
        let second = second.build(header());
        assert_eq!(first.canonical_json(), second.canonical_json());
        assert_eq!(first.fletcher16(), second.fletcher16());
        assert_eq!(
            first.canonical_json(),
            "{\"fds\": [{\"lhs\": [0], \"rhs\": 1},{\"lhs\": [0], \"rhs\": 2},{\"lhs\": [1], \"rhs\": 0}]}"
        );
    }

    #[test]
    fn concurrent_builder_collects_from_threads() {
        let builder = Arc::new(ConcurrentFdStorageBuilder::new(header()));
        let handles: Vec<_> = (0..3)
            .map(|i| {
                let builder = Arc::clone(&builder);
                std::thread::spawn(move || builder.add_fd(fd(&[i], &[(i + 1) % 3])))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let builder = Arc::into_inner(builder).unwrap();
        assert_eq!(builder.build().stripped().len(), 3);
    }
}
