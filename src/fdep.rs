//! The FDep mining pipeline.
//!
//! Every disagreeing row pair contributes its agree-set as a witness that the
//! agree-set does not determine the disagreeing attributes; the LHS-maximal
//! witnesses form the negative cover. Inverting the negative cover by
//! repeated specialization of the most general dependencies yields the
//! positive cover, the minimal FDs that hold on the relation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::algorithm::Execution;
use crate::bitset::AttrSet;
use crate::common::{AttrId, ValueId};
use crate::relation::load_tuples;
use crate::storage::{FdStoragePtr, LhsCappedFdStorageBuilder};
use crate::table::{RelationInput, TableHeader};
use crate::tree::FdTree;
use crate::{Error, Result};

/// How many row pairs are compared between cancellation checks.
const PAIR_BATCH: usize = 1024;

/// Miner for the minimal cover of exact FDs.
///
/// Configure with [`FDep::set_equal_nulls`] / [`FDep::set_max_lhs`] (or the
/// dynamic [`crate::Algorithm`] surface), load a table with [`FDep::fit`],
/// then [`FDep::execute`]. Results come back through [`FDep::fd_storage`].
pub struct FDep {
    equal_nulls: bool,
    max_lhs: usize,
    cancel: Option<Arc<AtomicBool>>,
    loaded: Option<Loaded>,
    storage: Option<FdStoragePtr>,
}

struct Loaded {
    header: TableHeader,
    tuples: Vec<Vec<ValueId>>,
}

impl Default for FDep {
    fn default() -> FDep {
        FDep::new()
    }
}

impl FDep {
    pub fn new() -> FDep {
        FDep {
            equal_nulls: false,
            max_lhs: usize::MAX,
            cancel: None,
            loaded: None,
            storage: None,
        }
    }

    /// Whether two NULLs count as equal when comparing rows. Takes effect at
    /// the next [`FDep::fit`].
    pub fn set_equal_nulls(&mut self, equal_nulls: bool) {
        self.equal_nulls = equal_nulls;
    }

    /// Drop every FD whose LHS has more than `max_lhs` attributes.
    pub fn set_max_lhs(&mut self, max_lhs: usize) {
        self.max_lhs = max_lhs;
    }

    /// Install a cooperative cancellation flag. The miner polls it between
    /// phases and every `PAIR_BATCH` row pairs; once it is set, execution
    /// abandons all partial state and reports [`Execution::Cancelled`].
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    pub(crate) fn is_fitted(&self) -> bool {
        self.loaded.is_some()
    }

    /// Load a table, discarding any previous table and results.
    pub fn fit(&mut self, input: &mut dyn RelationInput) -> Result<()> {
        self.loaded = None;
        self.storage = None;
        let (header, tuples) = load_tuples(input, self.equal_nulls)?;
        self.loaded = Some(Loaded {
            header,
            tuples: tuples.rows,
        });
        Ok(())
    }

    /// Mine the minimal cover. Returns the elapsed wall-clock time, or
    /// [`Execution::Cancelled`] if the cancellation flag was observed.
    pub fn execute(&mut self) -> Result<Execution> {
        let loaded = self.loaded.as_ref().ok_or(Error::NotFitted)?;
        self.storage = None;
        let start = Instant::now();
        let n = loaded.header.num_columns();

        let Some(neg_cover) = build_negative_cover(loaded, self.cancel.as_deref()) else {
            return Ok(Execution::Cancelled);
        };
        debug!("negative cover built over {} rows", loaded.tuples.len());
        if cancelled(self.cancel.as_deref()) {
            return Ok(Execution::Cancelled);
        }

        let mut pos_cover = FdTree::new(n);
        pos_cover.add_most_general();
        neg_cover.for_each_fd(|lhs, rhs| specialize_positive_cover(&mut pos_cover, lhs, rhs, n));
        debug!("positive cover derived");
        if cancelled(self.cancel.as_deref()) {
            return Ok(Execution::Cancelled);
        }

        let mut builder = LhsCappedFdStorageBuilder::new(self.max_lhs);
        pos_cover.emit(&mut builder, self.max_lhs);
        let storage = builder.build(loaded.header.clone());
        debug!("mined {} stripped FDs", storage.stripped().len());
        self.storage = Some(storage);

        Ok(Execution::Completed {
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// The result of the last successful [`FDep::execute`].
    pub fn fd_storage(&self) -> Result<FdStoragePtr> {
        self.storage.clone().ok_or(Error::NotExecuted)
    }
}

fn cancelled(flag: Option<&AtomicBool>) -> bool {
    flag.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Compare all unordered row pairs and record their violated FDs; then keep
/// only the LHS-maximal witnesses. `None` on cancellation.
fn build_negative_cover(loaded: &Loaded, cancel: Option<&AtomicBool>) -> Option<FdTree> {
    let n = loaded.header.num_columns();
    let mut neg_cover = FdTree::new(n);
    let all_attrs = AttrSet::fill_below(n);
    let mut since_check = 0usize;
    for (i, t1) in loaded.tuples.iter().enumerate() {
        for t2 in &loaded.tuples[i + 1..] {
            add_violated_fds(&mut neg_cover, all_attrs, t1, t2);
            since_check += 1;
            if since_check == PAIR_BATCH {
                since_check = 0;
                if cancelled(cancel) {
                    return None;
                }
            }
        }
    }
    neg_cover.filter_specializations();
    Some(neg_cover)
}

/// A pair disagreeing on `a` while agreeing on `eq` witnesses that `eq` does
/// not determine `a`.
fn add_violated_fds(neg_cover: &mut FdTree, all_attrs: AttrSet, t1: &[ValueId], t2: &[ValueId]) {
    let mut diff = AttrSet::new();
    for (attr, (v1, v2)) in t1.iter().zip(t2).enumerate() {
        if v1 != v2 {
            diff.insert(AttrId::from_usize(attr));
        }
    }
    let eq = all_attrs & !diff;
    for attr in diff.iter() {
        neg_cover.add(&eq, attr);
    }
}

/// The cover-inversion step: every positive-cover generalization of a
/// negative witness `lhs ↛ rhs` is removed and replaced by its minimal
/// extensions that escape the witness.
fn specialize_positive_cover(pos_cover: &mut FdTree, lhs: &AttrSet, rhs: AttrId, n: usize) {
    let mut gen_lhs = AttrSet::new();
    while pos_cover.take_generalization(lhs, rhs, &mut gen_lhs) {
        for attr in (0..n).rev() {
            let attr = AttrId::from_usize(attr);
            if lhs.contains(attr) || attr == rhs {
                continue;
            }
            gen_lhs.insert(attr);
            if !pos_cover.contains_generalization(&gen_lhs, rhs) {
                pos_cover.add(&gen_lhs, rhs);
            }
            gen_lhs.remove(attr);
        }
    }
}
