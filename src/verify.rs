//! Verification of a single candidate FD.
//!
//! The decision runs entirely on stripped partitions: the candidate holds
//! exactly when intersecting the RHS partition into the LHS partition leaves
//! every LHS cluster intact: same cluster count, same number of clustered
//! rows. On violation, the verifier walks the LHS clusters and reports a
//! [`Highlight`] for every cluster whose rows carry more than one distinct
//! RHS value.

use std::cmp::Ordering;
use std::time::Instant;

use smallvec::SmallVec;

use crate::algorithm::Execution;
use crate::common::{IndexMap, RecordId, ValueId};
use crate::input::{FdInput, NormalizedFd};
use crate::relation::ColumnLayoutRelation;
use crate::table::RelationInput;
use crate::{Error, Result};

/// One RHS value combination; most candidates have a single RHS attribute.
type RhsValues = SmallVec<[ValueId; 4]>;

/// Diagnostic record for one violating LHS cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    cluster: Vec<RecordId>,
    num_distinct_rhs_values: usize,
    most_frequent_rhs_value_proportion: f64,
}

impl Highlight {
    /// Rows of the LHS cluster, in partition order.
    pub fn cluster(&self) -> &[RecordId] {
        &self.cluster
    }

    /// How many distinct RHS values the cluster carries; always at least 2.
    pub fn num_distinct_rhs_values(&self) -> usize {
        self.num_distinct_rhs_values
    }

    /// Share of the most common RHS value within the cluster.
    pub fn most_frequent_rhs_value_proportion(&self) -> f64 {
        self.most_frequent_rhs_value_proportion
    }
}

struct Verification {
    holds: bool,
    num_error_rows: usize,
    error: f64,
    highlights: Vec<Highlight>,
}

/// Checks whether a candidate FD holds exactly on a loaded table.
pub struct FdVerifier {
    equal_nulls: bool,
    relation: Option<ColumnLayoutRelation>,
    fd: Option<NormalizedFd>,
    verification: Option<Verification>,
}

impl Default for FdVerifier {
    fn default() -> FdVerifier {
        FdVerifier::new()
    }
}

impl FdVerifier {
    pub fn new() -> FdVerifier {
        FdVerifier {
            equal_nulls: false,
            relation: None,
            fd: None,
            verification: None,
        }
    }

    /// Whether two NULLs count as equal. Takes effect at the next
    /// [`FdVerifier::fit`].
    pub fn set_equal_nulls(&mut self, equal_nulls: bool) {
        self.equal_nulls = equal_nulls;
    }

    pub(crate) fn is_fitted(&self) -> bool {
        self.relation.is_some()
    }

    /// Load a table, discarding any previous table, candidate, and results.
    pub fn fit(&mut self, input: &mut dyn RelationInput) -> Result<()> {
        self.relation = None;
        self.fd = None;
        self.verification = None;
        self.relation = Some(ColumnLayoutRelation::load(input, self.equal_nulls)?);
        Ok(())
    }

    /// Set the candidate FD. Requires a fitted table, since names resolve
    /// against the loaded header; the input is normalized and validated here.
    pub fn set_fd(&mut self, input: &FdInput) -> Result<()> {
        let relation = self.relation.as_ref().ok_or(Error::NotFitted)?;
        self.fd = Some(input.normalize(relation.header())?);
        self.verification = None;
        Ok(())
    }

    /// Decide the candidate and compute diagnostics. Highlights come back
    /// sorted by proportion, descending.
    pub fn execute(&mut self) -> Result<Execution> {
        let relation = self.relation.as_ref().ok_or(Error::NotFitted)?;
        let fd = self.fd.as_ref().ok_or(Error::OptionNotSet("fd"))?;
        let start = Instant::now();

        let lhs_pli = relation.pli_for(&fd.lhs);
        let rhs_pli = relation.pli_for(&fd.rhs);
        let joint_pli = lhs_pli.intersect(&rhs_pli);
        // The candidate holds exactly when every LHS cluster survives the
        // intersection intact: no cluster may split (count) and no row may
        // drop out into a stripped singleton (grouped-row total).
        let holds = lhs_pli.num_clusters() == joint_pli.num_clusters()
            && lhs_pli.num_grouped_rows() == joint_pli.num_grouped_rows();

        let mut highlights = Vec::new();
        let mut num_error_rows = 0;
        if !holds {
            let mut freq: IndexMap<RhsValues, usize> = IndexMap::default();
            for cluster in lhs_pli.clusters() {
                freq.clear();
                for &row in cluster {
                    let values: RhsValues = fd
                        .rhs
                        .iter()
                        .map(|&attr| relation.column(attr).value(row))
                        .collect();
                    *freq.entry(values).or_insert(0) += 1;
                }
                if freq.len() < 2 {
                    continue;
                }
                let most_frequent = freq.values().copied().max().unwrap_or(0);
                num_error_rows += cluster.len() - most_frequent;
                highlights.push(Highlight {
                    cluster: cluster.clone(),
                    num_distinct_rhs_values: freq.len(),
                    most_frequent_rhs_value_proportion: most_frequent as f64
                        / cluster.len() as f64,
                });
            }
        }

        self.verification = Some(Verification {
            holds,
            num_error_rows,
            error: num_error_rows as f64 / relation.num_rows() as f64,
            highlights,
        });
        self.sort_highlights_by_proportion_descending()?;

        Ok(Execution::Completed {
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    pub fn fd_holds(&self) -> Result<bool> {
        Ok(self.verification()?.holds)
    }

    /// Fraction of rows that would have to change for the candidate to hold,
    /// in `[0, 1]`.
    pub fn error(&self) -> Result<f64> {
        Ok(self.verification()?.error)
    }

    pub fn num_error_clusters(&self) -> Result<usize> {
        Ok(self.verification()?.highlights.len())
    }

    pub fn num_error_rows(&self) -> Result<usize> {
        Ok(self.verification()?.num_error_rows)
    }

    pub fn highlights(&self) -> Result<&[Highlight]> {
        Ok(&self.verification()?.highlights)
    }

    pub fn sort_highlights_by_proportion_ascending(&mut self) -> Result<()> {
        self.sort_highlights(|a, b| {
            a.most_frequent_rhs_value_proportion
                .total_cmp(&b.most_frequent_rhs_value_proportion)
        })
    }

    pub fn sort_highlights_by_proportion_descending(&mut self) -> Result<()> {
        self.sort_highlights(|a, b| {
            b.most_frequent_rhs_value_proportion
                .total_cmp(&a.most_frequent_rhs_value_proportion)
        })
    }

    pub fn sort_highlights_by_num_ascending(&mut self) -> Result<()> {
        self.sort_highlights(|a, b| a.num_distinct_rhs_values.cmp(&b.num_distinct_rhs_values))
    }

    pub fn sort_highlights_by_num_descending(&mut self) -> Result<()> {
        self.sort_highlights(|a, b| b.num_distinct_rhs_values.cmp(&a.num_distinct_rhs_values))
    }

    pub fn sort_highlights_by_size_ascending(&mut self) -> Result<()> {
        self.sort_highlights(|a, b| a.cluster.len().cmp(&b.cluster.len()))
    }

    pub fn sort_highlights_by_size_descending(&mut self) -> Result<()> {
        self.sort_highlights(|a, b| b.cluster.len().cmp(&a.cluster.len()))
    }

    /// Order clusters by the LHS values of their first row (NULLs first).
    pub fn sort_highlights_by_lhs_ascending(&mut self) -> Result<()> {
        self.sort_highlights_by_lhs(false)
    }

    pub fn sort_highlights_by_lhs_descending(&mut self) -> Result<()> {
        self.sort_highlights_by_lhs(true)
    }

    fn verification(&self) -> Result<&Verification> {
        self.verification.as_ref().ok_or(Error::NotExecuted)
    }

    /// All orderings are total: ties fall back to the first row id, so the
    /// result is reproducible regardless of the comparator.
    fn sort_highlights(&mut self, cmp: impl Fn(&Highlight, &Highlight) -> Ordering) -> Result<()> {
        let verification = self.verification.as_mut().ok_or(Error::NotExecuted)?;
        verification
            .highlights
            .sort_by(|a, b| cmp(a, b).then_with(|| a.cluster[0].cmp(&b.cluster[0])));
        Ok(())
    }

    fn sort_highlights_by_lhs(&mut self, descending: bool) -> Result<()> {
        let relation = self.relation.as_ref().ok_or(Error::NotFitted)?;
        let fd = self.fd.as_ref().ok_or(Error::OptionNotSet("fd"))?;
        let lhs = &fd.lhs;
        let key = |highlight: &Highlight| -> Vec<Option<String>> {
            let row = highlight.cluster[0];
            lhs.iter()
                .map(|&attr| {
                    let column = relation.column(attr);
                    column.decode(column.value(row)).map(str::to_owned)
                })
                .collect()
        };
        let verification = self.verification.as_mut().ok_or(Error::NotExecuted)?;
        verification.highlights.sort_by(|a, b| {
            let ord = key(a).cmp(&key(b));
            let ord = if descending { ord.reverse() } else { ord };
            ord.then_with(|| a.cluster[0].cmp(&b.cluster[0]))
        });
        Ok(())
    }
}

/// Free-standing convenience: fit, set the candidate, and execute in one go.
pub fn verify_fd(
    input: &mut dyn RelationInput,
    fd: &FdInput,
    equal_nulls: bool,
) -> Result<FdVerifier> {
    let mut verifier = FdVerifier::new();
    verifier.set_equal_nulls(equal_nulls);
    verifier.fit(input)?;
    verifier.set_fd(fd)?;
    verifier.execute()?;
    Ok(verifier)
}
