//! Stripped position-list indexes (PLIs).
//!
//! A [`Pli`] holds the equivalence classes ("clusters") of rows that agree on
//! an attribute set, with singleton classes removed. A probing vector maps
//! each row to its cluster ordinal for constant-time lookup during
//! intersection.

use crate::common::{IndexMap, RecordId, ValueId};


/// Probing-vector sentinel for rows whose cluster was stripped.
const NO_CLUSTER: u32 = u32::MAX;

/// The stripped partition induced by an attribute set.
///
/// Cluster order is deterministic: construction and intersection both keep
/// first-seen order, so two identical inputs always produce identical PLIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pli {
    clusters: Vec<Vec<RecordId>>,
    probing: Vec<u32>,
    num_rows: usize,
}

impl Pli {
    /// Build the partition of a single column from its interned values.
    pub fn for_column(values: &[ValueId]) -> Pli {
        let mut groups: IndexMap<ValueId, Vec<RecordId>> = IndexMap::default();
        for (row, &value) in values.iter().enumerate() {
            groups
                .entry(value)
                .or_default()
                .push(RecordId::from_usize(row));
        }
        let clusters = groups
            .into_values()
            .filter(|cluster| cluster.len() > 1)
            .collect();
        Pli::from_clusters(clusters, values.len())
    }

    /// The partition of the empty attribute set: every row agrees with every
    /// other, so there is a single cluster (none at all for tables of fewer
    /// than two rows, where even that cluster would be stripped).
    pub fn single_cluster(num_rows: usize) -> Pli {
        let clusters = if num_rows > 1 {
            vec![(0..num_rows).map(RecordId::from_usize).collect()]
        } else {
            Vec::new()
        };
        Pli::from_clusters(clusters, num_rows)
    }

    fn from_clusters(clusters: Vec<Vec<RecordId>>, num_rows: usize) -> Pli {
        let mut probing = vec![NO_CLUSTER; num_rows];
        for (ordinal, cluster) in clusters.iter().enumerate() {
            debug_assert!(cluster.len() > 1, "singleton clusters must be stripped");
            for &row in cluster {
                debug_assert_eq!(
                    probing[row.index()],
                    NO_CLUSTER,
                    "clusters must be disjoint"
                );
                probing[row.index()] = ordinal as u32;
            }
        }
        Pli {
            clusters,
            probing,
            num_rows,
        }
    }

    /// The partition of `S ∪ T` from the partitions of `S` (self) and `T`.
    ///
    /// Each cluster of `self` is split by `other`'s probing vector; rows that
    /// are singletons in `other` drop out, and the surviving buckets keep the
    /// scan order of `self` then the first-seen order of `other`'s clusters.
    pub fn intersect(&self, other: &Pli) -> Pli {
        assert_eq!(
            self.num_rows, other.num_rows,
            "intersecting partitions of different relations"
        );
        let mut clusters = Vec::new();
        let mut buckets: IndexMap<u32, Vec<RecordId>> = IndexMap::default();
        for cluster in &self.clusters {
            for &row in cluster {
                let probe = other.probing[row.index()];
                if probe != NO_CLUSTER {
                    buckets.entry(probe).or_default().push(row);
                }
            }
            clusters.extend(
                buckets
                    .drain(..)
                    .map(|(_, bucket)| bucket)
                    .filter(|bucket| bucket.len() > 1),
            );
        }
        Pli::from_clusters(clusters, self.num_rows)
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of rows that sit in some cluster, i.e. rows that agree
    /// with at least one other row.
    pub fn num_grouped_rows(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn clusters(&self) -> &[Vec<RecordId>] {
        &self.clusters
    }
}
