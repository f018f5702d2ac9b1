//! Column-layout view of a loaded table.
//!
//! Cell contents are interned per column into dense [`ValueId`]s in
//! first-occurrence order, so id equality is value equality and no hash
//! collision can fake an agreement between rows. NULL handling is fixed at
//! load time: with `equal_nulls` every NULL of a column shares one id,
//! without it every NULL receives a fresh id and can never agree with
//! anything.

use crate::common::{AttrId, HashMap, RecordId, ValueId};
use crate::pli::Pli;
use crate::table::{read_header, RelationInput, TableHeader};
use crate::{Error, Result};

/// One column: interned values per row, their dictionary, and the stripped
/// partition the column induces.
pub struct ColumnData {
    values: Vec<ValueId>,
    dictionary: Vec<Option<Box<str>>>,
    pli: Pli,
}

impl ColumnData {
    pub fn pli(&self) -> &Pli {
        &self.pli
    }

    pub fn value(&self, row: RecordId) -> ValueId {
        self.values[row.index()]
    }

    /// The cell contents behind an interned id; `None` for NULL.
    pub fn decode(&self, value: ValueId) -> Option<&str> {
        self.dictionary[value.index()].as_deref()
    }
}

/// A fully loaded relation: header plus per-column data.
pub struct ColumnLayoutRelation {
    header: TableHeader,
    columns: Vec<ColumnData>,
    num_rows: usize,
}

impl ColumnLayoutRelation {
    /// Scan `input` once and build per-column interned values and PLIs.
    pub fn load(input: &mut dyn RelationInput, equal_nulls: bool) -> Result<ColumnLayoutRelation> {
        let (header, tuples) = load_tuples(input, equal_nulls)?;
        let n = header.num_columns();
        let num_rows = tuples.rows.len();
        let columns = (0..n)
            .map(|col| {
                let values: Vec<ValueId> = tuples.rows.iter().map(|row| row[col]).collect();
                ColumnData {
                    pli: Pli::for_column(&values),
                    values,
                    dictionary: tuples.dictionaries[col].clone(),
                }
            })
            .collect();
        Ok(ColumnLayoutRelation {
            header,
            columns,
            num_rows,
        })
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, attr: AttrId) -> &ColumnData {
        &self.columns[attr.index()]
    }

    /// The partition induced by an attribute list, built by left-to-right
    /// intersection of the per-column partitions. The empty list yields the
    /// single-cluster partition.
    pub fn pli_for(&self, attrs: &[AttrId]) -> Pli {
        let mut attrs = attrs.iter();
        let Some(&first) = attrs.next() else {
            return Pli::single_cluster(self.num_rows);
        };
        let mut pli = self.column(first).pli().clone();
        for &attr in attrs {
            pli = pli.intersect(self.column(attr).pli());
        }
        pli
    }
}

/// Row-major interned tuples, the miner's working form.
pub(crate) struct InternedTuples {
    pub(crate) rows: Vec<Vec<ValueId>>,
    dictionaries: Vec<Vec<Option<Box<str>>>>,
}

/// Read all rows of `input`, interning each column independently.
pub(crate) fn load_tuples(
    input: &mut dyn RelationInput,
    equal_nulls: bool,
) -> Result<(TableHeader, InternedTuples)> {
    let header = read_header(input)?;
    let n = header.num_columns();
    input.reset()?;

    let mut interners: Vec<Interner> = (0..n).map(|_| Interner::new(equal_nulls)).collect();
    let mut rows: Vec<Vec<ValueId>> = Vec::new();
    while let Some(row) = input.next_row()? {
        if row.len() != n {
            return Err(Error::MalformedRow {
                row: rows.len(),
                expected: n,
                got: row.len(),
            });
        }
        rows.push(
            row.into_iter()
                .zip(&mut interners)
                .map(|(cell, interner)| interner.intern(cell))
                .collect(),
        );
    }
    if rows.is_empty() {
        return Err(Error::EmptyTable);
    }
    let dictionaries = interners.into_iter().map(|i| i.dictionary).collect();
    Ok((header, InternedTuples { rows, dictionaries }))
}

/// Per-column value interner. Ids are dense and assigned in first-occurrence
/// order, which keeps everything downstream reproducible.
struct Interner {
    map: HashMap<Box<str>, ValueId>,
    dictionary: Vec<Option<Box<str>>>,
    equal_nulls: bool,
    null_id: Option<ValueId>,
}

impl Interner {
    fn new(equal_nulls: bool) -> Interner {
        Interner {
            map: HashMap::default(),
            dictionary: Vec::new(),
            equal_nulls,
            null_id: None,
        }
    }

    fn intern(&mut self, cell: Option<String>) -> ValueId {
        match cell {
            Some(text) => {
                let text: Box<str> = text.into_boxed_str();
                if let Some(&id) = self.map.get(&text) {
                    return id;
                }
                let id = ValueId::from_usize(self.dictionary.len());
                self.dictionary.push(Some(text.clone()));
                self.map.insert(text, id);
                id
            }
            None if self.equal_nulls => match self.null_id {
                Some(id) => id,
                None => {
                    let id = ValueId::from_usize(self.dictionary.len());
                    self.dictionary.push(None);
                    self.null_id = Some(id);
                    id
                }
            },
            // Distinct-NULL semantics: a fresh id per occurrence.
            None => {
                let id = ValueId::from_usize(self.dictionary.len());
                self.dictionary.push(None);
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryRelation;

    fn null_table() -> Vec<Vec<Option<String>>> {
        vec![
            vec![None, Some("1".into())],
            vec![None, Some("1".into())],
            vec![Some("a".into()), Some("2".into())],
        ]
    }

    #[test]
    fn interning_is_per_column_and_first_seen() {
        let mut rel = MemoryRelation::of("t", &["x", "y"], &[&["a", "a"], &["b", "a"], &["a", "b"]]);
        let loaded = ColumnLayoutRelation::load(&mut rel, false).unwrap();
        let x = loaded.column(AttrId::new(0));
        let y = loaded.column(AttrId::new(1));
        assert_eq!(x.value(RecordId::new(0)), ValueId::new(0));
        assert_eq!(x.value(RecordId::new(1)), ValueId::new(1));
        assert_eq!(x.value(RecordId::new(2)), ValueId::new(0));
        assert_eq!(y.value(RecordId::new(0)), y.value(RecordId::new(1)));
        assert_eq!(x.decode(ValueId::new(1)), Some("b"));
    }

    #[test]
    fn equal_nulls_collapse_to_one_id() {
        let mut rel = MemoryRelation::new("t", &["k", "v"], null_table());
        let loaded = ColumnLayoutRelation::load(&mut rel, true).unwrap();
        let k = loaded.column(AttrId::new(0));
        assert_eq!(k.value(RecordId::new(0)), k.value(RecordId::new(1)));
        assert_eq!(k.decode(k.value(RecordId::new(0))), None);
        assert_eq!(k.pli().num_clusters(), 1);
    }

    #[test]
    fn distinct_nulls_never_agree() {
        let mut rel = MemoryRelation::new("t", &["k", "v"], null_table());
        let loaded = ColumnLayoutRelation::load(&mut rel, false).unwrap();
        let k = loaded.column(AttrId::new(0));
        assert_ne!(k.value(RecordId::new(0)), k.value(RecordId::new(1)));
        assert_eq!(k.pli().num_clusters(), 0);
    }

    #[test]
    fn load_rejects_bad_inputs() {
        let mut empty = MemoryRelation::of("t", &["a"], &[]);
        assert!(matches!(
            ColumnLayoutRelation::load(&mut empty, false),
            Err(Error::EmptyTable)
        ));

        let mut ragged = MemoryRelation::of("t", &["a", "b"], &[&["1", "2"], &["3"]]);
        assert!(matches!(
            ColumnLayoutRelation::load(&mut ragged, false),
            Err(Error::MalformedRow { row: 1, expected: 2, got: 1 })
        ));
    }

    #[test]
    fn pli_for_attribute_lists() {
        let mut rel = MemoryRelation::of(
            "t",
            &["x", "y"],
            &[&["a", "p"], &["a", "p"], &["a", "q"], &["b", "q"]],
        );
        let loaded = ColumnLayoutRelation::load(&mut rel, false).unwrap();
        assert_eq!(loaded.pli_for(&[]).num_clusters(), 1);
        assert_eq!(loaded.pli_for(&[AttrId::new(0)]).num_clusters(), 1);
        let joint = loaded.pli_for(&[AttrId::new(0), AttrId::new(1)]);
        assert_eq!(joint.num_clusters(), 1);
        assert_eq!(joint.clusters()[0], vec![RecordId::new(0), RecordId::new(1)]);
    }
}
