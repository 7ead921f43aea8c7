//! Record collections consumed by the row manager.
//!
//! [`Store`] is the read contract the rendering core depends on. [`ArrayStore`]
//! is an in-memory implementation whose mutating operations return the
//! [`StoreChange`] notification a grid feeds back into its row manager.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::columns::value_to_text;
use crate::types::{GroupHeader, Record, RecordId};

/// Read access to an ordered, identity-bearing record sequence.
pub trait Store {
    /// Number of records in the visible (filtered/grouped/sorted) sequence.
    fn count(&self) -> usize;
    fn get_at(&self, index: usize) -> Option<&Record>;
    fn get_by_id(&self, id: &RecordId) -> Option<&Record>;
    fn index_of(&self, id: &RecordId) -> Option<usize>;
}

/// Notification describing how a store changed.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A contiguous run of records was inserted at `index`.
    Add { index: usize, count: usize },
    /// Records were removed; indices are positions before the removal, ascending.
    Remove { records: Vec<(usize, RecordId)> },
    /// Field values of one record changed.
    Update {
        id: RecordId,
        index: Option<usize>,
        fields: Vec<String>,
    },
    /// One record moved.
    Move { id: RecordId, from: usize, to: usize },
    /// All data replaced.
    Dataset,
    Filter,
    Sort,
    Group,
}

type FilterFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

enum Entry {
    Data(usize),
    Header(Record),
}

/// In-memory store with filtering, sorting and grouping.
#[derive(Default)]
pub struct ArrayStore {
    /// All records in sort order, including filtered-out ones
    records: Vec<Record>,
    /// Visible sequence
    view: Vec<Entry>,
    /// id -> position in `view`
    index: HashMap<RecordId, usize>,
    filter: Option<FilterFn>,
    group_field: Option<String>,
}

impl fmt::Debug for ArrayStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayStore")
            .field("records", &self.records.len())
            .field("visible", &self.view.len())
            .field("filtered", &self.filter.is_some())
            .field("group_field", &self.group_field)
            .finish()
    }
}

impl Store for ArrayStore {
    fn count(&self) -> usize {
        self.view.len()
    }

    fn get_at(&self, index: usize) -> Option<&Record> {
        match self.view.get(index)? {
            Entry::Data(i) => self.records.get(*i),
            Entry::Header(record) => Some(record),
        }
    }

    fn get_by_id(&self, id: &RecordId) -> Option<&Record> {
        self.index_of(id).and_then(|i| self.get_at(i))
    }

    fn index_of(&self, id: &RecordId) -> Option<usize> {
        self.index.get(id).copied()
    }
}

impl ArrayStore {
    pub fn new(records: Vec<Record>) -> Self {
        let mut store = Self {
            records,
            ..Self::default()
        };
        store.rebuild_view();
        store
    }

    /// Total records including filtered-out ones (group headers excluded).
    pub fn all_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_grouped(&self) -> bool {
        self.group_field.is_some()
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    fn rebuild_view(&mut self) {
        let passes = |r: &Record| self.filter.as_ref().map_or(true, |f| f(r));
        let mut view = Vec::with_capacity(self.records.len());
        match &self.group_field {
            None => {
                view.extend(
                    self.records
                        .iter()
                        .enumerate()
                        .filter(|(_, r)| passes(r))
                        .map(|(i, _)| Entry::Data(i)),
                );
            }
            Some(field) => {
                let mut order: Vec<(String, Value, Vec<usize>)> = Vec::new();
                let mut slots: HashMap<String, usize> = HashMap::new();
                for (i, r) in self.records.iter().enumerate() {
                    if !passes(r) {
                        continue;
                    }
                    let value = r.get(field).cloned().unwrap_or(Value::Null);
                    let key = value_to_text(Some(&value));
                    let slot = *slots.entry(key.clone()).or_insert_with(|| {
                        order.push((key, value, Vec::new()));
                        order.len() - 1
                    });
                    if let Some((_, _, members)) = order.get_mut(slot) {
                        members.push(i);
                    }
                }
                for (key, value, members) in order {
                    let mut header = Record::new(format!("group-{field}-{key}"));
                    header.group_header = Some(GroupHeader {
                        field: field.clone(),
                        value,
                        child_count: members.len(),
                    });
                    view.push(Entry::Header(header));
                    view.extend(members.into_iter().map(Entry::Data));
                }
            }
        }
        self.view = view;
        self.index.clear();
        for (pos, entry) in self.view.iter().enumerate() {
            let id = match entry {
                Entry::Data(i) => self.records.get(*i).map(|r| r.id.clone()),
                Entry::Header(r) => Some(r.id.clone()),
            };
            if let Some(id) = id {
                self.index.insert(id, pos);
            }
        }
    }

    /// Position in `records` backing a view index.
    fn record_slot(&self, view_index: usize) -> Option<usize> {
        match self.view.get(view_index)? {
            Entry::Data(i) => Some(*i),
            Entry::Header(_) => None,
        }
    }

    /// Replace all data.
    pub fn load(&mut self, records: Vec<Record>) -> StoreChange {
        self.records = records;
        self.rebuild_view();
        StoreChange::Dataset
    }

    /// Append records.
    pub fn add(&mut self, records: Vec<Record>) -> StoreChange {
        let at = self.view.len();
        self.insert(at, records)
    }

    /// Insert records before the visible index `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, records: Vec<Record>) -> StoreChange {
        let slot = self
            .record_slot(index)
            .or_else(|| index.checked_add(1).and_then(|i| self.record_slot(i)))
            .unwrap_or(self.records.len());
        let ids: Vec<RecordId> = records.iter().map(|r| r.id.clone()).collect();
        self.records.splice(slot..slot, records);
        self.rebuild_view();

        let mut positions: Vec<usize> = ids.iter().filter_map(|id| self.index_of(id)).collect();
        positions.sort_unstable();
        let Some(first) = positions.first().copied() else {
            // Everything landed outside the filter.
            return StoreChange::Filter;
        };
        let contiguous = positions
            .iter()
            .enumerate()
            .all(|(n, pos)| *pos == first + n);
        if contiguous {
            StoreChange::Add {
                index: first,
                count: positions.len(),
            }
        } else if self.is_grouped() {
            StoreChange::Group
        } else {
            StoreChange::Filter
        }
    }

    /// Remove records by id. Unknown ids are ignored.
    pub fn remove(&mut self, ids: &[RecordId]) -> StoreChange {
        let mut removed: Vec<(usize, RecordId)> = ids
            .iter()
            .filter_map(|id| self.index_of(id).map(|i| (i, id.clone())))
            .collect();
        removed.sort_by_key(|(i, _)| *i);
        self.records.retain(|r| !ids.contains(&r.id));
        self.rebuild_view();
        StoreChange::Remove { records: removed }
    }

    /// Set one field of a record. Returns `None` for unknown ids.
    pub fn update(&mut self, id: &RecordId, field: &str, value: Value) -> Option<StoreChange> {
        let record = self.records.iter_mut().find(|r| &r.id == id)?;
        record.data.insert(field.to_string(), value);
        Some(StoreChange::Update {
            id: id.clone(),
            index: self.index_of(id),
            fields: vec![field.to_string()],
        })
    }

    /// Set or clear a record's height hint.
    pub fn set_row_height(&mut self, id: &RecordId, height: Option<f64>) -> Option<StoreChange> {
        let record = self.records.iter_mut().find(|r| &r.id == id)?;
        record.row_height = height;
        Some(StoreChange::Update {
            id: id.clone(),
            index: self.index_of(id),
            fields: vec!["rowHeight".to_string()],
        })
    }

    /// Move the record at visible index `from` so it ends up at visible index `to`.
    pub fn move_record(&mut self, from: usize, to: usize) -> Option<StoreChange> {
        let src = self.record_slot(from)?;
        let id = self.records.get(src)?.id.clone();
        let record = self.records.remove(src);
        let dst = self
            .record_slot(to)
            .map(|d| if d > src { d - 1 } else { d })
            .unwrap_or(self.records.len())
            .min(self.records.len());
        // A move downwards lands after the target, like dragging onto it.
        let dst = if to > from { (dst + 1).min(self.records.len()) } else { dst };
        self.records.insert(dst, record);
        self.rebuild_view();
        let to = self.index_of(&id)?;
        Some(StoreChange::Move { id, from, to })
    }

    /// Keep only records matching `filter`.
    pub fn filter_by(&mut self, filter: impl Fn(&Record) -> bool + Send + Sync + 'static) -> StoreChange {
        self.filter = Some(Arc::new(filter));
        self.rebuild_view();
        StoreChange::Filter
    }

    pub fn clear_filter(&mut self) -> StoreChange {
        self.filter = None;
        self.rebuild_view();
        StoreChange::Filter
    }

    /// Stable sort by a field.
    pub fn sort_by(&mut self, field: &str, ascending: bool) -> StoreChange {
        self.records.sort_by(|a, b| {
            let ord = compare_values(a.get(field), b.get(field));
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        self.rebuild_view();
        StoreChange::Sort
    }

    /// Group by a field; records are sorted by it and each group gets a header row.
    pub fn group_by(&mut self, field: &str) -> StoreChange {
        self.records
            .sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        self.group_field = Some(field.to_string());
        self.rebuild_view();
        StoreChange::Group
    }

    pub fn clear_group(&mut self) -> StoreChange {
        self.group_field = None;
        self.rebuild_view();
        StoreChange::Group
    }
}

/// Ordering for JSON scalars: null < bool < number < string, arrays/objects by text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| value_to_text(a).cmp(&value_to_text(b))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn people() -> ArrayStore {
        ArrayStore::new(vec![
            Record::new(1).with("name", "Ada").with("team", "b"),
            Record::new(2).with("name", "Bob").with("team", "a"),
            Record::new(3).with("name", "Cy").with("team", "b"),
            Record::new(4).with("name", "Di").with("team", "a"),
        ])
    }

    fn ids(store: &ArrayStore) -> Vec<String> {
        (0..store.count())
            .filter_map(|i| store.get_at(i))
            .map(|r| r.id.to_string())
            .collect()
    }

    #[test]
    fn test_insert_reports_contiguous_add() {
        let mut store = people();
        let change = store.insert(1, vec![Record::new(10), Record::new(11)]);
        assert_eq!(change, StoreChange::Add { index: 1, count: 2 });
        assert_eq!(ids(&store), vec!["1", "10", "11", "2", "3", "4"]);
        assert_eq!(store.index_of(&RecordId::Int(2)), Some(3));
    }

    #[test]
    fn test_insert_past_end_appends() {
        let mut store = people();
        let change = store.insert(usize::MAX, vec![Record::new(10)]);
        assert_eq!(change, StoreChange::Add { index: 4, count: 1 });
        assert_eq!(ids(&store), vec!["1", "2", "3", "4", "10"]);
    }

    #[test]
    fn test_remove_reports_old_indices() {
        let mut store = people();
        let change = store.remove(&[RecordId::Int(3), RecordId::Int(1), RecordId::Int(99)]);
        assert_eq!(
            change,
            StoreChange::Remove {
                records: vec![(0, RecordId::Int(1)), (2, RecordId::Int(3))]
            }
        );
        assert_eq!(ids(&store), vec!["2", "4"]);
    }

    #[test]
    fn test_filter_hides_records() {
        let mut store = people();
        store.filter_by(|r| r.get("team") == Some(&Value::from("a")));
        assert_eq!(ids(&store), vec!["2", "4"]);
        assert_eq!(store.all_count(), 4);
        assert!(store.get_by_id(&RecordId::Int(1)).is_none());
        store.clear_filter();
        assert_eq!(store.count(), 4);
    }

    #[test]
    fn test_group_inserts_headers() {
        let mut store = people();
        store.group_by("team");
        assert_eq!(ids(&store), vec!["group-team-a", "2", "4", "group-team-b", "1", "3"]);
        let header = store.get_at(0).unwrap();
        assert!(header.is_special());
        assert_eq!(header.group_header.as_ref().unwrap().child_count, 2);
    }

    #[test]
    fn test_sort_descending() {
        let mut store = people();
        store.sort_by("name", false);
        assert_eq!(ids(&store), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_move_record() {
        let mut store = people();
        let change = store.move_record(0, 2).unwrap();
        assert_eq!(ids(&store), vec!["2", "3", "1", "4"]);
        assert_eq!(
            change,
            StoreChange::Move {
                id: RecordId::Int(1),
                from: 0,
                to: 2
            }
        );
        store.move_record(3, 0).unwrap();
        assert_eq!(ids(&store), vec!["4", "2", "3", "1"]);
    }
}
