//! Cache index construction.
//!
//! A pure function of the strategy and the canonical records. Records are
//! borrowed and copied into the index; records lacking the key field are
//! skipped.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use excel_model::{CacheIndex, IndexKey, Record, index_key};

use crate::strategy::{IndexingStrategy, RecordFilter};

const DEFAULT_RANK: &str = "0";

/// Re-indexes canonical records into the dataset's lookup shape.
pub fn build_index(strategy: &IndexingStrategy, records: &[Record]) -> CacheIndex {
    match strategy {
        IndexingStrategy::Direct { id_field } => build_direct(id_field, None, records),
        IndexingStrategy::FilteredDirect { id_field, filter } => {
            build_direct(id_field, Some(filter), records)
        }
        IndexingStrategy::LeveledCurve {
            level_field,
            list_field,
            type_field,
            value_field,
        } => build_curve(level_field, list_field, type_field, value_field, records),
        IndexingStrategy::NestedByParentAndRank {
            parent_field,
            rank_field,
        } => build_nested(parent_field, rank_field, records),
    }
}

fn key_of(record: &Record, field: &str) -> Option<IndexKey> {
    record.get(field).and_then(index_key)
}

fn build_direct(id_field: &str, filter: Option<&RecordFilter>, records: &[Record]) -> CacheIndex {
    let mut entries = BTreeMap::new();
    let mut skipped = 0usize;
    let mut seen = BTreeSet::new();
    for record in records {
        let Some(id) = key_of(record, id_field) else {
            skipped += 1;
            continue;
        };
        let keep = match filter {
            None => true,
            Some(RecordFilter::FieldPresent { field }) => {
                record.get(field).is_some_and(|v| !v.is_null())
            }
            Some(RecordFilter::FieldNotEquals { field, value }) => record.get(field) != Some(value),
            Some(RecordFilter::FirstOccurrence) => seen.insert(id.clone()),
        };
        if keep {
            entries.insert(id, record.clone());
        }
    }
    if skipped > 0 {
        debug!(id_field, skipped, "records without id skipped");
    }
    CacheIndex::Direct(entries)
}

fn build_curve(
    level_field: &str,
    list_field: &str,
    type_field: &str,
    value_field: &str,
    records: &[Record],
) -> CacheIndex {
    let mut curves: BTreeMap<IndexKey, BTreeMap<IndexKey, Value>> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in records {
        let Some(level) = key_of(record, level_field) else {
            skipped += 1;
            continue;
        };
        let Some(entries) = record.get(list_field).and_then(Value::as_array) else {
            skipped += 1;
            continue;
        };
        for entry in entries.iter().filter_map(Value::as_object) {
            let (Some(curve_type), Some(value)) = (key_of(entry, type_field), entry.get(value_field))
            else {
                continue;
            };
            curves
                .entry(curve_type)
                .or_default()
                .insert(level.clone(), value.clone());
        }
    }
    if skipped > 0 {
        debug!(level_field, list_field, skipped, "records without level or curve list skipped");
    }
    CacheIndex::Curve(curves)
}

fn build_nested(parent_field: &str, rank_field: &str, records: &[Record]) -> CacheIndex {
    let mut groups: BTreeMap<IndexKey, BTreeMap<IndexKey, Record>> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in records {
        let Some(parent) = key_of(record, parent_field) else {
            skipped += 1;
            continue;
        };
        let rank = key_of(record, rank_field).unwrap_or_else(|| DEFAULT_RANK.to_string());
        groups
            .entry(parent)
            .or_default()
            .insert(rank, record.clone());
    }
    if skipped > 0 {
        debug!(parent_field, skipped, "records without parent id skipped");
    }
    CacheIndex::Nested(groups)
}
