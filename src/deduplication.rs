// 🔍 Deduplication - One record per primary key
// Policy: the last-encountered duplicate wins, at the position of the first one

use crate::entities::Record;
use std::collections::HashMap;

/// Result of a dedup pass
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated<R> {
    pub records: Vec<R>,

    /// Rows that were superseded by a later row with the same key
    pub duplicates_removed: usize,
}

/// Keep exactly one record per distinct key
///
/// A later duplicate overwrites the earlier one in place, so the output keeps
/// first-seen key order but carries the latest values.
pub fn dedup_keep_last<R: Record>(records: Vec<R>) -> Deduplicated<R> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<R> = Vec::with_capacity(records.len());
    let mut duplicates_removed = 0;

    for record in records {
        match positions.get(record.key()) {
            Some(&idx) => {
                kept[idx] = record;
                duplicates_removed += 1;
            }
            None => {
                positions.insert(record.key().to_string(), kept.len());
                kept.push(record);
            }
        }
    }

    Deduplicated {
        records: kept,
        duplicates_removed,
    }
}
