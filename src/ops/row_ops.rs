use std::collections::HashSet;

use chrono::Local;
use serde_json::Value;

use crate::model::row::{GridRow, Record, RowId};

/// Next free numeric id: one past the largest positive numeric id, or the
/// smallest unused positive id once the largest is `i64::MAX`.
/// String ids and generated (negative) ids do not count.
pub fn next_numeric_id(rows: &[Record]) -> i64 {
    let taken: HashSet<i64> = rows
        .iter()
        .filter_map(|r| match r.id() {
            RowId::Num(n) if n > 0 => Some(n),
            _ => None,
        })
        .collect();
    let max = taken.iter().copied().max().unwrap_or(0);
    max.checked_add(1)
        .unwrap_or_else(|| (1..).find(|n| !taken.contains(n)).unwrap_or(1))
}

/// Splice an accepted ghost into the real rows under a fresh id.
/// Returns the id it was given.
pub fn merge_ghost(rows: &mut Vec<Record>, ghost: Record) -> RowId {
    let id = RowId::Num(next_numeric_id(rows));
    let attrs = ghost
        .fields()
        .iter()
        .filter(|(k, _)| k.as_str() != "id")
        .map(|(k, v)| (k.clone(), v.clone()));
    let mut record = Record::new(id.clone(), attrs);
    if record.get("created").is_none() {
        record.set("created", Value::String(today_str()));
    }
    rows.push(record);
    id
}

/// Remove the given rows. Returns the removed rows in table order; unknown
/// ids are skipped.
pub fn delete_rows(rows: &mut Vec<Record>, ids: &[RowId]) -> Vec<Record> {
    let mut removed = Vec::new();
    rows.retain(|r| {
        if ids.contains(&r.row_id()) {
            removed.push(r.clone());
            false
        } else {
            true
        }
    });
    removed
}

/// Bulk action: set `field` to `value` on every listed row. Returns how many
/// rows actually changed.
pub fn apply_action(rows: &mut [Record], ids: &[RowId], field: &str, value: &Value) -> usize {
    if field == "id" {
        return 0;
    }
    let mut changed = 0;
    for row in rows.iter_mut().filter(|r| ids.contains(&r.id())) {
        if row.get(field) != Some(value) {
            row.set(field, value.clone());
            changed += 1;
        }
    }
    changed
}

fn today_str() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        vec![
            Record::new(1, [("name".to_string(), json!("A"))]),
            Record::new(4, [("name".to_string(), json!("B"))]),
            Record::new("x", [("name".to_string(), json!("C"))]),
        ]
    }

    #[test]
    fn next_id_ignores_string_and_negative_ids() {
        assert_eq!(next_numeric_id(&rows()), 5);
        assert_eq!(next_numeric_id(&[]), 1);
        assert_eq!(next_numeric_id(&[Record::new(-3, [])]), 1);
    }

    #[test]
    fn next_id_reuses_gap_after_max_id() {
        let rows = vec![Record::new(1, []), Record::new(i64::MAX, []), Record::new(2, [])];
        assert_eq!(next_numeric_id(&rows), 3);

        let mut rows = vec![Record::new(i64::MAX, [])];
        let id = merge_ghost(&mut rows, Record::new(-1, []));
        assert_eq!(id, RowId::Num(1));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn merge_assigns_fresh_id_and_keeps_fields() {
        let mut rows = rows();
        let ghost = Record::new(
            -1,
            [
                ("name".to_string(), json!("Generated")),
                ("created".to_string(), json!("2026-01-01")),
            ],
        );
        let id = merge_ghost(&mut rows, ghost);
        assert_eq!(id, RowId::Num(5));
        let merged = rows.last().unwrap();
        assert_eq!(merged.id(), RowId::Num(5));
        assert_eq!(merged.get("name"), Some(&json!("Generated")));
        assert_eq!(merged.get("created"), Some(&json!("2026-01-01")));

        let id = merge_ghost(&mut rows, Record::new(-2, []));
        assert_eq!(id, RowId::Num(6));
        assert!(rows.last().unwrap().get("created").is_some());
    }

    #[test]
    fn delete_returns_removed_rows() {
        let mut rows = rows();
        let removed = delete_rows(&mut rows, &[RowId::Str("x".into()), RowId::Num(1), RowId::Num(99)]);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].id(), RowId::Num(1));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn apply_action_counts_changes() {
        let mut rows = rows();
        rows[0].set("status", json!("Done"));
        let n = apply_action(&mut rows, &[RowId::Num(1), RowId::Num(4)], "status", &json!("Done"));
        assert_eq!(n, 1);
        assert_eq!(rows[1].get("status"), Some(&json!("Done")));
        assert_eq!(apply_action(&mut rows, &[RowId::Num(1)], "id", &json!(7)), 0);
    }
}
