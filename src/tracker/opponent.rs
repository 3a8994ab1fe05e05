//! Rehydration of the opponent's counter record from persisted partial data.
//!
//! The opponent is tracked as one flat record of lowercase counters. Which
//! counters exist depends on the team's configured stat columns, except for
//! `time` and `fouls`, which are tracked universally.

use indexmap::IndexMap;

/// Flat mapping of lowercase stat names to counters.
pub type StatRecord = IndexMap<String, i64>;

/// Zero-valued record with `time` and `fouls` plus one lowercase key per
/// requested column.
pub fn build_opponent_stat_defaults(columns: &[String]) -> StatRecord {
    let mut stats = StatRecord::new();
    stats.insert("time".to_owned(), 0);
    stats.insert("fouls".to_owned(), 0);
    for column in columns {
        stats.insert(column.to_lowercase(), 0);
    }
    stats
}

/// Overlay persisted values onto the defaults. Only the requested columns
/// are copied over, except `fouls`, which is restored whenever present in
/// `data` regardless of the configured column list.
pub fn hydrate_opponent_stats(data: &StatRecord, columns: &[String]) -> StatRecord {
    let mut stats = build_opponent_stat_defaults(columns);
    for column in columns {
        let key = column.to_lowercase();
        if let Some(value) = data.get(&key) {
            stats.insert(key, *value);
        }
    }
    if let Some(fouls) = data.get("fouls") {
        stats.insert("fouls".to_owned(), *fouls);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn record(pairs: &[(&str, i64)]) -> StatRecord {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    #[test]
    fn defaults_always_carry_time_and_fouls() {
        let defaults = build_opponent_stat_defaults(&[]);
        assert_eq!(defaults, record(&[("time", 0), ("fouls", 0)]));
    }

    #[test]
    fn defaults_lowercase_the_requested_columns() {
        let defaults = build_opponent_stat_defaults(&columns(&["PTS", "Reb"]));
        assert_eq!(defaults.get("pts"), Some(&0));
        assert_eq!(defaults.get("reb"), Some(&0));
        assert_eq!(defaults.get("PTS"), None);
    }

    #[test]
    fn hydrate_overlays_matching_columns_and_fouls() {
        let data = record(&[("pts", 8), ("fouls", 3)]);
        let stats = hydrate_opponent_stats(&data, &columns(&["PTS"]));

        assert_eq!(stats.get("pts"), Some(&8));
        assert_eq!(stats.get("fouls"), Some(&3));
        assert_eq!(stats.get("time"), Some(&0));
    }

    #[test]
    fn missing_source_values_stay_zero() {
        let stats = hydrate_opponent_stats(&StatRecord::new(), &columns(&["pts", "reb"]));
        assert!(stats.values().all(|value| *value == 0));
        assert_eq!(stats.len(), 4);
    }

    #[test]
    fn fouls_restore_even_when_not_a_configured_column() {
        let data = record(&[("fouls", 5), ("blk", 2)]);
        let stats = hydrate_opponent_stats(&data, &columns(&["pts"]));

        assert_eq!(stats.get("fouls"), Some(&5));
        // "blk" was not requested, so it is not rehydrated.
        assert_eq!(stats.get("blk"), None);
    }
}
