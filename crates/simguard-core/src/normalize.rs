//! Shared key normalization.
//!
//! Sensitivity-table lookups, provider/tier/domain tables and benchmark
//! input/output matching all compare names through [`normalize_key`], so
//! `wind_speed`, `windSpeed`, `Wind-Speed` and `wind speed` are the same key
//! everywhere.

use std::collections::BTreeMap;

/// Lower-case a key and strip `_`, `-` and whitespace.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether two keys are equal after normalization.
pub fn keys_match(a: &str, b: &str) -> bool {
    normalize_key(a) == normalize_key(b)
}

/// Look up a map entry by normalized key.
pub fn find_by_key<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<(&'a String, &'a V)> {
    let wanted = normalize_key(key);
    map.iter().find(|(k, _)| normalize_key(k) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_key("Wind_Speed"), "windspeed");
        assert_eq!(normalize_key("wind-speed"), "windspeed");
        assert_eq!(normalize_key("windSpeed"), "windspeed");
        assert_eq!(normalize_key("Power Output"), "poweroutput");
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match("capacity_factor", "capacityFactor"));
        assert!(!keys_match("capacity", "capacityFactor"));
    }

    #[test]
    fn test_find_by_key() {
        let mut map = BTreeMap::new();
        map.insert("rotorArea".to_string(), 7854.0);

        let (key, value) = find_by_key(&map, "rotor_area").unwrap();
        assert_eq!(key, "rotorArea");
        assert_eq!(*value, 7854.0);
        assert!(find_by_key(&map, "rotor").is_none());
    }
}
