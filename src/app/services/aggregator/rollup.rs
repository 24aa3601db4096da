//! "All"-marker roll-up expansion
//!
//! Dashboard datasets sometimes need totals at every level of a small
//! dimension set: per (date, os, country, device), but also per (date, os)
//! with the rest rolled up, and so on. Expansion replaces each subset of
//! the dimensions with the literal "All" marker, producing one tuple per
//! subset; counting the expanded tuples yields every roll-up total in one
//! pass.
//!
//! This is a power set over a handful of named dimensions, not over all
//! record fields; the tuple count doubles per dimension.

use crate::constants::ALL_MARKER;

/// Expand a dimension tuple into all roll-up combinations.
///
/// Input is the ordered (name, value) pairs of the roll-up dimensions.
/// Output contains `2^n` value tuples, each with some subset of positions
/// replaced by the "All" marker. The original tuple is the first entry;
/// ordering of the rest is deterministic.
pub fn expand_all(dimensions: &[(&str, String)]) -> Vec<Vec<String>> {
    let n = dimensions.len();
    let mut expanded = Vec::with_capacity(1 << n);

    for mask in 0u32..(1u32 << n) {
        let tuple = dimensions
            .iter()
            .enumerate()
            .map(|(i, (_, value))| {
                if mask & (1 << i) != 0 {
                    ALL_MARKER.to_string()
                } else {
                    value.clone()
                }
            })
            .collect();
        expanded.push(tuple);
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(pairs: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_expansion_size_doubles_per_dimension() {
        assert_eq!(expand_all(&dims(&[("a", "1")])).len(), 2);
        assert_eq!(expand_all(&dims(&[("a", "1"), ("b", "2")])).len(), 4);
        assert_eq!(
            expand_all(&dims(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")])).len(),
            16
        );
    }

    #[test]
    fn test_original_tuple_first() {
        let expanded = expand_all(&dims(&[("os", "1.3"), ("country", "Brazil")]));
        assert_eq!(expanded[0], vec!["1.3", "Brazil"]);
    }

    #[test]
    fn test_all_combinations_present() {
        let expanded = expand_all(&dims(&[("os", "1.3"), ("country", "Brazil")]));

        let expect = |a: &str, b: &str| {
            assert!(
                expanded.iter().any(|t| t[0] == a && t[1] == b),
                "missing combination ({}, {})",
                a,
                b
            );
        };
        expect("1.3", "Brazil");
        expect("All", "Brazil");
        expect("1.3", "All");
        expect("All", "All");
    }

    #[test]
    fn test_empty_dimensions() {
        assert_eq!(expand_all(&[]), vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_no_duplicate_tuples() {
        let expanded = expand_all(&dims(&[("a", "1"), ("b", "2"), ("c", "3")]));
        let mut unique = expanded.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), expanded.len());
    }
}
