//! Property-Based Tests for Metrics Module
//!
//! Uses proptest to check counter, hit-rate and cleanup behavior of the registry.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::metrics::MetricsRegistry;
use crate::time::round2;

// == Strategies ==
fn path_strategy() -> impl Strategy<Value = String> {
    "/[a-z]{1,8}(/[a-z0-9]{1,6})?".prop_map(|s| s)
}

fn method_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("GET"), Just("POST"), Just("PUT"), Just("DELETE")]
}

fn duration_strategy() -> impl Strategy<Value = f64> {
    (0u32..50_000).prop_map(|d| d as f64 / 10.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Each recorded request bumps count by one and total by its duration;
    // min/max match the true extremes.
    #[test]
    fn prop_request_counters_accumulate(
        method in method_strategy(),
        path in path_strategy(),
        durations in prop::collection::vec(duration_strategy(), 1..40),
    ) {
        let metrics = MetricsRegistry::new();
        let mut total = 0.0;

        for (i, d) in durations.iter().enumerate() {
            metrics.record_request(method, &path, *d, 200);
            total += d;

            let stats = metrics.get_request_stats();
            prop_assert_eq!(stats.len(), 1);
            prop_assert_eq!(stats[0].count, (i + 1) as u64);
            prop_assert!((stats[0].total_duration - round2(total)).abs() < 0.011);
        }

        let min = durations.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = durations.iter().cloned().fold(0.0, f64::max);
        let stats = metrics.get_request_stats();
        prop_assert_eq!(stats[0].min_duration, round2(min));
        prop_assert_eq!(stats[0].max_duration, round2(max));
        prop_assert_eq!(stats[0].status_codes.get(&200).copied(), Some(durations.len() as u64));
    }

    // hit_rate equals hits / (hits + misses), rounded to two decimals.
    #[test]
    fn prop_hit_rate_matches_counts(hits in prop::collection::vec(any::<bool>(), 1..100)) {
        let metrics = MetricsRegistry::new();
        for (i, hit) in hits.iter().enumerate() {
            metrics.record_cache_operation("get", &format!("k{}", i), *hit, 0.5);
        }

        let h = hits.iter().filter(|h| **h).count() as u64;
        let m = hits.len() as u64 - h;

        let stats = metrics.get_cache_stats();
        let get = stats.iter().find(|s| s.operation == "cache:get").unwrap();
        prop_assert_eq!(get.hits, h);
        prop_assert_eq!(get.misses, m);
        prop_assert_eq!(get.hit_rate, round2(h as f64 / (h + m) as f64));
    }

    // Cleanup removes exactly the entries last touched before the cutoff.
    #[test]
    fn prop_cleanup_age_boundary(
        paths in prop::collection::hash_set(path_strategy(), 1..20),
        pick in any::<prop::sample::Index>(),
        offset in 0u64..3,
    ) {
        let metrics = MetricsRegistry::new();
        for path in &paths {
            metrics.record_request("GET", path, 1.0, 200);
        }

        let before: HashMap<String, u64> = metrics
            .get_request_stats()
            .into_iter()
            .map(|s| (s.endpoint, s.last_access))
            .collect();
        let accesses: Vec<u64> = before.values().copied().collect();
        let cutoff = accesses[pick.index(accesses.len())] + offset;

        metrics.cleanup_before(cutoff);

        let after: HashMap<String, u64> = metrics
            .get_request_stats()
            .into_iter()
            .map(|s| (s.endpoint, s.last_access))
            .collect();

        for (endpoint, last_access) in &before {
            prop_assert_eq!(after.contains_key(endpoint), *last_access >= cutoff);
        }
    }
}
