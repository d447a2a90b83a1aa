//! Metrics facade helpers
//!
//! Counters go through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, gauge};

use crate::domain::response_cache::MatchType;

const MICRO_DOLLARS_PER_DOLLAR: f64 = 1_000_000.0;

/// Outcome label for a cache lookup
pub fn lookup_label(match_type: Option<MatchType>) -> &'static str {
    match match_type {
        Some(MatchType::Exact) => "exact",
        Some(MatchType::Fuzzy) => "fuzzy",
        None => "miss",
    }
}

/// Record a cache lookup outcome
pub fn record_cache_lookup(match_type: Option<MatchType>) {
    let labels = [("result", lookup_label(match_type).to_string())];
    counter!("tokenshield_cache_lookups_total", &labels).increment(1);
}

/// Record LRU evictions
pub fn record_cache_evictions(count: u64) {
    if count > 0 {
        counter!("tokenshield_cache_evictions_total").increment(count);
    }
}

/// Record TTL expirations
pub fn record_cache_expirations(count: u64) {
    if count > 0 {
        counter!("tokenshield_cache_expirations_total").increment(count);
    }
}

/// Track the live entry count
pub fn record_cache_size(entries: usize) {
    gauge!("tokenshield_cache_entries").set(entries as f64);
}

/// Record a priced request. Cost is tracked in micro-dollars so it fits a
/// monotonic integer counter.
pub fn record_cost(model: &str, total_cost: f64) {
    let labels = [("model", model.to_string())];

    counter!("tokenshield_cost_requests_total", &labels).increment(1);
    counter!("tokenshield_cost_usd_total", &labels).increment(to_micro_dollars(total_cost));
}

fn to_micro_dollars(cost: f64) -> u64 {
    if !cost.is_finite() || cost <= 0.0 {
        return 0;
    }

    (cost * MICRO_DOLLARS_PER_DOLLAR).round() as u64
}

/// Test recorder that remembers the last value of the cache size gauge
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex, PoisonError};

    use metrics::{
        Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };

    #[derive(Debug, Default)]
    struct LastValue(Mutex<Option<f64>>);

    impl LastValue {
        fn update(&self, f: impl FnOnce(f64) -> f64) {
            let mut value = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            *value = Some(f(value.unwrap_or(0.0)));
        }
    }

    impl GaugeFn for LastValue {
        fn increment(&self, value: f64) {
            self.update(|current| current + value);
        }

        fn decrement(&self, value: f64) {
            self.update(|current| current - value);
        }

        fn set(&self, value: f64) {
            self.update(|_| value);
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct CacheSizeCapture {
        size: Arc<LastValue>,
    }

    impl CacheSizeCapture {
        pub(crate) fn last(&self) -> Option<f64> {
            *self.size.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Recorder for CacheSizeCapture {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            if key.name() == "tokenshield_cache_entries" {
                Gauge::from_arc(Arc::clone(&self.size))
            } else {
                Gauge::noop()
            }
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_label() {
        assert_eq!(lookup_label(Some(MatchType::Exact)), "exact");
        assert_eq!(lookup_label(Some(MatchType::Fuzzy)), "fuzzy");
        assert_eq!(lookup_label(None), "miss");
    }

    #[test]
    fn test_to_micro_dollars() {
        assert_eq!(to_micro_dollars(0.0125), 12_500);
        assert_eq!(to_micro_dollars(0.0), 0);
        assert_eq!(to_micro_dollars(-1.0), 0);
        assert_eq!(to_micro_dollars(f64::NAN), 0);
    }

    #[test]
    fn test_size_gauge_capture() {
        let capture = testing::CacheSizeCapture::default();
        assert_eq!(capture.last(), None);

        ::metrics::with_local_recorder(&capture, || record_cache_size(7));
        assert_eq!(capture.last(), Some(7.0));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cache_lookup(None);
        record_cache_evictions(3);
        record_cache_expirations(0);
        record_cache_size(10);
        record_cost("gpt-4o", 0.5);
    }
}
