use crate::constants::ID_PREFIX;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out `fight_<created_nanos>_<n>` identifiers.
///
/// The timestamp is taken once when the generator is built, so ids are only
/// unique within one instance. Two generators created within the same clock
/// tick produce the same prefix and can collide.
#[derive(Debug)]
pub struct IdGenerator {
    created_nanos: i64,
    counter: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        let created_nanos = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros() * 1_000);
        Self::with_timestamp(created_nanos)
    }

    pub fn with_timestamp(created_nanos: i64) -> Self {
        Self {
            created_nanos,
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}_{}_{}", ID_PREFIX, self.created_nanos, n)
    }
}
