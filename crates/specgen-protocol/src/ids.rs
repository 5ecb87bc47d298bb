//! Message id generation
//!
//! Ids are injected rather than derived from the wall clock, so two
//! requests issued within the same millisecond still get distinct ids.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of outbound message ids
pub trait MessageIdSource: Send + Sync + Debug {
    /// Next id to stamp on a request
    fn next_id(&self) -> i64;
}

/// Strictly increasing ids starting from a seed
#[derive(Debug)]
pub struct MonotonicIds {
    next: AtomicI64,
}

impl MonotonicIds {
    /// Counter whose first id is `start`
    #[inline]
    #[must_use]
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Default for MonotonicIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl MessageIdSource for MonotonicIds {
    fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Uniformly random positive ids
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl MessageIdSource for RandomIds {
    fn next_id(&self) -> i64 {
        rand::rng().random_range(1..i64::MAX)
    }
}

/// Configurable id strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageIdStrategy {
    /// [`MonotonicIds`]
    #[default]
    Monotonic,
    /// [`RandomIds`]
    Random,
}

impl MessageIdStrategy {
    /// Build the id source
    #[must_use]
    pub fn build(self) -> Arc<dyn MessageIdSource> {
        match self {
            Self::Monotonic => Arc::new(MonotonicIds::default()),
            Self::Random => Arc::new(RandomIds),
        }
    }
}
