//! Object lifetime instrumentation.
//!
//! Creation and destruction of managed objects can be observed through an
//! [`ObjectObserver`]. Nothing is recorded unless an observer is attached to
//! a handle via [`Instrumentation`], so tests can inject their own counters
//! without touching process-wide state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use metrics::{counter, gauge};

/// Receives lifetime events for managed objects.
pub trait ObjectObserver: Send + Sync {
    fn on_create(&self, type_name: &'static str);
    fn on_destroy(&self, type_name: &'static str);
}

/// Optional observer attached to a handle.
#[derive(Clone, Default)]
pub struct Instrumentation {
    observer: Option<Arc<dyn ObjectObserver>>,
}

impl Instrumentation {
    /// No instrumentation.
    pub fn none() -> Self {
        Self { observer: None }
    }

    pub fn new(observer: Arc<dyn ObjectObserver>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_some()
    }

    pub(crate) fn created(&self, type_name: &'static str) {
        if let Some(observer) = &self.observer {
            observer.on_create(type_name);
        }
    }

    pub(crate) fn destroyed(&self, type_name: &'static str) {
        if let Some(observer) = &self.observer {
            observer.on_destroy(type_name);
        }
    }
}

impl fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumentation")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Created/destroyed counters for one object type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TypeCounters {
    pub created: u64,
    pub destroyed: u64,
}

impl TypeCounters {
    /// Objects created but not yet destroyed.
    pub fn live(&self) -> u64 {
        self.created.saturating_sub(self.destroyed)
    }
}

/// Per-type object counters.
#[derive(Debug, Default)]
pub struct ObjectStatistics {
    counters: Mutex<BTreeMap<&'static str, TypeCounters>>,
}

impl ObjectStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<&'static str, TypeCounters>> {
        // Counters stay meaningful even if a panicking thread held the lock.
        match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Counters for a single type (zero if never seen).
    pub fn counters(&self, type_name: &str) -> TypeCounters {
        self.guard().get(type_name).copied().unwrap_or_default()
    }

    /// Live objects of a single type.
    pub fn live(&self, type_name: &str) -> u64 {
        self.counters(type_name).live()
    }

    /// Live objects over all types.
    pub fn total_live(&self) -> u64 {
        self.guard().values().map(TypeCounters::live).sum()
    }

    /// Copy of all counters, keyed by type name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, TypeCounters> {
        self.guard().clone()
    }

    /// Log the current counters at info level.
    pub fn report(&self) {
        for (type_name, counters) in self.snapshot() {
            tracing::info!(
                type_name,
                created = counters.created,
                destroyed = counters.destroyed,
                live = counters.live(),
                "object statistics"
            );
        }
    }
}

impl ObjectObserver for ObjectStatistics {
    fn on_create(&self, type_name: &'static str) {
        let live = {
            let mut counters = self.guard();
            let entry = counters.entry(type_name).or_default();
            entry.created += 1;
            entry.live()
        };
        counter!("radar_objects_created_total", "type" => type_name).increment(1);
        gauge!("radar_objects_live", "type" => type_name).set(live as f64);
    }

    fn on_destroy(&self, type_name: &'static str) {
        let live = {
            let mut counters = self.guard();
            let entry = counters.entry(type_name).or_default();
            entry.destroyed += 1;
            entry.live()
        };
        counter!("radar_objects_destroyed_total", "type" => type_name).increment(1);
        gauge!("radar_objects_live", "type" => type_name).set(live as f64);
    }
}
