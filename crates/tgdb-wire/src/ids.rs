//! Client-side id sequences.
//!
//! Two sequences hand out provisional ids before the server assigns real
//! ones: virtual entity ids (also used for local large objects) and local
//! attribute-descriptor ids. Both count downward from -1 so a provisional id
//! can never collide with a server id.
//!
//! The sequences are injected through [`Sequences`]. [`Sequences::process`]
//! shares one pair across the whole process; tests use
//! [`Sequences::isolated`] to get deterministic values.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use lazy_static::lazy_static;

/// Source of provisional ids. Implementations must be safe to call from
/// many threads at once.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns the next id. Every call returns a distinct value.
    fn next_id(&self) -> i64;
}

/// Lock-free counter advancing by a fixed step.
#[derive(Debug)]
pub struct AtomicSequence {
    current: AtomicI64,
    step: i64,
}

impl AtomicSequence {
    /// A sequence yielding -1, -2, -3, ...
    pub const fn descending() -> Self {
        Self {
            current: AtomicI64::new(0),
            step: -1,
        }
    }

    /// A sequence whose first value is `first`, advancing by `step`.
    pub const fn starting_at(first: i64, step: i64) -> Self {
        Self {
            current: AtomicI64::new(first - step),
            step,
        }
    }

    /// Returns the most recently issued id without advancing.
    pub fn last(&self) -> i64 {
        self.current.load(Ordering::Acquire)
    }
}

impl IdGenerator for AtomicSequence {
    fn next_id(&self) -> i64 {
        self.current.fetch_add(self.step, Ordering::AcqRel) + self.step
    }
}

lazy_static! {
    static ref VIRTUAL_ENTITY_IDS: Arc<AtomicSequence> = Arc::new(AtomicSequence::descending());
    static ref LOCAL_ATTRIBUTE_IDS: Arc<AtomicSequence> = Arc::new(AtomicSequence::descending());
}

/// The pair of sequences a registry and its entities draw from.
#[derive(Debug, Clone)]
pub struct Sequences {
    /// Virtual ids for new nodes, edges, graphs and local large objects.
    pub entities: Arc<dyn IdGenerator>,
    /// Provisional ids for attribute descriptors not yet known to the server.
    pub attributes: Arc<dyn IdGenerator>,
}

impl Sequences {
    /// The process-wide sequences.
    pub fn process() -> Self {
        Self {
            entities: VIRTUAL_ENTITY_IDS.clone(),
            attributes: LOCAL_ATTRIBUTE_IDS.clone(),
        }
    }

    /// Fresh sequences private to the caller, both starting at -1.
    pub fn isolated() -> Self {
        Self {
            entities: Arc::new(AtomicSequence::descending()),
            attributes: Arc::new(AtomicSequence::descending()),
        }
    }
}

impl Default for Sequences {
    fn default() -> Self {
        Self::process()
    }
}
