//! Process-wide node and bus id issuance.
//!
//! Both counters only ever increase; ids are never reused or returned.

use std::sync::atomic::{AtomicI32, Ordering};

use timbre_types::{BusId, NodeId};

/// Node ids 0 and 1 belong to the server (root node and default group).
pub const FIRST_NODE_ID: i32 = 2;
/// Buses below this are the hardware in/out channels.
pub const FIRST_BUS_ID: i32 = 4;

pub struct ResourceIds {
    next_node: AtomicI32,
    next_bus: AtomicI32,
}

impl Default for ResourceIds {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceIds {
    pub fn new() -> Self {
        Self {
            next_node: AtomicI32::new(FIRST_NODE_ID),
            next_bus: AtomicI32::new(FIRST_BUS_ID),
        }
    }

    /// Issue a fresh synth node id.
    pub fn next_note_id(&self) -> NodeId {
        NodeId::new(self.next_node.fetch_add(1, Ordering::Relaxed))
    }

    /// Issue a fresh effect bus id.
    pub fn next_bus_id(&self) -> BusId {
        BusId::new(self.next_bus.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of node ids handed out so far.
    pub fn notes_issued(&self) -> i32 {
        self.next_node.load(Ordering::Relaxed) - FIRST_NODE_ID
    }
}
