//! Typed flow events kept in a pre-allocated ring buffer.
//!
//! Every physical movement the engine performs (production, delivery,
//! distillation, reserve traffic, loss) and every operator edit is recorded as
//! a [`FlowEvent`]. The reporting layer reads them back through
//! [`EventLog::iter`] or [`EventLog::for_tick`]; the engine never reads its own
//! log, so a full buffer only drops history, never changes the flow.

use crate::fixed::{Fixed64, Ticks};
use crate::id::{Commodity, FacilityId, LinkId, Pair, Side};
use crate::products::Products;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Why oil left the system without reaching a refinery or the reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossCause {
    /// Offered to a broken link or refinery.
    Broken,
    /// No room within capacity and storage bounds across the planning window.
    Saturated,
    /// Overflow the reserve could not absorb.
    ReserveFull,
}

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    // -- Flow --
    Produced {
        route: Side,
        amount: Fixed64,
        tick: Ticks,
    },
    Delivered {
        link: LinkId,
        amount: Fixed64,
        tick: Ticks,
    },
    Distilled {
        refinery: Side,
        crude: Fixed64,
        products: Products,
        tick: Ticks,
    },
    OilLost {
        facility: FacilityId,
        amount: Fixed64,
        cause: LossCause,
        tick: Ticks,
    },

    // -- Dispatch --
    Dispatched {
        oil: Fixed64,
        demand_oil: Fixed64,
        routed: Pair<Fixed64>,
        tick: Ticks,
    },
    ReserveDrawn {
        requested: Fixed64,
        granted: Fixed64,
        tick: Ticks,
    },
    ReserveFilled {
        amount: Fixed64,
        tick: Ticks,
    },
    TargetsSet {
        targets: Pair<Fixed64>,
        tick: Ticks,
    },
    IrregularIntake {
        deliveries: u32,
        tick: Ticks,
    },

    // -- Operator --
    BrokenChanged {
        facility: FacilityId,
        broken: bool,
        tick: Ticks,
    },
    DemandChanged {
        commodity: Commodity,
        value: Fixed64,
        tick: Ticks,
    },
    ImportChanged {
        commodity: Commodity,
        value: Fixed64,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowEventKind {
    Produced,
    Delivered,
    Distilled,
    OilLost,
    Dispatched,
    ReserveDrawn,
    ReserveFilled,
    TargetsSet,
    IrregularIntake,
    BrokenChanged,
    DemandChanged,
    ImportChanged,
}

impl FlowEvent {
    pub fn kind(&self) -> FlowEventKind {
        match self {
            FlowEvent::Produced { .. } => FlowEventKind::Produced,
            FlowEvent::Delivered { .. } => FlowEventKind::Delivered,
            FlowEvent::Distilled { .. } => FlowEventKind::Distilled,
            FlowEvent::OilLost { .. } => FlowEventKind::OilLost,
            FlowEvent::Dispatched { .. } => FlowEventKind::Dispatched,
            FlowEvent::ReserveDrawn { .. } => FlowEventKind::ReserveDrawn,
            FlowEvent::ReserveFilled { .. } => FlowEventKind::ReserveFilled,
            FlowEvent::TargetsSet { .. } => FlowEventKind::TargetsSet,
            FlowEvent::IrregularIntake { .. } => FlowEventKind::IrregularIntake,
            FlowEvent::BrokenChanged { .. } => FlowEventKind::BrokenChanged,
            FlowEvent::DemandChanged { .. } => FlowEventKind::DemandChanged,
            FlowEvent::ImportChanged { .. } => FlowEventKind::ImportChanged,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            FlowEvent::Produced { tick, .. }
            | FlowEvent::Delivered { tick, .. }
            | FlowEvent::Distilled { tick, .. }
            | FlowEvent::OilLost { tick, .. }
            | FlowEvent::Dispatched { tick, .. }
            | FlowEvent::ReserveDrawn { tick, .. }
            | FlowEvent::ReserveFilled { tick, .. }
            | FlowEvent::TargetsSet { tick, .. }
            | FlowEvent::IrregularIntake { tick, .. }
            | FlowEvent::BrokenChanged { tick, .. }
            | FlowEvent::DemandChanged { tick, .. }
            | FlowEvent::ImportChanged { tick, .. } => *tick,
        }
    }
}

// ---------------------------------------------------------------------------
// EventLog: pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Option<FlowEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
    /// Events overwritten while the buffer was full.
    dropped: u64,
}

impl EventLog {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: FlowEvent) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events dropped because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Iterate stored events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &FlowEvent> {
        let cap = self.capacity();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len).filter_map(move |i| self.events[(start + i) % cap].as_ref())
    }

    pub fn for_tick(&self, tick: Ticks) -> impl Iterator<Item = &FlowEvent> {
        self.iter().filter(move |e| e.tick() == tick)
    }

    pub fn of_kind(&self, kind: FlowEventKind) -> impl Iterator<Item = &FlowEvent> {
        self.iter().filter(move |e| e.kind() == kind)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
