//! Clock, agenda and console permit.
//!
//! The [`Scheduler`] is the context object threaded by `&mut` through every
//! component. It owns:
//!
//! - the tick counter,
//! - the agenda: a min-heap of `(tick, sequence, action)` drained in order,
//! - the single console permit that orders operator input ahead of the
//!   automatic flow of the same tick,
//! - the flow [`EventLog`].
//!
//! # Tick ordering
//!
//! The console acquires the permit before it reads input for tick T and
//! releases it only when it advances the clock. Agenda entries for tick T
//! must acquire the same permit before they run, so every operator edit made
//! while the console is open lands before that tick's deliveries and
//! distillations.

use crate::error::SimError;
use crate::event::{EventLog, FlowEvent};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{LinkId, Side};
use log::debug;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// ---------------------------------------------------------------------------
// Permit
// ---------------------------------------------------------------------------

/// Who currently holds the console permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermitHolder {
    /// The interactive control loop.
    Console,
    /// An automatically scheduled agenda entry.
    Agenda,
}

/// A one-slot mutual-exclusion permit.
#[derive(Debug, Default)]
pub struct Permit {
    holder: Option<PermitHolder>,
}

impl Permit {
    pub fn acquire(&mut self, who: PermitHolder) -> Result<(), SimError> {
        match self.holder {
            Some(holder) => Err(SimError::PermitHeld { holder }),
            None => {
                self.holder = Some(who);
                Ok(())
            }
        }
    }

    pub fn release(&mut self, who: PermitHolder) -> Result<(), SimError> {
        if self.holder != Some(who) {
            return Err(SimError::PermitNotHeld { holder: who });
        }
        self.holder = None;
        Ok(())
    }

    pub fn holder(&self) -> Option<PermitHolder> {
        self.holder
    }
}

// ---------------------------------------------------------------------------
// Agenda
// ---------------------------------------------------------------------------

/// A deferred one-shot task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Forward the link's slot for the current tick to its endpoint.
    Deliver { link: LinkId },
    /// Move the refinery's processing slot for the current tick into
    /// distillation.
    Process { refinery: Side },
    /// Convert crude to products and hand them to the product ledger.
    Distill { refinery: Side, amount: Fixed64 },
}

#[derive(Debug)]
struct Scheduled {
    tick: Ticks,
    seq: u64,
    action: Action,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we want the earliest first.
        other
            .tick
            .cmp(&self.tick)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Scheduler {
    clock: Ticks,
    permit: Permit,
    agenda: BinaryHeap<Scheduled>,
    next_seq: u64,
    events: EventLog,
}

impl Scheduler {
    pub fn new(event_capacity: usize) -> Self {
        Self {
            clock: 0,
            permit: Permit::default(),
            agenda: BinaryHeap::new(),
            next_seq: 0,
            events: EventLog::new(event_capacity),
        }
    }

    pub fn now(&self) -> Ticks {
        self.clock
    }

    /// Schedule `action` to run at tick `at`. A tick that has already passed
    /// runs at the current tick, after everything already due.
    pub fn schedule_at(&mut self, at: Ticks, action: Action) {
        let tick = if at < self.clock {
            debug!("[Scheduler] {action:?} for past tick {at} runs at {}", self.clock);
            self.clock
        } else {
            at
        };
        self.agenda.push(Scheduled {
            tick,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
    }

    pub fn acquire_permit(&mut self, who: PermitHolder) -> Result<(), SimError> {
        self.permit.acquire(who)
    }

    pub fn release_permit(&mut self, who: PermitHolder) -> Result<(), SimError> {
        self.permit.release(who)
    }

    pub fn permit_holder(&self) -> Option<PermitHolder> {
        self.permit.holder()
    }

    /// Pop the next entry due at or before the current tick.
    ///
    /// Entries pushed while draining (same-tick follow-ups) are returned by
    /// later calls, after everything already queued for the tick.
    pub fn pop_due(&mut self) -> Option<Action> {
        match self.agenda.peek() {
            Some(next) if next.tick <= self.clock => self.agenda.pop().map(|s| s.action),
            _ => None,
        }
    }

    /// Number of entries still on the agenda.
    pub fn pending(&self) -> usize {
        self.agenda.len()
    }

    /// Number of entries due exactly at `tick`.
    pub fn pending_at(&self, tick: Ticks) -> usize {
        self.agenda.iter().filter(|s| s.tick == tick).count()
    }

    /// Advance the clock by one tick.
    pub fn advance_clock(&mut self) {
        self.clock += 1;
    }

    pub fn emit(&mut self, event: FlowEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }
}
