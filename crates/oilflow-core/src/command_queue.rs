//! Operator commands and the queue that holds them until the next tick.
//!
//! The command model is what the (external) console layer produces after
//! parsing user input. Commands submitted ahead of time are applied during
//! the console phase of the next tick, before any of that tick's automatic
//! flow.

use crate::fixed::{Fixed64, Ticks};
use crate::id::{Commodity, FacilityId};
use crate::query::FacilityQuery;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Finish console input and run the tick.
    AdvanceTick,
    /// Set the daily demand for one product.
    SetDemand { commodity: Commodity, value: Fixed64 },
    /// Set the daily import of one product.
    SetImport { commodity: Commodity, value: Fixed64 },
    /// Break or repair a supply route or refinery.
    SetBroken { facility: FacilityId, broken: bool },
    /// Break or repair every breakable facility at once.
    SetBrokenAll(bool),
    /// Read-only status query.
    QueryStatus(FacilityQuery),
}

impl Command {
    /// Whether applying the command can change simulation state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::QueryStatus(_))
    }
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting for the next console phase, plus a bounded history of
/// what was applied and when.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    history: VecDeque<(Ticks, Command)>,
    /// 0 disables history.
    max_history: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Take every pending command in submission order.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending)
    }

    /// Remember that `command` was applied at `tick`, evicting the oldest
    /// entry when the history is full.
    pub fn record(&mut self, tick: Ticks, command: &Command) {
        if self.max_history == 0 {
            return;
        }
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back((tick, command.clone()));
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Applied commands, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &(Ticks, Command)> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
