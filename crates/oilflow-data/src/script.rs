//! Resolved operator scripts and their playback.

use log::info;
use oilflow_core::command_queue::Command;
use oilflow_core::engine::Simulation;
use oilflow_core::error::SimError;
use oilflow_core::fixed::Ticks;
use oilflow_core::report::TickReport;

/// Commands bound to the tick whose console phase applies them, in tick
/// order. Commands for the same tick keep their file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    ticks: Ticks,
    commands: Vec<(Ticks, Command)>,
}

impl Script {
    pub fn new(ticks: Ticks, mut commands: Vec<(Ticks, Command)>) -> Self {
        commands.sort_by_key(|&(at, _)| at);
        Self { ticks, commands }
    }

    /// Number of ticks a full playback runs.
    pub fn ticks(&self) -> Ticks {
        self.ticks
    }

    pub fn commands(&self) -> &[(Ticks, Command)] {
        &self.commands
    }

    pub fn commands_at(&self, tick: Ticks) -> impl Iterator<Item = &Command> {
        self.commands
            .iter()
            .filter(move |(at, _)| *at == tick)
            .map(|(_, command)| command)
    }

    /// Run the script from the simulation's current tick. Commands scheduled
    /// for ticks that already passed are skipped.
    pub fn run(&self, sim: &mut Simulation) -> Result<Vec<TickReport>, SimError> {
        let mut reports = Vec::new();
        while sim.tick() < self.ticks {
            let tick = sim.tick();
            for command in self.commands_at(tick) {
                sim.submit(command.clone())?;
            }
            reports.push(sim.step()?);
        }
        info!("[Script] ran {} ticks", reports.len());
        Ok(reports)
    }
}
