#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative mission state for the rover simulation.
//!
//! The world pairs an immutable [`MissionLayout`], shared through an `Arc`,
//! with the [`RunState`] of the current execution attempt. Systems mutate
//! the run exclusively through [`apply`] and read it through [`query`].

mod layout;
mod run_state;

use std::sync::Arc;

use rover_mission_core::{Command, Completion, Event, ObjectiveKind};

pub use layout::{
    load_layout_from_env, CellConfig, CommandConfig, LayoutError, MissionConfig, MissionLayout,
    ObjectiveConfig, BUILTIN_MISSION, MISSION_PATH_ENV,
};
pub use run_state::RunState;

/// Represents the authoritative mission world.
#[derive(Clone, Debug)]
pub struct World {
    layout: Arc<MissionLayout>,
    run: RunState,
}

impl World {
    /// Creates a world positioned at the layout's start configuration.
    #[must_use]
    pub fn new(layout: Arc<MissionLayout>) -> Self {
        let run = RunState::new(&layout);
        Self { layout, run }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Each command is committed in full before its events are pushed.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let layout = &world.layout;
    let run = &mut world.run;

    match command {
        Command::ResetRun => {
            run.reset_run(layout);
            out_events.push(Event::RunStarted {
                position: run.position(),
                heading: run.heading(),
                energy: run.energy(),
            });
        }
        Command::StepRover => {
            let (from, to) = run.move_one_cell(layout);
            if from != to {
                out_events.push(Event::PositionChanged { from, to });
            } else {
                tracing::debug!(
                    target: "rover_mission::world",
                    cell = %from,
                    heading = run.heading().as_str(),
                    "rover.blocked_by_boundary"
                );
            }
        }
        Command::RotateRover { direction } => {
            let from = run.rotate(direction);
            out_events.push(Event::HeadingChanged {
                from,
                to: run.heading(),
            });
        }
        Command::ConsumeEnergy { cost } => {
            push_energy_changed(run, cost, out_events);
        }
        Command::AttemptObjective { kind, id, cost } => {
            if !run.try_collect(layout, kind, &id) {
                tracing::debug!(
                    target: "rover_mission::world",
                    kind = kind.as_str(),
                    id = %id,
                    cell = %run.position(),
                    "objective.attempt_missed"
                );
                return;
            }

            let completion = match kind {
                ObjectiveKind::Sample => Completion::Collected(id),
                _ => Completion::Mapped(id),
            };
            push_energy_changed(run, cost, out_events);
            out_events.push(Event::ObjectiveCompleted { completion });
        }
        Command::AttemptRecharge { cost } => {
            if run.try_recharge(layout) {
                push_energy_changed(run, cost, out_events);
            }
        }
        Command::CompleteExtraction => {
            if run.complete_extraction(layout) {
                out_events.push(Event::ObjectiveCompleted {
                    completion: Completion::Extraction,
                });
            }
        }
    }
}

fn push_energy_changed(run: &mut RunState, cost: i32, out_events: &mut Vec<Event>) {
    let energy = run.consume_energy(cost);
    out_events.push(Event::EnergyChanged {
        energy,
        low_power: energy.is_low_power(),
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::sync::Arc;

    use super::{MissionLayout, RunState, World};
    use rover_mission_core::{CellCoord, Completion, Energy, Heading};

    /// Provides read-only access to the mission layout.
    #[must_use]
    pub fn layout(world: &World) -> &Arc<MissionLayout> {
        &world.layout
    }

    /// Provides read-only access to the current run state.
    #[must_use]
    pub fn run_state(world: &World) -> &RunState {
        &world.run
    }

    /// Current battery level.
    #[must_use]
    pub fn energy(world: &World) -> Energy {
        world.run.energy()
    }

    /// Cell the rover occupies.
    #[must_use]
    pub fn position(world: &World) -> CellCoord {
        world.run.position()
    }

    /// Heading the rover faces.
    #[must_use]
    pub fn heading(world: &World) -> Heading {
        world.run.heading()
    }

    /// Reports whether the extraction completion has been recorded.
    #[must_use]
    pub fn mission_accomplished(world: &World) -> bool {
        world.run.is_complete(&Completion::Extraction)
    }

    /// Captures a comparable snapshot of the run state.
    #[must_use]
    pub fn snapshot(world: &World) -> RunSnapshot {
        RunSnapshot {
            energy: world.run.energy(),
            position: world.run.position(),
            heading: world.run.heading(),
            completed: world.run.completed().cloned().collect(),
        }
    }

    /// Immutable copy of the run state, excluding the mission clock.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct RunSnapshot {
        /// Battery level.
        pub energy: Energy,
        /// Cell the rover occupies.
        pub position: CellCoord,
        /// Heading the rover faces.
        pub heading: Heading,
        /// Completions recorded so far, in key order.
        pub completed: Vec<Completion>,
    }
}
