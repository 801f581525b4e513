#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sequence executor that replays a command plan against the mission world.
//!
//! Execution is a deterministic fold over the plan. [`Executor::step`]
//! advances exactly one suspension unit: a single `advance` sub-step or a
//! whole non-movement command. Adapters that animate the rover call it
//! between their own pauses; [`Engine::run`] drives it to completion in one
//! go and yields the identical event sequence.

use std::sync::Arc;

use rover_mission_core::{Command, Event, ObjectiveKind, Outcome, RoverCommand};
use rover_mission_system_planner::{Plan, PlanRejection};
use rover_mission_world::{self as world, query, MissionLayout, World};
use thiserror::Error;

/// Lifecycle of the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    /// No run has started since construction or the last restart.
    Idle,
    /// A plan is being executed.
    Running,
    /// The last run finished with the contained outcome.
    Finished(Outcome),
}

/// Reasons an engine request is refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A run is already in progress; it must finish first.
    #[error("a run is already in progress")]
    RunInProgress,
    /// The plan holds no commands.
    #[error("the plan is empty")]
    EmptyPlan,
    /// The command failed parameter validation.
    #[error(transparent)]
    Rejected(#[from] PlanRejection),
}

/// State machine that executes a plan one step at a time.
#[derive(Debug)]
pub struct Executor {
    state: ExecutorState,
    commands: Vec<RoverCommand>,
    cursor: usize,
    pending_steps: u32,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Creates an idle executor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ExecutorState::Idle,
            commands: Vec::new(),
            cursor: 0,
            pending_steps: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ExecutorState {
        self.state
    }

    /// Reports whether a run is in progress.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, ExecutorState::Running)
    }

    /// Starts a run of `commands`, resetting the world's run state.
    ///
    /// The plan is copied, so later edits do not affect the active run.
    pub fn begin(
        &mut self,
        world: &mut World,
        commands: &[RoverCommand],
        out_events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::RunInProgress);
        }
        if commands.is_empty() {
            return Err(EngineError::EmptyPlan);
        }

        self.commands = commands.to_vec();
        self.cursor = 0;
        self.pending_steps = 0;
        self.state = ExecutorState::Running;

        world::apply(world, Command::ResetRun, out_events);
        tracing::info!(
            target: "rover_mission::executor",
            commands = self.commands.len(),
            "run.started"
        );
        Ok(())
    }

    /// Executes one suspension unit and returns the outcome once the run ends.
    ///
    /// Returns `None` while the run continues, and also when no run is active.
    pub fn step(&mut self, world: &mut World, out_events: &mut Vec<Event>) -> Option<Outcome> {
        if !self.is_running() {
            return None;
        }

        let Some(command) = self.commands.get(self.cursor).cloned() else {
            return Some(self.finish_plan(world, out_events));
        };

        let starting = self.pending_steps == 0;
        if starting {
            tracing::debug!(
                target: "rover_mission::executor",
                index = self.cursor,
                command = %command,
                "command.started"
            );
            out_events.push(Event::CommandStarted {
                index: self.cursor,
                command: command.clone(),
            });
        }

        let layout = Arc::clone(query::layout(world));
        let cost = layout.energy_cost(command.kind());
        let command_done = match command {
            RoverCommand::Advance { steps } => {
                if starting {
                    self.pending_steps = steps.get();
                }
                world::apply(world, Command::StepRover, out_events);
                world::apply(world, Command::ConsumeEnergy { cost }, out_events);
                self.pending_steps -= 1;
                self.pending_steps == 0
            }
            RoverCommand::Turn { direction } => {
                world::apply(world, Command::RotateRover { direction }, out_events);
                world::apply(world, Command::ConsumeEnergy { cost }, out_events);
                true
            }
            RoverCommand::CollectSample { id } => {
                let kind = ObjectiveKind::Sample;
                world::apply(world, Command::AttemptObjective { kind, id, cost }, out_events);
                true
            }
            RoverCommand::MapZone { id } => {
                let kind = ObjectiveKind::Mapping;
                world::apply(world, Command::AttemptObjective { kind, id, cost }, out_events);
                true
            }
            RoverCommand::Recharge => {
                world::apply(world, Command::AttemptRecharge { cost }, out_events);
                true
            }
            RoverCommand::SendReport => {
                world::apply(world, Command::ConsumeEnergy { cost }, out_events);
                true
            }
        };

        if query::energy(world).is_depleted() {
            let outcome = Outcome::Failed {
                command_index: self.cursor,
            };
            return Some(self.finish(outcome, out_events));
        }

        if !command_done {
            return None;
        }

        self.cursor += 1;
        if self.cursor == self.commands.len() {
            return Some(self.finish_plan(world, out_events));
        }
        None
    }

    /// Steps until the active run ends.
    pub fn run_to_end(
        &mut self,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Option<Outcome> {
        while self.is_running() {
            if let Some(outcome) = self.step(world, out_events) {
                return Some(outcome);
            }
        }
        None
    }

    /// Abandons any run and forgets the copied plan.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn finish_plan(&mut self, world: &mut World, out_events: &mut Vec<Event>) -> Outcome {
        world::apply(world, Command::CompleteExtraction, out_events);

        let energy_remaining = query::energy(world);
        let outcome = if query::mission_accomplished(world) {
            Outcome::Succeeded {
                energy_remaining,
                elapsed: query::run_state(world).elapsed(),
            }
        } else {
            Outcome::CompletedIncomplete { energy_remaining }
        };
        self.finish(outcome, out_events)
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) -> Outcome {
        self.state = ExecutorState::Finished(outcome);
        self.pending_steps = 0;
        tracing::info!(
            target: "rover_mission::executor",
            outcome = ?outcome,
            "run.ended"
        );
        out_events.push(Event::RunEnded { outcome });
        outcome
    }
}

/// Engine surface consumed by presentation adapters.
///
/// Owns the shared mission layout, the world, the queued plan and the
/// executor. The plan is the single source of truth for what will run.
#[derive(Debug)]
pub struct Engine {
    layout: Arc<MissionLayout>,
    world: World,
    plan: Plan,
    executor: Executor,
}

impl Engine {
    /// Creates an idle engine for the provided mission.
    #[must_use]
    pub fn new(layout: Arc<MissionLayout>) -> Self {
        Self {
            world: World::new(Arc::clone(&layout)),
            layout,
            plan: Plan::new(),
            executor: Executor::new(),
        }
    }

    /// Mission layout the engine runs against.
    #[must_use]
    pub fn layout(&self) -> &Arc<MissionLayout> {
        &self.layout
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Commands queued for the next run.
    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Current executor state.
    #[must_use]
    pub fn state(&self) -> ExecutorState {
        self.executor.state()
    }

    /// Validates and queues a command; returns its index in the plan.
    pub fn build_plan(&mut self, id: &str, raw: Option<&str>) -> Result<usize, EngineError> {
        self.ensure_idle()?;
        Ok(self.plan.build_plan(&self.layout, id, raw)?)
    }

    /// Replaces the queued plan wholesale.
    pub fn set_plan(&mut self, plan: Plan) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.plan = plan;
        Ok(())
    }

    /// Empties the queued plan.
    pub fn clear_plan(&mut self) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.plan.clear();
        Ok(())
    }

    /// Drops the queued command at `index`.
    pub fn remove_command(&mut self, index: usize) -> Result<Option<RoverCommand>, EngineError> {
        self.ensure_idle()?;
        Ok(self.plan.remove(index))
    }

    /// Moves a queued command from `from` to `to`.
    pub fn move_command(&mut self, from: usize, to: usize) -> Result<bool, EngineError> {
        self.ensure_idle()?;
        Ok(self.plan.move_command(from, to))
    }

    /// Starts executing the queued plan without advancing it.
    pub fn begin(&mut self, out_events: &mut Vec<Event>) -> Result<(), EngineError> {
        self.executor
            .begin(&mut self.world, self.plan.commands(), out_events)
    }

    /// Advances the active run by one step.
    pub fn step(&mut self, out_events: &mut Vec<Event>) -> Option<Outcome> {
        self.executor.step(&mut self.world, out_events)
    }

    /// Executes the queued plan to completion, handing every event to `sink`
    /// in emission order.
    pub fn run<F>(&mut self, mut sink: F) -> Result<Outcome, EngineError>
    where
        F: FnMut(&Event),
    {
        let mut events = Vec::new();
        self.begin(&mut events)?;
        loop {
            let outcome = self.step(&mut events);
            for event in events.drain(..) {
                sink(&event);
            }
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }
    }

    /// Discards the run state and the queued plan and returns to idle.
    pub fn restart(&mut self) {
        self.world = World::new(Arc::clone(&self.layout));
        self.plan.clear();
        self.executor.reset();
        tracing::info!(target: "rover_mission::executor", "engine.restarted");
    }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        if self.executor.is_running() {
            Err(EngineError::RunInProgress)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let layout = MissionLayout::builtin().expect("builtin mission validates");
        Engine::new(Arc::new(layout))
    }

    #[test]
    fn empty_plan_is_refused() {
        let mut engine = engine();
        assert_eq!(engine.run(|_| {}), Err(EngineError::EmptyPlan));
        assert_eq!(engine.state(), ExecutorState::Idle);
    }

    #[test]
    fn runs_are_not_reentrant() {
        let mut engine = engine();
        let _ = engine.build_plan("advance", Some("2")).expect("accepted");
        let mut events = Vec::new();
        engine.begin(&mut events).expect("run starts");

        assert_eq!(engine.begin(&mut events), Err(EngineError::RunInProgress));
        assert_eq!(engine.run(|_| {}), Err(EngineError::RunInProgress));
        assert_eq!(
            engine.build_plan("turn", Some("left")),
            Err(EngineError::RunInProgress)
        );
        assert_eq!(engine.clear_plan(), Err(EngineError::RunInProgress));
        assert_eq!(engine.plan().len(), 1);
    }

    #[test]
    fn advance_yields_between_sub_steps() {
        let mut engine = engine();
        let _ = engine.build_plan("advance", Some("3")).expect("accepted");
        let mut events = Vec::new();
        engine.begin(&mut events).expect("run starts");

        assert_eq!(engine.step(&mut events), None);
        assert_eq!(engine.step(&mut events), None);
        assert!(matches!(
            engine.step(&mut events),
            Some(Outcome::CompletedIncomplete { .. })
        ));
        assert_eq!(engine.step(&mut events), None);

        let started = events
            .iter()
            .filter(|event| matches!(event, Event::CommandStarted { .. }))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn rejection_is_forwarded() {
        let mut engine = engine();
        assert_eq!(
            engine.build_plan("advance", Some("0")),
            Err(EngineError::Rejected(PlanRejection::InvalidStepCount {
                raw: "0".to_owned()
            }))
        );
        assert!(engine.plan().is_empty());
    }

    #[test]
    fn plan_edits_reorder_and_drop_commands() {
        let mut engine = engine();
        let _ = engine.build_plan("advance", Some("1")).expect("accepted");
        let _ = engine.build_plan("turn", Some("left")).expect("accepted");
        let _ = engine.build_plan("sendReport", None).expect("accepted");

        assert_eq!(engine.move_command(2, 0), Ok(true));
        assert_eq!(engine.move_command(7, 0), Ok(false));
        let removed = engine.remove_command(1).expect("engine idle");

        assert!(matches!(removed, Some(RoverCommand::Advance { .. })));
        assert_eq!(engine.plan().to_script(), "sendReport()\nturn(left)\n");
        assert_eq!(engine.remove_command(5), Ok(None));
    }

    #[test]
    fn executor_runs_a_copied_plan_to_the_end() {
        let layout = Arc::new(MissionLayout::builtin().expect("builtin mission validates"));
        let mut world = World::new(layout);
        let mut executor = Executor::new();
        let mut events = Vec::new();

        executor
            .begin(&mut world, &[RoverCommand::SendReport], &mut events)
            .expect("run starts");
        let outcome = executor.run_to_end(&mut world, &mut events);

        assert_eq!(
            outcome,
            Some(Outcome::CompletedIncomplete {
                energy_remaining: query::energy(&world)
            })
        );
        assert_eq!(query::energy(&world).get(), 98);
        assert!(matches!(executor.state(), ExecutorState::Finished(_)));
        assert_eq!(executor.run_to_end(&mut world, &mut events), None);
    }

    #[test]
    fn restart_returns_to_idle_with_empty_plan() {
        let mut engine = engine();
        let _ = engine.build_plan("sendReport", None).expect("accepted");
        let _ = engine.run(|_| {}).expect("run completes");

        engine.restart();

        assert_eq!(engine.state(), ExecutorState::Idle);
        assert!(engine.plan().is_empty());
        assert_eq!(query::energy(engine.world()), engine.layout().start_energy());
    }
}
