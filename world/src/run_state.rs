//! Mutable state of a single execution attempt.

use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use rover_mission_core::{
    CellCoord, Completion, Energy, Heading, ObjectiveId, ObjectiveKind, TurnDirection,
};

use crate::MissionLayout;

/// Rover position, heading, battery and completed objectives for one run.
///
/// Every mutator commits its change completely before returning, so an
/// observer never sees a half-applied command.
#[derive(Clone, Debug)]
pub struct RunState {
    energy: Energy,
    position: CellCoord,
    heading: Heading,
    completed: BTreeSet<Completion>,
    started_at: Instant,
}

impl RunState {
    /// Creates a run state positioned at the layout's start configuration.
    #[must_use]
    pub fn new(layout: &MissionLayout) -> Self {
        Self {
            energy: layout.start_energy(),
            position: layout.start(),
            heading: Heading::North,
            completed: BTreeSet::new(),
            started_at: Instant::now(),
        }
    }

    /// Restores the start configuration and restarts the mission clock.
    pub fn reset_run(&mut self, layout: &MissionLayout) {
        *self = Self::new(layout);
    }

    /// Moves one cell along the current heading, clamping at the grid edge.
    ///
    /// Returns the cells occupied before and after the move; both are equal
    /// when the rover pushed against the boundary.
    pub fn move_one_cell(&mut self, layout: &MissionLayout) -> (CellCoord, CellCoord) {
        let from = self.position;
        self.position = from.step_within(self.heading, layout.grid_size());
        (from, self.position)
    }

    /// Rotates a quarter turn and returns the previous heading.
    pub fn rotate(&mut self, direction: TurnDirection) -> Heading {
        let previous = self.heading;
        self.heading = previous.rotate(direction);
        previous
    }

    /// Charges `cost` against the battery, clamping to `0..=MAX_ENERGY`.
    pub fn consume_energy(&mut self, cost: i32) -> Energy {
        self.energy = self.energy.apply_cost(cost);
        self.energy
    }

    /// Completes the sample or mapping objective `id` when the rover stands on it.
    ///
    /// Returns `false` without touching state when the objective is unknown,
    /// already completed, or elsewhere on the grid.
    pub fn try_collect(
        &mut self,
        layout: &MissionLayout,
        kind: ObjectiveKind,
        id: &ObjectiveId,
    ) -> bool {
        if !matches!(kind, ObjectiveKind::Sample | ObjectiveKind::Mapping) {
            return false;
        }

        let Some(objective) = layout.objective(kind, id) else {
            return false;
        };
        if objective.cell() != self.position {
            return false;
        }
        let Some(completion) = objective.completion() else {
            return false;
        };

        self.completed.insert(completion)
    }

    /// Reports whether a recharge station sits under the rover.
    #[must_use]
    pub fn try_recharge(&self, layout: &MissionLayout) -> bool {
        layout.is_recharge_station(self.position)
    }

    /// Reports whether the rover stands on extraction with every
    /// prerequisite completed.
    #[must_use]
    pub fn extraction_ready(&self, layout: &MissionLayout) -> bool {
        self.position == layout.extraction().cell()
            && layout
                .prerequisites()
                .all(|completion| self.completed.contains(&completion))
    }

    /// Records the extraction completion when [`Self::extraction_ready`] holds.
    pub fn complete_extraction(&mut self, layout: &MissionLayout) -> bool {
        if !self.extraction_ready(layout) {
            return false;
        }
        self.completed.insert(Completion::Extraction)
    }

    /// Current battery level.
    #[must_use]
    pub const fn energy(&self) -> Energy {
        self.energy
    }

    /// Cell the rover occupies.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Heading the rover faces.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Completions recorded so far, in key order.
    pub fn completed(&self) -> impl Iterator<Item = &Completion> {
        self.completed.iter()
    }

    /// Reports whether `completion` has been recorded.
    #[must_use]
    pub fn is_complete(&self, completion: &Completion) -> bool {
        self.completed.contains(completion)
    }

    /// Wall-clock time since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
