#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the rover mission engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The planner turns raw player input
//! into typed [`RoverCommand`] values, the executor translates each of them
//! into world [`Command`] mutations, the world applies those through its
//! `apply` entry point and broadcasts [`Event`] values that adapters render.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Upper bound of the rover battery, expressed in percent.
pub const MAX_ENERGY: u32 = 100;

/// Energy level at or below which the rover reports low power.
pub const LOW_POWER_THRESHOLD: u32 = 20;

/// Largest number of cells a single `advance` command may cover.
pub const MAX_ADVANCE_STEPS: u32 = 10;

/// Commands that express all permissible mutations of the run state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Restores the start position, heading, energy and clears completions.
    ResetRun,
    /// Moves the rover one cell along its heading, clamped to the grid.
    StepRover,
    /// Rotates the rover a quarter turn.
    RotateRover {
        /// Side the rover turns towards.
        direction: TurnDirection,
    },
    /// Charges the provided cost against the battery.
    ConsumeEnergy {
        /// Energy to subtract; negative values restore energy.
        cost: i32,
    },
    /// Attempts to complete a sample or mapping objective at the rover cell.
    AttemptObjective {
        /// Kind of objective the rover works on.
        kind: ObjectiveKind,
        /// Identifier of the targeted objective.
        id: ObjectiveId,
        /// Energy charged only when the attempt succeeds.
        cost: i32,
    },
    /// Attempts to draw energy from a recharge station at the rover cell.
    AttemptRecharge {
        /// Energy charged only when a station is present; negative restores.
        cost: i32,
    },
    /// Marks the extraction objective complete when the rover qualifies.
    CompleteExtraction,
}

/// Events broadcast by the world and executor while a run progresses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Announces that a fresh run began from the start configuration.
    RunStarted {
        /// Cell the rover starts from.
        position: CellCoord,
        /// Heading the rover starts with.
        heading: Heading,
        /// Battery level at the start of the run.
        energy: Energy,
    },
    /// Announces that the executor began processing a queued command.
    CommandStarted {
        /// Zero-based index of the command within the plan.
        index: usize,
        /// Command being processed.
        command: RoverCommand,
    },
    /// Confirms that the rover moved between two cells.
    PositionChanged {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Confirms that the rover changed its heading.
    HeadingChanged {
        /// Heading before the rotation.
        from: Heading,
        /// Heading after the rotation.
        to: Heading,
    },
    /// Reports the battery level after a consumption or recharge.
    EnergyChanged {
        /// Battery level after the change.
        energy: Energy,
        /// Indicates that the level fell into the low power band.
        low_power: bool,
    },
    /// Confirms that an objective was completed.
    ObjectiveCompleted {
        /// Completion key added to the run state.
        completion: Completion,
    },
    /// Announces the terminal outcome of a run.
    RunEnded {
        /// How the run finished.
        outcome: Outcome,
    },
}

/// Terminal result of executing a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every objective was completed and the rover reached extraction.
    Succeeded {
        /// Battery level left when the plan finished.
        energy_remaining: Energy,
        /// Wall-clock time measured from the start of the run.
        elapsed: Duration,
    },
    /// The battery was depleted.
    Failed {
        /// Index of the command during which the battery ran out.
        command_index: usize,
    },
    /// The plan finished with energy left but the mission is not accomplished.
    CompletedIncomplete {
        /// Battery level left when the plan finished.
        energy_remaining: Energy,
    },
}

impl Outcome {
    /// Reports whether the run accomplished the mission.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Columns grow eastwards and rows grow southwards, so heading north
/// decreases the row index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether the cell lies inside a square grid of `size` cells.
    #[must_use]
    pub const fn is_within(&self, size: u32) -> bool {
        self.column < size && self.row < size
    }

    /// Computes the neighbouring cell along `heading`, clamped to a square
    /// grid of `size` cells.
    ///
    /// Stepping off an edge leaves that axis unchanged.
    #[must_use]
    pub fn step_within(self, heading: Heading, size: u32) -> Self {
        let last = size.saturating_sub(1);
        match heading {
            Heading::North => Self::new(self.column, self.row.saturating_sub(1)),
            Heading::South => Self::new(self.column, self.row.saturating_add(1).min(last)),
            Heading::East => Self::new(self.column.saturating_add(1).min(last), self.row),
            Heading::West => Self::new(self.column.saturating_sub(1), self.row),
        }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Cardinal headings the rover can face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Facing decreasing row indices.
    North,
    /// Facing increasing column indices.
    East,
    /// Facing increasing row indices.
    South,
    /// Facing decreasing column indices.
    West,
}

impl Heading {
    const CLOCKWISE: [Heading; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Position of the heading in the clockwise cycle starting at north.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Returns the heading reached after a quarter turn towards `direction`.
    #[must_use]
    pub const fn rotate(self, direction: TurnDirection) -> Self {
        let offset = match direction {
            TurnDirection::Right => 1,
            TurnDirection::Left => 3,
        };
        Self::CLOCKWISE[(self.index() + offset) % 4]
    }

    /// Lowercase name of the heading.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }
}

/// Side the rover turns towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Counter-clockwise quarter turn.
    Left,
    /// Clockwise quarter turn.
    Right,
}

impl TurnDirection {
    /// Canonical lowercase token of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Categories of objectives placed on the mission grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Sample collected with `collectSample`.
    Sample,
    /// Zone surveyed with `mapZone`.
    Mapping,
    /// Station that restores energy through `recharge`.
    Recharge,
    /// Terminal point the rover must reach to win.
    Extraction,
}

impl ObjectiveKind {
    /// Lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Mapping => "mapping",
            Self::Recharge => "recharge",
            Self::Extraction => "extraction",
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a sample or mapping objective, such as `S1` or `M2`.
///
/// Identifiers are trimmed and upper-cased once on construction, so
/// comparisons downstream are exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectiveId(String);

impl ObjectiveId {
    /// Creates a normalised identifier from raw text.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// Normalised textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ObjectiveId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<ObjectiveId> for String {
    fn from(value: ObjectiveId) -> Self {
        value.0
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry of the completed-objective set tracked by a run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Completion {
    /// A sample was collected.
    Collected(ObjectiveId),
    /// A zone was mapped.
    Mapped(ObjectiveId),
    /// The rover reached extraction with every prerequisite complete.
    Extraction,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collected(id) => write!(f, "collect-{}", id.as_str().to_ascii_lowercase()),
            Self::Mapped(id) => write!(f, "map-{}", id.as_str().to_ascii_lowercase()),
            Self::Extraction => f.write_str("reach-extraction"),
        }
    }
}

/// Immutable objective placed on the mission grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Objective {
    kind: ObjectiveKind,
    id: Option<ObjectiveId>,
    symbol: String,
    cell: CellCoord,
}

impl Objective {
    /// Creates a new objective description.
    #[must_use]
    pub fn new(
        kind: ObjectiveKind,
        id: Option<ObjectiveId>,
        symbol: String,
        cell: CellCoord,
    ) -> Self {
        Self {
            kind,
            id,
            symbol,
            cell,
        }
    }

    /// Kind of the objective.
    #[must_use]
    pub const fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    /// Identifier matched against player parameters, if the kind uses one.
    #[must_use]
    pub fn id(&self) -> Option<&ObjectiveId> {
        self.id.as_ref()
    }

    /// Symbol adapters draw on the map.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fixed grid location of the objective.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Completion key recorded when the objective is accomplished.
    ///
    /// Recharge stations are reusable and never complete.
    #[must_use]
    pub fn completion(&self) -> Option<Completion> {
        match (self.kind, &self.id) {
            (ObjectiveKind::Sample, Some(id)) => Some(Completion::Collected(id.clone())),
            (ObjectiveKind::Mapping, Some(id)) => Some(Completion::Mapped(id.clone())),
            (ObjectiveKind::Extraction, _) => Some(Completion::Extraction),
            _ => None,
        }
    }
}

/// Rover battery level clamped to `0..=MAX_ENERGY`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Energy(u32);

impl Energy {
    /// Creates an energy level, clamping values above the battery capacity.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value > MAX_ENERGY {
            Self(MAX_ENERGY)
        } else {
            Self(value)
        }
    }

    /// Fully charged battery.
    #[must_use]
    pub const fn full() -> Self {
        Self(MAX_ENERGY)
    }

    /// Numeric battery level in percent.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Charges `cost` against the battery and clamps the result to the
    /// battery range. Negative costs restore energy.
    #[must_use]
    pub fn apply_cost(self, cost: i32) -> Self {
        let next = i64::from(self.0) - i64::from(cost);
        let clamped = next.clamp(0, i64::from(MAX_ENERGY));
        Self(u32::try_from(clamped).unwrap_or(0))
    }

    /// Reports whether the level sits in the low power band `(0, 20]`.
    #[must_use]
    pub const fn is_low_power(&self) -> bool {
        self.0 > 0 && self.0 <= LOW_POWER_THRESHOLD
    }

    /// Reports whether the battery is empty.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Kind of parameter a catalog command accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Integer parameter.
    Number,
    /// Free text parameter.
    Text,
}

/// Identifier of an entry in the fixed command catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    /// `advance(steps)`.
    Advance,
    /// `turn(direction)`.
    Turn,
    /// `collectSample(id)`.
    CollectSample,
    /// `mapZone(id)`.
    MapZone,
    /// `recharge()`.
    Recharge,
    /// `sendReport()`.
    SendReport,
}

impl CommandKind {
    /// Every catalog entry in presentation order.
    pub const ALL: [CommandKind; 6] = [
        Self::Advance,
        Self::Turn,
        Self::CollectSample,
        Self::MapZone,
        Self::Recharge,
        Self::SendReport,
    ];

    /// Canonical catalog identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Turn => "turn",
            Self::CollectSample => "collectSample",
            Self::MapZone => "mapZone",
            Self::Recharge => "recharge",
            Self::SendReport => "sendReport",
        }
    }

    const fn localized_id(self) -> &'static str {
        match self {
            Self::Advance => "avanzar",
            Self::Turn => "girar",
            Self::CollectSample => "recogerMuestra",
            Self::MapZone => "mapearTerreno",
            Self::Recharge => "recargarEnergia",
            Self::SendReport => "enviarReporte",
        }
    }

    /// Resolves a catalog identifier, ignoring ASCII case.
    ///
    /// Both the canonical identifiers and the Spanish identifiers used by
    /// the classroom interface are accepted.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|kind| {
            raw.eq_ignore_ascii_case(kind.id()) || raw.eq_ignore_ascii_case(kind.localized_id())
        })
    }

    /// Kind of parameter the command requires, if any.
    #[must_use]
    pub const fn parameter(self) -> Option<ParameterKind> {
        match self {
            Self::Advance => Some(ParameterKind::Number),
            Self::Turn | Self::CollectSample | Self::MapZone => Some(ParameterKind::Text),
            Self::Recharge | Self::SendReport => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Immutable catalog entry describing a command available to players.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandDefinition {
    kind: CommandKind,
    label: String,
    energy_cost: i32,
}

impl CommandDefinition {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(kind: CommandKind, label: String, energy_cost: i32) -> Self {
        Self {
            kind,
            label,
            energy_cost,
        }
    }

    /// Catalog identifier of the entry.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Human readable label, such as `advance(steps)`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parameter accepted by the command, if any.
    #[must_use]
    pub const fn parameter(&self) -> Option<ParameterKind> {
        self.kind.parameter()
    }

    /// Fixed energy cost; negative values restore energy.
    #[must_use]
    pub const fn energy_cost(&self) -> i32 {
        self.energy_cost
    }
}

/// Number of cells covered by an `advance` command, always within
/// `1..=MAX_ADVANCE_STEPS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StepCount(u32);

impl StepCount {
    /// Creates a step count, rejecting values outside `1..=MAX_ADVANCE_STEPS`.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value >= 1 && value <= MAX_ADVANCE_STEPS {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Number of single-cell moves requested.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for StepCount {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!("step count {value} is outside 1..={MAX_ADVANCE_STEPS}")
        })
    }
}

impl From<StepCount> for u32 {
    fn from(value: StepCount) -> Self {
        value.0
    }
}

/// Validated command queued in a plan, carrying its typed parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoverCommand {
    /// Moves forward one cell at a time.
    Advance {
        /// Number of single-cell moves.
        steps: StepCount,
    },
    /// Rotates a quarter turn.
    Turn {
        /// Side to turn towards.
        direction: TurnDirection,
    },
    /// Collects the sample with the provided identifier.
    CollectSample {
        /// Identifier of the sample objective.
        id: ObjectiveId,
    },
    /// Maps the zone with the provided identifier.
    MapZone {
        /// Identifier of the mapping objective.
        id: ObjectiveId,
    },
    /// Draws energy from a recharge station.
    Recharge,
    /// Transmits a report; costs energy and has no other effect.
    SendReport,
}

impl RoverCommand {
    /// Catalog entry the command belongs to.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Advance { .. } => CommandKind::Advance,
            Self::Turn { .. } => CommandKind::Turn,
            Self::CollectSample { .. } => CommandKind::CollectSample,
            Self::MapZone { .. } => CommandKind::MapZone,
            Self::Recharge => CommandKind::Recharge,
            Self::SendReport => CommandKind::SendReport,
        }
    }
}

impl fmt::Display for RoverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.kind().id();
        match self {
            Self::Advance { steps } => write!(f, "{id}({})", steps.get()),
            Self::Turn { direction } => write!(f, "{id}({})", direction.as_str()),
            Self::CollectSample { id: objective } | Self::MapZone { id: objective } => {
                write!(f, "{id}({objective})")
            }
            Self::Recharge | Self::SendReport => write!(f, "{id}()"),
        }
    }
}

/// Renders a mission duration as `HH:MM:SS.mmm`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_millis = elapsed.as_millis();
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let seconds = (total_millis % 60_000) / 1_000;
    let millis = total_millis % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
