//! Immutable mission layout: grid geometry, objectives and the command catalog.

use std::{
    collections::BTreeSet,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use rover_mission_core::{
    CellCoord, CommandDefinition, CommandKind, Completion, Energy, Objective, ObjectiveId,
    ObjectiveKind, ParameterKind, MAX_ENERGY,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mission document compiled into the binary.
pub const BUILTIN_MISSION: &str = include_str!("../data/mission.toml");

/// Environment variable naming a mission document that replaces the builtin one.
pub const MISSION_PATH_ENV: &str = "ROVER_MISSION_PATH";

const DEFAULT_START_ENERGY: u32 = MAX_ENERGY;

/// Serialized form of a mission as read from TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissionConfig {
    /// Number of cells along each side of the square grid.
    pub grid_size: u32,
    /// Cell the rover starts every run from.
    pub start: CellConfig,
    /// Battery level at the start of every run.
    #[serde(default = "default_start_energy")]
    pub start_energy: u32,
    /// Cells drawn as unsurveyed terrain; they have no effect on the simulation.
    #[serde(default)]
    pub hidden_terrain: Vec<CellConfig>,
    /// Objectives placed on the grid.
    pub objectives: Vec<ObjectiveConfig>,
    /// Catalog of commands available to players.
    pub commands: Vec<CommandConfig>,
}

fn default_start_energy() -> u32 {
    DEFAULT_START_ENERGY
}

/// Grid cell written as an `{ x, y }` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConfig {
    /// Column of the cell.
    pub x: u32,
    /// Row of the cell.
    pub y: u32,
}

impl From<CellConfig> for CellCoord {
    fn from(cell: CellConfig) -> Self {
        CellCoord::new(cell.x, cell.y)
    }
}

/// Serialized objective entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    /// Kind of objective.
    pub kind: ObjectiveKind,
    /// Identifier players refer to; required for samples and mapping zones.
    #[serde(default)]
    pub id: Option<String>,
    /// Symbol drawn on the map.
    pub symbol: String,
    /// Column of the objective.
    pub x: u32,
    /// Row of the objective.
    pub y: u32,
}

/// Serialized command catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Catalog identifier, such as `advance`.
    pub id: String,
    /// Label shown to players; defaults to the identifier.
    #[serde(default)]
    pub label: Option<String>,
    /// Declared parameter kind; must match the command's fixed signature.
    #[serde(default)]
    pub parameter: Option<ParameterKind>,
    /// Fixed energy cost; negative values restore energy.
    pub energy_cost: i32,
}

/// Reasons a mission document is rejected.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The mission file could not be read.
    #[error("failed to read mission from {path:?}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The mission document is not valid TOML for a mission.
    #[error("failed to parse mission: {0}")]
    Parse(#[from] toml::de::Error),
    /// The grid has no cells.
    #[error("grid size must be at least one cell")]
    EmptyGrid,
    /// The start cell lies outside the grid.
    #[error("start position {cell} lies outside the {grid_size}x{grid_size} grid")]
    StartOutOfBounds {
        /// Offending start cell.
        cell: CellCoord,
        /// Configured grid size.
        grid_size: u32,
    },
    /// The start energy is outside `1..=MAX_ENERGY`.
    #[error("start energy {value} must lie within 1..=100")]
    StartEnergyOutOfRange {
        /// Offending energy value.
        value: u32,
    },
    /// An objective lies outside the grid.
    #[error("{kind} objective at {cell} lies outside the {grid_size}x{grid_size} grid")]
    ObjectiveOutOfBounds {
        /// Kind of the misplaced objective.
        kind: ObjectiveKind,
        /// Offending cell.
        cell: CellCoord,
        /// Configured grid size.
        grid_size: u32,
    },
    /// A sample or mapping objective has no identifier.
    #[error("{kind} objective at {cell} requires an id")]
    MissingObjectiveId {
        /// Kind of the objective.
        kind: ObjectiveKind,
        /// Cell of the objective.
        cell: CellCoord,
    },
    /// Two objectives of the same kind share an identifier.
    #[error("{kind} objective id {id} is declared more than once")]
    DuplicateObjectiveId {
        /// Kind of the objectives.
        kind: ObjectiveKind,
        /// Repeated identifier.
        id: ObjectiveId,
    },
    /// The mission has no extraction point.
    #[error("mission declares no extraction objective")]
    MissingExtraction,
    /// The mission has more than one extraction point.
    #[error("mission declares more than one extraction objective")]
    DuplicateExtraction,
    /// A hidden terrain marker lies outside the grid.
    #[error("hidden terrain at {cell} lies outside the grid")]
    HiddenTerrainOutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
    /// A catalog entry uses an unknown identifier.
    #[error("unknown command id `{id}` in catalog")]
    UnknownCommand {
        /// Unrecognised identifier.
        id: String,
    },
    /// Two catalog entries resolve to the same command.
    #[error("command `{kind}` is declared more than once")]
    DuplicateCommand {
        /// Repeated command.
        kind: CommandKind,
    },
    /// The catalog lacks one of the fixed commands.
    #[error("catalog is missing command `{kind}`")]
    MissingCommand {
        /// Missing command.
        kind: CommandKind,
    },
    /// A catalog entry declares a parameter the command does not take.
    #[error("command `{kind}` declares parameter {declared:?}, expected {expected:?}")]
    ParameterMismatch {
        /// Command with the mismatched declaration.
        kind: CommandKind,
        /// Parameter kind written in the catalog.
        declared: Option<ParameterKind>,
        /// Parameter kind the command takes.
        expected: Option<ParameterKind>,
    },
}

/// Validated, immutable description of a mission.
#[derive(Clone, Debug, PartialEq)]
pub struct MissionLayout {
    grid_size: u32,
    start: CellCoord,
    start_energy: Energy,
    objectives: Vec<Objective>,
    extraction: usize,
    hidden_terrain: BTreeSet<CellCoord>,
    commands: Vec<CommandDefinition>,
}

impl MissionLayout {
    /// Validates a mission document and builds the layout.
    pub fn new(config: MissionConfig) -> Result<Self, LayoutError> {
        let grid_size = config.grid_size;
        if grid_size == 0 {
            return Err(LayoutError::EmptyGrid);
        }

        let start = CellCoord::from(config.start);
        if !start.is_within(grid_size) {
            return Err(LayoutError::StartOutOfBounds {
                cell: start,
                grid_size,
            });
        }

        if config.start_energy == 0 || config.start_energy > MAX_ENERGY {
            return Err(LayoutError::StartEnergyOutOfRange {
                value: config.start_energy,
            });
        }

        let objectives = build_objectives(config.objectives, grid_size)?;
        let extraction = locate_extraction(&objectives)?;

        let mut hidden_terrain = BTreeSet::new();
        for cell in config.hidden_terrain.into_iter().map(CellCoord::from) {
            if !cell.is_within(grid_size) {
                return Err(LayoutError::HiddenTerrainOutOfBounds { cell });
            }
            let _ = hidden_terrain.insert(cell);
        }

        let commands = build_catalog(config.commands)?;

        Ok(Self {
            grid_size,
            start,
            start_energy: Energy::new(config.start_energy),
            objectives,
            extraction,
            hidden_terrain,
            commands,
        })
    }

    /// Parses and validates a TOML mission document.
    pub fn from_toml_str(contents: &str) -> Result<Self, LayoutError> {
        let config: MissionConfig = toml::from_str(contents)?;
        Self::new(config)
    }

    /// Reads, parses and validates a TOML mission file.
    pub fn from_path(path: &Path) -> Result<Self, LayoutError> {
        let contents = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Builds the mission compiled into the binary.
    pub fn builtin() -> Result<Self, LayoutError> {
        Self::from_toml_str(BUILTIN_MISSION)
    }

    /// Number of cells along each side of the grid.
    #[must_use]
    pub const fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Cell every run starts from.
    #[must_use]
    pub const fn start(&self) -> CellCoord {
        self.start
    }

    /// Battery level every run starts with.
    #[must_use]
    pub const fn start_energy(&self) -> Energy {
        self.start_energy
    }

    /// Objectives in declaration order.
    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Objective placed at `cell`, if any.
    #[must_use]
    pub fn objective_at(&self, cell: CellCoord) -> Option<&Objective> {
        self.objectives.iter().find(|objective| objective.cell() == cell)
    }

    /// Objective of `kind` with the provided identifier, if declared.
    #[must_use]
    pub fn objective(&self, kind: ObjectiveKind, id: &ObjectiveId) -> Option<&Objective> {
        self.objectives
            .iter()
            .find(|objective| objective.kind() == kind && objective.id() == Some(id))
    }

    /// Reports whether a recharge station sits at `cell`.
    #[must_use]
    pub fn is_recharge_station(&self, cell: CellCoord) -> bool {
        self.objectives
            .iter()
            .any(|objective| objective.kind() == ObjectiveKind::Recharge && objective.cell() == cell)
    }

    /// The extraction objective.
    #[must_use]
    pub fn extraction(&self) -> &Objective {
        &self.objectives[self.extraction]
    }

    /// Completions that must be recorded before extraction counts as a win.
    pub fn prerequisites(&self) -> impl Iterator<Item = Completion> + '_ {
        self.objectives
            .iter()
            .filter(|objective| {
                matches!(
                    objective.kind(),
                    ObjectiveKind::Sample | ObjectiveKind::Mapping
                )
            })
            .filter_map(Objective::completion)
    }

    /// Reports whether `cell` is drawn as unsurveyed terrain.
    #[must_use]
    pub fn is_hidden_terrain(&self, cell: CellCoord) -> bool {
        self.hidden_terrain.contains(&cell)
    }

    /// Catalog entries in presentation order.
    #[must_use]
    pub fn commands(&self) -> &[CommandDefinition] {
        &self.commands
    }

    /// Catalog entry for `kind`.
    #[must_use]
    pub fn command(&self, kind: CommandKind) -> &CommandDefinition {
        &self.commands[kind as usize]
    }

    /// Fixed energy cost of `kind`.
    #[must_use]
    pub fn energy_cost(&self, kind: CommandKind) -> i32 {
        self.command(kind).energy_cost()
    }
}

/// Loads the mission named by `ROVER_MISSION_PATH`, falling back to the
/// builtin mission when the variable is unset or the file is unusable.
pub fn load_layout_from_env() -> Result<Arc<MissionLayout>, LayoutError> {
    if let Some(path) = env::var_os(MISSION_PATH_ENV).map(PathBuf::from) {
        match MissionLayout::from_path(&path) {
            Ok(layout) => {
                tracing::info!(
                    target: "rover_mission::world",
                    path = %path.display(),
                    "mission.loaded"
                );
                return Ok(Arc::new(layout));
            }
            Err(err) => {
                tracing::warn!(
                    target: "rover_mission::world",
                    path = %path.display(),
                    error = %err,
                    "mission.load_failed"
                );
            }
        }
    }

    MissionLayout::builtin().map(Arc::new)
}

fn build_objectives(
    entries: Vec<ObjectiveConfig>,
    grid_size: u32,
) -> Result<Vec<Objective>, LayoutError> {
    let mut seen: BTreeSet<(ObjectiveKind, ObjectiveId)> = BTreeSet::new();
    let mut objectives = Vec::with_capacity(entries.len());

    for entry in entries {
        let cell = CellCoord::new(entry.x, entry.y);
        if !cell.is_within(grid_size) {
            return Err(LayoutError::ObjectiveOutOfBounds {
                kind: entry.kind,
                cell,
                grid_size,
            });
        }

        let id = entry
            .id
            .as_deref()
            .map(ObjectiveId::new)
            .filter(|id| !id.as_str().is_empty());
        let requires_id = matches!(entry.kind, ObjectiveKind::Sample | ObjectiveKind::Mapping);
        match (&id, requires_id) {
            (None, true) => {
                return Err(LayoutError::MissingObjectiveId {
                    kind: entry.kind,
                    cell,
                });
            }
            (Some(id), _) => {
                if !seen.insert((entry.kind, id.clone())) {
                    return Err(LayoutError::DuplicateObjectiveId {
                        kind: entry.kind,
                        id: id.clone(),
                    });
                }
            }
            (None, false) => {}
        }

        objectives.push(Objective::new(entry.kind, id, entry.symbol, cell));
    }

    Ok(objectives)
}

fn locate_extraction(objectives: &[Objective]) -> Result<usize, LayoutError> {
    let mut extraction = objectives
        .iter()
        .enumerate()
        .filter(|(_, objective)| objective.kind() == ObjectiveKind::Extraction)
        .map(|(index, _)| index);

    let first = extraction.next().ok_or(LayoutError::MissingExtraction)?;
    if extraction.next().is_some() {
        return Err(LayoutError::DuplicateExtraction);
    }
    Ok(first)
}

fn build_catalog(entries: Vec<CommandConfig>) -> Result<Vec<CommandDefinition>, LayoutError> {
    let mut slots: [Option<CommandDefinition>; 6] = Default::default();

    for entry in entries {
        let kind = CommandKind::parse(&entry.id).ok_or_else(|| LayoutError::UnknownCommand {
            id: entry.id.clone(),
        })?;

        let expected = kind.parameter();
        if entry.parameter != expected {
            return Err(LayoutError::ParameterMismatch {
                kind,
                declared: entry.parameter,
                expected,
            });
        }

        let slot = &mut slots[kind as usize];
        if slot.is_some() {
            return Err(LayoutError::DuplicateCommand { kind });
        }

        let label = entry.label.unwrap_or_else(|| kind.id().to_owned());
        *slot = Some(CommandDefinition::new(kind, label, entry.energy_cost));
    }

    CommandKind::ALL
        .into_iter()
        .zip(slots)
        .map(|(kind, slot)| slot.ok_or(LayoutError::MissingCommand { kind }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_config() -> MissionConfig {
        toml::from_str(BUILTIN_MISSION).expect("builtin mission parses")
    }

    #[test]
    fn builtin_mission_matches_reference_layout() {
        let layout = MissionLayout::builtin().expect("builtin mission validates");

        assert_eq!(layout.grid_size(), 15);
        assert_eq!(layout.start(), CellCoord::new(0, 14));
        assert_eq!(layout.start_energy(), Energy::full());
        assert_eq!(layout.extraction().cell(), CellCoord::new(14, 0));
        assert!(layout.is_recharge_station(CellCoord::new(8, 2)));
        assert!(!layout.is_recharge_station(CellCoord::new(8, 3)));
        assert!(layout.is_hidden_terrain(CellCoord::new(13, 1)));

        let sample = layout
            .objective(ObjectiveKind::Sample, &ObjectiveId::new("s2"))
            .expect("S2 declared");
        assert_eq!(sample.cell(), CellCoord::new(11, 6));
        assert!(layout
            .objective(ObjectiveKind::Mapping, &ObjectiveId::new("S2"))
            .is_none());
    }

    #[test]
    fn builtin_catalog_carries_fixed_costs() {
        let layout = MissionLayout::builtin().expect("builtin mission validates");
        let costs: Vec<i32> = CommandKind::ALL
            .into_iter()
            .map(|kind| layout.energy_cost(kind))
            .collect();
        assert_eq!(costs, vec![3, 1, 5, 4, -40, 2]);
        assert_eq!(layout.command(CommandKind::Turn).label(), "turn(direction)");
    }

    #[test]
    fn prerequisites_cover_samples_and_zones() {
        let layout = MissionLayout::builtin().expect("builtin mission validates");
        let keys: Vec<String> = layout.prerequisites().map(|c| c.to_string()).collect();
        assert_eq!(keys, vec!["collect-s1", "collect-s2", "map-m1", "map-m2"]);
    }

    #[test]
    fn rejects_start_outside_grid() {
        let mut config = builtin_config();
        config.start = CellConfig { x: 15, y: 0 };
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::StartOutOfBounds { .. })
        ));
    }

    #[test]
    fn rejects_objective_outside_grid() {
        let mut config = builtin_config();
        config.objectives[0].y = 40;
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::ObjectiveOutOfBounds {
                kind: ObjectiveKind::Sample,
                ..
            })
        ));
    }

    #[test]
    fn rejects_duplicate_command_ids() {
        let mut config = builtin_config();
        let mut duplicate = config.commands[0].clone();
        duplicate.id = "avanzar".to_owned();
        config.commands.push(duplicate);
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::DuplicateCommand {
                kind: CommandKind::Advance
            })
        ));
    }

    #[test]
    fn rejects_incomplete_catalog() {
        let mut config = builtin_config();
        config.commands.retain(|command| command.id != "sendReport");
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::MissingCommand {
                kind: CommandKind::SendReport
            })
        ));
    }

    #[test]
    fn rejects_mismatched_parameter_declaration() {
        let mut config = builtin_config();
        config.commands[4].parameter = Some(ParameterKind::Number);
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::ParameterMismatch {
                kind: CommandKind::Recharge,
                ..
            })
        ));
    }

    #[test]
    fn rejects_sample_without_id() {
        let mut config = builtin_config();
        config.objectives[1].id = None;
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::MissingObjectiveId { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_objective_ids_case_insensitively() {
        let mut config = builtin_config();
        config.objectives[1].id = Some("s1".to_owned());
        assert!(matches!(
            MissionLayout::new(config),
            Err(LayoutError::DuplicateObjectiveId { .. })
        ));
    }

    #[test]
    fn requires_exactly_one_extraction() {
        let mut missing = builtin_config();
        missing
            .objectives
            .retain(|objective| objective.kind != ObjectiveKind::Extraction);
        assert!(matches!(
            MissionLayout::new(missing),
            Err(LayoutError::MissingExtraction)
        ));

        let mut doubled = builtin_config();
        let extra = doubled
            .objectives
            .iter()
            .find(|objective| objective.kind == ObjectiveKind::Extraction)
            .cloned()
            .expect("extraction declared");
        doubled.objectives.push(extra);
        assert!(matches!(
            MissionLayout::new(doubled),
            Err(LayoutError::DuplicateExtraction)
        ));
    }

    #[test]
    fn rejects_empty_grid_and_bad_energy() {
        let mut empty = builtin_config();
        empty.grid_size = 0;
        assert!(matches!(MissionLayout::new(empty), Err(LayoutError::EmptyGrid)));

        let mut drained = builtin_config();
        drained.start_energy = 0;
        assert!(matches!(
            MissionLayout::new(drained),
            Err(LayoutError::StartEnergyOutOfRange { value: 0 })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/definitely/not/a/mission.toml");
        match MissionLayout::from_path(path) {
            Err(LayoutError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            MissionLayout::from_toml_str("grid_size = \"wide\""),
            Err(LayoutError::Parse(_))
        ));
    }
}
