#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure planning system that validates player input and maintains the
//! ordered command plan.
//!
//! Every parameter is checked before it is queued, so the executor only ever
//! receives well-formed [`RoverCommand`] values.

use rover_mission_core::{
    CommandKind, ObjectiveId, ObjectiveKind, RoverCommand, StepCount, TurnDirection,
};
use rover_mission_world::MissionLayout;
use thiserror::Error;

const LEFT_TOKENS: [&str; 2] = ["left", "izquierda"];
const RIGHT_TOKENS: [&str; 2] = ["right", "derecha"];
const COMMENT_MARKER: char = '#';

/// Reasons a command is refused before it enters the plan.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlanRejection {
    /// The identifier does not name a catalog command.
    #[error("unknown command `{id}`")]
    UnknownCommand {
        /// Identifier supplied by the player.
        id: String,
    },
    /// The command needs a parameter but none was supplied.
    #[error("`{kind}` requires a parameter")]
    MissingParameter {
        /// Command that was requested.
        kind: CommandKind,
    },
    /// A parameter was supplied to a command that takes none.
    #[error("`{kind}` takes no parameter, got `{raw}`")]
    UnexpectedParameter {
        /// Command that was requested.
        kind: CommandKind,
        /// Parameter supplied by the player.
        raw: String,
    },
    /// The step count is not a whole number within range.
    #[error("steps must be a whole number from 1 to 10, got `{raw}`")]
    InvalidStepCount {
        /// Parameter supplied by the player.
        raw: String,
    },
    /// The direction is neither left nor right.
    #[error("direction must be left or right, got `{raw}`")]
    InvalidDirection {
        /// Parameter supplied by the player.
        raw: String,
    },
    /// No objective of the expected kind carries the identifier.
    #[error("no {kind} objective named `{raw}`")]
    UnknownObjective {
        /// Kind of objective the command works on.
        kind: ObjectiveKind,
        /// Parameter supplied by the player.
        raw: String,
    },
}

/// Validates a raw parameter for `kind` and produces the typed command.
///
/// Parameters are trimmed first; an empty parameter counts as absent.
pub fn validate(
    layout: &MissionLayout,
    kind: CommandKind,
    raw: Option<&str>,
) -> Result<RoverCommand, PlanRejection> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty());

    let Some(raw) = raw else {
        return match kind {
            CommandKind::Recharge => Ok(RoverCommand::Recharge),
            CommandKind::SendReport => Ok(RoverCommand::SendReport),
            _ => Err(PlanRejection::MissingParameter { kind }),
        };
    };

    match kind {
        CommandKind::Advance => raw
            .parse::<u32>()
            .ok()
            .and_then(StepCount::new)
            .map(|steps| RoverCommand::Advance { steps })
            .ok_or_else(|| PlanRejection::InvalidStepCount {
                raw: raw.to_owned(),
            }),
        CommandKind::Turn => parse_direction(raw)
            .map(|direction| RoverCommand::Turn { direction })
            .ok_or_else(|| PlanRejection::InvalidDirection {
                raw: raw.to_owned(),
            }),
        CommandKind::CollectSample => resolve_objective(layout, ObjectiveKind::Sample, raw)
            .map(|id| RoverCommand::CollectSample { id }),
        CommandKind::MapZone => resolve_objective(layout, ObjectiveKind::Mapping, raw)
            .map(|id| RoverCommand::MapZone { id }),
        CommandKind::Recharge | CommandKind::SendReport => {
            Err(PlanRejection::UnexpectedParameter {
                kind,
                raw: raw.to_owned(),
            })
        }
    }
}

/// Resolves a direction token, accepting the localized classroom words.
#[must_use]
pub fn parse_direction(raw: &str) -> Option<TurnDirection> {
    let raw = raw.trim();
    if LEFT_TOKENS.iter().any(|token| raw.eq_ignore_ascii_case(token)) {
        Some(TurnDirection::Left)
    } else if RIGHT_TOKENS.iter().any(|token| raw.eq_ignore_ascii_case(token)) {
        Some(TurnDirection::Right)
    } else {
        None
    }
}

fn resolve_objective(
    layout: &MissionLayout,
    kind: ObjectiveKind,
    raw: &str,
) -> Result<ObjectiveId, PlanRejection> {
    let id = ObjectiveId::new(raw);
    if layout.objective(kind, &id).is_some() {
        Ok(id)
    } else {
        Err(PlanRejection::UnknownObjective {
            kind,
            raw: raw.to_owned(),
        })
    }
}

/// Failure to load a plan script, pointing at the offending line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {source}")]
pub struct ScriptError {
    /// One-based line number of the rejected command.
    pub line: usize,
    /// Reason the command was rejected.
    #[source]
    pub source: PlanRejection,
}

/// Ordered list of validated commands; insertion order is execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    commands: Vec<RoverCommand>,
}

impl Plan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `id` and `raw` against the layout and appends the command.
    ///
    /// Returns the index of the queued command. The plan is left unchanged
    /// when the command is rejected.
    pub fn build_plan(
        &mut self,
        layout: &MissionLayout,
        id: &str,
        raw: Option<&str>,
    ) -> Result<usize, PlanRejection> {
        let outcome = CommandKind::parse(id)
            .ok_or_else(|| PlanRejection::UnknownCommand { id: id.to_owned() })
            .and_then(|kind| validate(layout, kind, raw));

        match outcome {
            Ok(command) => {
                tracing::debug!(
                    target: "rover_mission::planner",
                    command = %command,
                    index = self.commands.len(),
                    "plan.queued"
                );
                self.commands.push(command);
                Ok(self.commands.len() - 1)
            }
            Err(rejection) => {
                tracing::debug!(
                    target: "rover_mission::planner",
                    id,
                    reason = %rejection,
                    "plan.rejected"
                );
                Err(rejection)
            }
        }
    }

    /// Empties the plan.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Removes the command at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<RoverCommand> {
        (index < self.commands.len()).then(|| self.commands.remove(index))
    }

    /// Moves the command at `from` so it ends up at `to`.
    ///
    /// Returns `false` and leaves the plan unchanged when either index is
    /// out of range.
    pub fn move_command(&mut self, from: usize, to: usize) -> bool {
        let len = self.commands.len();
        if from >= len || to >= len {
            return false;
        }
        let command = self.commands.remove(from);
        self.commands.insert(to, command);
        true
    }

    /// Queued commands in execution order.
    #[must_use]
    pub fn commands(&self) -> &[RoverCommand] {
        &self.commands
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Reports whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sums the catalog costs of every queued command, counting each
    /// `advance` step and assuming every location precondition holds.
    ///
    /// This is a planning hint only; the battery clamp is not applied.
    #[must_use]
    pub fn total_declared_cost(&self, layout: &MissionLayout) -> i64 {
        self.commands
            .iter()
            .map(|command| {
                let cost = i64::from(layout.energy_cost(command.kind()));
                match command {
                    RoverCommand::Advance { steps } => cost * i64::from(steps.get()),
                    _ => cost,
                }
            })
            .sum()
    }

    /// Parses a plan script with one command per line.
    ///
    /// Lines take the form `id param` or `id(param)`; blank lines and text
    /// after `#` are ignored. The first rejected line aborts parsing.
    pub fn from_script(layout: &MissionLayout, script: &str) -> Result<Self, ScriptError> {
        let mut plan = Self::new();
        for (index, line) in script.lines().enumerate() {
            let Some((id, raw)) = split_script_line(line) else {
                continue;
            };
            let _ = plan
                .build_plan(layout, id, raw)
                .map_err(|source| ScriptError {
                    line: index + 1,
                    source,
                })?;
        }
        Ok(plan)
    }

    /// Renders the plan back into script form, one command per line.
    #[must_use]
    pub fn to_script(&self) -> String {
        self.commands
            .iter()
            .map(|command| format!("{command}\n"))
            .collect()
    }
}

fn split_script_line(line: &str) -> Option<(&str, Option<&str>)> {
    let line = match line.split_once(COMMENT_MARKER) {
        Some((content, _)) => content,
        None => line,
    }
    .trim();
    if line.is_empty() {
        return None;
    }

    if let Some((id, rest)) = line.split_once('(') {
        let raw = rest.trim_end().strip_suffix(')').unwrap_or(rest);
        return Some((id.trim(), Some(raw)));
    }

    match line.split_once(char::is_whitespace) {
        Some((id, raw)) => Some((id, Some(raw))),
        None => Some((line, None)),
    }
}
