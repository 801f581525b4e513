//! Text projections of the mission, the plan and the event stream.

use rover_mission_core::{format_elapsed, CellCoord, Event, Outcome, ParameterKind};
use rover_mission_system_planner::Plan;
use rover_mission_world::MissionLayout;

const ROVER_GLYPH: &str = "R";
const HIDDEN_GLYPH: &str = "?";
const EMPTY_GLYPH: &str = ".";

/// Describes a single event as one human readable line.
pub(crate) fn event_line(event: &Event) -> String {
    match event {
        Event::RunStarted {
            position,
            heading,
            energy,
        } => format!(
            "run started at {position} facing {} with {energy}",
            heading.as_str()
        ),
        Event::CommandStarted { index, command } => format!("[{:02}] {command}", index + 1),
        Event::PositionChanged { from, to } => format!("     moved {from} -> {to}"),
        Event::HeadingChanged { from, to } => {
            format!("     turned {} -> {}", from.as_str(), to.as_str())
        }
        Event::EnergyChanged { energy, low_power } => {
            if *low_power {
                format!("     energy {energy} (low power)")
            } else {
                format!("     energy {energy}")
            }
        }
        Event::ObjectiveCompleted { completion } => format!("     completed {completion}"),
        Event::RunEnded { outcome } => outcome_line(outcome),
    }
}

fn outcome_line(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Succeeded {
            energy_remaining,
            elapsed,
        } => format!(
            "mission accomplished: energy {energy_remaining}, time {}",
            format_elapsed(*elapsed)
        ),
        Outcome::Failed { command_index } => format!(
            "mission failed: battery depleted during command {}",
            command_index + 1
        ),
        Outcome::CompletedIncomplete { energy_remaining } => format!(
            "sequence finished with objectives pending: energy {energy_remaining}"
        ),
    }
}

/// Draws the grid with the rover at `rover`, followed by a legend.
///
/// Rows are printed north to south. Objectives hide terrain markers and the
/// rover hides whatever lies beneath it.
pub(crate) fn tactical_map(layout: &MissionLayout, rover: CellCoord) -> String {
    let size = layout.grid_size();
    let mut map = String::new();
    for row in 0..size {
        let line: Vec<String> = (0..size)
            .map(|column| {
                let cell = CellCoord::new(column, row);
                let glyph = if cell == rover {
                    ROVER_GLYPH
                } else if let Some(objective) = layout.objective_at(cell) {
                    objective.symbol()
                } else if layout.is_hidden_terrain(cell) {
                    HIDDEN_GLYPH
                } else {
                    EMPTY_GLYPH
                };
                format!("{glyph:<2}")
            })
            .collect();
        map.push_str(line.join(" ").trim_end());
        map.push('\n');
    }

    map.push('\n');
    map.push_str(&format!("{ROVER_GLYPH:<3}rover at {rover}\n"));
    for objective in layout.objectives() {
        map.push_str(&format!(
            "{:<3}{} at {}\n",
            objective.symbol(),
            objective.kind(),
            objective.cell()
        ));
    }
    map
}

/// Lists the command catalog in canonical order.
pub(crate) fn catalog(layout: &MissionLayout) -> String {
    let mut listing = String::new();
    for definition in layout.commands() {
        let parameter = match definition.parameter() {
            Some(ParameterKind::Number) => "number",
            Some(ParameterKind::Text) => "text",
            None => "-",
        };
        listing.push_str(&format!(
            "{:<14}{:<20}{:<8}{:>4}\n",
            definition.kind().id(),
            definition.label(),
            parameter,
            definition.energy_cost()
        ));
    }
    listing
}

/// Lists the commands of a validated plan and its declared energy cost.
pub(crate) fn plan_listing(layout: &MissionLayout, plan: &Plan) -> String {
    let mut listing = String::new();
    for (index, command) in plan.commands().iter().enumerate() {
        listing.push_str(&format!("[{:02}] {command}\n", index + 1));
    }
    listing.push_str(&format!(
        "{} commands, declared cost {}\n",
        plan.len(),
        plan.total_declared_cost(layout)
    ));
    listing
}
