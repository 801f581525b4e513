use rover_mission_core::{
    CommandKind, ObjectiveId, ObjectiveKind, RoverCommand, StepCount, TurnDirection,
};
use rover_mission_system_planner::{parse_direction, validate, Plan, PlanRejection, ScriptError};
use rover_mission_world::MissionLayout;

fn layout() -> MissionLayout {
    MissionLayout::builtin().expect("builtin mission validates")
}

fn steps(value: u32) -> StepCount {
    StepCount::new(value).expect("valid step count")
}

#[test]
fn advance_accepts_whole_numbers_within_range() {
    let layout = layout();
    for value in 1..=10 {
        let raw = value.to_string();
        assert_eq!(
            validate(&layout, CommandKind::Advance, Some(&raw)),
            Ok(RoverCommand::Advance {
                steps: steps(value)
            })
        );
    }

    for raw in ["0", "11", "-1", "2.5", "three", "3abc"] {
        assert_eq!(
            validate(&layout, CommandKind::Advance, Some(raw)),
            Err(PlanRejection::InvalidStepCount {
                raw: raw.to_owned()
            }),
            "`{raw}` should be rejected"
        );
    }
}

#[test]
fn turn_accepts_canonical_and_localized_tokens() {
    assert_eq!(parse_direction("LEFT"), Some(TurnDirection::Left));
    assert_eq!(parse_direction("Derecha"), Some(TurnDirection::Right));
    assert_eq!(parse_direction(" izquierda "), Some(TurnDirection::Left));
    assert_eq!(parse_direction("up"), None);

    let layout = layout();
    assert_eq!(
        validate(&layout, CommandKind::Turn, Some("around")),
        Err(PlanRejection::InvalidDirection {
            raw: "around".to_owned()
        })
    );
}

#[test]
fn objective_ids_must_match_the_command_kind() {
    let layout = layout();
    assert_eq!(
        validate(&layout, CommandKind::CollectSample, Some("s1")),
        Ok(RoverCommand::CollectSample {
            id: ObjectiveId::new("S1")
        })
    );
    assert_eq!(
        validate(&layout, CommandKind::MapZone, Some("m2")),
        Ok(RoverCommand::MapZone {
            id: ObjectiveId::new("M2")
        })
    );
    assert_eq!(
        validate(&layout, CommandKind::CollectSample, Some("M1")),
        Err(PlanRejection::UnknownObjective {
            kind: ObjectiveKind::Sample,
            raw: "M1".to_owned()
        })
    );
    assert_eq!(
        validate(&layout, CommandKind::MapZone, Some("M9")),
        Err(PlanRejection::UnknownObjective {
            kind: ObjectiveKind::Mapping,
            raw: "M9".to_owned()
        })
    );
}

#[test]
fn parameter_presence_is_enforced() {
    let layout = layout();
    assert_eq!(
        validate(&layout, CommandKind::Advance, None),
        Err(PlanRejection::MissingParameter {
            kind: CommandKind::Advance
        })
    );
    assert_eq!(
        validate(&layout, CommandKind::Turn, Some("   ")),
        Err(PlanRejection::MissingParameter {
            kind: CommandKind::Turn
        })
    );
    assert_eq!(
        validate(&layout, CommandKind::SendReport, Some("now")),
        Err(PlanRejection::UnexpectedParameter {
            kind: CommandKind::SendReport,
            raw: "now".to_owned()
        })
    );
    assert_eq!(
        validate(&layout, CommandKind::Recharge, Some("")),
        Ok(RoverCommand::Recharge)
    );
}

#[test]
fn rejected_commands_leave_the_plan_unchanged() {
    let layout = layout();
    let mut plan = Plan::new();

    assert_eq!(plan.build_plan(&layout, "advance", Some("4")), Ok(0));
    assert_eq!(plan.build_plan(&layout, "girar", Some("derecha")), Ok(1));

    let before = plan.clone();
    assert_eq!(
        plan.build_plan(&layout, "fly", Some("home")),
        Err(PlanRejection::UnknownCommand {
            id: "fly".to_owned()
        })
    );
    assert!(plan.build_plan(&layout, "advance", Some("12")).is_err());
    assert_eq!(plan, before);

    assert_eq!(
        plan.commands(),
        &[
            RoverCommand::Advance { steps: steps(4) },
            RoverCommand::Turn {
                direction: TurnDirection::Right
            },
        ]
    );
}

#[test]
fn plan_supports_reordering_removal_and_clearing() {
    let layout = layout();
    let mut plan = Plan::new();
    for (id, raw) in [
        ("advance", Some("1")),
        ("sendReport", None),
        ("recharge", None),
    ] {
        let _ = plan.build_plan(&layout, id, raw).expect("command accepted");
    }

    assert!(plan.move_command(2, 0));
    assert_eq!(plan.commands()[0], RoverCommand::Recharge);
    assert!(!plan.move_command(0, 3));

    assert_eq!(plan.remove(1), Some(RoverCommand::Advance { steps: steps(1) }));
    assert_eq!(plan.remove(5), None);
    assert_eq!(plan.len(), 2);

    plan.clear();
    assert!(plan.is_empty());
}

#[test]
fn declared_cost_counts_every_step() {
    let layout = layout();
    let plan = Plan::from_script(
        &layout,
        "advance 10\nturn left\ncollectSample S1\nmapZone M1\nrecharge\nsendReport\n",
    )
    .expect("script parses");

    assert_eq!(plan.total_declared_cost(&layout), 30 + 1 + 5 + 4 - 40 + 2);
}

#[test]
fn scripts_report_the_first_rejected_line() {
    let layout = layout();
    let script = "# approach\nadvance(4)\n\nturn(sideways)\nadvance 2\n";

    assert_eq!(
        Plan::from_script(&layout, script),
        Err(ScriptError {
            line: 4,
            source: PlanRejection::InvalidDirection {
                raw: "sideways".to_owned()
            },
        })
    );
}

#[test]
fn scripts_render_back_to_canonical_form() {
    let layout = layout();
    let plan = Plan::from_script(&layout, "avanzar 2\ngirar izquierda\nrecogerMuestra s1\nrecargarEnergia()\n")
        .expect("script parses");

    assert_eq!(
        plan.to_script(),
        "advance(2)\nturn(left)\ncollectSample(S1)\nrecharge()\n"
    );
    assert_eq!(Plan::from_script(&layout, &plan.to_script()), Ok(plan));
}
