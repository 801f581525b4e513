use std::{
    path::PathBuf,
    process::{Command, Output},
};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn rover_mission(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rover-mission"))
        .args(args)
        .env_remove("ROVER_MISSION_PATH")
        .output()
        .expect("failed to invoke the rover-mission binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is utf-8")
}

#[test]
fn winning_plan_reports_success() {
    let plan = demo("winning.plan");
    let output = rover_mission(&["run", plan.to_str().expect("utf-8 path")]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("run started at (0, 14) facing north with 100%\n"));
    assert!(text.contains("completed reach-extraction"));
    assert!(text.contains("mission accomplished: energy 27%, time 00:00:"));
}

#[test]
fn json_format_emits_one_event_per_line() {
    let plan = demo("depleted.plan");
    let output = rover_mission(&[
        "run",
        plan.to_str().expect("utf-8 path"),
        "--format",
        "json",
    ]);

    assert!(output.status.success());
    let text = stdout(&output);
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a JSON object"))
        .collect();

    assert!(events[0].get("RunStarted").is_some());
    let last = events.last().expect("events were emitted");
    assert_eq!(last["RunEnded"]["outcome"]["Failed"]["command_index"], 3);
}

#[test]
fn check_rejects_invalid_scripts() {
    let dir = std::env::temp_dir().join(format!("rover-mission-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir is writable");
    let plan = dir.join("bad.plan");
    std::fs::write(&plan, "advance 2\nturn sideways\n").expect("plan is writable");

    let output = rover_mission(&["check", plan.to_str().expect("utf-8 path")]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "unexpected stderr: {stderr}");
}

#[test]
fn check_prints_declared_cost() {
    let plan = demo("depleted.plan");
    let output = rover_mission(&["check", plan.to_str().expect("utf-8 path")]);

    assert!(output.status.success());
    assert!(stdout(&output).ends_with("5 commands, declared cost 122\n"));
}

#[test]
fn map_shows_the_rover_at_the_start() {
    let output = rover_mission(&["map"]);

    assert!(output.status.success());
    let text = stdout(&output);
    let rows: Vec<&str> = text.lines().collect();
    assert!(rows[14].starts_with('R'));
    assert!(text.contains("E  extraction at (14, 0)"));
}
