use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use std::fs;
use std::process::Command; // Run programs
use tempfile::tempdir; // Create temporary directories for testing

fn bar_forge(dir: &tempfile::TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("bar-forge")?;
    // Keep a stray bar-forge.toml or BAR_FORGE_* variable out of the run
    cmd.current_dir(dir.path());
    cmd.env("RUST_LOG", "info");
    cmd.env_remove("BAR_FORGE_SEED");
    cmd.env_remove("BAR_FORGE_ROWS");
    cmd.env_remove("BAR_FORGE_COLS");
    cmd.env_remove("BAR_FORGE_LAYOUT");
    Ok(cmd)
}

#[test]
fn test_basic_carve_run() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let output_file = tmp_dir.path().join("bar.txt");

    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--seed")
        .arg("happy hour")
        .arg("--rows")
        .arg("20")
        .arg("--cols")
        .arg("20")
        .arg("--output-path")
        .arg(&output_file);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Accepted map for seed 'happy hour'"));

    let text = fs::read_to_string(&output_file)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 20);
    assert!(lines.iter().all(|line| line.len() == 20));
    assert_eq!(text.matches('0').count(), 1);
    assert!(text.contains('R') && text.contains('C'));

    Ok(())
}

#[test]
fn test_map_goes_to_stdout_without_output_path() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--seed").arg("stdout");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("R").and(predicate::str::contains("#")));

    Ok(())
}

#[test]
fn test_same_seed_same_output() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let first = bar_forge(&tmp_dir)?.arg("--seed").arg("twice").output()?;
    let second = bar_forge(&tmp_dir)?.arg("--seed").arg("twice").output()?;
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    Ok(())
}

#[test]
fn test_wfc_layout_with_bundled_library() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--seed").arg("wfc-run").arg("--layout").arg("wfc");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("wfc layout"));

    Ok(())
}

#[test]
fn test_config_file_layer() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let output_file = tmp_dir.path().join("from_config.txt");
    fs::write(
        tmp_dir.path().join("bar-forge.toml"),
        "rows = 16\ncols = 18\nseed = \"configured\"\n",
    )?;

    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--output-path").arg(&output_file);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("seed 'configured'"));

    let text = fs::read_to_string(&output_file)?;
    assert_eq!(text.lines().count(), 16);
    Ok(())
}

#[test]
fn test_env_layer_overrides_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.env("BAR_FORGE_SEED", "from-env");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("seed 'from-env'"));
    Ok(())
}

#[test]
fn test_survey_writes_csv() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let csv_file = tmp_dir.path().join("survey.csv");

    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--seed")
        .arg("survey")
        .arg("--survey")
        .arg("4")
        .arg("--survey-csv")
        .arg(&csv_file);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Survey finished"));

    let text = fs::read_to_string(&csv_file)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Seed,Status,Archetype,Layout,Attempts,Error");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("survey-0,"));
    Ok(())
}

#[test]
fn test_too_small_grid_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--rows").arg("4");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid generation context"));
    Ok(())
}

#[test]
fn test_missing_pattern_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let mut cmd = bar_forge(&tmp_dir)?;
    cmd.arg("--pattern-file").arg("does_not_exist.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Pattern Library Error"));
    Ok(())
}
