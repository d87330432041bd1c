use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_cmdtag")));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Copy a fixture into a fresh temp dir.
fn staged(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::copy(fixture(name), &path).unwrap();
    (dir, path)
}

fn insert_args(header: &Path, source: &Path, class: &str, function: &str) -> Vec<String> {
    vec![
        "insert".to_string(),
        "--header".to_string(),
        header.to_string_lossy().into_owned(),
        "--source".to_string(),
        source.to_string_lossy().into_owned(),
        "--class".to_string(),
        class.to_string(),
        "-f".to_string(),
        function.to_string(),
    ]
}

#[test]
fn manifest_keeps_only_commands() {
    let output = cmd()
        .args(["manifest", fixture("sample_service.hpp").to_str().unwrap(), "-o", "-"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let yaml = String::from_utf8(output).unwrap();

    assert!(yaml.contains("subsystem: sample_service\n"), "Got: {yaml}");
    assert!(yaml.contains("modes: [normal, diagnostics, provisioning, recovery, low_power]\n"));
    assert!(yaml.contains("id: cmd.sample_service.arm\n"));
    assert!(yaml.contains("id: cmd.sample_service.self_test\n"));
    assert!(yaml.contains("allowed_modes: [normal, diagnostics]\n"));
    assert!(!yaml.contains("Armed"), "Got: {yaml}");

    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let commands = value["commands"].as_sequence().unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0]["request"]["type"].as_str(), Some("const ArmRequest&"));
    assert_eq!(commands[1]["request"]["type"].as_str(), Some("void"));
    assert_eq!(commands[1]["emit"][1].as_str(), Some("ev.failed"));
    assert_eq!(commands[1]["allowed_modes"].as_sequence().unwrap().len(), 5);
}

#[test]
fn manifest_default_output_path() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .args(["manifest", fixture("sample_service.hpp").to_str().unwrap()])
        .args(["--subsystem", "RadioControl", "--version", "3", "--modes", "normal,recovery"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] manifest written: sample_service_command.yaml"));

    let yaml = fs::read_to_string(dir.path().join("sample_service_command.yaml")).unwrap();
    assert!(yaml.starts_with("version: 3\n"), "Got: {yaml}");
    assert!(yaml.contains("modes: [normal, recovery]\n"));
    assert!(yaml.contains("id: cmd.radio_control.arm\n"));
}

#[test]
fn manifest_json() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("m.json");
    cmd()
        .args(["manifest", fixture("sample_service.hpp").to_str().unwrap(), "-f", "json"])
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["commands"][0]["name"], "Arm");
    assert_eq!(value["commands"][0]["emit"][0], "ev.armed");
}

#[test]
fn manifest_unknown_format_fails() {
    cmd()
        .args(["manifest", fixture("sample_service.hpp").to_str().unwrap(), "-f", "toml", "-o", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn insert_radio_is_idempotent() {
    let (dir, header) = staged("radio.hpp");
    let source = dir.path().join("radio.cpp");
    let original = fs::read_to_string(&header).unwrap();

    cmd()
        .args(insert_args(&header, &source, "Radio", "Receive"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Inserted declaration into header"))
        .stdout(predicate::str::contains("[OK] Added definition to source"));

    let after = fs::read_to_string(&header).unwrap();
    assert!(after.contains("public: // command\n"), "Got: {after}");
    assert!(after.contains("     * @type: command\n     * @command: Receive\n"));
    assert!(after.contains("    void Receive();\n"));
    assert!(after.contains("public: void Send(); };"));
    assert_eq!(fs::read_to_string(dir.path().join("radio.hpp.bak")).unwrap(), original);
    assert_eq!(
        fs::read_to_string(&source).unwrap(),
        "#include \"radio.hpp\"\n\nvoid Radio::Receive() {\n}\n"
    );

    cmd()
        .args(insert_args(&header, &source, "Radio", "Receive"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK]").not())
        .stderr(predicate::str::contains("already contains the same declaration"))
        .stderr(predicate::str::contains("already contains the same definition"));

    assert_eq!(fs::read_to_string(&header).unwrap(), after);
}

#[test]
fn insert_lands_in_tagged_section() {
    let (dir, header) = staged("sample_service.hpp");
    let source = dir.path().join("sample_service.cpp");
    fs::write(&source, "#include \"sample_service.hpp\"\n").unwrap();

    let mut args = insert_args(&header, &source, "SampleService", "Disarm");
    args.extend(
        ["--ns", "sample", "--return-type", "int", "--params", "int level = 0", "--qualifiers", "const override"]
            .map(String::from),
    );
    args.extend(["--allowed-modes", "normal", "recovery", "--emit", "[ev.disarmed]"].map(String::from));
    args.push("--also-comment-in-cpp".to_string());
    cmd().args(args).assert().success();

    let after = fs::read_to_string(&header).unwrap();
    let tagged = after.find("public: // command").unwrap();
    let decl = after.find("    int Disarm(int level = 0) const override;\n").unwrap();
    let arm = after.find("void Arm(").unwrap();
    assert!(tagged < decl && decl < arm, "Got: {after}");
    assert!(after.contains("     * @allowed_modes: [normal,recovery]\n     * @emit: [ev.disarmed]\n"));

    let src = fs::read_to_string(&source).unwrap();
    assert!(src.contains(" */\nint sample::SampleService::Disarm(int level) const {\n    return {};\n}\n"), "Got: {src}");
}

#[test]
fn insert_event_annotation() {
    let (dir, header) = staged("radio.hpp");
    let source = dir.path().join("radio.cpp");
    let mut args = insert_args(&header, &source, "Radio", "Received");
    args.extend(["--type", "event", "--durability", "persistent", "--causation", "cmd.radio.receive", "--no-backup"].map(String::from));
    cmd().args(args).assert().success();

    let after = fs::read_to_string(&header).unwrap();
    assert!(after.contains("public: // event\n"), "Got: {after}");
    assert!(after.contains("     * @durability: persistent\n     * @causation: [cmd.radio.receive]\n"));
    assert!(!dir.path().join("radio.hpp.bak").exists());
}

#[test]
fn insert_missing_class_fails_without_writing() {
    let (dir, header) = staged("radio.hpp");
    let source = dir.path().join("radio.cpp");
    cmd()
        .args(insert_args(&header, &source, "Television", "Receive"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("class 'Television' not found"));

    assert!(!source.exists());
    assert!(!dir.path().join("radio.hpp.bak").exists());
}

#[test]
fn insert_dry_run_writes_nothing() {
    let (dir, header) = staged("radio.hpp");
    let source = dir.path().join("radio.cpp");
    let original = fs::read_to_string(&header).unwrap();
    let mut args = insert_args(&header, &source, "Radio", "Receive");
    args.push("--dry-run".to_string());

    cmd()
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would insert declaration"));

    assert_eq!(fs::read_to_string(&header).unwrap(), original);
    assert!(!source.exists());
}

#[test]
fn annotate_to_stdout() {
    cmd()
        .args(["annotate", fixture("manager.hpp").to_str().unwrap()])
        .args(["--func", "getServiceFactory:Get the service factory", "--func", "Load:Load it"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "    /**\n     * @brief Get the service factory\n     */\n    ServiceFactory* getServiceFactory() const;",
        ))
        .stdout(predicate::str::contains("Already documented"))
        .stdout(predicate::str::contains("@brief Load it").not());
}

#[test]
fn annotate_in_place_with_regex() {
    let (dir, header) = staged("manager.hpp");
    let original = fs::read_to_string(&header).unwrap();

    cmd()
        .args(["annotate", header.to_str().unwrap(), "--func", "set[AB]", "--regex", "--in-place"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Updated in place"));

    let after = fs::read_to_string(&header).unwrap();
    assert_eq!(after.matches("@brief set[AB] function").count(), 2, "Got: {after}");
    assert_eq!(fs::read_to_string(dir.path().join("manager.hpp.bak")).unwrap(), original);
}

#[test]
fn annotate_to_output_file() {
    let (dir, header) = staged("manager.hpp");
    let original = fs::read_to_string(&header).unwrap();
    let out = dir.path().join("annotated.hpp");

    cmd()
        .args(["annotate", header.to_str().unwrap(), "--func", "setB:Set B"])
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Wrote:"))
        .stdout(predicate::str::contains("@brief").not());

    let written = fs::read_to_string(&out).unwrap();
    assert!(
        written.contains("    /**\n     * @brief Set B\n     */\n    void setB(int b);"),
        "Got: {written}"
    );
    assert_eq!(fs::read_to_string(&header).unwrap(), original);
    assert!(!dir.path().join("manager.hpp.bak").exists());
}

#[test]
fn annotate_requires_func() {
    cmd()
        .args(["annotate", fixture("manager.hpp").to_str().unwrap()])
        .assert()
        .failure();
}
