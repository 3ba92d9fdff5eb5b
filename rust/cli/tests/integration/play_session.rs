use crate::helpers::cli_runner::CliRunner;
use crate::helpers::temp_files::TempFileManager;

#[test]
fn p1_scripted_play_reports_final_score() {
    let cli = CliRunner::new().expect("init");
    let res = cli.run_with_input(
        &["play", "--player", "alice", "--seed", "42"],
        "d\nd\ns\nq\n",
    );
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    assert!(res.stdout.contains("started for alice"));
    assert!(res.stdout.contains("Drew "));
    assert!(res.stdout.contains("Score: alice = "));
    assert!(res.stdout.contains("Final score: alice = "));
}

#[test]
fn p2_draw_log_is_jsonl() {
    let tfm = TempFileManager::new().unwrap();
    let log = tfm.base_dir().join("draws.jsonl");
    let cli = CliRunner::new().expect("init");
    let res = cli.run_with_input(
        &[
            "play",
            "--player",
            "bob",
            "--seed",
            "3",
            "--log",
            log.to_str().unwrap(),
        ],
        "d\nq\n",
    );
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);

    let contents = std::fs::read_to_string(&log).expect("log written");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["player"], "bob");
    assert!(record["ts"].is_string());
    assert!(record["card"]["type"].is_string());
}

#[test]
fn p3_play_ignores_broken_server_config() {
    let tfm = TempFileManager::new().unwrap();
    let bad = tfm.create_file("bad.toml", "port = \"eighty\"\n").unwrap();
    let cli = CliRunner::new().expect("init");

    let res = cli.run_with_env_and_input(
        &["play", "--seed", "1"],
        &[("DEFUSE_PORT", "abc")],
        "q\n",
    );
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    assert!(res.stdout.contains("Final score: player = 0"));

    let res = cli.run_with_env_and_input(
        &["play", "--seed", "1"],
        &[("DEFUSE_CONFIG", bad.to_str().unwrap())],
        "q\n",
    );
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);

    // cfg still reports the same environment as an error
    let res = cli.run_with_env(&["cfg"], &[("DEFUSE_PORT", "abc")]);
    assert_eq!(res.exit_code, 2);
}

#[test]
fn p4_player_name_is_trimmed_once() {
    let cli = CliRunner::new().expect("init");
    let res = cli.run_with_input(&["play", "--player", " alice ", "--seed", "7"], "s\nq\n");
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    assert!(res.stdout.contains("started for alice\n"), "{}", res.stdout);
    assert!(res.stdout.contains("Score: alice = "), "{}", res.stdout);
    assert!(res.stdout.contains("Final score: alice = "), "{}", res.stdout);
}
