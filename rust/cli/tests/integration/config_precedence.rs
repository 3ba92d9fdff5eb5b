use crate::helpers::cli_runner::CliRunner;
use crate::helpers::temp_files::TempFileManager;

#[test]
fn i1_cfg_prints_json_config() {
    let cli = CliRunner::new().expect("init");
    let res = cli.run(&["cfg"]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let json: serde_json::Value = serde_json::from_str(&res.stdout).expect("cfg emits JSON");
    for key in [
        "host",
        "port",
        "session_ttl_secs",
        "allowed_origins",
        "purge_interval_secs",
    ] {
        assert!(json.get(key).is_some(), "missing {}: {}", key, res.stdout);
    }
}

#[test]
fn i2_env_overrides_file() {
    let tfm = TempFileManager::new().unwrap();
    let cfg_path = tfm
        .create_file(
            "defuse.toml",
            "host = \"127.0.0.1\"\nport = 9100\nsession_ttl_secs = 600\n",
        )
        .unwrap();
    let cfg_path = cfg_path.to_str().unwrap();
    let cli = CliRunner::new().expect("init");

    // file only
    let res = cli.run_with_env(&["cfg"], &[("DEFUSE_CONFIG", cfg_path)]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    assert!(res.stdout.contains("\"port\": 9100"), "{}", res.stdout);
    assert!(res.stdout.contains("\"session_ttl_secs\": 600"));
    assert!(res.stdout.contains("\"host\": \"127.0.0.1\""));

    // env beats file
    let res = cli.run_with_env(
        &["cfg"],
        &[("DEFUSE_CONFIG", cfg_path), ("DEFUSE_PORT", "9200")],
    );
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    assert!(res.stdout.contains("\"port\": 9200"), "{}", res.stdout);
    assert!(res.stdout.contains("\"session_ttl_secs\": 600"));
}

#[test]
fn i3_invalid_config_exits_with_error() {
    let tfm = TempFileManager::new().unwrap();
    let bad = tfm.create_file("bad.toml", "colour = \"red\"\n").unwrap();
    let cli = CliRunner::new().expect("init");

    let res = cli.run_with_env(&["cfg"], &[("DEFUSE_CONFIG", bad.to_str().unwrap())]);
    assert_eq!(res.exit_code, 2);
    assert!(res.stderr.contains("parse"), "stderr: {}", res.stderr);

    let res = cli.run_with_env(&["cfg"], &[("DEFUSE_PORT", "not-a-port")]);
    assert_eq!(res.exit_code, 2);
    assert!(res.stderr.contains("Invalid port"), "stderr: {}", res.stderr);
}
