use crate::helpers::cli_runner::CliRunner;

#[test]
fn a1_help_lists_all_commands() {
    // GIVEN the defuse binary
    let cli = CliRunner::new().expect("cli runner");
    // WHEN running without arguments
    let res = cli.run(&[]);
    // THEN usage and every command are listed
    assert_eq!(res.exit_code, 0);
    assert!(res.stdout.contains("Usage: defuse"));
    for cmd in ["serve", "play", "cfg"] {
        assert!(
            res.stdout.contains(cmd),
            "help should list {}: {}",
            cmd,
            res.stdout
        );
    }
}

#[test]
fn a2_version_flag_exits_zero() {
    let cli = CliRunner::new().expect("cli runner");
    let res = cli.run(&["--version"]);
    assert_eq!(res.exit_code, 0);
    assert!(res.stdout.contains("defuse"));
    assert!(res.stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn a3_unknown_command_is_usage_error() {
    let cli = CliRunner::new().expect("cli runner");
    let res = cli.run(&["explode"]);
    assert_eq!(res.exit_code, 2);
    assert!(res.stderr.starts_with("Error:"), "stderr: {}", res.stderr);
    assert!(res.stdout.contains("Commands:"));
}

#[test]
fn a4_serve_rejects_non_numeric_port() {
    let cli = CliRunner::new().expect("cli runner");
    let res = cli.run(&["serve", "--port", "abc"]);
    assert_eq!(res.exit_code, 2);
}
