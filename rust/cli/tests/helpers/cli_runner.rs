use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Runs the compiled `defuse` binary in a child process.
#[derive(Debug, Clone)]
pub struct CliRunner {
    bin: PathBuf,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CliResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[allow(dead_code)]
impl CliRunner {
    pub fn new() -> Result<Self, String> {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_defuse"));
        if !bin.exists() {
            return Err(format!("defuse binary not found at {}", bin.display()));
        }
        Ok(Self { bin })
    }

    pub fn run(&self, args: &[&str]) -> CliResult {
        self.run_inner(args, &[], None)
    }

    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> CliResult {
        self.run_inner(args, env, None)
    }

    pub fn run_with_input(&self, args: &[&str], input: &str) -> CliResult {
        self.run_inner(args, &[], Some(input))
    }

    pub fn run_with_env_and_input(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
        input: &str,
    ) -> CliResult {
        self.run_inner(args, env, Some(input))
    }

    fn run_inner(&self, args: &[&str], env: &[(&str, &str)], input: Option<&str>) -> CliResult {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_remove("DEFUSE_TEST_INPUT");
        for (k, v) in env.iter() {
            cmd.env(k, v);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().expect("failed to spawn CLI binary");
        if let Some(s) = input {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(s.as_bytes());
            }
        }
        let output = child.wait_with_output().expect("failed to read output");
        CliResult {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        }
    }
}
