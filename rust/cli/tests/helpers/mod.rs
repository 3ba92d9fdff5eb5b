//! Shared helpers for the CLI integration tests.
//!
//! - `cli_runner`: `CliRunner` invokes the compiled `defuse` binary and
//!   captures stdout, stderr, exit code and duration.
//! - `temp_files`: `TempFileManager` hands out collision-free paths under
//!   `target/` and removes them on drop.
//!
//! ```rust
//! use crate::helpers::{cli_runner::CliRunner, temp_files::TempFileManager};
//!
//! let cli = CliRunner::new().expect("cli runner");
//! let tmp = TempFileManager::new().expect("temp dir");
//! let cfg = tmp.create_file("defuse.toml", "port = 9000\n").expect("write");
//! let res = cli.run_with_env(&["cfg"], &[("DEFUSE_CONFIG", cfg.to_str().unwrap())]);
//! assert_eq!(res.exit_code, 0);
//! ```
pub mod cli_runner;
pub mod temp_files;
