pub mod config;
pub mod play;
pub mod ui;

use std::io::{Cursor, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use defuse_web::server::WebServer;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::play::PlayOptions;
use crate::ui::write_error;

const DEFAULT_LOG_FILTER: &str = "info,warp=info";

/// Runs the CLI with provided args, writing to the given writers.
/// Returns the intended process exit code.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
    let parsed = DefuseCli::try_parse_from(&argv);
    match parsed {
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayVersion => {
            let _ = write!(out, "{}", e);
            0
        }
        Err(e) => {
            let _ = writeln!(out, "Defuse card game server\n");
            let _ = writeln!(out, "Usage: defuse <command> [options]\n");
            let _ = writeln!(out, "Commands:");
            for (c, about) in [
                ("serve", "run the HTTP and live leaderboard server"),
                ("play", "play a local game in the terminal"),
                ("cfg", "print the effective configuration"),
            ] {
                let _ = writeln!(out, "  {:<6} {}", c, about);
            }
            let _ = writeln!(out, "\nOptions:\n  -h, --help     Show this help");
            // bare invocation and --help are not errors
            if argv.len() <= 1 || e.kind() == clap::error::ErrorKind::DisplayHelp {
                0
            } else {
                let _ = write_error(err, &e);
                2
            }
        }
        Ok(cli) => match cli.cmd {
            Commands::Cfg => {
                let Some(cfg) = load_config(err) else {
                    return 2;
                };
                match serde_json::to_string_pretty(&cfg) {
                    Ok(json) => {
                        let _ = writeln!(out, "{}", json);
                        0
                    }
                    Err(e) => {
                        let _ = write_error(err, &e);
                        1
                    }
                }
            }
            Commands::Serve { host, port } => {
                let Some(mut cfg) = load_config(err) else {
                    return 2;
                };
                if let Some(host) = host {
                    cfg.host = host;
                }
                if let Some(port) = port {
                    cfg.port = port;
                }
                serve(cfg, out, err)
            }
            // local play runs in memory and never reads the server config
            Commands::Play { player, seed, log } => {
                let opts = PlayOptions {
                    player: player.trim().to_string(),
                    seed,
                    log,
                };
                let result = match std::env::var("DEFUSE_TEST_INPUT") {
                    Ok(script) => play::play(&opts, Cursor::new(script), out),
                    Err(_) => play::play(&opts, std::io::stdin().lock(), out),
                };
                match result {
                    Ok(_) => 0,
                    Err(e) => {
                        let _ = write_error(err, &e);
                        2
                    }
                }
            }
        },
    }
}

fn load_config(err: &mut dyn Write) -> Option<Config> {
    match config::load() {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            let _ = write_error(err, &e);
            None
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn serve(cfg: Config, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    init_tracing();
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = write_error(err, &e);
            return 1;
        }
    };

    let result = runtime.block_on(async {
        let server = WebServer::new(cfg.to_server_config())?;
        let handle = server.start().await?;
        let _ = writeln!(out, "listening on http://{}", handle.address());
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for shutdown signal");
        }
        handle.shutdown().await
    });

    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = write_error(err, &e);
            1
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "defuse", version, about = "Defuse card game server")]
struct DefuseCli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Play {
        #[arg(long, default_value = "player")]
        player: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    Cfg,
}
