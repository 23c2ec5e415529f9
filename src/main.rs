//! donotshout: fault-injecting DNS responder
//!
//! This is the main entry point for the responder binary.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults (UDP 0.0.0.0:53)
//! sudo ./donotshout
//!
//! # Run with a configuration file
//! ./donotshout -c /path/to/config.json
//!
//! # Run with environment overrides and a fixed seed
//! DONOTSHOUT_PORT=5353 DONOTSHOUT_DROP_PERCENT=50 ./donotshout --seed 42
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use donotshout::chaos::{ChaosEngine, SeededSource};
use donotshout::config::{
    apply_env_overrides_from_file, create_default_config, load_config, Config, DOTENV_FILE,
};
use donotshout::responder::ChaosDns;

/// Command-line arguments
struct Args {
    /// Configuration file path; built-in defaults when absent
    config_path: Option<PathBuf>,
    /// Seed given on the command line
    seed: Option<u64>,
    /// Generate default configuration
    generate_config: bool,
    /// Check configuration only
    check_config: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config_path = None;
        let mut seed = None;
        let mut generate_config = false;
        let mut check_config = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    if let Some(path) = args.next() {
                        config_path = Some(PathBuf::from(path));
                    }
                }
                "--seed" => match args.next().map(|s| s.parse::<u64>()) {
                    Some(Ok(value)) => seed = Some(value),
                    _ => {
                        eprintln!("--seed expects an unsigned integer");
                        std::process::exit(1);
                    }
                },
                "-g" | "--generate-config" => {
                    generate_config = true;
                }
                "--check" => {
                    check_config = true;
                }
                "-h" | "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "-v" | "--version" => {
                    println!("donotshout v{}", donotshout::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", arg);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        Self {
            config_path,
            seed,
            generate_config,
            check_config,
        }
    }
}

fn print_help() {
    println!(
        r#"donotshout v{}

Fault-injecting DNS responder: answers A/AAAA queries with fixed addresses
while dropping, truncating and delaying a share of the answers.

USAGE:
    donotshout [OPTIONS]

OPTIONS:
    -c, --config <PATH>     Configuration file path [default: built-in defaults]
    --seed <N>              Fixed PRNG seed [default: current Unix time]
    -g, --generate-config   Write the default configuration to --config and exit
    --check                 Check configuration and exit
    -h, --help              Print help information
    -v, --version           Print version information

ENVIRONMENT:
    DONOTSHOUT_HOST              Listen host [0.0.0.0]
    DONOTSHOUT_PORT              Listen port [53]
    DONOTSHOUT_TRANSPORT         udp or tcp [udp]
    DONOTSHOUT_TCP_IDLE_TIMEOUT_SECS  Idle TCP connection timeout [8]
    DONOTSHOUT_MIN_JITTER_MS     Lowest delay in ms [1]
    DONOTSHOUT_MAX_JITTER_MS     Delay sampling width in ms [5000]
    DONOTSHOUT_IPV4_ADDRESS      Address returned for A [127.0.0.1]
    DONOTSHOUT_IPV6_ADDRESS      Address returned for AAAA [::1]
    DONOTSHOUT_TRUNCATE_PERCENT  Truncation likelihood 0-100 [10]
    DONOTSHOUT_DROP_PERCENT      Drop likelihood 0-100 [5]
    DONOTSHOUT_SEED              Fixed PRNG seed
    DONOTSHOUT_LOG_LEVEL         trace, debug, info, warn, error [info]

    Variables may also be set in ./.env; the process environment wins.

NOTE:
    Jitter is sampled from [min, min + max - 1]: the max value is a width,
    so raising the minimum also raises the ceiling.
"#,
        donotshout::VERSION
    );
}

/// Initialize logging
fn init_logging(config: &Config) {
    let level = match config.log.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if let Ok(directive) = "tokio=warn".parse() {
        filter = filter.add_directive(directive);
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.log.target);

    if config.log.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Load the file (if any), then apply environment, `.env` and command-line overrides
fn resolve_config(args: &Args) -> Result<Config> {
    let config = match &args.config_path {
        Some(path) => load_config(path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration from {:?}: {}", path, e)
        })?,
        None => Config::default(),
    };

    let mut config = apply_env_overrides_from_file(config, DOTENV_FILE)
        .map_err(|e| anyhow::anyhow!("Invalid environment override: {}", e))?;

    if args.seed.is_some() {
        config.seed = args.seed;
    }

    Ok(config)
}

/// Main application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();

    let args = Args::parse();

    if args.generate_config {
        let path = args
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("donotshout.json"));
        create_default_config(&path)?;
        println!("Generated default configuration at {:?}", path);
        return Ok(());
    }

    let config = resolve_config(&args)?;

    if args.check_config {
        config.listen.socket_addr()?;
        println!("Configuration is valid");
        return Ok(());
    }

    init_logging(&config);

    info!("donotshout v{}", donotshout::VERSION);
    if let Some(path) = &args.config_path {
        info!("Configuration loaded from {:?}", path);
    }

    let source = match config.seed {
        Some(seed) => SeededSource::new(seed),
        None => {
            let source = SeededSource::from_clock();
            warn!(
                "Seeded from wall-clock seconds ({}); instances started in the same second repeat each other",
                source.seed()
            );
            source
        }
    };
    info!("PRNG seed: {}", source.seed());
    let engine = ChaosEngine::new(std::sync::Arc::new(source));

    info!(
        "Chaos: drop={}%, truncate={}%, jitter={}..={}ms, A={}, AAAA={}",
        config.chaos.drop_percent,
        config.chaos.truncate_percent,
        config.chaos.min_jitter_ms,
        config.chaos.effective_max_jitter().as_millis(),
        config.answer.ipv4_address,
        config.answer.ipv6_address
    );

    let server = ChaosDns::bind(&config, engine)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start responder: {}", e))?;
    let stats = server.stats();

    info!(
        "Startup complete in {:.2}ms",
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    let result = tokio::select! {
        result = server.run() => result,
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
            Ok(())
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM, shutting down...");
            Ok(())
        }
    };

    let snapshot = stats.snapshot();
    info!(
        "Final stats: {} queries, {} emitted, {} dropped, {} truncated, {} ignored, {} malformed, {}ms injected",
        snapshot.queries,
        snapshot.emitted,
        snapshot.dropped,
        snapshot.truncated,
        snapshot.ignored,
        snapshot.malformed,
        snapshot.jitter_ms_total
    );

    if let Err(e) = &result {
        error!("Responder stopped: {}", e);
    }

    info!("Shutdown complete");

    result.map_err(|e| anyhow::anyhow!("Responder error: {}", e))
}

/// Wait for SIGTERM signal
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
