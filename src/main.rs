use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ci_lamp::config::{MonitorConfig, DEFAULT_CONFIG_PATH};
use ci_lamp::fetch::CurlFetcher;
use ci_lamp::indicator::output::DEFAULT_GPIO_ROOT;
use ci_lamp::indicator::OutputKind;
use ci_lamp::monitor::Monitor;
use ci_lamp::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "ci-lamp")]
#[command(version)]
#[command(about = "Shows the health of groups of CI build jobs on RGB status lamps")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'f', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    /// Log lamp writes instead of driving GPIO lines
    #[arg(long)]
    simulate: bool,

    /// Root of the sysfs GPIO tree
    #[arg(long, default_value = DEFAULT_GPIO_ROOT, conflicts_with = "simulate")]
    gpio_root: PathBuf,

    /// Directory for fetched job artifacts (overrides the config file)
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Validate the configuration, print the resolved groups and exit
    #[arg(long)]
    check: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "ci_lamp=debug" } else { "ci_lamp=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn print_summary(config: &MonitorConfig) {
    println!("Artifacts: {}", config.artifact_dir.display());
    println!(
        "Blink:     {} ms (animation {})",
        config.blink_interval.as_millis(),
        if config.allow_animation { "on" } else { "off" }
    );
    for group in &config.groups {
        println!();
        println!("Group {}", group.name);
        println!("  server:          {}", group.server);
        if let Some(ref creds) = group.credentials {
            println!("  user:            {}", creds.username);
        }
        println!("  pins (r/g/b):    {}", group.pins);
        println!("  stale after:     {} s", group.staleness_threshold.as_secs());
        println!("  success shown:   {} s", group.success_timeout.as_secs());
        println!("  poll / timeout:  {} s / {} s", group.poll_interval.as_secs(), group.fetch_timeout.as_secs());
        for job in &group.jobs {
            println!("  job {}{}", job.path, job.name);
            println!("    status:     {}", job.status_artifact.display());
            println!("    last build: {}", job.last_build_artifact.display());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = MonitorConfig::load(&args.config, args.artifact_dir.as_deref())?;

    if args.check {
        print_summary(&config);
        return Ok(());
    }

    config.prepare_artifact_dir()?;

    let output = if args.simulate {
        OutputKind::Simulated
    } else {
        OutputKind::Gpio {
            root: args.gpio_root,
        }
    };

    let shutdown = install_shutdown_handler();
    let monitor = Monitor::start(
        &config,
        CurlFetcher::new(),
        |group| output.open(group),
        shutdown.clone(),
    )?;

    tracing::info!(
        groups = config.groups.len(),
        config = %args.config.display(),
        "ci-lamp running"
    );

    shutdown.cancelled().await;
    tracing::info!("Waiting for group tasks to finish");
    monitor.join().await?;
    tracing::info!("Shutdown complete");

    Ok(())
}
