use anyhow::Result;
use clap::Parser;
use photo_gallery::{gallery_listing, GalleryApp, GalleryConfig, PlatformMode};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "photo-gallery")]
#[command(about = "Capture photos into app-private storage and keep a persistent gallery")]
#[command(version)]
#[command(long_about = "Takes photos from a snapshot camera, saves them to app-private \
storage, and keeps an index of the gallery in a key-value store so it is restored on the \
next start. Runs interactively or performs a single capture or listing.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gallery.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the gallery")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR", help = "Directory for daily rolling log files")]
    log_dir: Option<String>,

    /// Override the configured platform mode
    #[arg(long, value_name = "MODE", help = "Host platform: native or web")]
    platform: Option<PlatformMode>,

    /// Take one photo and exit
    #[arg(long, conflicts_with = "list", help = "Take a single photo, save it, and exit")]
    capture: bool,

    /// Print the gallery and exit
    #[arg(long, help = "Print the saved gallery and exit")]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let exit_code = run(args).await?;
    std::process::exit(exit_code);
}

async fn run(args: Args) -> Result<i32> {
    // Flushes the log file when dropped
    let _log_guard = init_logging(&args)?;

    info!("Starting photo gallery v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match GalleryConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(mode) = args.platform {
        info!("Platform overridden to {:?}", mode);
        config.platform.mode = mode;
    }

    if args.debug {
        config.system.debug_events = true;
    }

    if args.validate_config {
        return match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                Ok(0)
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                Ok(1)
            }
        };
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let mut app = GalleryApp::new(config).map_err(|e| {
        error!("Failed to create gallery: {}", e);
        e
    })?;

    app.start().await.map_err(|e| {
        error!("Failed to start gallery: {}", e);
        e
    })?;

    let exit_code = if args.capture {
        let captured = app.capture_once().await;
        let shutdown_code = app.shutdown().await?;
        match captured {
            Some(photo) => {
                println!("Saved {}", photo.filepath);
                shutdown_code
            }
            None => {
                eprintln!("✗ Capture failed, gallery unchanged");
                1
            }
        }
    } else if args.list {
        let photos = app.gallery().photos().await;
        for line in gallery_listing(&photos) {
            println!("{}", line);
        }
        app.shutdown().await?
    } else {
        app.run_interactive().await.map_err(|e| {
            error!("Gallery error during execution: {}", e);
            e
        })?
    };

    info!("Photo gallery exited with code: {}", exit_code);
    Ok(exit_code)
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("photo_gallery={}", log_level)));

    // Logs go to stderr so listings on stdout stay clean
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "photo-gallery.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .try_init()?;

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Photo Gallery Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Every value can be overridden with PHOTO_GALLERY_<SECTION>__<KEY>");
    println!();
    println!("{}", GalleryConfig::default().to_toml()?);
    Ok(())
}
