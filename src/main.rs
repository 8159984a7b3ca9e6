use clap::{Parser, Subcommand};
use flickr_wxr::{config, convert, output};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "flickr-wxr")]
#[command(about = "Convert a Flickr data export into a WordPress WXR import file")]
#[command(long_about = "\
Convert a Flickr data export into a WordPress WXR import file

Each photo becomes a private post with its original image attached. Albums
become tags, and every post is filed under a single provenance category.

Export structure:

  flickr-data/
  ├── config.toml              # Converter config (optional)
  ├── albums.json              # Album list
  ├── photo_5234567890.json    # One record per photo
  └── …

Import the result with Tools → Import → WordPress, ticking
\"Download and import file attachments\" so the originals are sideloaded.

Run 'flickr-wxr gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Flickr export directory
    #[arg(long, default_value = "flickr-data", global = true)]
    source: PathBuf,

    /// WXR file to write
    #[arg(long, default_value = "flickr-export.xml", global = true)]
    output: PathBuf,

    /// Config file (defaults to <source>/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert the export and write the WXR file (default)
    Convert,
    /// Load and map the export without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Convert) {
        Command::Convert => {
            let export_config = config::load_config(&cli.source, cli.config.as_deref())?;
            init_thread_pool(&export_config.processing);
            println!("==> Converting {}", cli.source.display());
            let summary = convert::convert(&cli.source, &cli.output, &export_config)?;
            output::print_convert_output(&summary, &cli.output);
        }
        Command::Check => {
            let export_config = config::load_config(&cli.source, cli.config.as_deref())?;
            init_thread_pool(&export_config.processing);
            println!("==> Checking {}", cli.source.display());
            let summary = convert::check(&cli.source, &export_config)?;
            output::print_check_output(&summary);
            println!("==> Export is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
