//! Driftwood CLI
//!
//! Single binary static site generator with a live development server.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

use driftwood::cmd::serve::ServeOptions;

/// Command-line interface for Driftwood.
#[derive(Parser)]
#[command(
    name = "driftwood",
    version,
    about = "A static site generator with a live development server"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "driftwood.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the static site for production
    Build {
        /// Output directory
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Include draft pages
        #[arg(long)]
        drafts: bool,
    },
    /// Start the development server, rebuilding on changes
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory to watch instead of the content directory
        #[arg(long)]
        watch_dir: Option<std::path::PathBuf>,
        /// Output directory to build into and serve
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Skip the initial build before watching
        #[arg(long)]
        no_initial_build: bool,
        /// Only rebuild when a changed path matches this regex (repeatable)
        #[arg(long = "include", value_name = "REGEX")]
        include: Vec<String>,
        /// Never rebuild when a changed path matches this regex (repeatable)
        #[arg(long = "exclude", value_name = "REGEX")]
        exclude: Vec<String>,
        /// Open the site in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Create new content from template
    New {
        /// Path for the new content (e.g., posts/my-article)
        path: std::path::PathBuf,
        /// Template type (post, page)
        #[arg(short, long, default_value = "post")]
        template: String,
    },
    /// Validate configuration and content
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    driftwood::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, drafts } => {
            driftwood::cmd::build::run(&cli.config, output.as_deref(), drafts)?;
        }
        Commands::Serve {
            host,
            port,
            watch_dir,
            output,
            no_initial_build,
            include,
            exclude,
            open,
        } => {
            let options = ServeOptions {
                host,
                port,
                watch_dir,
                output,
                initial_build: !no_initial_build,
                include,
                exclude,
                open,
            };
            driftwood::cmd::serve::run(&cli.config, options).await?;
        }
        Commands::New { path, template } => {
            driftwood::cmd::new::run(&cli.config, &path, &template)?;
        }
        Commands::Check { strict } => {
            driftwood::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}
