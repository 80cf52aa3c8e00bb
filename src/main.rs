//! CLI entry point for quill

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill::commands::list::ListOptions;
use quill::content::BlogId;

#[derive(Parser)]
#[command(name = "quill")]
#[command(version = "0.1.0")]
#[command(about = "A small hosted blogging service", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Start the server
    #[command(alias = "s")]
    Server {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to the configured address)
        #[arg(short, long)]
        ip: Option<String>,

        /// Keep everything in memory; nothing is written to the data directory
        #[arg(long)]
        ephemeral: bool,
    },

    /// Create a new blog
    New {
        /// Name of the new blog
        name: String,

        /// Identity that owns the blog
        #[arg(short, long)]
        author: String,
    },

    /// List site content
    List {
        /// Type of content to list (blogs, posts, tags, images)
        #[arg(default_value = "blogs")]
        r#type: String,

        /// Blog to list posts or tags of
        #[arg(short, long)]
        blog: Option<BlogId>,

        /// Restrict to this identity's blogs or images
        #[arg(short, long)]
        author: Option<String>,

        /// Only posts carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Delete all stored blogs, posts and uploads
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "quill=debug,tower_http=debug,info"
    } else {
        "quill=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            quill::commands::init::init_site(&target_dir)?;
            println!("Initialized empty site in {:?}", target_dir);
        }

        Commands::Server {
            port,
            ip,
            ephemeral,
        } => {
            let quill = if ephemeral {
                quill::Quill::ephemeral(quill::Quill::load_config(&base_dir)?)
            } else {
                quill::Quill::open(&base_dir).await?
            };
            let ip = ip.unwrap_or_else(|| quill.config.server.ip.clone());
            let port = port.unwrap_or(quill.config.server.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            quill::server::start(quill, &ip, port).await?;
        }

        Commands::New { name, author } => {
            let quill = quill::Quill::open(&base_dir).await?;
            tracing::info!("Creating blog {:?} for {}", name, author);
            let blog_id = quill::commands::new::create_blog(&quill, &name, &author)?;
            println!("Created blog {} ({})", blog_id, name);
        }

        Commands::List {
            r#type,
            blog,
            author,
            tag,
        } => {
            let quill = quill::Quill::open(&base_dir).await?;
            let options = ListOptions { blog, author, tag };
            quill::commands::list::run(&quill, &r#type, &options)?;
        }

        Commands::Clean => {
            let quill = quill::Quill::open(&base_dir).await?;
            tracing::info!("Cleaning data directory...");
            quill.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("quill version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
