use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use moodplot::charts::fonts;
use moodplot::dashboard::{self, Dashboard, DashboardOptions};
use moodplot::server::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moodplot", version, about = "Mood and listening-history dashboard")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard at /plot
    Serve {
        /// Address to bind (defaults to config server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to config server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Render the dashboard once and write the HTML page
    Render {
        #[arg(short, long, default_value = "1")]
        user: i64,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a mood check-in
    LogMood {
        /// Mood score, 0 (sad) to 10 (happy)
        #[arg(long)]
        mood: f64,

        /// Arousal score, 0 (calm) to 10 (excited)
        #[arg(long)]
        arousal: f64,

        #[arg(short, long, default_value = "1")]
        user: i64,

        /// When the mood was felt (RFC 3339 or "YYYY-MM-DD HH:MM:SS", UTC); defaults to now
        #[arg(long, value_parser = moodplot::ingest::parse_timestamp)]
        at: Option<NaiveDateTime>,
    },

    /// Import played tracks and audio features for a mood from a JSON file
    Import {
        file: PathBuf,
    },

    /// Show what is stored for a user
    Stats {
        #[arg(short, long, default_value = "1")]
        user: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing), then DB_DATABASE / PORT
    let config = moodplot::config::AppConfig::load();

    // Resolve database path: CLI > env > config > XDG default
    let db_path = config.resolve_db_path(cli.db_path);
    log::info!("Database: {}", db_path.display());

    let db = moodplot::db::Database::open(&db_path)
        .context("Failed to open database")?;

    let options = DashboardOptions {
        theme: config.charts.theme(),
        parallel: config.charts.parallel,
    };

    match cli.command {
        Commands::Serve { host, port } => {
            // Requests open their own read-only connections
            drop(db);
            fonts::init(&config.charts.font_paths);

            let mut server_config = config.server;
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            let addr = server_config.bind_addr();

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime
                .block_on(server::serve(&addr, AppState::new(db_path, options)))
                .with_context(|| format!("Server on {addr} failed"))?;
        }

        Commands::Render { user, output } => {
            drop(db);
            fonts::init(&config.charts.font_paths);

            let dashboard = dashboard::render_for_user(&db_path, user, &options);
            match &dashboard {
                Dashboard::Page(_) => {}
                Dashboard::NoData => eprintln!("No data for user {}.", user),
                Dashboard::ChartFailed(kind) => eprintln!("Could not render the {}.", kind),
            }
            let html = dashboard.into_html();
            match output {
                Some(path) => {
                    std::fs::write(&path, &html)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {} ({} bytes)", path.display(), html.len());
                }
                None => println!("{}", html),
            }
        }

        Commands::LogMood { mood, arousal, user, at } => {
            let mood_id = moodplot::ingest::record_mood(&db, user, mood, arousal, at)
                .context("Failed to record mood")?;
            println!("Recorded mood {} for user {}", mood_id, user);
        }

        Commands::Import { file } => {
            let import = moodplot::ingest::load_import(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let summary = moodplot::ingest::import_listening(&db, &import)
                .context("Failed to import listening history")?;
            println!(
                "Import complete for mood {}: {} plays, {} with features, {} feature entries skipped",
                import.mood_id, summary.listening_entries, summary.tracks_with_features,
                summary.skipped_features
            );
        }

        Commands::Stats { user } => {
            let stats = db.user_stats(user).context("Failed to get stats")?;
            println!("Mood Statistics (user {})", user);
            println!("==========================");
            println!("Moods recorded:        {}", stats.moods);
            println!("Plays:                 {}", stats.listening_entries);
            println!("Plays linked to mood:  {}", stats.linked_entries);
            println!("Tracks with features:  {}", stats.tracks_with_features);
            if let (Some(first), Some(last)) = (stats.first_mood, stats.last_mood) {
                println!();
                println!("First mood:  {}", first.format("%Y-%m-%d %H:%M"));
                println!("Last mood:   {}", last.format("%Y-%m-%d %H:%M"));
            }
        }
    }

    Ok(())
}
