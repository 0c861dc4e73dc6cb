use std::path::PathBuf;

use clap::Parser;
use taskd_server::ServerConfig;
use taskd_store::Database;

#[derive(Parser, Debug)]
#[command(name = "taskd", about = "Task-list management backend")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to the SQLite database. Defaults to ~/.taskd/tasks.db.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let db_path = args
        .db_path
        .unwrap_or_else(|| dirs_home().join(".taskd").join("tasks.db"));

    let db = Database::open(&db_path).expect("Failed to open database");
    tracing::info!(path = %db_path.display(), "Database opened");

    let config = ServerConfig { port: args.port };
    let handle = taskd_server::start(config, db)
        .await
        .expect("Failed to start server");

    tracing::info!(port = handle.port, "taskd ready");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
