use std::sync::Arc;

use clap::Parser;
use intelliquiz::{ai::AiConfig, ai::AiService, db::Db, AppState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database URL (`sqlite://intelliquiz.db` or `file:intelliquiz.db`).
    #[arg(long, env, default_value = "sqlite://intelliquiz.db")]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Mark cookies `Secure` (serve behind HTTPS).
    #[arg(long, env)]
    secure_cookies: bool,

    /// Administrator created on startup when missing.
    #[arg(long, env)]
    admin_username: Option<String>,

    #[arg(long, env, hide_env_values = true)]
    admin_password: Option<String>,

    #[command(flatten)]
    ai: AiConfig,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "intelliquiz=debug,tower_http=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(args.database_url).await?;

    if let (Some(username), Some(password)) = (&args.admin_username, &args.admin_password) {
        db.ensure_admin(username, password).await?;
    }

    let ai = Arc::new(AiService::from_config(&args.ai)?);
    let app = intelliquiz::router(AppState::new(db, ai, args.secure_cookies));

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", args.address);
    axum::serve(listener, app).await?;

    Ok(())
}
