use std::sync::Arc;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing_subscriber::EnvFilter;

use vidhost::cli::{self, Cli, CliError, Commands};
use vidhost::config::{Config, StorageConfig};
use vidhost::routes::create_routes;
use vidhost::services::s3::S3Backend;
use vidhost::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vidhost=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn connect(config: &Config) -> Result<DatabaseConnection, CliError> {
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Connected to database");
    Ok(db)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => {
            let db = connect(&config).await?;
            Migrator::up(&db, None).await?;
            tracing::info!("Migrations applied");
            Ok(())
        }
        Commands::CreateUser { username } => {
            let db = connect(&config).await?;
            let password = rpassword::prompt_password("Password: ")?;
            let confirm = rpassword::prompt_password("Confirm password: ")?;
            if password != confirm {
                return Err(CliError::Invalid("passwords do not match".to_string()));
            }
            let user = cli::create_user(&db, &username, &password).await?;
            println!("Created user {} (id {})", user.username, user.id);
            Ok(())
        }
        Commands::CreateVideo { owner, id, title } => {
            let db = connect(&config).await?;
            let video = cli::create_video(&db, &owner, id, &title).await?;
            println!("Created video {}", video.public_id);
            Ok(())
        }
        Commands::CreatePlaylist { owner, name, videos } => {
            let db = connect(&config).await?;
            let playlist = cli::create_playlist(&db, &owner, &name, &videos).await?;
            println!("Created playlist {}", playlist.public_id);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<(), CliError> {
    let storage = StorageConfig::from_env()?;

    let db = connect(&config).await?;
    Migrator::up(&db, None).await?;

    let backend = S3Backend::new(&storage).await;
    if let Err(e) = backend.ensure_bucket_exists().await {
        tracing::warn!("Could not verify bucket {}: {}", backend.bucket_name, e);
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, config, Arc::new(backend));
    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind(bind_addr.as_str()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
