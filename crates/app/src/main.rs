use chrono::{NaiveDate, Utc};
use engine::{Mailer, MailerError};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

const DEFAULT_REMINDER_INTERVAL_HOURS: u64 = 6;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "giftpool={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if let Some(server) = settings.server {
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let db = match parse_database(&server.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match engine::Engine::builder()
                .database(db.clone())
                .build()
                .await
            {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, db, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    if let Some(reminders) = settings.reminders {
        tasks.spawn(async move {
            tracing::info!("Found reminder settings...");
            let db = match parse_database(&reminders.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };
            let engine = match engine::Engine::builder().database(db).build().await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };

            let hours = reminders
                .interval_hours
                .unwrap_or(DEFAULT_REMINDER_INTERVAL_HOURS);
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(hours * 3600));
            let mailer = LogMailer;

            loop {
                ticker.tick().await;
                match engine
                    .run_daily_reminders(Utc::now(), &reminders.base_url, &mailer)
                    .await
                {
                    Ok(run) => tracing::debug!(?run, "reminder sweep done"),
                    Err(err) => tracing::error!("reminder sweep failed: {err}"),
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// Delivery transport is deployment-specific; this binary logs the emails it
/// would send. Swap in a real transport behind the same trait.
struct LogMailer;

impl Mailer for LogMailer {
    async fn send_personal_reminder(
        &self,
        to_email: &str,
        to_name: &str,
        birthday: NaiveDate,
        days_until: i64,
        base_url: &str,
    ) -> Result<(), MailerError> {
        tracing::info!(
            to_email,
            to_name,
            %birthday,
            days_until,
            base_url,
            "personal birthday reminder"
        );
        Ok(())
    }

    async fn send_group_reminder(
        &self,
        to_email: &str,
        to_name: &str,
        birthday_name: &str,
        group_name: &str,
        birthday: NaiveDate,
        base_url: &str,
    ) -> Result<(), MailerError> {
        tracing::info!(
            to_email,
            to_name,
            birthday_name,
            group_name,
            %birthday,
            base_url,
            "group birthday reminder"
        );
        Ok(())
    }
}
