use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

const CREATE_BOARDS: &str = r#"
CREATE TABLE IF NOT EXISTS boards (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    resources TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const CREATE_BOARDS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_boards_user_id ON boards(user_id)";

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    tracing::info!("Connecting to database: {}", database_url);

    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);

    let db = if database_url == "sqlite::memory:" {
        // Every pooled connection would see its own empty in-memory database.
        options.max_connections(1).min_connections(1);
        Database::connect(options)
            .await
            .map_err(|e| DbErr::Custom(format!("Connection failed: {}", e)))?
    } else if let Some(path_str) = database_url.strip_prefix("sqlite://") {
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        let path = std::path::Path::new(path_str);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbErr::Custom(format!("Failed to create DB directory: {}", e)))?;
                tracing::info!("Created database directory: {}", parent.display());
            }
        }

        if !path.exists() {
            std::fs::File::create(path)
                .map_err(|e| DbErr::Custom(format!("Failed to create DB file: {}", e)))?;
            tracing::info!("Created database file: {}", path.display());
        }

        Database::connect(options)
            .await
            .map_err(|e| DbErr::Custom(format!("Connection failed: {}", e)))?
    } else {
        return Err(DbErr::Custom("Invalid SQLite URL format".to_string()));
    };

    db.execute_unprepared(CREATE_BOARDS).await?;
    db.execute_unprepared(CREATE_BOARDS_USER_INDEX).await?;
    tracing::info!("Board schema ready");

    Ok(db)
}
