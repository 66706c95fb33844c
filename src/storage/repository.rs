use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{prelude::*, QueryOrder, Set};

use crate::models::{Board, WellnessResource};
use crate::storage::entities::boards;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DbError(#[from] sea_orm::DbErr),
    #[error("Board {0} belongs to another user")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Corrupt board document {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// Per-user board documents. Writes replace the whole document, so
/// concurrent writers resolve as last-write-wins.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    async fn list_boards(&self, user_id: &str) -> Result<Vec<Board>, RepositoryError>;
    async fn find_board(
        &self,
        user_id: &str,
        board_id: &str,
    ) -> Result<Option<Board>, RepositoryError>;
    /// Creates or replaces the document with `board.id`.
    async fn put_board(&self, user_id: &str, board: &Board) -> Result<(), RepositoryError>;
    /// Returns whether a document was removed.
    async fn delete_board(&self, user_id: &str, board_id: &str) -> Result<bool, RepositoryError>;
}

pub struct SeaOrmBoardRepository {
    db: DatabaseConnection,
}

impl SeaOrmBoardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn owned_model(
        &self,
        user_id: &str,
        board_id: &str,
    ) -> Result<Option<boards::Model>, RepositoryError> {
        let model = boards::Entity::find_by_id(board_id.to_string())
            .one(&self.db)
            .await?;

        match model {
            Some(m) if m.user_id != user_id => Err(RepositoryError::Forbidden(board_id.to_string())),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl BoardRepository for SeaOrmBoardRepository {
    async fn list_boards(&self, user_id: &str) -> Result<Vec<Board>, RepositoryError> {
        let models = boards::Entity::find()
            .filter(boards::Column::UserId.eq(user_id))
            .order_by_asc(boards::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Board::try_from).collect()
    }

    async fn find_board(
        &self,
        user_id: &str,
        board_id: &str,
    ) -> Result<Option<Board>, RepositoryError> {
        self.owned_model(user_id, board_id)
            .await?
            .map(Board::try_from)
            .transpose()
    }

    async fn put_board(&self, user_id: &str, board: &Board) -> Result<(), RepositoryError> {
        if board.id.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("board id must not be empty".to_string()));
        }

        // Keep one entry per resource id even if the client sent duplicates.
        let mut resources: Vec<WellnessResource> = Vec::with_capacity(board.resources.len());
        for resource in &board.resources {
            match resources.iter_mut().find(|r| r.id == resource.id) {
                Some(existing) => *existing = resource.clone(),
                None => resources.push(resource.clone()),
            }
        }
        let resources_json = serde_json::to_string(&resources)
            .map_err(|e| RepositoryError::InvalidInput(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        match self.owned_model(user_id, &board.id).await? {
            Some(model) => {
                let mut active_model: boards::ActiveModel = model.into();
                active_model.name = Set(board.name.clone());
                active_model.resources = Set(resources_json);
                active_model.updated_at = Set(now);
                active_model.update(&self.db).await?;
                tracing::debug!("Replaced board {} for user {}", board.id, user_id);
            }
            None => {
                let active_model = boards::ActiveModel {
                    id: Set(board.id.clone()),
                    user_id: Set(user_id.to_string()),
                    name: Set(board.name.clone()),
                    resources: Set(resources_json),
                    created_at: Set(board.created_at.to_rfc3339()),
                    updated_at: Set(now),
                };
                active_model.insert(&self.db).await?;
                tracing::info!("Created board {} for user {}", board.id, user_id);
            }
        }

        Ok(())
    }

    async fn delete_board(&self, user_id: &str, board_id: &str) -> Result<bool, RepositoryError> {
        if self.owned_model(user_id, board_id).await?.is_none() {
            return Ok(false);
        }

        boards::Entity::delete_by_id(board_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(true)
    }
}

// ============================================
// Conversions
// ============================================

impl TryFrom<boards::Model> for Board {
    type Error = RepositoryError;

    fn try_from(model: boards::Model) -> Result<Self, Self::Error> {
        let corrupt = |message: String| RepositoryError::Corrupt {
            id: model.id.clone(),
            message,
        };

        let resources: Vec<WellnessResource> =
            serde_json::from_str(&model.resources).map_err(|e| corrupt(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&model.created_at)
            .map_err(|e| corrupt(e.to_string()))?
            .with_timezone(&Utc);

        Ok(Board {
            id: model.id,
            name: model.name,
            resources,
            created_at,
        })
    }
}
