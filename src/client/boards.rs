//! Boards store with write-behind persistence.
//!
//! Mutations update the in-memory boards at once and queue a write of the
//! affected document. A single writer task applies queued writes to the
//! backend in mutation order.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::client::api::{ApiClient, ClientError};
use crate::client::local_storage::LocalStorage;
use crate::models::{Board, WellnessResource};

pub const BOARDS_KEY: &str = "aramiyot_boards";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Board {0} not found")]
    BoardNotFound(String),
    #[error("Resource is missing an id")]
    MissingResourceId,
    #[error("Failed to load boards: {0}")]
    Load(#[from] ClientError),
    #[error("Failed to persist boards: {0}")]
    Persistence(String),
    #[error("Board writer has stopped")]
    WriterStopped,
}

/// Where board documents live.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardBackend: Send + Sync {
    async fn load_boards(&self) -> Result<Vec<Board>, ClientError>;
    /// Creates or replaces the whole document.
    async fn save_board(&self, board: &Board) -> Result<(), ClientError>;
    async fn delete_board(&self, board_id: &str) -> Result<(), ClientError>;
}

/// Per-user documents on the server, last write wins.
pub struct RemoteBoards {
    api: ApiClient,
}

impl RemoteBoards {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BoardBackend for RemoteBoards {
    async fn load_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.api.list_boards().await
    }

    async fn save_board(&self, board: &Board) -> Result<(), ClientError> {
        self.api.put_board(board).await
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), ClientError> {
        if !self.api.delete_board(board_id).await? {
            tracing::debug!("Board {} was already absent on the server", board_id);
        }
        Ok(())
    }
}

/// All boards as one JSON array under [`BOARDS_KEY`].
pub struct LocalBoards {
    storage: Arc<LocalStorage>,
}

impl LocalBoards {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    fn read(&self) -> Result<Vec<Board>, ClientError> {
        Ok(self.storage.get_json(BOARDS_KEY)?.unwrap_or_default())
    }
}

#[async_trait]
impl BoardBackend for LocalBoards {
    async fn load_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.read()
    }

    async fn save_board(&self, board: &Board) -> Result<(), ClientError> {
        let mut boards = self.read()?;
        match boards.iter_mut().find(|b| b.id == board.id) {
            Some(existing) => *existing = board.clone(),
            None => boards.push(board.clone()),
        }
        self.storage.set_json(BOARDS_KEY, &boards)?;
        Ok(())
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), ClientError> {
        let mut boards = self.read()?;
        boards.retain(|b| b.id != board_id);
        self.storage.set_json(BOARDS_KEY, &boards)?;
        Ok(())
    }
}

enum WriteOp {
    Save(Board),
    Delete(String),
    Flush(oneshot::Sender<Option<String>>),
}

async fn run_writer(backend: Arc<dyn BoardBackend>, mut ops: mpsc::UnboundedReceiver<WriteOp>) {
    let mut first_error: Option<String> = None;

    while let Some(op) = ops.recv().await {
        let result = match op {
            WriteOp::Save(board) => backend
                .save_board(&board)
                .await
                .map_err(|e| format!("saving board {}: {}", board.id, e)),
            WriteOp::Delete(board_id) => backend
                .delete_board(&board_id)
                .await
                .map_err(|e| format!("deleting board {}: {}", board_id, e)),
            WriteOp::Flush(reply) => {
                // The caller may have gone away; nothing to report to then.
                let _ = reply.send(first_error.take());
                continue;
            }
        };

        if let Err(message) = result {
            tracing::error!("Board write failed: {}", message);
            first_error.get_or_insert(message);
        }
    }

    tracing::debug!("Board writer stopped");
}

pub struct BoardsStore {
    boards: Vec<Board>,
    writes: mpsc::UnboundedSender<WriteOp>,
}

impl BoardsStore {
    /// Loads the current boards from `backend` and starts the writer.
    /// Must be called within a Tokio runtime.
    pub async fn load(backend: Arc<dyn BoardBackend>) -> Result<Self, StoreError> {
        let boards = backend.load_boards().await?;
        tracing::debug!("Loaded {} boards", boards.len());
        Ok(Self::with_boards(backend, boards))
    }

    fn with_boards(backend: Arc<dyn BoardBackend>, boards: Vec<Board>) -> Self {
        let (writes, ops) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(backend, ops));
        Self { boards, writes }
    }

    fn enqueue(&self, op: WriteOp) {
        if self.writes.send(op).is_err() {
            tracing::error!("Board writer has stopped; change kept in memory only");
        }
    }

    fn board_mut(&mut self, board_id: &str) -> Result<&mut Board, StoreError> {
        self.boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(|| StoreError::BoardNotFound(board_id.to_string()))
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn get_board_by_id(&self, board_id: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == board_id)
    }

    pub fn create_board(&mut self, name: &str) -> Board {
        let board = Board::new(Uuid::new_v4().to_string(), name);
        self.boards.push(board.clone());
        self.enqueue(WriteOp::Save(board.clone()));
        board
    }

    /// Adds `resource`, replacing any entry with the same id.
    pub fn add_resource_to_board(
        &mut self,
        board_id: &str,
        resource: WellnessResource,
    ) -> Result<(), StoreError> {
        if resource.id.trim().is_empty() {
            return Err(StoreError::MissingResourceId);
        }

        let board = self.board_mut(board_id)?;
        board.upsert_resource(resource);
        let snapshot = board.clone();
        self.enqueue(WriteOp::Save(snapshot));
        Ok(())
    }

    /// No-op when the board or the resource is absent.
    pub fn remove_resource_from_board(&mut self, board_id: &str, resource_id: &str) {
        let Ok(board) = self.board_mut(board_id) else {
            return;
        };
        if board.remove_resource(resource_id) {
            let snapshot = board.clone();
            self.enqueue(WriteOp::Save(snapshot));
        }
    }

    pub fn update_board_name(&mut self, board_id: &str, name: &str) -> Result<(), StoreError> {
        let board = self.board_mut(board_id)?;
        board.name = name.to_string();
        let snapshot = board.clone();
        self.enqueue(WriteOp::Save(snapshot));
        Ok(())
    }

    /// Returns whether a board was removed.
    pub fn delete_board(&mut self, board_id: &str) -> bool {
        let before = self.boards.len();
        self.boards.retain(|b| b.id != board_id);
        let removed = self.boards.len() != before;
        if removed {
            self.enqueue(WriteOp::Delete(board_id.to_string()));
        }
        removed
    }

    /// Waits until every write queued so far has been applied. Reports the
    /// first failure since the previous flush.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (reply, done) = oneshot::channel();
        self.writes
            .send(WriteOp::Flush(reply))
            .map_err(|_| StoreError::WriterStopped)?;

        match done.await.map_err(|_| StoreError::WriterStopped)? {
            Some(message) => Err(StoreError::Persistence(message)),
            None => Ok(()),
        }
    }
}
