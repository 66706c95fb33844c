//! Aramiyot - AI wellness companion service

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod flows;
pub mod models;
pub mod services;
pub mod storage;

// Re-export main types for convenience
pub use crate::api::dto::*;
pub use crate::api::routes::{create_router, AppState};
pub use crate::config::Config;
pub use crate::flows::{FlowError, Flows};
pub use crate::models::internal::{Board, ChatMessage, WellnessResource};
pub use crate::services::genai_client::{GenAiClient, GenerativeBackend};
pub use crate::storage::db::init_db;
pub use crate::storage::repository::{BoardRepository, SeaOrmBoardRepository};
