//! Library features kept on the device: reviews, offline copies and the
//! dashboard todo list.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::client::local_storage::{LocalStorage, StorageError};
use crate::models::{ResourceKind, Review, TodoItem, WellnessResource};

pub const TODOS_KEY: &str = "armiyot_dashboard_todos";

fn reviews_key(resource_id: &str) -> String {
    format!("reviews_{}", resource_id)
}

fn offline_key(resource_id: &str) -> String {
    format!("offline_{}", resource_id)
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Please provide your name, a rating, and a comment: {0}")]
    IncompleteReview(#[from] validator::ValidationErrors),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Validate)]
pub struct NewReview {
    #[validate(custom(function = "crate::flows::not_blank"))]
    pub user_name: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(custom(function = "crate::flows::not_blank"))]
    pub comment: String,
}

pub struct Library {
    storage: Arc<LocalStorage>,
}

impl Library {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn reviews_for(&self, resource_id: &str) -> Result<Vec<Review>, LibraryError> {
        Ok(self
            .storage
            .get_json(&reviews_key(resource_id))?
            .unwrap_or_default())
    }

    pub fn submit_review(&self, resource_id: &str, review: NewReview) -> Result<Review, LibraryError> {
        review.validate()?;

        let review = Review {
            id: Uuid::new_v4().to_string(),
            resource_id: resource_id.to_string(),
            user_name: review.user_name,
            rating: review.rating,
            comment: review.comment,
            timestamp: Utc::now(),
        };

        let mut reviews = self.reviews_for(resource_id)?;
        reviews.push(review.clone());
        self.storage.set_json(&reviews_key(resource_id), &reviews)?;
        Ok(review)
    }

    /// Stores a copy for offline reading. Articles with markdown are kept in
    /// full, videos with a YouTube id keep their metadata; other resources
    /// are not saved and `false` is returned.
    pub fn save_offline(&self, resource: &WellnessResource) -> Result<bool, LibraryError> {
        let copy = match &resource.kind {
            ResourceKind::Article {
                content_markdown: Some(_),
                ..
            } => resource.clone(),
            ResourceKind::Video {
                youtube_video_id: Some(video_id),
                content_url,
                ..
            } => WellnessResource {
                kind: ResourceKind::Video {
                    content_url: content_url.clone(),
                    duration: None,
                    youtube_video_id: Some(video_id.clone()),
                },
                ..resource.clone()
            },
            _ => return Ok(false),
        };

        self.storage.set_json(&offline_key(&resource.id), &copy)?;
        tracing::debug!(
            "Saved {} {} for offline use",
            resource.kind.label(),
            resource.id
        );
        Ok(true)
    }

    pub fn offline_copy(&self, resource_id: &str) -> Result<Option<WellnessResource>, LibraryError> {
        Ok(self.storage.get_json(&offline_key(resource_id))?)
    }
}

pub fn average_rating(reviews: &[Review]) -> f32 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(|r| f32::from(r.rating)).sum::<f32>() / reviews.len() as f32
}

pub struct TodoList {
    storage: Arc<LocalStorage>,
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn open(storage: Arc<LocalStorage>) -> Self {
        let items = match storage.get_json(TODOS_KEY) {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Failed to load todos: {}", e);
                Vec::new()
            }
        };
        Self { storage, items }
    }

    fn save(&self) -> Result<(), StorageError> {
        self.storage.set_json(TODOS_KEY, &self.items)
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn pending(&self) -> usize {
        self.items.iter().filter(|t| !t.completed).count()
    }

    /// Blank text is ignored.
    pub fn add(&mut self, text: &str) -> Result<Option<&TodoItem>, StorageError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.items.push(TodoItem {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
            created_at: Utc::now(),
        });
        self.save()?;
        Ok(self.items.last())
    }

    pub fn toggle(&mut self, id: &str) -> Result<bool, StorageError> {
        let Some(item) = self.items.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        item.completed = !item.completed;
        self.save()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
