pub mod catalog;
pub mod internal;

pub use internal::{
    Attachment, Board, ChatMessage, Hospital, HospitalSuggestion, ResourceKind, Review, Sender,
    TodoItem, WellnessResource,
};
