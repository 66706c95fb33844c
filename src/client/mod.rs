//! Client side of the service: the chat stream consumer, the boards store and
//! the library features backed by local storage.

pub mod api;
pub mod boards;
pub mod chat;
pub mod decoder;
pub mod library;
pub mod local_storage;

pub use api::{ApiClient, ClientError};
pub use boards::{BoardBackend, BoardsStore, LocalBoards, RemoteBoards, StoreError};
pub use chat::{ChatError, ChatSession};
pub use decoder::Utf8StreamDecoder;
pub use library::{Library, LibraryError, NewReview, TodoList};
pub use local_storage::{LocalStorage, StorageError};
