#[path = "../common/mod.rs"]
mod common;

mod boards;
mod chat_session;
mod flows;
