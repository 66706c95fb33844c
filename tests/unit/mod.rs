#[path = "../common/mod.rs"]
mod common;


// Unit tests for API
mod auth_test;
mod config_test;
mod rate_limiter_test;
