//! Quizsmith · quiz generation, scoring, and attempt history.
//!
//! - `generator`: spec → model call → validated multiple-choice questions
//! - `scoring`: responses × answer keys → result
//! - `store`: append/list of scored attempts (SQLite or in-memory)
//! - `routes`: the axum HTTP surface over `logic`

pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod logic;
pub mod model;
pub mod openai;
pub mod protocol;
pub mod report;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;

pub use routes::build_router;
pub use state::AppState;
