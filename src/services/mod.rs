pub mod auth;
pub mod generation;
pub mod quiz_session;
pub mod stats;
