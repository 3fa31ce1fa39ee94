pub mod account;
pub mod admin;
pub mod catalog;
pub mod components;
pub mod dashboard;
pub mod explanation;
pub mod layout;
pub mod session;

// Re-export commonly used functions from layout
pub use layout::{page, render, titled};
