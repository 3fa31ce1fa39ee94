pub mod account;
pub mod admin;
pub mod catalog;
pub mod dashboard;
pub mod explanation;
pub mod session;
