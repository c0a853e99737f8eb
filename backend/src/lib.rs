//! Rental marketplace backend for Cameroon: listings filtered by region and
//! division, landlord access control, inquiries, reviews and realtime chat.

pub mod access;
pub mod account;
pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod inquiry;
pub mod models;
pub mod property;
pub mod region;
pub mod regions;
pub mod relay;
pub mod review;
pub mod schema;
pub mod search;
pub mod store;

pub use app::{router, AppState};
