//! Projexia: project and task tracking over a JSON API, plus a typed client
//! and a small state container for front ends written in Rust.

pub mod app_state;
pub mod auth;
pub mod chat;
pub mod client;
pub mod comment;
pub mod config;
pub mod error;
pub mod health;
pub mod member;
pub mod models;
pub mod oauth;
pub mod project;
pub mod routes;
pub mod session;
pub mod store;
pub mod task;
pub mod workspace;
