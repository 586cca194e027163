//! Community Qur'an reading campaigns (khatmas) kept in a local SQLite file.
//!
//! The binary is a thin shell over these modules: `services` holds the
//! rule-checked operations, `db` the schema and repositories, `cli` and `tui`
//! the two front ends.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod quran;
pub mod services;
pub mod tui;
pub mod utils;
