//! A small CRM: companies, contacts and missions backed by SQLite, with a
//! per-contact pipeline rollup, an append-only comment log carrying alerts
//! and attachments, change notification for mission watchers, and CSV
//! export tuned per spreadsheet application.

pub mod alerts;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod notify;
pub mod rollup;
pub mod services;
pub mod types;
pub mod util;
