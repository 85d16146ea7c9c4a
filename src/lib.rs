//! End-to-end browser checks for a demo storefront, driven over the Chrome
//! DevTools Protocol.
//!
//! # Modules
//! - `config` — environment resolution and the JSON configuration document
//! - `browser` — Chromium session lifecycle and console capture
//! - `page` — resilient element lookups over one page handle
//! - `views` — home, login, and about page vocabularies
//! - `retry` — bounded retry with pluggable backoff
//! - `report` — scenario reports and the pull-request CSV output
//! - `scenarios` — the four runnable checks

pub mod browser;
pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod report;
pub mod retry;
pub mod scenarios;
pub mod views;
