//! # Country Atlas
//!
//! Seeds a local SQLite store from the REST Countries API and serves a
//! paginated, filterable, full-text search endpoint over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌──────────────┐
//! │ REST source  │──▶│  Loader  │──▶│    SQLite    │
//! │ (one-shot)   │   │ (1 txn)  │   │ countries+FTS│
//! └──────────────┘   └──────────┘   └──────┬───────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌────────────┐
//!                 │   CLI    │       │    HTTP    │
//!                 │ (atlas)  │       │ /countries │
//!                 └──────────┘       └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! atlas init                    # create schema
//! atlas sync                    # fetch and store countries (first run only)
//! atlas search --q bra --sort population --order desc
//! atlas serve                   # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Store handle |
//! | [`migrate`] | Schema, FTS index, and sync triggers |
//! | [`models`] | Core data types |
//! | [`source`] | Upstream dataset fetch |
//! | [`loader`] | One-time, transactional seeding |
//! | [`query`] | Parameter parsing and SQL construction |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod loader;
pub mod migrate;
pub mod models;
pub mod query;
pub mod server;
pub mod source;
