//! Integration Tests
//!
//! End-to-end tests through the public facade:
//! - Config: loading couchsphinx.toml and building the registry from it
//! - Pipeline: store rows -> docset -> daemon -> hits -> store ids -> documents

#[path = "../common/mod.rs"]
mod common;

mod config;
mod pipeline;
