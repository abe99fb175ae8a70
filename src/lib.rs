#![doc(test(attr(deny(warnings))))]

//! Household budget engine: monthly groups and categories, an idempotent
//! salary and allocation automation, JSON persistence with backups, and an
//! optional last-write-wins shared room.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod sync;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("household budget tracing initialized");
    });
}
