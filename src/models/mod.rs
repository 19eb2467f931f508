// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains the data structures shared by the pipeline,
//! storage, and service layers.

mod change;
mod config;
mod mapping;

// Re-export all public types
pub use change::{ChangeRecord, ChangeSet, Scope};
pub use config::{
    Config, ExtractConfig, LoggingConfig, NotifyConfig, SourceConfig, StorageConfig,
    WatcherConfig,
};
pub use mapping::{Entity, Mapping};
