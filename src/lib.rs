// src/lib.rs

//! projectwatch: change notifications for the JDK release listing and the
//! JEPs targeted at each release.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
