//! TaskFlow library
//!
//! This library exposes the core functionality of TaskFlow for the CLI,
//! for testing and for embedding in other front ends.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
