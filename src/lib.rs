// src/lib.rs

//! jobwatch: job-listing watcher library
//!
//! Polls a job-listing service for a set of keywords, keeps the recent
//! postings for one location, works out which ones were not seen before,
//! and announces those through a notifier.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
