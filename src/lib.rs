// src/lib.rs

//! pacegrade library
//!
//! Fetches an athlete's race-result history from public results sites,
//! normalizes it into canonical records, caches the normalized profile with
//! TTL and stale-fallback rules, and derives comparative statistics
//! (percentile rank, age grading, trend direction) from the cached history.

pub mod cache;
pub mod compare;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod grading;
pub mod models;
pub mod platforms;
pub mod storage;
