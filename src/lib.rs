//! ARBWATCH: live soccer odds reconciliation and arbitrage scanner.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod normalize;
pub mod sources;
pub mod engine;
pub mod storage;
pub mod dashboard;
