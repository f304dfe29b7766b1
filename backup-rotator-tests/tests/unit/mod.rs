//! Unit tests for backup-rotator
//!
//! These tests exercise individual components through the public library API.

mod config;
mod retention;
mod source;
