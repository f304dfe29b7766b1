//! Command tests for backup-rotator
//!
//! These tests drive a full backup pass from a configuration document with a
//! mocked command executor.

mod run;
