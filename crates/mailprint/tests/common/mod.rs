//! Shared test utilities for mailprint integration tests.
//!
//! This module provides in-memory stand-ins for the mailbox and print server
//! plus builders for the messages they carry.

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::*;
