//! migconsole - inspect and reorder versioned database migrations
//!
//! The core lives in [`migrations`]: catalog building, action policy, the
//! action executor and the bring-to-top reorder engine, all written against
//! the [`migrations::MigrationAdapter`] trait. [`cli`] wires them to a
//! filesystem adapter and an interactive terminal session.

pub mod cli;
pub mod logging;
pub mod migrations;
pub mod schema_dump;
