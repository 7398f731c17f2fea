//! rollcall: badge-scan attendance tracking.
//!
//! The roster, the attendance ledger and the work schedule live in a
//! key-value [`store`]; [`tracker::Tracker`] runs every operation against
//! them behind a role gate, and [`cli`] drives it from a terminal.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod model;
pub mod policy;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod schedule;
pub mod store;
pub mod tracker;
