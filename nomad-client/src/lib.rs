//! Terminal client for a Nomad cluster: browse jobs and tasks, follow logs
//! and cluster events, exec into tasks and run basic admin actions.

pub mod cmd;
pub mod config;
pub mod error;
pub mod filter;
pub mod log;
pub mod nav;
pub mod source;
pub mod streaming;
pub mod structs;
pub mod table_format;
pub mod ui;
pub mod utils;
