pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod schedule;
pub mod service;
pub mod signal_handler;
pub mod types;
pub mod util;
