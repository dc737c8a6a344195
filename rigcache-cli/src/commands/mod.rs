//! CLI subcommands.

pub mod common;
pub mod init_config;
pub mod list;
pub mod scan;
pub mod watch;
