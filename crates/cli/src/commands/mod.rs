//! CLI subcommands.

pub mod migrate;
pub mod sync_roles;
