//! Subcommand implementations.

pub mod cltools;
pub mod completion;
pub mod info;
pub mod vistrails_run;
