//! CLI command implementations

pub mod collect;
pub mod event;
pub mod init;
pub mod submit;
