//! deadline-bridge - publish pipeline bridge for the Deadline render farm
//!
//! A publish run on a workstation collects render jobs (one per write node of
//! the compositing script, plus anything the context adds) and hands them to
//! the farm through its `deadlinecommand` tool. Jobs can be tagged with an
//! integer `order`; every job of an order group depends on all jobs of the
//! previous group, so e.g. a Draft/QuickTime job runs after its renders.
//!
//! On the farm side, lifecycle events (job finished, failed, ...) start a new
//! publish run seeded with the data the workstation publish stored on the job.
//!
//! ## Modules
//!
//! - [`domain`]: settings values, job/plugin descriptors, publish context
//! - [`submit`]: ordered submission through the farm's command-line tool
//! - [`collect`]: write nodes from an exported scene description
//! - [`events`]: farm event handling and publish runs
//! - [`config`]: TOML configuration

pub mod collect;
pub mod config;
pub mod domain;
pub mod events;
pub mod submit;

pub use domain::*;
