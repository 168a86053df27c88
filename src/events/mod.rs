//! Farm lifecycle events.
//!
//! The farm's event plugin forwards each lifecycle event (job submitted,
//! finished, failed, worker idle, ...) to this crate. An [`EventListener`]
//! maps event names to [`EventHandler`]s; the [`PublishHandler`] turns an
//! event into a publish run with the plugin paths configured for it.

mod event;
mod listener;
mod publish;

pub use event::{EventPayload, FarmEvent, FarmJob, UnknownEvent};
pub use listener::{EventHandler, EventListener, HandlerOutcome};
pub use publish::{PLUGIN_PATH_VAR, PublishHandler, PublishPlan, plan_publish, run_publish};
