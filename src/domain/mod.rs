//! Core domain types for farm submission

mod batch;
mod context;
mod descriptor;
mod setting;

pub use batch::{BatchEntry, SubmissionBatch};
pub use context::{
    DEADLINE_DATA, DEADLINE_FAMILY, DEADLINE_JOB_DATA, Entity, Instance, PublishContext,
};
pub use descriptor::{
    DeadlineEntry, DroppedSetting, ENVIRONMENT_KEY_VALUE, EXTRA_INFO, EXTRA_INFO_KEY_VALUE,
    JobSettings, MalformedEntry, PluginSettings, deadline_data_elements,
};
pub use setting::{Scalar, SettingValue, Unrepresentable};
