//! Collecting the submission batch for one publish run.

use super::context::{DEADLINE_DATA, Entity, PublishContext};
use super::descriptor::{DeadlineEntry, deadline_data_elements};

/// A descriptor together with the entity it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub entry: DeadlineEntry,
    pub entity: Entity,
    /// Human-readable source, used in logs and reports
    pub label: String,
}

/// Every job/plugin pair produced by one publish run, in encounter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionBatch {
    pub entries: Vec<BatchEntry>,
}

impl SubmissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DeadlineEntry, entity: Entity, label: impl Into<String>) {
        self.entries.push(BatchEntry {
            entry,
            entity,
            label: label.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gather descriptors from eligible instances, then from the context.
    ///
    /// Malformed descriptors are skipped with a warning; settings that fail
    /// the capability check are dropped with a warning.
    pub fn from_context(context: &PublishContext) -> Self {
        let mut batch = Self::new();

        for (index, instance) in context.instances.iter().enumerate() {
            if !instance.is_eligible() {
                tracing::info!(
                    "No \"deadline\" family assigned or publishing disabled. Skipping \"{}\".",
                    instance.name
                );
                continue;
            }
            let Some(data) = instance.data.get(DEADLINE_DATA) else {
                tracing::warn!("Instance \"{}\" has no {}", instance.name, DEADLINE_DATA);
                continue;
            };
            batch.collect_elements(data, Entity::Instance(index), context);
        }

        if let Some(data) = context.data.get(DEADLINE_DATA) {
            batch.collect_elements(data, Entity::Context, context);
        }

        batch
    }

    fn collect_elements(
        &mut self,
        data: &serde_json::Value,
        entity: Entity,
        context: &PublishContext,
    ) {
        let label = context.entity_label(entity);
        for (position, element) in deadline_data_elements(data).into_iter().enumerate() {
            match DeadlineEntry::from_json(element) {
                Ok((entry, dropped)) => {
                    for d in dropped {
                        tracing::warn!(
                            "Setting \"{}\" of {} {} dropped: {}",
                            d.key,
                            label,
                            DEADLINE_DATA,
                            d.reason
                        );
                    }
                    self.push(entry, entity, label.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping {}[{}] of {}: {}",
                        DEADLINE_DATA,
                        position,
                        label,
                        e
                    );
                }
            }
        }
    }
}
