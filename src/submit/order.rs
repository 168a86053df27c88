//! Submission ordering and dependency bookkeeping.
//!
//! Entries tagged with an `order` are submitted first, grouped by ascending
//! order value; every job of a group depends on all jobs submitted for the
//! previous group. Untagged entries follow in encounter order, unchained.

use crate::domain::BatchEntry;

/// Indices into `entries` in the sequence they must be submitted.
///
/// Stable: entries sharing an order value keep their relative position.
pub fn submission_sequence(entries: &[BatchEntry]) -> Vec<usize> {
    let mut sequence: Vec<usize> = (0..entries.len()).collect();
    sequence.sort_by_key(|&i| match entries[i].entry.order {
        Some(order) => (false, order),
        None => (true, 0),
    });
    sequence
}

/// Job ids recorded per order group during one submission pass
#[derive(Debug, Clone, Default)]
pub struct OrderGroups {
    /// Distinct order values, ascending
    orders: Vec<i64>,
    /// Ids returned for each group, parallel to `orders`
    job_ids: Vec<Vec<String>>,
}

impl OrderGroups {
    /// Collect the distinct order values present in a batch
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut orders: Vec<i64> = entries.iter().filter_map(|e| e.entry.order).collect();
        orders.sort_unstable();
        orders.dedup();
        let job_ids = vec![Vec::new(); orders.len()];
        Self { orders, job_ids }
    }

    /// Distinct order values, ascending
    pub fn orders(&self) -> &[i64] {
        &self.orders
    }

    fn index_of(&self, order: i64) -> Option<usize> {
        self.orders.binary_search(&order).ok()
    }

    /// Ids a job of `order` has to wait for: those of the preceding group.
    ///
    /// Empty for the first group and for unknown orders.
    pub fn dependencies_for(&self, order: i64) -> &[String] {
        match self.index_of(order) {
            Some(index) if index > 0 => &self.job_ids[index - 1],
            _ => &[],
        }
    }

    /// Remember an id returned for a job of `order`
    pub fn record(&mut self, order: i64, job_id: impl Into<String>) {
        if let Some(index) = self.index_of(order) {
            self.job_ids[index].push(job_id.into());
        }
    }

    /// Ids recorded so far for `order`
    pub fn job_ids(&self, order: i64) -> &[String] {
        self.index_of(order)
            .map(|index| self.job_ids[index].as_slice())
            .unwrap_or(&[])
    }
}
