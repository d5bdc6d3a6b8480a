//! Batch result aggregation.
//!
//! A [`SyncResult`] is owned by exactly one orchestration call. It moves
//! `Pending → Running → {Completed, Failed}` and is only mutated through
//! methods that keep its counters consistent:
//!
//! - `processed_items == success_items + failed_items <= total_items`
//! - `errors.len() == failed_items`
//! - `completed_at` is set iff the status is terminal
//!
//! The batch is `Failed` only when every attempted item failed. A `Completed`
//! result can still carry errors; check [`SyncResult::has_partial_failure`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Interruption, MarketplaceError, MarketplaceId, UtcDateTime};

/// Direction of a sync relative to the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Shop → marketplace.
    Export,
    /// Marketplace → shop.
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SyncStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One failed item inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub sku: String,
    pub message: String,
    pub code: String,
}

/// Report of one batch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    id: Uuid,
    marketplace: MarketplaceId,
    direction: SyncDirection,
    status: SyncStatus,
    total_items: usize,
    processed_items: usize,
    success_items: usize,
    failed_items: usize,
    errors: Vec<ItemError>,
    started_at: UtcDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<UtcDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interruption: Option<Interruption>,
}

impl SyncResult {
    /// Creates a pending result for a batch of `total_items`.
    pub fn new(marketplace: MarketplaceId, direction: SyncDirection, total_items: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            marketplace,
            direction,
            status: SyncStatus::Pending,
            total_items,
            processed_items: 0,
            success_items: 0,
            failed_items: 0,
            errors: Vec::new(),
            started_at: UtcDateTime::now(),
            completed_at: None,
            interruption: None,
        }
    }

    /// Creates a result that is already running.
    pub fn start(marketplace: MarketplaceId, direction: SyncDirection, total_items: usize) -> Self {
        let mut result = Self::new(marketplace, direction, total_items);
        result.begin();
        result
    }

    /// Running result whose clock started earlier, before the batch size was known.
    pub fn start_from(
        marketplace: MarketplaceId,
        direction: SyncDirection,
        total_items: usize,
        started_at: UtcDateTime,
    ) -> Self {
        let mut result = Self::start(marketplace, direction, total_items);
        result.started_at = started_at;
        result
    }

    /// `Pending → Running`. No effect in any other state.
    pub fn begin(&mut self) {
        if self.status == SyncStatus::Pending {
            self.status = SyncStatus::Running;
            self.started_at = UtcDateTime::now();
        }
    }

    pub fn record_success(&mut self) {
        if !self.accepts_items() {
            return;
        }
        self.success_items += 1;
        self.processed_items += 1;
    }

    pub fn record_failure(&mut self, sku: impl Into<String>, error: &MarketplaceError) {
        if !self.accepts_items() {
            return;
        }
        self.failed_items += 1;
        self.processed_items += 1;
        self.errors.push(ItemError {
            sku: sku.into(),
            message: error.to_string(),
            code: error.code().to_owned(),
        });
    }

    /// Marks that the batch stopped before attempting every item.
    pub fn interrupt(&mut self, interruption: Interruption) {
        if !self.status.is_terminal() {
            self.interruption = Some(interruption);
        }
    }

    /// `Running → Completed | Failed`. Idempotent once terminal.
    pub fn finish(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = if self.failed_items > 0 && self.success_items == 0 {
            SyncStatus::Failed
        } else {
            SyncStatus::Completed
        };
        self.completed_at = Some(UtcDateTime::now());
    }

    fn accepts_items(&self) -> bool {
        self.status == SyncStatus::Running && self.processed_items < self.total_items
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn marketplace(&self) -> MarketplaceId {
        self.marketplace
    }

    pub fn direction(&self) -> SyncDirection {
        self.direction
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn processed_items(&self) -> usize {
        self.processed_items
    }

    pub fn success_items(&self) -> usize {
        self.success_items
    }

    pub fn failed_items(&self) -> usize {
        self.failed_items
    }

    pub fn errors(&self) -> &[ItemError] {
        &self.errors
    }

    pub fn started_at(&self) -> UtcDateTime {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<UtcDateTime> {
        self.completed_at
    }

    pub fn interruption(&self) -> Option<&Interruption> {
        self.interruption.as_ref()
    }

    /// Items never attempted because the batch stopped early.
    pub fn remaining_items(&self) -> usize {
        self.total_items - self.processed_items
    }

    /// Completed, but with at least one failed item.
    pub fn has_partial_failure(&self) -> bool {
        self.status == SyncStatus::Completed && self.failed_items > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(result: &SyncResult) {
        assert_eq!(
            result.processed_items(),
            result.success_items() + result.failed_items()
        );
        assert!(result.processed_items() <= result.total_items());
        assert_eq!(result.errors().len(), result.failed_items());
        assert_eq!(
            result.completed_at().is_some(),
            result.status().is_terminal()
        );
    }

    #[test]
    fn new_results_are_pending_until_begun() {
        let mut result = SyncResult::new(MarketplaceId::Etsy, SyncDirection::Export, 2);
        assert_eq!(result.status(), SyncStatus::Pending);
        result.record_success();
        assert_eq!(result.processed_items(), 0);

        result.begin();
        assert_eq!(result.status(), SyncStatus::Running);
        assert_invariants(&result);
    }

    #[test]
    fn mixed_outcome_completes_with_partial_failure() {
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Export, 3);
        result.record_success();
        result.record_failure("SKU-2", &MarketplaceError::remote(400, "rejected"));
        result.record_success();
        result.finish();

        assert_eq!(result.status(), SyncStatus::Completed);
        assert!(result.has_partial_failure());
        assert_eq!(result.errors()[0].sku, "SKU-2");
        assert_eq!(result.errors()[0].code, "marketplace.remote_error");
        assert_invariants(&result);
    }

    #[test]
    fn all_failures_mark_batch_failed() {
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Export, 2);
        result.record_failure("A", &MarketplaceError::transport("reset"));
        result.record_failure("B", &MarketplaceError::transport("reset"));
        result.finish();

        assert_eq!(result.status(), SyncStatus::Failed);
        assert!(!result.has_partial_failure());
        assert_invariants(&result);
    }

    #[test]
    fn empty_batch_completes() {
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Import, 0);
        result.finish();
        assert_eq!(result.status(), SyncStatus::Completed);
        assert_invariants(&result);
    }

    #[test]
    fn counters_never_exceed_total() {
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Export, 1);
        result.record_success();
        result.record_success();
        result.record_failure("X", &MarketplaceError::transport("late"));
        assert_eq!(result.processed_items(), 1);
        assert_invariants(&result);
    }

    #[test]
    fn finished_results_are_frozen() {
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Export, 2);
        result.record_success();
        result.finish();
        let completed_at = result.completed_at();

        result.record_failure("late", &MarketplaceError::transport("ignored"));
        result.interrupt(Interruption::Cancelled);
        result.finish();

        assert_eq!(result.failed_items(), 0);
        assert_eq!(result.interruption(), None);
        assert_eq!(result.completed_at(), completed_at);
        assert_eq!(result.remaining_items(), 1);
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Export, 1);
        result.interrupt(Interruption::Cancelled);
        result.finish();
        let json = serde_json::to_value(&result).expect("serializable");

        assert_eq!(json["status"], "completed");
        assert_eq!(json["direction"], "export");
        assert_eq!(json["marketplace"], "etsy");
        assert_eq!(json["total_items"], 1);
        assert_eq!(json["interruption"]["reason"], "cancelled");
    }
}
