//! Persistence seam for sync history, imported orders and category mappings.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{
    CategoryMapping, MarketplaceId, Order, StoreError, SyncDirection, SyncResult,
};

/// Storage used by the sync service.
///
/// Implementations must be safe to share across concurrent sync invocations.
pub trait SyncStore: Send + Sync {
    fn save_sync_result(&self, result: &SyncResult) -> Result<(), StoreError>;

    /// Most recent result for one marketplace and direction.
    fn last_sync_result(
        &self,
        marketplace: MarketplaceId,
        direction: SyncDirection,
    ) -> Result<Option<SyncResult>, StoreError>;

    /// Most recent result that ran to the end without an interruption.
    fn last_uninterrupted_result(
        &self,
        marketplace: MarketplaceId,
        direction: SyncDirection,
    ) -> Result<Option<SyncResult>, StoreError>;

    /// Newest first, at most `limit` entries.
    fn sync_history(
        &self,
        marketplace: MarketplaceId,
        limit: usize,
    ) -> Result<Vec<SyncResult>, StoreError>;

    /// Inserts an order unless one with the same marketplace and external id
    /// exists. Returns `true` when the order was newly stored.
    fn save_order(&self, order: &Order) -> Result<bool, StoreError>;

    fn order(
        &self,
        marketplace: MarketplaceId,
        external_id: &str,
    ) -> Result<Option<Order>, StoreError>;

    /// Returns `false` when the order is unknown.
    fn update_order_status(
        &self,
        marketplace: MarketplaceId,
        external_id: &str,
        status: &str,
    ) -> Result<bool, StoreError>;

    fn category_mappings(
        &self,
        marketplace: MarketplaceId,
    ) -> Result<Vec<CategoryMapping>, StoreError>;

    /// Upserts by shop category id.
    fn save_category_mapping(
        &self,
        marketplace: MarketplaceId,
        mapping: CategoryMapping,
    ) -> Result<(), StoreError>;
}

/// In-process [`SyncStore`] behind a single mutex.
#[derive(Debug, Default)]
pub struct MemorySyncStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    results: Vec<SyncResult>,
    orders: HashMap<(MarketplaceId, String), Order>,
    mappings: BTreeMap<MarketplaceId, Vec<CategoryMapping>>,
}

/// Serializable copy of a [`MemorySyncStore`], used to persist state between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub results: Vec<SyncResult>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub mappings: BTreeMap<MarketplaceId, Vec<CategoryMapping>>,
}

impl MemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store; later duplicates of an order key are ignored.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut orders = HashMap::new();
        for order in snapshot.orders {
            orders
                .entry((order.marketplace, order.external_id.clone()))
                .or_insert(order);
        }
        Self {
            state: Mutex::new(MemoryState {
                results: snapshot.results,
                orders,
                mappings: snapshot.mappings,
            }),
        }
    }

    /// Results oldest first, orders sorted by marketplace and external id.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|left, right| {
            (left.marketplace, &left.external_id).cmp(&(right.marketplace, &right.external_id))
        });
        Ok(StoreSnapshot {
            results: state.results.clone(),
            orders,
            mappings: state.mappings.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SyncStore for MemorySyncStore {
    fn save_sync_result(&self, result: &SyncResult) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        match state
            .results
            .iter_mut()
            .find(|existing| existing.id() == result.id())
        {
            Some(existing) => *existing = result.clone(),
            None => state.results.push(result.clone()),
        }
        Ok(())
    }

    fn last_sync_result(
        &self,
        marketplace: MarketplaceId,
        direction: SyncDirection,
    ) -> Result<Option<SyncResult>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .results
            .iter()
            .rev()
            .find(|result| result.marketplace() == marketplace && result.direction() == direction)
            .cloned())
    }

    fn last_uninterrupted_result(
        &self,
        marketplace: MarketplaceId,
        direction: SyncDirection,
    ) -> Result<Option<SyncResult>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .results
            .iter()
            .rev()
            .filter(|result| result.marketplace() == marketplace && result.direction() == direction)
            .find(|result| result.status().is_terminal() && result.interruption().is_none())
            .cloned())
    }

    fn sync_history(
        &self,
        marketplace: MarketplaceId,
        limit: usize,
    ) -> Result<Vec<SyncResult>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .results
            .iter()
            .rev()
            .filter(|result| result.marketplace() == marketplace)
            .take(limit)
            .cloned()
            .collect())
    }

    fn save_order(&self, order: &Order) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let key = (order.marketplace, order.external_id.clone());
        if state.orders.contains_key(&key) {
            return Ok(false);
        }
        state.orders.insert(key, order.clone());
        Ok(true)
    }

    fn order(
        &self,
        marketplace: MarketplaceId,
        external_id: &str,
    ) -> Result<Option<Order>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .orders
            .get(&(marketplace, external_id.to_owned()))
            .cloned())
    }

    fn update_order_status(
        &self,
        marketplace: MarketplaceId,
        external_id: &str,
        status: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        match state.orders.get_mut(&(marketplace, external_id.to_owned())) {
            Some(order) => {
                order.status = status.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn category_mappings(
        &self,
        marketplace: MarketplaceId,
    ) -> Result<Vec<CategoryMapping>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .mappings
            .get(&marketplace)
            .cloned()
            .unwrap_or_default())
    }

    fn save_category_mapping(
        &self,
        marketplace: MarketplaceId,
        mapping: CategoryMapping,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let mappings = state.mappings.entry(marketplace).or_default();
        match mappings
            .iter_mut()
            .find(|existing| existing.shop_category_id == mapping.shop_category_id)
        {
            Some(existing) => *existing = mapping,
            None => mappings.push(mapping),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UtcDateTime;

    fn order(external_id: &str, status: &str) -> Order {
        Order {
            external_id: external_id.to_owned(),
            marketplace: MarketplaceId::Etsy,
            status: status.to_owned(),
            total: 10.0,
            customer_name: String::from("Ada"),
            delivery_address: String::new(),
            delivery_city: String::new(),
            items: Vec::new(),
            created_at: UtcDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn orders_are_deduplicated_by_external_id() {
        let store = MemorySyncStore::new();

        assert!(store.save_order(&order("r-1", "paid")).expect("store works"));
        assert!(!store.save_order(&order("r-1", "open")).expect("store works"));

        let stored = store
            .order(MarketplaceId::Etsy, "r-1")
            .expect("store works")
            .expect("order exists");
        assert_eq!(stored.status, "paid");
    }

    #[test]
    fn order_status_updates_only_known_orders() {
        let store = MemorySyncStore::new();
        store.save_order(&order("r-1", "paid")).expect("store works");

        assert!(store
            .update_order_status(MarketplaceId::Etsy, "r-1", "shipped")
            .expect("store works"));
        assert!(!store
            .update_order_status(MarketplaceId::Etsy, "missing", "shipped")
            .expect("store works"));
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let store = MemorySyncStore::new();
        let mut ids = Vec::new();
        for direction in [SyncDirection::Export, SyncDirection::Import, SyncDirection::Export] {
            let mut result = SyncResult::start(MarketplaceId::Etsy, direction, 0);
            result.finish();
            ids.push(result.id());
            store.save_sync_result(&result).expect("store works");
        }

        let history = store
            .sync_history(MarketplaceId::Etsy, 2)
            .expect("store works");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id(), ids[2]);
        assert_eq!(history[1].id(), ids[1]);

        let last_import = store
            .last_sync_result(MarketplaceId::Etsy, SyncDirection::Import)
            .expect("store works")
            .expect("import recorded");
        assert_eq!(last_import.id(), ids[1]);
    }

    #[test]
    fn interrupted_results_are_skipped_when_looking_for_a_clean_run() {
        let store = MemorySyncStore::new();
        let mut clean = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Import, 0);
        clean.finish();
        store.save_sync_result(&clean).expect("store works");
        let mut cancelled = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Import, 0);
        cancelled.interrupt(crate::Interruption::Cancelled);
        cancelled.finish();
        store.save_sync_result(&cancelled).expect("store works");

        let last = store
            .last_uninterrupted_result(MarketplaceId::Etsy, SyncDirection::Import)
            .expect("store works")
            .expect("clean import recorded");

        assert_eq!(last.id(), clean.id());
        assert!(store
            .last_uninterrupted_result(MarketplaceId::Etsy, SyncDirection::Export)
            .expect("store works")
            .is_none());
    }

    #[test]
    fn saving_same_result_twice_replaces_it() {
        let store = MemorySyncStore::new();
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Export, 0);
        store.save_sync_result(&result).expect("store works");
        result.finish();
        store.save_sync_result(&result).expect("store works");

        let history = store
            .sync_history(MarketplaceId::Etsy, 10)
            .expect("store works");
        assert_eq!(history.len(), 1);
        assert!(history[0].completed_at().is_some());
    }

    #[test]
    fn snapshot_restores_history_and_orders() {
        let store = MemorySyncStore::new();
        let mut result = SyncResult::start(MarketplaceId::Etsy, SyncDirection::Import, 1);
        result.record_success();
        result.finish();
        store.save_sync_result(&result).expect("store works");
        store.save_order(&order("r-2", "paid")).expect("store works");
        store.save_order(&order("r-1", "paid")).expect("store works");

        let json = serde_json::to_string(&store.snapshot().expect("snapshot")).expect("serializes");
        let restored = MemorySyncStore::from_snapshot(
            serde_json::from_str(&json).expect("deserializes"),
        );

        let snapshot = restored.snapshot().expect("snapshot");
        assert_eq!(snapshot.results.len(), 1);
        assert_eq!(snapshot.results[0].id(), result.id());
        assert_eq!(snapshot.results[0].success_items(), 1);
        let ids: Vec<_> = snapshot
            .orders
            .iter()
            .map(|order| order.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["r-1", "r-2"]);
        assert!(!restored.save_order(&order("r-1", "open")).expect("store works"));
    }

    #[test]
    fn category_mappings_upsert_by_shop_category() {
        let store = MemorySyncStore::new();
        for target in ["100", "200"] {
            store
                .save_category_mapping(
                    MarketplaceId::Etsy,
                    CategoryMapping {
                        shop_category_id: String::from("lamps"),
                        marketplace_category_id: target.to_owned(),
                    },
                )
                .expect("store works");
        }

        let mappings = store
            .category_mappings(MarketplaceId::Etsy)
            .expect("store works");
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].marketplace_category_id, "200");
    }
}
