//! # Held Sale Repository
//!
//! The held list lives on the terminal, stored as one JSON array under the
//! `pos_held_sales` key, newest first.
//!
//! ```text
//! hold()    ──► put(sale)      prepend, truncate to capacity, persist
//! resume()  ──► delete(id)     remove and hand back (at most once)
//! list UI   ──► list()         newest first
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use storefront_core::held::push_capped;
use storefront_core::HeldSale;

use crate::error::PosResult;
use crate::storage::{read_json, write_json, KeyValueStore};

/// Storage key for the held list.
pub const HELD_SALES_KEY: &str = "pos_held_sales";

pub trait HeldSaleRepository: Send + Sync {
    /// Newest first.
    fn list(&self) -> PosResult<Vec<HeldSale>>;

    fn get(&self, id: &str) -> PosResult<Option<HeldSale>>;

    /// Prepends `sale`, dropping the oldest entries past capacity.
    fn put(&self, sale: HeldSale) -> PosResult<()>;

    /// Removes and returns the entry; `None` when absent.
    fn delete(&self, id: &str) -> PosResult<Option<HeldSale>>;
}

pub struct KvHeldSaleRepository {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl KvHeldSaleRepository {
    /// A capacity of 0 is raised to 1 so a freshly held sale is never evicted.
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        KvHeldSaleRepository {
            store,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn save(&self, list: &[HeldSale]) -> PosResult<()> {
        write_json(self.store.as_ref(), HELD_SALES_KEY, &list)
    }
}

impl HeldSaleRepository for KvHeldSaleRepository {
    fn list(&self) -> PosResult<Vec<HeldSale>> {
        Ok(read_json(self.store.as_ref(), HELD_SALES_KEY)?.unwrap_or_default())
    }

    fn get(&self, id: &str) -> PosResult<Option<HeldSale>> {
        Ok(self.list()?.into_iter().find(|s| s.id == id))
    }

    fn put(&self, sale: HeldSale) -> PosResult<()> {
        let mut list = self.list()?;
        let id = sale.id.clone();

        let evicted = push_capped(&mut list, sale, self.capacity);
        for old in &evicted {
            info!(id = %old.id, label = %old.label, "Held sale evicted, list at capacity");
        }

        self.save(&list)?;
        debug!(id = %id, held = list.len(), "Held sale stored");
        Ok(())
    }

    fn delete(&self, id: &str) -> PosResult<Option<HeldSale>> {
        let mut list = self.list()?;
        let Some(pos) = list.iter().position(|s| s.id == id) else {
            return Ok(None);
        };

        let removed = list.remove(pos);
        self.save(&list)?;
        debug!(id = %id, held = list.len(), "Held sale removed");
        Ok(Some(removed))
    }
}
