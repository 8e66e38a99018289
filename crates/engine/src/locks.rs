//! Per-campaign exclusive access.
//!
//! Every read-modify-write of a campaign row (spend, sweep update, deletion)
//! holds that campaign's lock for the whole sequence. Locks are scoped to one
//! campaign; nothing ever locks across campaigns except deletion, which takes
//! the locks it needs in id order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Held while a campaign row is being read, decided on and written.
pub(crate) type CampaignGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub(crate) struct CampaignLocks {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl CampaignLocks {
    fn slot(&self, campaign_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(campaign_id).or_default())
    }

    /// Wait at most `timeout` for exclusive access to `campaign_id`.
    pub(crate) async fn acquire(
        &self,
        campaign_id: Uuid,
        timeout: Duration,
    ) -> ResultEngine<CampaignGuard> {
        let slot = self.slot(campaign_id);
        tokio::time::timeout(timeout, slot.lock_owned())
            .await
            .map_err(|_| EngineError::LockTimeout(campaign_id.to_string()))
    }

    /// Lock several campaigns for a multi-row operation, in id order.
    pub(crate) async fn acquire_many(
        &self,
        mut campaign_ids: Vec<Uuid>,
        timeout: Duration,
    ) -> ResultEngine<Vec<CampaignGuard>> {
        campaign_ids.sort_unstable();
        campaign_ids.dedup();
        let mut guards = Vec::with_capacity(campaign_ids.len());
        for id in campaign_ids {
            guards.push(self.acquire(id, timeout).await?);
        }
        Ok(guards)
    }

    /// Drop the slot of a deleted campaign.
    pub(crate) fn forget(&self, campaign_id: Uuid) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(&campaign_id);
    }
}
