mod conflict;
mod decorate;
mod error;
mod mutations;
mod queries;
mod validation;

pub use conflict::{
    check_booking, scan_conflicts, validate_range, ConflictPolicy, END_CONFLICT,
    END_NOT_AFTER_START, START_CONFLICT, START_IN_PAST,
};
pub use decorate::{average_stars, decorate_spot, preview_image, rating};
pub use error::{EngineError, EntityKind, FieldErrors};

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use ulid::{Generator, Ulid};

use crate::model::*;

pub type SharedSpotState = Arc<RwLock<SpotState>>;

/// In-memory rental store. Each spot carries its own lock; everything that
/// must be consistent for one spot (bookings, reviews, images) lives behind it.
pub struct Engine {
    pub(super) users: DashMap<Ulid, User>,
    pub(super) spots: DashMap<Ulid, SharedSpotState>,
    /// Reverse lookup: review id → spot id
    pub(super) review_to_spot: DashMap<Ulid, Ulid>,
    pub(super) policy: ConflictPolicy,
    /// Monotonic so ids sort in creation order even within one millisecond.
    ids: Mutex<Generator>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ConflictPolicy::default())
    }
}

impl Engine {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            users: DashMap::new(),
            spots: DashMap::new(),
            review_to_spot: DashMap::new(),
            policy,
            ids: Mutex::new(Generator::new()),
        }
    }

    pub(super) fn next_id(&self) -> Ulid {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        // Overflow needs 2^80 ids in one millisecond; fall back to a random id.
        ids.generate().unwrap_or_else(|_| Ulid::new())
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn get_user(&self, id: &Ulid) -> Option<User> {
        self.users.get(id).map(|e| e.value().clone())
    }

    pub fn get_spot(&self, id: &Ulid) -> Option<SharedSpotState> {
        self.spots.get(id).map(|e| e.value().clone())
    }

    pub fn spot_count(&self) -> usize {
        self.spots.len()
    }

    pub(super) fn require_user(&self, id: Ulid) -> Result<User, EngineError> {
        self.get_user(&id)
            .ok_or(EngineError::not_found(EntityKind::User, id))
    }

    /// Snapshot of every spot handle, ordered by id (creation order).
    /// Never hold DashMap refs across an await.
    pub(super) fn spot_handles(&self) -> Vec<SharedSpotState> {
        let mut handles: Vec<(Ulid, SharedSpotState)> = self
            .spots
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        handles.sort_by_key(|(id, _)| *id);
        handles.into_iter().map(|(_, rs)| rs).collect()
    }

    /// Lookup spot, acquire write lock. A spot deleted while we waited counts
    /// as missing.
    pub(super) async fn spot_write(
        &self,
        id: Ulid,
    ) -> Result<OwnedRwLockWriteGuard<SpotState>, EngineError> {
        let rs = self
            .get_spot(&id)
            .ok_or(EngineError::not_found(EntityKind::Spot, id))?;
        let guard = rs.write_owned().await;
        if guard.deleted {
            return Err(EngineError::not_found(EntityKind::Spot, id));
        }
        Ok(guard)
    }

    pub(super) async fn spot_read(
        &self,
        id: Ulid,
    ) -> Result<OwnedRwLockReadGuard<SpotState>, EngineError> {
        let rs = self
            .get_spot(&id)
            .ok_or(EngineError::not_found(EntityKind::Spot, id))?;
        let guard = rs.read_owned().await;
        if guard.deleted {
            return Err(EngineError::not_found(EntityKind::Spot, id));
        }
        Ok(guard)
    }
}
