// ── Persistence seam ──
//
// Everything the core persists goes through `EntityStore`. Two
// implementations ship: `RemoteStore` over the HTTP backend and
// `MemoryStore` for tests and offline use. Each call is a single
// attempt; retries belong to the caller.
//
// Contract shared by every implementation: a voucher code, once
// assigned, is never handed to a different voucher. Creating a voucher
// with a taken code fails with `CoreError::Conflict`.

mod memory;
mod remote;

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use memory::{CallCounts, MemoryStore};
pub use remote::RemoteStore;
pub use tollgate_api::EntityKind;

use crate::command::{
    CreateSubscriptionRequest, CreateVoucherRequest, SubscriptionPatch, VoucherPatch,
};
use crate::error::CoreError;
use crate::model::{EntityId, Payment, Subscription, Voucher};

// ── Entity ──────────────────────────────────────────────────────────

/// A persisted record type and the payloads used to write it.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    type Create: Serialize + Clone + Send + Sync;
    type Patch: Serialize + Clone + Send + Sync;

    fn id(&self) -> &EntityId;
}

/// Payload type for collections the core never writes.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum ReadOnly {}

impl Entity for Voucher {
    const KIND: EntityKind = EntityKind::Vouchers;
    type Create = CreateVoucherRequest;
    type Patch = VoucherPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Entity for Subscription {
    const KIND: EntityKind = EntityKind::Subscriptions;
    type Create = CreateSubscriptionRequest;
    type Patch = SubscriptionPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Entity for Payment {
    const KIND: EntityKind = EntityKind::Payments;
    type Create = ReadOnly;
    type Patch = ReadOnly;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ── EntityStore ─────────────────────────────────────────────────────

pub trait EntityStore: Send + Sync {
    fn list_entities<E: Entity>(&self) -> impl Future<Output = Result<Vec<E>, CoreError>> + Send;

    fn create_entity<E: Entity>(
        &self,
        data: E::Create,
    ) -> impl Future<Output = Result<E, CoreError>> + Send;

    fn update_entity<E: Entity>(
        &self,
        id: &EntityId,
        patch: E::Patch,
    ) -> impl Future<Output = Result<E, CoreError>> + Send;

    fn delete_entity<E: Entity>(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}
