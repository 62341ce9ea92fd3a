// ── Remote store ──
//
// `EntityStore` over the HTTP backend. Translation of transport errors
// happens in `CoreError`'s `From` impl.

use std::future::Future;

use tollgate_api::ApiClient;
use tracing::debug;

use super::{Entity, EntityStore};
use crate::error::CoreError;
use crate::model::EntityId;

#[derive(Clone)]
pub struct RemoteStore {
    client: ApiClient,
}

impl RemoteStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl EntityStore for RemoteStore {
    fn list_entities<E: Entity>(&self) -> impl Future<Output = Result<Vec<E>, CoreError>> + Send {
        async move {
            let items: Vec<E> = self.client.list_entities(E::KIND).await?;
            debug!(kind = %E::KIND, count = items.len(), "listed entities");
            Ok(items)
        }
    }

    fn create_entity<E: Entity>(
        &self,
        data: E::Create,
    ) -> impl Future<Output = Result<E, CoreError>> + Send {
        async move { Ok(self.client.create_entity(E::KIND, &data).await?) }
    }

    fn update_entity<E: Entity>(
        &self,
        id: &EntityId,
        patch: E::Patch,
    ) -> impl Future<Output = Result<E, CoreError>> + Send {
        let id = id.to_string();
        async move { Ok(self.client.update_entity(E::KIND, &id, &patch).await?) }
    }

    fn delete_entity<E: Entity>(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send {
        let id = id.to_string();
        async move { Ok(self.client.delete_entity(E::KIND, &id).await?) }
    }
}
