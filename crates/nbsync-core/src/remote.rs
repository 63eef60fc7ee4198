// ── Remote capability ──
//
// The importer and exporter only ever need five operations from a NetBox
// instance. `NetboxClient` provides them over HTTP; tests provide them
// from memory.

use std::future::Future;

use futures_util::Stream;

use nbsync_api::{Error as ApiError, NetboxClient, Object};

use crate::schema::Collection;

pub trait Remote: Sync {
    /// Confirm the instance is reachable and the token is accepted.
    fn verify(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Every object in `collection` matching all `filters`.
    fn list_by_filter(
        &self,
        collection: Collection,
        filters: &[(String, String)],
    ) -> impl Future<Output = Result<Vec<Object>, ApiError>> + Send;

    fn create(
        &self,
        collection: Collection,
        fields: &Object,
    ) -> impl Future<Output = Result<Object, ApiError>> + Send;

    /// Partial update; fields absent from `fields` are left untouched.
    fn update(
        &self,
        collection: Collection,
        id: i64,
        fields: &Object,
    ) -> impl Future<Output = Result<Object, ApiError>> + Send;

    /// Lazily stream every object in `collection`.
    fn iterate_all(
        &self,
        collection: Collection,
    ) -> impl Stream<Item = Result<Object, ApiError>> + Send + '_;
}

impl Remote for NetboxClient {
    async fn verify(&self) -> Result<(), ApiError> {
        self.status().await
    }

    async fn list_by_filter(
        &self,
        collection: Collection,
        filters: &[(String, String)],
    ) -> Result<Vec<Object>, ApiError> {
        self.list(collection.api_path(), filters).await
    }

    async fn create(&self, collection: Collection, fields: &Object) -> Result<Object, ApiError> {
        NetboxClient::create(self, collection.api_path(), fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: i64,
        fields: &Object,
    ) -> Result<Object, ApiError> {
        NetboxClient::update(self, collection.api_path(), id, fields).await
    }

    fn iterate_all(
        &self,
        collection: Collection,
    ) -> impl Stream<Item = Result<Object, ApiError>> + Send + '_ {
        self.iterate(collection.api_path())
    }
}
