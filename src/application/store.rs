use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    entities::{Apartment, Client, Commercial, Deal, District, Entity, Land, Metro, User, View},
    error::ApiError,
    page::{Page, PageRequest},
    ports::Transport,
    request::{collection_path, member_path, ApiRequest, MultipartBody},
};

/// Large page used by screens that page through one fetch locally.
pub const FETCH_ALL_LIMIT: u32 = 1000;

/// A patched field and the values to try for it, in order.
type FieldPatch = (String, Vec<Value>);

/// Last known state of one resource collection.
#[derive(Debug, Clone)]
pub struct StoreState<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            loading: false,
            error: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EntityStore
// ─────────────────────────────────────────────────────────────────────────────

/// CRUD cache for one backend resource.
///
/// Every operation clears `error`, performs exactly one request, and then
/// either updates `items` (replace on fetch, local patch on create, update and
/// delete) or records the error message and leaves `items` untouched. Nothing
/// is retried and a failed mutation is not rolled back on the server.
pub struct EntityStore<T: Entity> {
    transport: Arc<dyn Transport>,
    state: StoreState<T>,
}

impl<T: Entity> EntityStore<T> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: StoreState::default(),
        }
    }

    pub fn state(&self) -> &StoreState<T> {
        &self.state
    }

    pub fn items(&self) -> &[T] {
        &self.state.items
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn find(&self, id: i64) -> Option<&T> {
        self.state.items.iter().find(|item| item.id() == id)
    }

    /// Fetch one server-side page and replace the cached items with it.
    pub async fn fetch(&mut self, page: &PageRequest) -> Result<&[T], ApiError> {
        self.fetch_with(page, Vec::new()).await
    }

    /// Like [`fetch`](Self::fetch) with extra filter parameters.
    pub async fn fetch_with(
        &mut self,
        page: &PageRequest,
        filters: Vec<(String, String)>,
    ) -> Result<&[T], ApiError> {
        let mut query = page.query();
        query.extend(filters);
        let request = ApiRequest::get(collection_path(T::RESOURCE)).with_query(query);

        let value = self.send(request).await?;
        let page: Page<T> = self.decode(value)?;
        debug!(resource = T::RESOURCE, items = page.items.len(), count = page.count, "fetched");
        self.state.items = page.items;
        self.state.count = page.count;
        Ok(&self.state.items)
    }

    /// Fetch one large page for client-side paging.
    pub async fn fetch_all(&mut self) -> Result<&[T], ApiError> {
        self.fetch(&PageRequest::new(1, FETCH_ALL_LIMIT)).await
    }

    /// Create from a JSON body. Returns the created record when the backend
    /// echoes it back.
    pub async fn create(&mut self, body: &impl Serialize) -> Result<Option<T>, ApiError> {
        let request = ApiRequest::post_json(collection_path(T::RESOURCE), body)?;
        self.finish_create(request).await
    }

    /// Create with attachments.
    pub async fn create_multipart(&mut self, body: MultipartBody) -> Result<Option<T>, ApiError> {
        let request = ApiRequest::post_multipart(collection_path(T::RESOURCE), body);
        self.finish_create(request).await
    }

    /// Partial update from a JSON body.
    pub async fn update(&mut self, id: i64, body: &impl Serialize) -> Result<Option<T>, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let patch = match &body {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), vec![v.clone()])).collect(),
            _ => Vec::new(),
        };
        let request = ApiRequest::patch_json(member_path(T::RESOURCE, id), &body)?;
        self.finish_update(id, request, patch).await
    }

    /// Partial update with attachments.
    pub async fn update_multipart(
        &mut self,
        id: i64,
        body: MultipartBody,
    ) -> Result<Option<T>, ApiError> {
        let patch = body
            .fields
            .iter()
            .map(|(k, text)| (k.clone(), text_candidates(text)))
            .collect();
        let request = ApiRequest::patch_multipart(member_path(T::RESOURCE, id), body);
        self.finish_update(id, request, patch).await
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(member_path(T::RESOURCE, id)))
            .await?;
        let before = self.state.items.len();
        self.state.items.retain(|item| item.id() != id);
        if self.state.items.len() < before {
            self.state.count = self.state.count.saturating_sub(1);
        }
        Ok(())
    }

    async fn finish_create(&mut self, request: ApiRequest) -> Result<Option<T>, ApiError> {
        let value = self.send(request).await?;
        if value.is_null() {
            debug!(resource = T::RESOURCE, "create returned no body");
            return Ok(None);
        }
        match serde_json::from_value::<T>(value) {
            Ok(created) => {
                self.state.items.push(created.clone());
                self.state.count += 1;
                Ok(Some(created))
            }
            Err(e) => {
                warn!(resource = T::RESOURCE, error = %e, "created record not decodable, cache left as is");
                Ok(None)
            }
        }
    }

    async fn finish_update(
        &mut self,
        id: i64,
        request: ApiRequest,
        patch: Vec<FieldPatch>,
    ) -> Result<Option<T>, ApiError> {
        let value = self.send(request).await?;
        if !value.is_null() {
            match serde_json::from_value::<T>(value) {
                Ok(updated) => {
                    if let Some(slot) = self.state.items.iter_mut().find(|i| i.id() == id) {
                        *slot = updated.clone();
                    }
                    return Ok(Some(updated));
                }
                Err(e) => {
                    warn!(resource = T::RESOURCE, id, error = %e, "updated record not decodable, patching locally");
                }
            }
        }
        self.patch_local(id, patch);
        Ok(self.find(id).cloned())
    }

    /// Merge `patch` into the cached item field by field. For each field the
    /// first value the record type accepts wins; a field nothing fits keeps
    /// its cached value.
    fn patch_local(&mut self, id: i64, patch: Vec<FieldPatch>) {
        let Some(slot) = self.state.items.iter_mut().find(|i| i.id() == id) else {
            return;
        };
        let Ok(Value::Object(mut current)) = serde_json::to_value(&*slot) else {
            return;
        };
        let mut merged = None;
        for (key, candidates) in patch {
            let previous = current.get(&key).cloned();
            let fitted = candidates.into_iter().find_map(|candidate| {
                current.insert(key.clone(), candidate);
                serde_json::from_value::<T>(Value::Object(current.clone())).ok()
            });
            match fitted {
                Some(record) => merged = Some(record),
                None => {
                    match previous {
                        Some(v) => current.insert(key.clone(), v),
                        None => current.remove(&key),
                    };
                    debug!(resource = T::RESOURCE, id, field = %key, "patch value does not fit, skipped");
                }
            }
        }
        if let Some(record) = merged {
            *slot = record;
        }
    }

    async fn send(&mut self, request: ApiRequest) -> Result<Value, ApiError> {
        self.state.loading = true;
        self.state.error = None;
        let result = self.transport.send(request).await;
        self.state.loading = false;
        result.map_err(|e| self.fail(e))
    }

    fn decode<R: serde::de::DeserializeOwned>(&mut self, value: Value) -> Result<R, ApiError> {
        serde_json::from_value(value).map_err(|e| self.fail(ApiError::Decode(e.to_string())))
    }

    fn fail(&mut self, err: ApiError) -> ApiError {
        warn!(resource = T::RESOURCE, error = %err, "store operation failed");
        self.state.error = Some(err.user_message());
        err
    }
}

/// Typed readings of a multipart text field: the JSON literal it spells
/// (number, bool, null) first, then the raw text.
fn text_candidates(text: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) if !parsed.is_string() => vec![parsed, Value::String(text.to_string())],
        _ => vec![Value::String(text.to_string())],
    }
}

pub fn apartments(transport: Arc<dyn Transport>) -> EntityStore<Apartment> {
    EntityStore::new(transport)
}

pub fn lands(transport: Arc<dyn Transport>) -> EntityStore<Land> {
    EntityStore::new(transport)
}

pub fn commercials(transport: Arc<dyn Transport>) -> EntityStore<Commercial> {
    EntityStore::new(transport)
}

pub fn clients(transport: Arc<dyn Transport>) -> EntityStore<Client> {
    EntityStore::new(transport)
}

pub fn deals(transport: Arc<dyn Transport>) -> EntityStore<Deal> {
    EntityStore::new(transport)
}

pub fn views(transport: Arc<dyn Transport>) -> EntityStore<View> {
    EntityStore::new(transport)
}

pub fn users(transport: Arc<dyn Transport>) -> EntityStore<User> {
    EntityStore::new(transport)
}

pub fn metros(transport: Arc<dyn Transport>) -> EntityStore<Metro> {
    EntityStore::new(transport)
}

pub fn districts(transport: Arc<dyn Transport>) -> EntityStore<District> {
    EntityStore::new(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Detail;
    use crate::domain::request::Method;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // ── Helper: scripted transport that replays canned answers ──

    #[derive(Default)]
    struct Scripted {
        answers: Mutex<VecDeque<Result<Value, ApiError>>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Scripted {
        fn with(answers: Vec<Result<Value, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                seen: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
            self.seen.lock().unwrap().push(request);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    fn districts_page() -> Value {
        json!({"results": [{"id": 1, "name": "Yunusobod"}, {"id": 2, "name": "Chilonzor"}], "count": 2})
    }

    fn backend_error(msg: &str) -> ApiError {
        ApiError::Backend {
            status: 400,
            detail: Detail::Message(msg.into()),
        }
    }

    #[tokio::test]
    async fn fetch_replaces_items_and_sends_page_params() {
        let t = Scripted::with(vec![Ok(districts_page())]);
        let mut store = districts(t.clone());
        store.fetch(&PageRequest::new(2, 5)).await.unwrap();

        assert_eq!(store.items().len(), 2);
        assert_eq!(store.state().count, 2);
        assert!(!store.state().loading);
        let seen = t.seen.lock().unwrap();
        assert_eq!(seen[0].path, "district/");
        assert_eq!(
            seen[0].query,
            vec![("page".into(), "2".into()), ("limit".into(), "5".into())]
        );
    }

    #[tokio::test]
    async fn create_appends_created_item() {
        let t = Scripted::with(vec![
            Ok(districts_page()),
            Ok(json!({"id": 3, "name": "Sergeli"})),
        ]);
        let mut store = districts(t.clone());
        store.fetch_all().await.unwrap();
        let created = store.create(&json!({"name": "Sergeli"})).await.unwrap();

        assert_eq!(created.unwrap().id, 3);
        assert!(store.find(3).is_some());
        assert_eq!(store.state().count, 3);
        assert_eq!(t.seen.lock().unwrap()[1].method, Method::Post);
    }

    #[tokio::test]
    async fn delete_removes_item() {
        let t = Scripted::with(vec![Ok(districts_page()), Ok(Value::Null)]);
        let mut store = districts(t);
        store.fetch_all().await.unwrap();
        store.delete(1).await.unwrap();

        assert!(store.find(1).is_none());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.state().count, 1);
    }

    #[tokio::test]
    async fn failed_operations_keep_items_and_set_error() {
        let t = Scripted::with(vec![
            Ok(districts_page()),
            Err(backend_error("Not found.")),
            Err(ApiError::Network("connection refused".into())),
        ]);
        let mut store = districts(t);
        store.fetch_all().await.unwrap();

        assert!(store.delete(1).await.is_err());
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.error(), Some("Не найдено"));

        assert!(store.update(2, &json!({"name": "X"})).await.is_err());
        assert_eq!(store.find(2).unwrap().name, "Chilonzor");
        assert!(store.error().unwrap().contains("Ошибка сети"));
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn update_without_body_patches_locally() {
        let t = Scripted::with(vec![Ok(districts_page()), Ok(Value::Null)]);
        let mut store = districts(t);
        store.fetch_all().await.unwrap();
        let updated = store.update(2, &json!({"name": "Olmazor"})).await.unwrap();

        assert_eq!(updated.unwrap().name, "Olmazor");
        assert_eq!(store.find(2).unwrap().name, "Olmazor");
    }

    #[tokio::test]
    async fn update_with_body_replaces_item() {
        let t = Scripted::with(vec![
            Ok(districts_page()),
            Ok(json!({"id": 1, "name": "Mirobod"})),
        ]);
        let mut store = districts(t);
        store.fetch_all().await.unwrap();
        store.update(1, &json!({"name": "ignored"})).await.unwrap();
        assert_eq!(store.find(1).unwrap().name, "Mirobod");
    }

    fn apartments_page() -> Value {
        json!({"results": [{"id": 1, "title": "Old", "rooms": 2, "furnished": false}], "count": 1})
    }

    #[tokio::test]
    async fn multipart_update_patches_typed_fields() {
        let t = Scripted::with(vec![Ok(apartments_page()), Ok(Value::Null)]);
        let mut store = apartments(t.clone());
        store.fetch_all().await.unwrap();

        let body = MultipartBody {
            fields: vec![
                ("title".into(), "New".into()),
                ("rooms".into(), "3".into()),
                ("furnished".into(), "true".into()),
                ("address".into(), "42".into()),
                ("owner_phone".into(), "+998901234567".into()),
                ("price".into(), "not a number".into()),
            ],
            files: Vec::new(),
        };
        let returned = store.update_multipart(1, body).await.unwrap().unwrap();

        assert_eq!(returned.title.as_deref(), Some("New"));
        let cached = store.find(1).unwrap();
        assert_eq!(cached.title.as_deref(), Some("New"));
        assert_eq!(cached.rooms, Some(3));
        assert!(cached.furnished);
        assert_eq!(cached.address.as_deref(), Some("42"));
        assert_eq!(cached.owner_phone.as_deref(), Some("+998901234567"));
        assert_eq!(cached.price, None);
        assert_eq!(t.seen.lock().unwrap()[1].method, Method::Patch);
    }

    #[tokio::test]
    async fn multipart_create_appends_echoed_record() {
        let t = Scripted::with(vec![
            Ok(apartments_page()),
            Ok(json!({"id": 2, "title": "Fresh", "rooms": 1})),
        ]);
        let mut store = apartments(t.clone());
        store.fetch_all().await.unwrap();

        let body = MultipartBody {
            fields: vec![("title".into(), "Fresh".into())],
            files: Vec::new(),
        };
        let created = store.create_multipart(body).await.unwrap().unwrap();

        assert_eq!(created.id, 2);
        assert_eq!(store.state().count, 2);
        let seen = t.seen.lock().unwrap();
        assert_eq!(seen[1].path, "apartment/");
        assert_eq!(seen[1].method, Method::Post);
    }

    #[tokio::test]
    async fn undecodable_echo_is_not_a_failure() {
        let t = Scripted::with(vec![
            Ok(districts_page()),
            Ok(json!({"status": "ok"})),
            Ok(json!({"status": "ok"})),
        ]);
        let mut store = districts(t);
        store.fetch_all().await.unwrap();

        let created = store.create(&json!({"name": "Sergeli"})).await.unwrap();
        assert!(created.is_none());
        assert!(store.error().is_none());
        assert_eq!(store.items().len(), 2);

        let updated = store.update(2, &json!({"name": "Olmazor"})).await.unwrap();
        assert_eq!(updated.unwrap().name, "Olmazor");
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn next_success_clears_previous_error() {
        let t = Scripted::with(vec![Err(backend_error("boom")), Ok(districts_page())]);
        let mut store = districts(t);
        assert!(store.fetch_all().await.is_err());
        assert_eq!(store.error(), Some("boom"));
        store.fetch_all().await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn malformed_page_is_a_decode_error() {
        let t = Scripted::with(vec![Ok(json!({"results": [{"nope": true}]}))]);
        let mut store = districts(t);
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(store.error().is_some());
    }
}
