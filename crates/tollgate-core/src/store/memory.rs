// ── In-memory entity store ──
//
// Concurrent JSON document store keyed by (kind, id). Documents keep an
// insertion sequence so listings come back in creation order. A second
// map indexes every voucher code ever assigned.

use std::future::{Future, ready};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Entity, EntityKind, EntityStore};
use crate::codegen::CodeTemplate;
use crate::error::CoreError;
use crate::model::EntityId;

const CODE_ATTEMPTS: usize = 64;

struct Document {
    seq: u64,
    body: Map<String, Value>,
}

/// Number of store calls made so far, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

impl CallCounts {
    /// Calls that would have written to a backend.
    pub fn writes(&self) -> usize {
        self.create + self.update + self.delete
    }
}

#[derive(Default)]
struct Counters {
    list: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

/// Process-local `EntityStore`.
///
/// Voucher codes are unique for the lifetime of the store: a code stays
/// reserved after its voucher is deleted. Code-less voucher creations get
/// a generated code.
pub struct MemoryStore {
    docs: DashMap<(EntityKind, String), Document>,
    codes: DashMap<String, EntityId>,
    next_seq: AtomicU64,
    counters: Counters,
    template: CodeTemplate,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_code_template(CodeTemplate::new("VOUCHER"))
    }

    /// Store that generates missing voucher codes from `template`.
    pub fn with_code_template(template: CodeTemplate) -> Self {
        Self {
            docs: DashMap::new(),
            codes: DashMap::new(),
            next_seq: AtomicU64::new(0),
            counters: Counters::default(),
            template,
        }
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.counters.list.load(Ordering::Relaxed),
            create: self.counters.create.load(Ordering::Relaxed),
            update: self.counters.update.load(Ordering::Relaxed),
            delete: self.counters.delete.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.docs.iter().filter(|e| e.key().0 == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Seed an existing record, bypassing the call counters.
    pub fn insert<E: Entity>(&self, entity: &E) -> Result<(), CoreError> {
        let body = to_document(entity)?;
        if E::KIND == EntityKind::Vouchers {
            let code = code_of(&body).ok_or_else(|| {
                CoreError::Internal("seeded voucher has no code".into())
            })?;
            self.reserve_code(&code, entity.id())?;
        }
        self.put(E::KIND, entity.id(), body);
        Ok(())
    }

    /// Mark `code` as taken without creating a voucher.
    pub fn reserve_code(&self, code: &str, owner: &EntityId) -> Result<(), CoreError> {
        match self.codes.entry(code.to_owned()) {
            Entry::Occupied(existing) if existing.get() != owner => Err(CoreError::Conflict {
                message: format!("voucher code {code} is already assigned"),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner.clone());
                Ok(())
            }
        }
    }

    fn put(&self, kind: EntityKind, id: &EntityId, body: Map<String, Value>) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.docs.insert((kind, id.to_string()), Document { seq, body });
    }

    fn unused_code(&self) -> Result<String, CoreError> {
        for _ in 0..CODE_ATTEMPTS {
            let code = self.template.generate();
            if !self.codes.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(CoreError::Internal(
            "could not find an unused voucher code".into(),
        ))
    }

    // ── Synchronous operations ───────────────────────────────────────

    fn list_now<E: Entity>(&self) -> Result<Vec<E>, CoreError> {
        self.counters.list.fetch_add(1, Ordering::Relaxed);

        let mut rows: Vec<(u64, Map<String, Value>)> = self
            .docs
            .iter()
            .filter(|e| e.key().0 == E::KIND)
            .map(|e| (e.value().seq, e.value().body.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        rows.into_iter().map(|(_, body)| from_document(body)).collect()
    }

    fn create_now<E: Entity>(&self, data: &E::Create) -> Result<E, CoreError> {
        self.counters.create.fetch_add(1, Ordering::Relaxed);

        let mut body = to_document(data)?;
        let id = EntityId::new_v4();
        body.insert("id".into(), to_value(&id)?);
        body.entry("createdAt").or_insert(to_value(&Utc::now())?);

        let code = if E::KIND == EntityKind::Vouchers {
            let code = match code_of(&body) {
                Some(code) => code,
                None => self.unused_code()?,
            };
            body.insert("code".into(), Value::String(code.clone()));
            Some(code)
        } else {
            None
        };

        let entity: E = from_document(body.clone())?;
        if let Some(code) = &code {
            self.reserve_code(code, &id)?;
        }
        self.put(E::KIND, &id, body);

        debug!(kind = %E::KIND, %id, code = code.as_deref(), "created entity");
        Ok(entity)
    }

    fn update_now<E: Entity>(&self, id: &EntityId, patch: &E::Patch) -> Result<E, CoreError> {
        self.counters.update.fetch_add(1, Ordering::Relaxed);

        let mut doc = self
            .docs
            .get_mut(&(E::KIND, id.to_string()))
            .ok_or_else(|| CoreError::not_found(E::KIND.path(), id))?;

        let mut merged = doc.body.clone();
        for (field, value) in to_document(patch)? {
            merged.insert(field, value);
        }
        merged.insert("updatedAt".into(), to_value(&Utc::now())?);

        if E::KIND == EntityKind::Vouchers {
            check_voucher_update(&doc.body, &merged)?;
        }

        let entity: E = from_document(merged.clone())?;
        doc.body = merged;
        Ok(entity)
    }

    fn delete_now<E: Entity>(&self, id: &EntityId) -> Result<(), CoreError> {
        self.counters.delete.fetch_add(1, Ordering::Relaxed);

        self.docs
            .remove(&(E::KIND, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found(E::KIND.path(), id))
    }
}

impl EntityStore for MemoryStore {
    fn list_entities<E: Entity>(&self) -> impl Future<Output = Result<Vec<E>, CoreError>> + Send {
        ready(self.list_now())
    }

    fn create_entity<E: Entity>(
        &self,
        data: E::Create,
    ) -> impl Future<Output = Result<E, CoreError>> + Send {
        ready(self.create_now::<E>(&data))
    }

    fn update_entity<E: Entity>(
        &self,
        id: &EntityId,
        patch: E::Patch,
    ) -> impl Future<Output = Result<E, CoreError>> + Send {
        ready(self.update_now::<E>(id, &patch))
    }

    fn delete_entity<E: Entity>(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send {
        ready(self.delete_now::<E>(id))
    }
}

// ── Document helpers ────────────────────────────────────────────────

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|e| CoreError::Internal(format!("encode: {e}")))
}

fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>, CoreError> {
    match to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::Internal(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn from_document<E: Entity>(body: Map<String, Value>) -> Result<E, CoreError> {
    serde_json::from_value(Value::Object(body)).map_err(|e| CoreError::Rejected {
        message: format!("invalid {} record: {e}", E::KIND),
    })
}

fn code_of(body: &Map<String, Value>) -> Option<String> {
    body.get("code")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
}

fn count_field(body: &Map<String, Value>, field: &str, default: u64) -> u64 {
    body.get(field).and_then(Value::as_u64).unwrap_or(default)
}

/// Codes are immutable and usage only ever grows, up to `maxUses`.
fn check_voucher_update(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
) -> Result<(), CoreError> {
    if code_of(before) != code_of(after) {
        return Err(CoreError::Rejected {
            message: "voucher codes cannot be changed".into(),
        });
    }

    let used_before = count_field(before, "usedCount", 0);
    let used_after = count_field(after, "usedCount", 0);
    let max_uses = count_field(after, "maxUses", 1);

    if used_after < used_before {
        return Err(CoreError::Rejected {
            message: format!("usedCount cannot decrease ({used_before} -> {used_after})"),
        });
    }
    if used_after > max_uses {
        return Err(CoreError::Rejected {
            message: format!("usedCount {used_after} exceeds maxUses {max_uses}"),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::{CreateVoucherRequest, VoucherPatch};
    use crate::model::Voucher;

    #[tokio::test]
    async fn generates_code_when_missing() {
        let store = MemoryStore::new();
        let v: Voucher = store.create_entity(CreateVoucherRequest::new("daily")).await.unwrap();

        assert!(v.code.starts_with("VOUCHER_"));
        assert_eq!(store.calls().create, 1);
        assert_eq!(store.len(EntityKind::Vouchers), 1);
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let store = MemoryStore::new();
        let mut req = CreateVoucherRequest::new("daily");
        req.code = Some("SAME_AAAAAA".into());

        store.create_entity::<Voucher>(req.clone()).await.unwrap();
        let err = store.create_entity::<Voucher>(req).await.unwrap_err();

        assert!(matches!(err, CoreError::Conflict { .. }));
        assert_eq!(store.len(EntityKind::Vouchers), 1);
    }

    #[tokio::test]
    async fn deleted_code_stays_reserved() {
        let store = MemoryStore::new();
        let mut req = CreateVoucherRequest::new("daily");
        req.code = Some("ONCE_BBBBBB".into());

        let v: Voucher = store.create_entity(req.clone()).await.unwrap();
        store.delete_entity::<Voucher>(&v.id).await.unwrap();

        let err = store.create_entity::<Voucher>(req).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn usage_cannot_shrink_or_overflow() {
        let store = MemoryStore::new();
        let v: Voucher = store.create_entity(CreateVoucherRequest::new("daily")).await.unwrap();

        let over = VoucherPatch {
            used_count: Some(2),
            ..VoucherPatch::default()
        };
        let err = store.update_entity::<Voucher>(&v.id, over).await.unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));

        let ok = VoucherPatch {
            used_count: Some(1),
            used: Some(true),
            ..VoucherPatch::default()
        };
        let updated: Voucher = store.update_entity(&v.id, ok).await.unwrap();
        assert_eq!(updated.used_count, 1);
        assert!(updated.updated_at.is_some());

        let back = VoucherPatch {
            used_count: Some(0),
            ..VoucherPatch::default()
        };
        assert!(store.update_entity::<Voucher>(&v.id, back).await.is_err());
    }

    #[tokio::test]
    async fn list_preserves_creation_order() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store.create_entity::<Voucher>(CreateVoucherRequest::new(key)).await.unwrap();
        }
        let listed: Vec<Voucher> = store.list_entities().await.unwrap();
        let keys: Vec<_> = listed.iter().map(|v| v.package_key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn missing_entity_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete_entity::<Voucher>(&EntityId::from("nope")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
