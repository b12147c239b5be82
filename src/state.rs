//! State compiler.
//!
//! A [`StateDef`] tree describes the reactive state of an app: each state
//! owns its fields, computed vars and substates. Substates see every var of
//! their ancestors; those inherited names are passed down the walk
//! explicitly so a substate never re-emits a parent's var.
//!
//! Two artifacts come out of it:
//! - the initial snapshot, with every deferred computed var resolved and
//!   keys sorted at every level, and
//! - the client storage map binding fields to cookies, local storage or
//!   session storage.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::constants::FIELD_MARKER;
use crate::runtime::{run_to_completion, ExecutionContext};
use crate::{CompileError, Result};

// ---------------------------------------------------------------------------
// Client storage markers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Cookie,
    LocalStorage,
    SessionStorage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    /// Initial value of the field.
    pub value: String,
    pub name: Option<String>,
    pub path: String,
    pub max_age: Option<u64>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub same_site: Option<String>,
}

impl Default for Cookie {
    fn default() -> Self {
        Self {
            value: String::new(),
            name: None,
            path: "/".to_string(),
            max_age: None,
            domain: None,
            secure: None,
            same_site: None,
        }
    }
}

impl Cookie {
    pub fn options(&self) -> Value {
        let mut options = Map::new();
        options.insert("path".into(), json!(self.path));
        insert_some(&mut options, "name", &self.name);
        insert_some(&mut options, "maxAge", &self.max_age);
        insert_some(&mut options, "domain", &self.domain);
        insert_some(&mut options, "secure", &self.secure);
        insert_some(&mut options, "sameSite", &self.same_site);
        Value::Object(options)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalStorage {
    pub value: String,
    pub name: Option<String>,
    /// Sync the value across browser tabs.
    pub sync: bool,
}

impl LocalStorage {
    pub fn options(&self) -> Value {
        let mut options = Map::new();
        insert_some(&mut options, "name", &self.name);
        if self.sync {
            options.insert("sync".into(), Value::Bool(true));
        }
        Value::Object(options)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStorage {
    pub value: String,
    pub name: Option<String>,
}

impl SessionStorage {
    pub fn options(&self) -> Value {
        let mut options = Map::new();
        insert_some(&mut options, "name", &self.name);
        Value::Object(options)
    }
}

fn insert_some<T: Serialize>(options: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        options.insert(key.to_string(), json!(value));
    }
}

/// A field's binding to one client storage backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientStorage {
    Cookie(Cookie),
    Local(LocalStorage),
    Session(SessionStorage),
}

impl ClientStorage {
    /// Backend with default options, for fields that only declare the type.
    pub fn default_for(kind: StorageKind) -> Self {
        match kind {
            StorageKind::Cookie => ClientStorage::Cookie(Cookie::default()),
            StorageKind::LocalStorage => ClientStorage::Local(LocalStorage::default()),
            StorageKind::SessionStorage => ClientStorage::Session(SessionStorage::default()),
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            ClientStorage::Cookie(_) => StorageKind::Cookie,
            ClientStorage::Local(_) => StorageKind::LocalStorage,
            ClientStorage::Session(_) => StorageKind::SessionStorage,
        }
    }

    pub fn options(&self) -> Value {
        match self {
            ClientStorage::Cookie(cookie) => cookie.options(),
            ClientStorage::Local(local) => local.options(),
            ClientStorage::Session(session) => session.options(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ClientStorage::Cookie(cookie) => &cookie.value,
            ClientStorage::Local(local) => &local.value,
            ClientStorage::Session(session) => &session.value,
        }
    }
}

// ---------------------------------------------------------------------------
// State definitions
// ---------------------------------------------------------------------------

/// Produces a computed var's initial value asynchronously.
pub type DeferredValue = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// A var's value as extracted from an initial-only state instance.
#[derive(Clone)]
pub enum InitialValue {
    Ready(Value),
    Deferred(DeferredValue),
}

impl fmt::Debug for InitialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialValue::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            InitialValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    Value(Value),
    Storage(ClientStorage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub default: FieldDefault,
    /// Storage backend named by the field's declared type, if any.
    pub storage_type: Option<StorageKind>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: FieldDefault::Value(default.into()),
            storage_type: None,
        }
    }

    /// Field whose default value is a client storage marker.
    pub fn storage(name: impl Into<String>, storage: ClientStorage) -> Self {
        Self {
            name: name.into(),
            default: FieldDefault::Storage(storage),
            storage_type: None,
        }
    }

    /// Field declared with a storage type but a plain default.
    pub fn typed(name: impl Into<String>, kind: StorageKind) -> Self {
        Self {
            name: name.into(),
            default: FieldDefault::Value(Value::String(String::new())),
            storage_type: Some(kind),
        }
    }

    /// The storage backend this field is bound to. The default value wins
    /// over the declared type.
    pub fn client_storage(&self) -> Option<ClientStorage> {
        match (&self.default, self.storage_type) {
            (FieldDefault::Storage(storage), _) => Some(storage.clone()),
            (FieldDefault::Value(_), Some(kind)) => Some(ClientStorage::default_for(kind)),
            (FieldDefault::Value(_), None) => None,
        }
    }

    pub fn initial_value(&self) -> Value {
        match &self.default {
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Storage(storage) => Value::String(storage.value().to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComputedVar {
    pub name: String,
    pub value: InitialValue,
}

/// One state in the tree. The state exclusively owns its substates.
#[derive(Debug, Clone)]
pub struct StateDef {
    pub name: String,
    /// Fields as seen by this state, possibly including inherited ones.
    pub fields: Vec<FieldDef>,
    pub computed: Vec<ComputedVar>,
    pub substates: Vec<StateDef>,
}

/// Raw snapshot: state full name → var name → possibly deferred value.
pub type Delta = IndexMap<String, IndexMap<String, InitialValue>>;

/// Snapshot with every deferred value resolved.
pub type ResolvedDelta = IndexMap<String, IndexMap<String, Value>>;

impl StateDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            computed: Vec::new(),
            substates: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_computed(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.computed.push(ComputedVar {
            name: name.into(),
            value: InitialValue::Ready(value.into()),
        });
        self
    }

    /// Computed var whose initial value is produced asynchronously.
    pub fn with_deferred<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync + 'static,
    {
        self.computed.push(ComputedVar {
            name: name.into(),
            value: InitialValue::Deferred(Arc::new(compute)),
        });
        self
    }

    pub fn with_substate(mut self, substate: StateDef) -> Self {
        self.substates.push(substate);
        self
    }

    fn var_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|field| field.name.as_str())
            .chain(self.computed.iter().map(|var| var.name.as_str()))
    }

    /// Pre-order walk yielding each state's full dotted name and the names
    /// it inherits from its ancestors.
    fn walk<'a>(
        &'a self,
        parent: Option<&str>,
        inherited: &HashSet<&'a str>,
        visit: &mut dyn FnMut(&str, &'a StateDef, &HashSet<&'a str>),
    ) {
        let full_name = match parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        };

        visit(&full_name, self, inherited);

        let mut passed_down = inherited.clone();
        passed_down.extend(self.var_names());
        for substate in &self.substates {
            substate.walk(Some(&full_name), &passed_down, visit);
        }
    }

    /// Extract the initial-only snapshot, leaving computed vars deferred.
    pub fn initial_delta(&self) -> Delta {
        let mut delta = Delta::new();
        self.walk(None, &HashSet::new(), &mut |full_name, state, inherited| {
            let vars = delta.entry(full_name.to_string()).or_default();
            for field in state
                .fields
                .iter()
                .filter(|field| !inherited.contains(field.name.as_str()))
            {
                vars.insert(field.name.clone(), InitialValue::Ready(field.initial_value()));
            }
            for var in state
                .computed
                .iter()
                .filter(|var| !inherited.contains(var.name.as_str()))
            {
                vars.insert(var.name.clone(), var.value.clone());
            }
        });
        delta
    }
}

// ---------------------------------------------------------------------------
// Delta resolution
// ---------------------------------------------------------------------------

/// Resolves every deferred value in a raw snapshot.
#[async_trait]
pub trait DeltaResolver: Send + Sync {
    async fn resolve_delta(&self, delta: Delta) -> Result<ResolvedDelta>;
}

/// Spawns every deferred value as its own task, then awaits them in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskResolver;

#[async_trait]
impl DeltaResolver for TaskResolver {
    async fn resolve_delta(&self, delta: Delta) -> Result<ResolvedDelta> {
        let mut resolved = ResolvedDelta::new();
        let mut pending = Vec::new();

        for (state_name, vars) in delta {
            let state_vars = resolved.entry(state_name.clone()).or_default();
            for (var_name, value) in vars {
                match value {
                    InitialValue::Ready(value) => {
                        state_vars.insert(var_name, value);
                    }
                    InitialValue::Deferred(compute) => {
                        // placeholder keeps the var's position
                        state_vars.insert(var_name.clone(), Value::Null);
                        pending.push((state_name.clone(), var_name, tokio::spawn(compute())));
                    }
                }
            }
        }

        for (state_name, var_name, task) in pending {
            let value = task.await.map_err(|err| {
                CompileError::StateResolution(format!("{}.{}: {}", state_name, var_name, err))
            })??;
            if let Some(state_vars) = resolved.get_mut(&state_name) {
                state_vars.insert(var_name, value);
            }
        }

        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile the initial state snapshot of `state` and all of its substates.
///
/// Deferred values are resolved through `resolver`, run to completion on a
/// worker when `context` says the caller is already inside a scheduler.
pub fn compile_state<R>(state: &StateDef, resolver: &R, context: ExecutionContext) -> Result<Value>
where
    R: DeltaResolver + ?Sized,
{
    let delta = state.initial_delta();
    let resolved = run_to_completion(context, resolver.resolve_delta(delta))?;

    tracing::info!(
        root = %state.name,
        states = resolved.len(),
        "compiled initial state"
    );

    Ok(sorted_keys(serde_json::to_value(resolved)?))
}

/// Rebuild every object in `value` with its keys in sorted order.
pub fn sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_keys).collect()),
        other => other,
    }
}

/// Client storage bindings, one bucket per backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientStorageMap {
    pub cookies: IndexMap<String, Value>,
    pub local_storage: IndexMap<String, Value>,
    pub session_storage: IndexMap<String, Value>,
}

/// Collect the client storage options of every field of `state` and its
/// substates, keyed `"{state_full_name}.{field}"` plus the field marker.
///
/// Fields bound to no backend are skipped; inherited fields are only
/// emitted by the state that declares them.
pub fn compile_client_storage(state: &StateDef) -> ClientStorageMap {
    let mut storage = ClientStorageMap::default();

    state.walk(None, &HashSet::new(), &mut |full_name, state, inherited| {
        for field in state
            .fields
            .iter()
            .filter(|field| !inherited.contains(field.name.as_str()))
        {
            let key = format!("{}.{}{}", full_name, field.name, FIELD_MARKER);
            let Some(backend) = field.client_storage() else {
                tracing::debug!(field = %key, "no client storage backend, skipping");
                continue;
            };
            let bucket = match backend.kind() {
                StorageKind::Cookie => &mut storage.cookies,
                StorageKind::LocalStorage => &mut storage.local_storage,
                StorageKind::SessionStorage => &mut storage.session_storage,
            };
            bucket.insert(key, backend.options());
        }
    });

    tracing::debug!(
        cookies = storage.cookies.len(),
        local_storage = storage.local_storage.len(),
        session_storage = storage.session_storage.len(),
        "compiled client storage"
    );

    storage
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn app_state() -> StateDef {
        StateDef::new("state")
            .with_field(FieldDef::new("count", 0))
            .with_field(FieldDef::storage(
                "token",
                ClientStorage::Cookie(Cookie {
                    max_age: Some(3600),
                    ..Default::default()
                }),
            ))
            .with_substate(
                StateDef::new("settings")
                    // inherited from the parent, must not be re-emitted
                    .with_field(FieldDef::storage(
                        "token",
                        ClientStorage::Cookie(Cookie::default()),
                    ))
                    .with_field(FieldDef::typed("theme", StorageKind::LocalStorage))
                    .with_field(FieldDef::storage(
                        "draft",
                        ClientStorage::Session(SessionStorage {
                            name: Some("draft_key".into()),
                            ..Default::default()
                        }),
                    )),
            )
    }

    #[test]
    fn test_cookie_options() {
        let cookie = Cookie {
            max_age: Some(60),
            same_site: Some("strict".into()),
            ..Default::default()
        };
        assert_eq!(
            cookie.options(),
            json!({"path": "/", "maxAge": 60, "sameSite": "strict"})
        );
    }

    #[test]
    fn test_client_storage_partition() {
        let storage = compile_client_storage(&app_state());
        let token_key = format!("state.token{}", FIELD_MARKER);
        assert_eq!(storage.cookies.len(), 1);
        assert_eq!(storage.cookies[&token_key], json!({"path": "/", "maxAge": 3600}));

        let theme_key = format!("state.settings.theme{}", FIELD_MARKER);
        assert_eq!(storage.local_storage[&theme_key], json!({}));

        let draft_key = format!("state.settings.draft{}", FIELD_MARKER);
        assert_eq!(storage.session_storage[&draft_key], json!({"name": "draft_key"}));
    }

    #[test]
    fn test_plain_fields_are_not_storage() {
        let storage = compile_client_storage(&StateDef::new("state").with_field(FieldDef::new("n", 1)));
        assert_eq!(storage, ClientStorageMap::default());
    }

    #[test]
    fn test_initial_delta_skips_inherited() {
        let delta = app_state().initial_delta();
        assert!(delta["state"].contains_key("token"));
        assert!(!delta["state.settings"].contains_key("token"));
        assert!(delta["state.settings"].contains_key("theme"));
    }

    #[test]
    fn test_compile_state_resolves_and_sorts() {
        let state = StateDef::new("state")
            .with_field(FieldDef::new("zeta", 1))
            .with_field(FieldDef::new("alpha", json!({"y": 2, "x": 1})))
            .with_deferred("total", || async { Ok(json!(10)) }.boxed());

        let snapshot = compile_state(&state, &TaskResolver, ExecutionContext::Blocking).unwrap();
        assert_eq!(snapshot["state"]["total"], 10);

        let keys: Vec<_> = snapshot["state"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["alpha", "total", "zeta"]);
        let nested: Vec<_> = snapshot["state"]["alpha"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(nested, vec!["x", "y"]);
    }

    #[test]
    fn test_deferred_failure_surfaces() {
        let state = StateDef::new("state").with_deferred("broken", || {
            async { Err(CompileError::StateResolution("no backend".into())) }.boxed()
        });
        let result = compile_state(&state, &TaskResolver, ExecutionContext::Blocking);
        assert!(matches!(result, Err(CompileError::StateResolution(_))));
    }
}
