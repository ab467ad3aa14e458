//! In-memory stand-in for the management API.
//!
//! Stores objects by request path and shapes GET responses the way the
//! broker does (including `[""]` tag placeholders and runtime-only fields).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use warren_client::api::encode_segment;
use warren_client::{ApiError, BoxFuture, Created, ManagementApi, ObjectKey, ObjectKind};
use warren_provisioner::{Attributes, Registry};

#[derive(Default)]
pub struct FakeBroker {
    objects: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
}

impl FakeBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed or overwrite an object behind the reconciler's back.
    pub fn put_raw(&self, key: &ObjectKey, value: Value) {
        self.objects.lock().unwrap().insert(key.path(), value);
    }

    pub fn get_raw(&self, key: &ObjectKey) -> Option<Value> {
        self.objects.lock().unwrap().get(&key.path()).cloned()
    }

    /// Delete an object out-of-band.
    pub fn remove_raw(&self, key: &ObjectKey) -> Option<Value> {
        self.objects.lock().unwrap().remove(&key.path())
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.lock().unwrap().contains_key(&key.path())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Make every mutating call on `key` fail with `status`.
    pub fn fail_mutations(&self, key: &ObjectKey, status: u16, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(key.path(), (status, body.to_string()));
    }

    /// Calls recorded as `"METHOD path"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("GET "))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, method: &str, key: &ObjectKey) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{method} {}", key.path()));
    }

    fn injected_failure(&self, key: &ObjectKey) -> Option<ApiError> {
        self.failures
            .lock()
            .unwrap()
            .get(&key.path())
            .map(|(status, body)| ApiError::Status {
                status: *status,
                body: body.clone(),
            })
    }

    fn store(&self, key: &ObjectKey, body: &Value) -> Created {
        if key.kind == ObjectKind::Binding {
            let routing_key = body["routing_key"].as_str().unwrap_or_default();
            let properties_key = if routing_key.is_empty() {
                "~".to_string()
            } else {
                routing_key.to_string()
            };
            let object_key = key.child(properties_key.clone());
            let value = materialize(&object_key, body);
            self.objects.lock().unwrap().insert(object_key.path(), value);
            return Created {
                location: Some(format!("../../../../{}", encode_segment(&properties_key))),
            };
        }

        let value = materialize(key, body);
        self.objects.lock().unwrap().insert(key.path(), value);
        Created::default()
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: r#"{"error":"Object Not Found","reason":"Not Found"}"#.to_string(),
    }
}

/// Broker-shaped object for a stored request body.
fn materialize(key: &ObjectKey, body: &Value) -> Value {
    let seg = |i: usize| key.segments.get(i).cloned().unwrap_or_default();
    match key.kind {
        ObjectKind::Vhost => json!({"name": seg(0), "tracing": false}),
        ObjectKind::User => {
            // The broker echoes the raw split, placeholders included.
            let tags: Vec<&str> = body["tags"].as_str().unwrap_or_default().split(',').collect();
            json!({
                "name": seg(0),
                "password_hash": "kI3GCqW5JLMJa4iX1lo7X4D6XbYqlLgxIs30+P6tENUV2POR",
                "hashing_algorithm": "rabbit_password_hashing_sha256",
                "tags": tags,
            })
        }
        ObjectKind::Permissions => json!({
            "vhost": seg(0),
            "user": seg(1),
            "configure": body["configure"],
            "write": body["write"],
            "read": body["read"],
        }),
        ObjectKind::Exchange => json!({
            "vhost": seg(0),
            "name": seg(1),
            "type": body["type"],
            "durable": body["durable"],
            "auto_delete": body["auto_delete"],
            "internal": body["internal"],
            "arguments": body["arguments"],
            "user_who_performed_action": "admin",
        }),
        ObjectKind::Queue => json!({
            "vhost": seg(0),
            "name": seg(1),
            "durable": body["durable"],
            "auto_delete": body["auto_delete"],
            "arguments": body["arguments"],
            "type": "classic",
            "messages": 0,
            "consumers": 0,
            "state": "running",
        }),
        ObjectKind::Binding => json!({
            "vhost": seg(0),
            "source": seg(2),
            "destination": seg(4),
            "destination_type": if seg(3) == "q" { "queue" } else { "exchange" },
            "routing_key": body["routing_key"],
            "arguments": body["arguments"],
            "properties_key": seg(5),
        }),
        ObjectKind::Policy => json!({
            "vhost": seg(0),
            "name": seg(1),
            "pattern": body["pattern"],
            "priority": body["priority"],
            "apply-to": body["apply-to"],
            "definition": body["definition"],
        }),
    }
}

impl ManagementApi for FakeBroker {
    fn get(&self, key: &ObjectKey) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.record("GET", key);
        let found = self.get_raw(key);
        Box::pin(async move { found.ok_or_else(not_found) })
    }

    fn create(&self, key: &ObjectKey, body: &Value) -> BoxFuture<'_, Result<Created, ApiError>> {
        let method = if key.kind == ObjectKind::Binding { "POST" } else { "PUT" };
        self.record(method, key);
        let result = match self.injected_failure(key) {
            Some(err) => Err(err),
            None => Ok(self.store(key, body)),
        };
        Box::pin(async move { result })
    }

    fn update(&self, key: &ObjectKey, body: &Value) -> BoxFuture<'_, Result<(), ApiError>> {
        self.record("PUT", key);
        let result = match self.injected_failure(key) {
            Some(err) => Err(err),
            None => {
                self.store(key, body);
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn delete(&self, key: &ObjectKey) -> BoxFuture<'_, Result<(), ApiError>> {
        self.record("DELETE", key);
        let result = match self.injected_failure(key) {
            Some(err) => Err(err),
            None => self
                .objects
                .lock()
                .unwrap()
                .remove(&key.path())
                .map(|_| ())
                .ok_or_else(not_found),
        };
        Box::pin(async move { result })
    }
}

pub fn registry(broker: &Arc<FakeBroker>) -> Registry {
    Registry::new(broker.clone())
}

/// `json!({...})` → `Attributes`.
pub fn attrs(value: Value) -> Attributes {
    value.as_object().cloned().expect("attributes must be a JSON object")
}

pub fn key<const N: usize>(kind: ObjectKind, segments: [&str; N]) -> ObjectKey {
    ObjectKey::new(kind, segments)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
