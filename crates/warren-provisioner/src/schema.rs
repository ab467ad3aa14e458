use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ProvisionerError;

/// Attribute name → value, for both declared and observed state.
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Bool,
    Int,
    /// Ordered list of strings where `""` is a placeholder for "no tags".
    TagSet,
    /// Free-form JSON object (queue arguments, policy definitions).
    Map,
}

impl AttrType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::TagSet => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Map => value.is_object(),
        }
    }

    /// What an absent optional value of this type means.
    fn empty(self) -> Option<Value> {
        match self {
            Self::TagSet => Some(json!([])),
            Self::Map => Some(json!({})),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::TagSet => "list of strings",
            Self::Map => "object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Server-assigned; read-only to the declarer.
    Computed,
}

/// One field of a resource kind and its reconciliation policy.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttrType,
    pub presence: Presence,
    pub default: Option<Value>,
    /// Any change requires destroying and recreating the remote object.
    pub force_new: bool,
    /// Write-only: the broker never returns it, so observed state keeps the
    /// last applied value instead.
    pub sensitive: bool,
}

impl Attribute {
    fn new(name: &'static str, ty: AttrType, presence: Presence) -> Self {
        Self {
            name,
            ty,
            presence,
            default: None,
            force_new: false,
            sensitive: false,
        }
    }

    pub fn required(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, Presence::Required)
    }

    pub fn optional(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, Presence::Optional)
    }

    pub fn computed(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, Presence::Computed)
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Structured before/after for a single field that doesn't match desired state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDrift {
    pub field: String,
    /// What we want
    pub expected: Value,
    /// What the broker has
    pub actual: Value,
    pub force_new: bool,
}

/// The declared-config surface of one resource kind.
#[derive(Debug, Clone)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// True when at least one declarable attribute can change in place.
    pub fn has_mutable(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| a.presence != Presence::Computed && !a.force_new)
    }

    /// Reject declarations the broker could never converge to.
    ///
    /// `null` counts as absent.
    pub fn validate(&self, declared: &Attributes) -> Result<(), ProvisionerError> {
        for (name, value) in declared {
            let Some(attr) = self.get(name) else {
                return Err(ProvisionerError::Validation(format!(
                    "unknown attribute '{name}'"
                )));
            };
            if value.is_null() {
                continue;
            }
            if attr.presence == Presence::Computed {
                return Err(ProvisionerError::Validation(format!(
                    "attribute '{name}' is computed and cannot be set"
                )));
            }
            if !attr.ty.accepts(value) {
                return Err(ProvisionerError::Validation(format!(
                    "attribute '{name}' must be a {}, got {value}",
                    attr.ty.name()
                )));
            }
        }

        for attr in &self.attributes {
            let present = declared.get(attr.name).is_some_and(|v| !v.is_null());
            if attr.presence == Presence::Required && !present {
                return Err(ProvisionerError::Validation(format!(
                    "missing required attribute '{}'",
                    attr.name
                )));
            }
        }

        Ok(())
    }

    /// Drop nulls and fill in defaults for absent optional attributes.
    pub fn apply_defaults(&self, declared: &Attributes) -> Attributes {
        let mut out: Attributes = declared
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for attr in &self.attributes {
            if attr.presence != Presence::Optional || out.contains_key(attr.name) {
                continue;
            }
            if let Some(default) = &attr.default {
                out.insert(attr.name.to_string(), default.clone());
            }
        }
        out
    }

    /// Canonical form used for every comparison.
    ///
    /// Tag sets lose their empty-string placeholders and an absent tag set or
    /// map becomes an empty one, so `[""]`, `[]` and "not declared" compare
    /// equal.
    pub fn normalize(&self, attrs: &Attributes) -> Attributes {
        let mut out = attrs.clone();
        out.retain(|_, v| !v.is_null());

        for attr in &self.attributes {
            match out.get_mut(attr.name) {
                Some(value) if attr.ty == AttrType::TagSet => {
                    *value = json!(clean_tags(value));
                }
                Some(_) => {}
                None if attr.presence != Presence::Required => {
                    if let Some(empty) = attr.ty.empty() {
                        out.insert(attr.name.to_string(), empty);
                    }
                }
                None => {}
            }
        }
        out
    }

    /// Defaults applied, then normalized.
    pub fn desired(&self, declared: &Attributes) -> Attributes {
        self.normalize(&self.apply_defaults(declared))
    }

    /// Field-level differences between desired and observed state.
    ///
    /// Computed fields are skipped. Sensitive values are masked in the
    /// result. A sensitive field the observed side has no value for counts
    /// as drift: nothing has applied it yet (e.g. an imported user).
    pub fn diff(&self, desired: &Attributes, observed: &Attributes) -> Vec<FieldDrift> {
        let mut drifts = Vec::new();

        for attr in &self.attributes {
            if attr.presence == Presence::Computed {
                continue;
            }
            let expected = desired.get(attr.name).cloned().unwrap_or(Value::Null);
            let actual = observed.get(attr.name).cloned().unwrap_or(Value::Null);

            if values_equal(attr.ty, &expected, &actual) {
                continue;
            }
            let (expected, actual) = if attr.sensitive {
                (json!("(sensitive)"), json!("(sensitive)"))
            } else {
                (expected, actual)
            };
            drifts.push(FieldDrift {
                field: attr.name.to_string(),
                expected,
                actual,
                force_new: attr.force_new,
            });
        }
        drifts
    }

    /// Force-new attributes whose value differs between two declarations.
    pub fn force_new_changes(&self, prior: &Attributes, declared: &Attributes) -> Vec<FieldDrift> {
        self.diff(&self.desired(declared), &self.desired(prior))
            .into_iter()
            .filter(|d| d.force_new)
            .collect()
    }

    /// Copy write-only values from `source` into `observed` where the broker
    /// left them out.
    pub fn carry_write_only(&self, source: &Attributes, observed: &mut Attributes) {
        for attr in self.attributes.iter().filter(|a| a.sensitive) {
            if observed.contains_key(attr.name) {
                continue;
            }
            if let Some(value) = source.get(attr.name) {
                observed.insert(attr.name.to_string(), value.clone());
            }
        }
    }

    /// Declarable view of observed state, used when adopting an object.
    pub fn declarable(&self, observed: &Attributes) -> Attributes {
        observed
            .iter()
            .filter(|(k, _)| {
                self.get(k)
                    .is_some_and(|a| a.presence != Presence::Computed)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Same attributes with sensitive values masked, for logs and reports.
    pub fn redact(&self, attrs: &Attributes) -> Attributes {
        let mut out = attrs.clone();
        for attr in self.attributes.iter().filter(|a| a.sensitive) {
            if let Some(value) = out.get_mut(attr.name) {
                *value = json!("(sensitive)");
            }
        }
        out
    }
}

fn values_equal(ty: AttrType, a: &Value, b: &Value) -> bool {
    match ty {
        AttrType::TagSet => {
            let mut left = clean_tags(a);
            let mut right = clean_tags(b);
            left.sort();
            right.sort();
            left == right
        }
        _ => a == b,
    }
}

/// Tags as the broker reports them: a JSON array on current versions, a
/// comma-separated string on older ones. Empty placeholders are dropped.
pub fn clean_tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        Value::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}
