//! Feature toggles and tunable parameters
//!
//! The catalog ([`catalog::FEATURES`]) is static data. [`FeatureRegistry`]
//! holds the live state: an enabled flag per feature and one value per
//! declared parameter, initialized from defaults and overridden by the
//! persisted configuration.
//!
//! Lookups are soft: unknown ids or keys yield `false`/`None` and writes to
//! them are logged and ignored, so feature-gated call sites never need to
//! handle errors.

pub mod catalog;

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use catalog::{FEATURES, ids};

use crate::persistence::Persistence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureCategory {
    Gameplay,
    Audio,
    Visual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Boolean,
}

/// A live or default parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Boolean,
            ParamValue::Number(_) => ParamKind::Number,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            ParamValue::Number(v) => Some(v),
            ParamValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Bool(v) => Some(v),
            ParamValue::Number(_) => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// Declared parameter of a feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDef {
    pub key: &'static str,
    pub default: ParamValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl ParamDef {
    pub const fn number(key: &'static str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            key,
            default: ParamValue::Number(default),
            min: Some(min),
            max: Some(max),
            step: Some(step),
        }
    }

    pub const fn boolean(key: &'static str, default: bool) -> Self {
        Self {
            key,
            default: ParamValue::Bool(default),
            min: None,
            max: None,
            step: None,
        }
    }

    pub fn kind(&self) -> ParamKind {
        self.default.kind()
    }

    /// Validate `value` against this definition, clamping numbers into range.
    /// `None` when the value has the wrong type or is not finite.
    pub fn sanitize(&self, value: ParamValue) -> Option<ParamValue> {
        match (self.kind(), value) {
            (ParamKind::Boolean, ParamValue::Bool(_)) => Some(value),
            (ParamKind::Number, ParamValue::Number(v)) if v.is_finite() => {
                let v = self.min.map_or(v, |min| v.max(min));
                let v = self.max.map_or(v, |max| v.min(max));
                Some(ParamValue::Number(v))
            }
            _ => None,
        }
    }
}

/// Static description of a feature
#[derive(Debug)]
pub struct FeatureDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: FeatureCategory,
    /// Enabled by default
    pub enabled: bool,
    pub params: &'static [ParamDef],
}

impl FeatureDef {
    pub fn param(&self, key: &str) -> Option<&'static ParamDef> {
        self.params.iter().find(|p| p.key == key)
    }

    fn param_index(&self, key: &str) -> Option<usize> {
        self.params.iter().position(|p| p.key == key)
    }
}

/// Persisted per-feature record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfigEntry {
    pub enabled: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

/// Persisted configuration: `{ featureId: { enabled, parameters: { key: value } } }`
pub type FeatureConfig = BTreeMap<String, FeatureConfigEntry>;

#[derive(Debug, Clone)]
struct FeatureState {
    def: &'static FeatureDef,
    enabled: bool,
    /// Parallel to `def.params`
    values: Vec<ParamValue>,
}

impl FeatureState {
    fn from_def(def: &'static FeatureDef) -> Self {
        Self {
            def,
            enabled: def.enabled,
            values: def.params.iter().map(|p| p.default).collect(),
        }
    }
}

/// Saved live state, used to undo temporary overrides (round maluses)
#[derive(Debug, Clone)]
pub struct FeatureSnapshot {
    states: Vec<FeatureState>,
}

/// Live feature state
pub struct FeatureRegistry {
    persistence: Rc<Persistence>,
    features: Vec<FeatureState>,
    initialized: bool,
}

impl FeatureRegistry {
    /// Create an uninitialized registry; call [`init`](Self::init) before use
    pub fn new(persistence: Rc<Persistence>) -> Self {
        Self {
            persistence,
            features: Vec::new(),
            initialized: false,
        }
    }

    /// Load the catalog and merge persisted overrides. No-op once initialized.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.load_defaults();
        if let Some(config) = self.persistence.get_feature_config() {
            self.merge_config(&config);
        }
        self.initialized = true;
        log::info!("Feature registry initialized ({} features)", self.features.len());
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn load_defaults(&mut self) {
        self.features = FEATURES.iter().map(FeatureState::from_def).collect();
    }

    fn merge_config(&mut self, config: &FeatureConfig) {
        for (id, entry) in config {
            let Some(state) = self.state_mut(id) else {
                log::debug!("Ignoring persisted config for unknown feature {}", id);
                continue;
            };
            state.enabled = entry.enabled;
            for (key, value) in &entry.parameters {
                let def = state.def;
                match def.param_index(key) {
                    Some(i) => match def.params[i].sanitize(*value) {
                        Some(v) => state.values[i] = v,
                        None => log::warn!("Ignoring persisted {}.{}: bad value", id, key),
                    },
                    None => log::debug!("Ignoring persisted unknown parameter {}.{}", id, key),
                }
            }
        }
    }

    fn state(&self, id: &str) -> Option<&FeatureState> {
        self.features.iter().find(|f| f.def.id == id)
    }

    fn state_mut(&mut self, id: &str) -> Option<&mut FeatureState> {
        self.features.iter_mut().find(|f| f.def.id == id)
    }

    /// Whether a feature is on (`false` for unknown ids)
    pub fn is_enabled(&self, id: &str) -> bool {
        self.state(id).is_some_and(|f| f.enabled)
    }

    /// Live value of a parameter (`None` for unknown feature or key)
    pub fn get_parameter(&self, id: &str, key: &str) -> Option<ParamValue> {
        let state = self.state(id)?;
        let i = state.def.param_index(key)?;
        Some(state.values[i])
    }

    pub fn number(&self, id: &str, key: &str) -> Option<f64> {
        self.get_parameter(id, key)?.as_number()
    }

    pub fn flag(&self, id: &str, key: &str) -> Option<bool> {
        self.get_parameter(id, key)?.as_bool()
    }

    /// Numeric parameter as f32, or `fallback` when missing
    pub fn number_or(&self, id: &str, key: &str, fallback: f32) -> f32 {
        self.number(id, key).map_or(fallback, |v| v as f32)
    }

    pub fn flag_or(&self, id: &str, key: &str, fallback: bool) -> bool {
        self.flag(id, key).unwrap_or(fallback)
    }

    /// Set a parameter, clamping numbers to the declared range.
    /// Unknown features/keys and mistyped values are logged and ignored.
    pub fn set_parameter(&mut self, id: &str, key: &str, value: impl Into<ParamValue>) -> bool {
        let value = value.into();
        let Some(state) = self.state_mut(id) else {
            log::warn!("set_parameter: unknown feature {}", id);
            return false;
        };
        let def = state.def;
        let Some(i) = def.param_index(key) else {
            log::warn!("set_parameter: unknown parameter {}.{}", id, key);
            return false;
        };
        match def.params[i].sanitize(value) {
            Some(v) => {
                state.values[i] = v;
                true
            }
            None => {
                log::warn!("set_parameter: rejected {:?} for {}.{}", value, id, key);
                false
            }
        }
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.state_mut(id) {
            Some(state) => {
                state.enabled = enabled;
                log::debug!("Feature {} {}", id, if enabled { "enabled" } else { "disabled" });
                true
            }
            None => {
                log::warn!("set_enabled: unknown feature {}", id);
                false
            }
        }
    }

    /// Flip a feature. Returns the new state, `None` for unknown ids.
    pub fn toggle_feature(&mut self, id: &str) -> Option<bool> {
        let enabled = !self.state(id)?.enabled;
        self.set_enabled(id, enabled);
        Some(enabled)
    }

    /// Definitions of every known feature, in catalog order
    pub fn definitions(&self) -> impl Iterator<Item = &'static FeatureDef> + '_ {
        self.features.iter().map(|f| f.def)
    }

    pub fn in_category(&self, category: FeatureCategory) -> Vec<&'static FeatureDef> {
        self.definitions().filter(|d| d.category == category).collect()
    }

    /// Live state in persisted shape
    pub fn to_config(&self) -> FeatureConfig {
        self.features
            .iter()
            .map(|f| {
                let parameters = f
                    .def
                    .params
                    .iter()
                    .zip(&f.values)
                    .map(|(p, v)| (p.key.to_string(), *v))
                    .collect();
                (
                    f.def.id.to_string(),
                    FeatureConfigEntry {
                        enabled: f.enabled,
                        parameters,
                    },
                )
            })
            .collect()
    }

    /// Persist the live configuration
    pub fn save_config(&self) -> bool {
        self.persistence.save_feature_config(&self.to_config())
    }

    /// Discard live state, reload the catalog defaults and persist them
    pub fn reset_to_defaults(&mut self) {
        self.load_defaults();
        self.initialized = true;
        self.save_config();
        log::info!("Feature configuration reset to defaults");
    }

    pub fn snapshot(&self) -> FeatureSnapshot {
        FeatureSnapshot {
            states: self.features.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: FeatureSnapshot) {
        self.features = snapshot.states;
    }
}
