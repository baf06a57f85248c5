//! State schema and reducer system
//!
//! Nodes never mutate state directly. Each node returns a partial update, and
//! the executor merges that update into the accumulated state field by field,
//! using the reducer the state type declares for each field.
//!
//! # Reducers
//!
//! | Reducer | Behavior | Typical fields |
//! |---------|----------|----------------|
//! | [`OverwriteReducer`] | Last write wins | scores, counters, candidate lists |
//! | [`AppendReducer`] | Concatenate arrays | message history |
//! | [`MergeReducer`] | Shallow object merge, empty values ignored | extracted preferences |
//!
//! # Typed state
//!
//! A [`GraphState`] is an ordinary serde struct. Its partial update type is a
//! second serde struct whose fields are all optional and skipped when unset,
//! so "no write" serializes to an absent key. Merging works on the JSON form:
//!
//! ```rust
//! use tripgraph_core::state::{AppendReducer, GraphState, OverwriteReducer, StateSchema};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Default, Serialize, Deserialize)]
//! struct Counter {
//!     log: Vec<String>,
//!     value: u32,
//! }
//!
//! #[derive(Default, Serialize)]
//! struct CounterUpdate {
//!     #[serde(skip_serializing_if = "Vec::is_empty")]
//!     log: Vec<String>,
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     value: Option<u32>,
//! }
//!
//! impl GraphState for Counter {
//!     type Update = CounterUpdate;
//!
//!     fn schema() -> StateSchema {
//!         StateSchema::new()
//!             .with_field("log", AppendReducer)
//!             .with_field("value", OverwriteReducer)
//!     }
//! }
//!
//! let schema = Counter::schema();
//! let state = Counter { log: vec!["start".into()], value: 1 };
//! let next = schema
//!     .merge(&state, &CounterUpdate { log: vec!["bump".into()], value: Some(2) })
//!     .unwrap();
//!
//! assert_eq!(next.log, vec!["start", "bump"]);
//! assert_eq!(next.value, 2);
//! ```
//!
//! # Atomicity
//!
//! [`StateSchema::apply`] reduces every field of the update into a copy of
//! the state and only replaces the original once all fields succeeded. A
//! failing field (an undeclared key, or a type mismatch) leaves the state
//! untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while merging an update into state
#[derive(Debug, Error)]
pub enum StateError {
    /// State or update is not a JSON object
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Reducer encountered incompatible types
    #[error("Reducer error: {0}")]
    ReducerError(String),

    /// Update wrote a field the schema does not declare
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Typed state could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Merge strategy for one state field
pub trait Reducer: Send + Sync {
    /// Combine the current value (possibly `Null`) with an update
    fn reduce(&self, current: &Value, update: &Value) -> Result<Value>;

    /// Human-readable name, used in diagrams and logs
    fn name(&self) -> &str;
}

/// Replace the current value with the update
#[derive(Debug, Clone, Copy)]
pub struct OverwriteReducer;

impl Reducer for OverwriteReducer {
    fn reduce(&self, _current: &Value, update: &Value) -> Result<Value> {
        Ok(update.clone())
    }

    fn name(&self) -> &str {
        "overwrite"
    }
}

/// Append the update's elements to the current array
///
/// Never removes or rewrites existing elements.
#[derive(Debug, Clone, Copy)]
pub struct AppendReducer;

impl Reducer for AppendReducer {
    fn reduce(&self, current: &Value, update: &Value) -> Result<Value> {
        match (current, update) {
            (Value::Array(curr_arr), Value::Array(upd_arr)) => {
                let mut result = curr_arr.clone();
                result.extend_from_slice(upd_arr);
                Ok(Value::Array(result))
            }
            (Value::Null, Value::Array(upd_arr)) => Ok(Value::Array(upd_arr.clone())),
            (Value::Array(curr_arr), single_value) => {
                let mut result = curr_arr.clone();
                result.push(single_value.clone());
                Ok(Value::Array(result))
            }
            (Value::Null, single_value) => Ok(Value::Array(vec![single_value.clone()])),
            _ => Err(StateError::ReducerError(
                "AppendReducer requires array values".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "append"
    }
}

/// Shallow-merge the update object into the current object
///
/// Keys whose new value is empty (`null`, a blank string, `[]` or `{}`) are
/// ignored, so a partial extraction never erases something learned earlier.
#[derive(Debug, Clone, Copy)]
pub struct MergeReducer;

impl MergeReducer {
    fn is_empty(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

impl Reducer for MergeReducer {
    fn reduce(&self, current: &Value, update: &Value) -> Result<Value> {
        let mut result = match current {
            Value::Object(curr_obj) => curr_obj.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(StateError::ReducerError(
                    "MergeReducer requires object values".to_string(),
                ))
            }
        };

        let upd_obj = update.as_object().ok_or_else(|| {
            StateError::ReducerError("MergeReducer requires object values".to_string())
        })?;

        for (key, value) in upd_obj {
            if !Self::is_empty(value) {
                result.insert(key.clone(), value.clone());
            }
        }

        Ok(Value::Object(result))
    }

    fn name(&self) -> &str {
        "merge"
    }
}

/// Declared per-field reducer table for a state type
#[derive(Default)]
pub struct StateSchema {
    fields: BTreeMap<String, Box<dyn Reducer>>,
    step_field: Option<String>,
}

impl StateSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field and its reducer
    pub fn add_field(&mut self, field_name: impl Into<String>, reducer: impl Reducer + 'static) {
        self.fields.insert(field_name.into(), Box::new(reducer));
    }

    /// Builder form of [`add_field`](Self::add_field)
    pub fn with_field(mut self, field_name: impl Into<String>, reducer: impl Reducer + 'static) -> Self {
        self.add_field(field_name, reducer);
        self
    }

    /// Name a field the executor overwrites with each executed node's name
    ///
    /// The field is declared with [`OverwriteReducer`] if it is not already.
    pub fn with_step_field(mut self, field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        self.fields
            .entry(field_name.clone())
            .or_insert_with(|| Box::new(OverwriteReducer));
        self.step_field = Some(field_name);
        self
    }

    /// Field recording the last executed node, if any
    pub fn step_field(&self) -> Option<&str> {
        self.step_field.as_deref()
    }

    /// Declared fields and their reducer names, sorted by field
    pub fn fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(field, reducer)| (field.clone(), reducer.name().to_string()))
            .collect()
    }

    /// Reducer name for `field_name`, if declared
    pub fn reducer_name(&self, field_name: &str) -> Option<&str> {
        self.fields.get(field_name).map(|r| r.name())
    }

    /// Apply a JSON update to JSON state
    ///
    /// All-or-nothing: on error `state` is unchanged.
    pub fn apply(&self, state: &mut Value, update: &Value) -> Result<()> {
        let state_obj = state
            .as_object()
            .ok_or_else(|| StateError::InvalidState("State must be an object".to_string()))?;

        let update_obj = update
            .as_object()
            .ok_or_else(|| StateError::InvalidState("Update must be an object".to_string()))?;

        let mut next = state_obj.clone();
        for (field_name, update_value) in update_obj {
            let reducer = self
                .fields
                .get(field_name)
                .ok_or_else(|| StateError::FieldNotFound(field_name.clone()))?;

            let current_value = next.get(field_name).cloned().unwrap_or(Value::Null);
            let reduced_value = reducer.reduce(&current_value, update_value)?;
            next.insert(field_name.clone(), reduced_value);
        }

        *state = Value::Object(next);
        Ok(())
    }

    /// Merge a typed update into typed state, returning the new state
    pub fn merge<S: GraphState>(&self, state: &S, update: &S::Update) -> Result<S> {
        let mut values = serde_json::to_value(state)?;
        let update = serde_json::to_value(update)?;
        self.apply(&mut values, &update)?;
        Ok(serde_json::from_value(values)?)
    }

    /// Overwrite the step field of `state` with `node`
    ///
    /// No-op when the schema has no step field.
    pub fn record_step<S: GraphState>(&self, state: &S, node: &str) -> Result<S> {
        let Some(field) = &self.step_field else {
            return Ok(state.clone());
        };

        let mut values = serde_json::to_value(state)?;
        let mut update = Map::new();
        update.insert(field.clone(), Value::String(node.to_string()));
        self.apply(&mut values, &Value::Object(update))?;
        Ok(serde_json::from_value(values)?)
    }
}

impl std::fmt::Debug for StateSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSchema")
            .field("fields", &self.fields())
            .field("step_field", &self.step_field)
            .finish()
    }
}

/// A typed graph state
///
/// The default value is the state of a conversation that has never been
/// seen. `Update` is the partial-update type nodes return; it must serialize
/// to an object containing only the fields it writes.
pub trait GraphState: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial update produced by nodes
    type Update: Serialize + Send + Sync + 'static;

    /// Reducer table for every field of the state
    fn schema() -> StateSchema;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_overwrite_reducer() {
        let result = OverwriteReducer.reduce(&json!(0.5), &json!(0.8)).unwrap();
        assert_eq!(result, json!(0.8));
    }

    #[test]
    fn test_append_reducer_arrays() {
        let result = AppendReducer.reduce(&json!([1, 2, 3]), &json!([4, 5])).unwrap();
        assert_eq!(result, json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_append_reducer_null_current() {
        let result = AppendReducer.reduce(&Value::Null, &json!([1, 2])).unwrap();
        assert_eq!(result, json!([1, 2]));
    }

    #[test]
    fn test_append_reducer_rejects_non_array_state() {
        let result = AppendReducer.reduce(&json!(42), &json!([1]));
        assert!(matches!(result, Err(StateError::ReducerError(_))));
    }

    #[test]
    fn test_merge_reducer_ignores_empty_values() {
        let current = json!({"budget": 1000000, "interests": ["food"], "season": "spring"});
        let update = json!({"budget": null, "interests": [], "season": " ", "duration": "3박4일"});

        let result = MergeReducer.reduce(&current, &update).unwrap();
        assert_eq!(
            result,
            json!({"budget": 1000000, "interests": ["food"], "season": "spring", "duration": "3박4일"})
        );
    }

    #[test]
    fn test_merge_reducer_overwrites_with_non_empty() {
        let result = MergeReducer
            .reduce(&json!({"companion": "solo"}), &json!({"companion": "family"}))
            .unwrap();
        assert_eq!(result, json!({"companion": "family"}));
    }

    #[test]
    fn test_merge_reducer_null_current() {
        let result = MergeReducer.reduce(&Value::Null, &json!({"a": 1, "b": ""})).unwrap();
        assert_eq!(result, json!({"a": 1}));
    }

    #[test]
    fn test_schema_apply_uses_declared_reducers() {
        let schema = StateSchema::new()
            .with_field("messages", AppendReducer)
            .with_field("score", OverwriteReducer);

        let mut state = json!({"messages": ["hello"], "score": 0.1});
        schema
            .apply(&mut state, &json!({"messages": ["world"], "score": 0.9}))
            .unwrap();

        assert_eq!(state["messages"], json!(["hello", "world"]));
        assert_eq!(state["score"], json!(0.9));
    }

    #[test]
    fn test_schema_apply_is_atomic() {
        let schema = StateSchema::new()
            .with_field("messages", AppendReducer)
            .with_field("score", OverwriteReducer);

        let mut state = json!({"messages": ["hello"], "score": 0.1});
        let before = state.clone();

        // "score" would succeed, "unknown" fails; neither may be applied
        let err = schema
            .apply(&mut state, &json!({"score": 0.9, "unknown": true}))
            .unwrap_err();

        assert!(matches!(err, StateError::FieldNotFound(f) if f == "unknown"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_schema_rejects_non_object_update() {
        let schema = StateSchema::new();
        let mut state = json!({});
        assert!(schema.apply(&mut state, &json!([1])).is_err());
    }

    #[test]
    fn test_step_field_declared_as_overwrite() {
        let schema = StateSchema::new().with_step_field("current_step");
        assert_eq!(schema.step_field(), Some("current_step"));
        assert_eq!(schema.reducer_name("current_step"), Some("overwrite"));
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        lines: Vec<String>,
        current_step: String,
    }

    #[derive(Default, Serialize)]
    struct DocUpdate {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        lines: Vec<String>,
    }

    impl GraphState for Doc {
        type Update = DocUpdate;

        fn schema() -> StateSchema {
            StateSchema::new()
                .with_field("lines", AppendReducer)
                .with_step_field("current_step")
        }
    }

    #[test]
    fn test_typed_merge_and_step() {
        let schema = Doc::schema();
        let state = Doc::default();

        let merged = schema
            .merge(&state, &DocUpdate { lines: vec!["a".into()] })
            .unwrap();
        let stepped = schema.record_step(&merged, "writer").unwrap();

        assert_eq!(stepped.lines, vec!["a"]);
        assert_eq!(stepped.current_step, "writer");
        assert_eq!(state, Doc::default());
    }

    #[test]
    fn test_empty_update_is_noop() {
        let schema = Doc::schema();
        let state = Doc {
            lines: vec!["x".into()],
            current_step: "n".into(),
        };
        let merged = schema.merge(&state, &DocUpdate::default()).unwrap();
        assert_eq!(merged, state);
    }
}
