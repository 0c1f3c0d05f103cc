//! Event and block field selections.
//!
//! The decoder owns the full event ABI representation. This crate only needs
//! the projection "ordered inputs, each optionally bound to a column and
//! optionally indexed", exposed through [`EventSelection`]. Any keys the
//! decoder adds are kept in `extra` so persisted blobs round-trip.

use serde::{Deserialize, Serialize};

/// One event input (ABI parameter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    /// Decoded from a log topic rather than the log body.
    #[serde(default)]
    pub indexed: bool,
    /// Target column; `None` or empty means the input is not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Input {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Default::default()
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Bind this input to `column`.
    pub fn select(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// The bound column name, if any.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_selected(&self) -> bool {
        self.column().is_some()
    }
}

/// Read-only view over an event's inputs.
pub trait EventSelection {
    fn inputs(&self) -> &[Input];

    /// Inputs bound to a column, in declaration order.
    fn selected(&self) -> Vec<&Input> {
        self.inputs().iter().filter(|i| i.is_selected()).collect()
    }

    /// `true` if any selected input is decoded from the log body.
    fn selects_unindexed(&self) -> bool {
        self.selected().iter().any(|i| !i.indexed)
    }
}

/// An event specification as stored in an integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: "event".into(),
            ..Default::default()
        }
    }

    pub fn input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }
}

impl EventSelection for Event {
    fn inputs(&self) -> &[Input] {
        &self.inputs
    }
}

/// A block-level field (e.g. `block_hash`, `tx_hash`) bound to a column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub name: String,
    #[serde(default)]
    pub column: String,
}

impl BlockData {
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }
}
