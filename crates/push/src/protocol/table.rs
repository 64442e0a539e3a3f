//! Value shapes for the subscription/control channel.
//!
//! These records describe what a control request carries, not how it is
//! encoded: the control wire format is intentionally left out of this crate
//! and belongs to whatever layer implements the control channel.

/// Subscription delivery mode of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    Raw,
    Merge,
    Distinct,
    Command,
}

/// What to do with a subscription table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOperation {
    Add,
    /// Add without requesting the initial snapshot confirmation.
    AddSilent,
    Start,
    Delete,
}

/// Description of a subscription table.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub table_id: String,
    pub schema: String,
    pub mode: SubscriptionMode,
    pub adapter: Option<String>,
    pub buffer_size: Option<u64>,
    pub selector: Option<String>,
    pub snapshot: Option<bool>,
    pub max_frequency: Option<f64>,
}

impl TableInfo {
    pub fn new(table_id: impl Into<String>, schema: impl Into<String>, mode: SubscriptionMode) -> Self {
        Self {
            table_id: table_id.into(),
            schema: schema.into(),
            mode,
            adapter: None,
            buffer_size: None,
            selector: None,
            snapshot: None,
            max_frequency: None,
        }
    }
}

/// Change the delivery parameters of an existing table.
#[derive(Debug, Clone)]
pub struct ReconfigureRequest {
    pub table_id: String,
    pub max_frequency: Option<f64>,
}

/// Change session-wide constraints, currently only the bandwidth cap.
#[derive(Debug, Clone)]
pub struct ConstraintsRequest {
    pub max_bandwidth: Option<f64>,
}
