//! Event payloads for frontend notifications.
//!
//! Events originate in the application's event system; the renderer only
//! serialises their data and wraps it in a `notify` statement.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

use super::script::notify_call;

// ============================================================================
// Constants
// ============================================================================

/// Data sent when an event carries no payload.
const EMPTY_DATA: &str = "[]";

// ============================================================================
// EventData
// ============================================================================

/// A named event with optional data.
///
/// `T` is any serializable value; serialization failures surface as
/// [`Error::Json`](crate::Error::Json) when the event is rendered.
#[derive(Debug, Clone, Serialize)]
pub struct EventData<T = Value> {
    /// Event name, e.g. `user:login`.
    pub name: String,

    /// Event payload.
    pub data: Option<T>,
}

impl<T: Serialize> EventData<T> {
    /// Creates an event with data.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, data: T) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
        }
    }

    /// Serialises the payload, defaulting to an empty array.
    pub fn data_json(&self) -> Result<String> {
        match &self.data {
            Some(data) => Ok(serde_json::to_string(data)?),
            None => Ok(EMPTY_DATA.to_string()),
        }
    }

    /// Builds the frontend `notify` statement for this event.
    pub fn to_script(&self) -> Result<String> {
        let json = self.data_json()?;
        Ok(notify_call(&self.name, &json))
    }
}

impl EventData<Value> {
    /// Creates an event without data.
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
