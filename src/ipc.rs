//! Seams to the surrounding application.
//!
//! The renderer does not interpret frontend calls or own the event system.
//! It forwards inbound frames to a [`Dispatcher`] and announces bootstrap
//! completion through an [`EventEmitter`]. Both are implemented for plain
//! closures.

// ============================================================================
// Constants
// ============================================================================

/// Event emitted once a connection's bootstrap frames are queued.
pub const READY_EVENT: &str = "bridge:ready";

// ============================================================================
// Traits
// ============================================================================

/// Receives raw inbound frames from the frontend.
///
/// Called on the connection's read task, once per frame, in arrival order.
pub trait Dispatcher: Send + Sync + 'static {
    /// Handles one frontend message.
    fn dispatch(&self, message: String);
}

/// Application event system.
pub trait EventEmitter: Send + Sync + 'static {
    /// Emits a named event with no data.
    fn emit(&self, name: &str);
}

impl<F> Dispatcher for F
where
    F: Fn(String) + Send + Sync + 'static,
{
    fn dispatch(&self, message: String) {
        self(message);
    }
}

impl<F> EventEmitter for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn emit(&self, name: &str) {
        self(name);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;

    #[test]
    fn test_closure_dispatcher() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let dispatcher = move |message: String| sink.lock().push(message);

        dispatcher.dispatch("call".to_string());
        assert_eq!(*seen.lock(), vec!["call".to_string()]);
    }

    #[test]
    fn test_closure_emitter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let emitter = move |name: &str| sink.lock().push(name.to_string());

        EventEmitter::emit(&emitter, READY_EVENT);
        assert_eq!(*seen.lock(), vec![READY_EVENT.to_string()]);
    }
}
