//! Message kinds and frame encoding.
//!
//! Framing is a pure, total function: the tag is prepended to the payload
//! and nothing else happens. Callers escape payloads for their kind before
//! they get here.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// MessageKind
// ============================================================================

/// The closed set of outbound message kinds.
///
/// Each kind owns one reserved tag character; adding a kind means reserving
/// a new tag that the frontend runtime understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Script evaluated by the frontend (`j`).
    Script,
    /// Stylesheet injection statement (`s`).
    Stylesheet,
    /// HTML fragment injection statement (`h`).
    HtmlFragment,
    /// Event notification statement (`n`).
    Notification,
    /// Binding registration (`b`).
    Binding,
    /// Result of a frontend-invoked backend call (`c`).
    Callback,
    /// Frontend runtime bootstrap (`w`).
    Runtime,
}

impl MessageKind {
    /// Every kind, in tag-table order.
    pub const ALL: [Self; 7] = [
        Self::Script,
        Self::Stylesheet,
        Self::HtmlFragment,
        Self::Notification,
        Self::Binding,
        Self::Callback,
        Self::Runtime,
    ];

    /// Returns the one-character wire tag.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::Script => 'j',
            Self::Stylesheet => 's',
            Self::HtmlFragment => 'h',
            Self::Notification => 'n',
            Self::Binding => 'b',
            Self::Callback => 'c',
            Self::Runtime => 'w',
        }
    }

    /// Looks up the kind for a wire tag.
    #[must_use]
    pub fn from_tag(tag: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Returns a lowercase name used in log fields.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::HtmlFragment => "html",
            Self::Notification => "notification",
            Self::Binding => "binding",
            Self::Callback => "callback",
            Self::Runtime => "runtime",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// OutboundMessage
// ============================================================================

/// A kind-tagged payload headed for the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    kind: MessageKind,
    payload: String,
}

impl OutboundMessage {
    /// Creates a new message.
    #[inline]
    #[must_use]
    pub fn new(kind: MessageKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Returns the message kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the raw payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Encodes the message as a wire frame.
    #[inline]
    #[must_use]
    pub fn encode(&self) -> String {
        frame(self.kind, &self.payload)
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Builds a wire frame: the kind tag followed by the untouched payload.
#[must_use]
pub fn frame(kind: MessageKind, payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + 1);
    out.push(kind.tag());
    out.push_str(payload);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use proptest::prelude::*;

    #[test]
    fn test_tag_table() {
        assert_eq!(MessageKind::Script.tag(), 'j');
        assert_eq!(MessageKind::Stylesheet.tag(), 's');
        assert_eq!(MessageKind::HtmlFragment.tag(), 'h');
        assert_eq!(MessageKind::Notification.tag(), 'n');
        assert_eq!(MessageKind::Binding.tag(), 'b');
        assert_eq!(MessageKind::Callback.tag(), 'c');
        assert_eq!(MessageKind::Runtime.tag(), 'w');
    }

    #[test]
    fn test_tags_are_injective() {
        let tags: HashSet<char> = MessageKind::ALL.iter().map(|k| k.tag()).collect();
        assert_eq!(tags.len(), MessageKind::ALL.len());

        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MessageKind::from_tag('x'), None);
    }

    #[test]
    fn test_frame_does_not_escape() {
        assert_eq!(frame(MessageKind::Script, "alert('a')\n"), "jalert('a')\n");
        assert_eq!(frame(MessageKind::Binding, ""), "b");
    }

    #[test]
    fn test_outbound_message_encode() {
        let message = OutboundMessage::new(MessageKind::Binding, "main.Greet");
        assert_eq!(message.kind(), MessageKind::Binding);
        assert_eq!(message.payload(), "main.Greet");
        assert_eq!(message.encode(), "bmain.Greet");
    }

    fn any_kind() -> impl Strategy<Value = MessageKind> {
        (0..MessageKind::ALL.len()).prop_map(|i| MessageKind::ALL[i])
    }

    proptest! {
        #[test]
        fn test_frame_is_tag_plus_payload(kind in any_kind(), payload in ".*") {
            let framed = frame(kind, &payload);
            let mut chars = framed.chars();
            prop_assert_eq!(chars.next(), Some(kind.tag()));
            prop_assert_eq!(chars.as_str(), payload.as_str());
        }
    }
}
