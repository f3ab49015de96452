//! Atomic units of a rich-text message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a message [`Component`].
///
/// Only [`Text`](ComponentKind::Text) components carry addressable
/// characters; every other kind is an opaque atom.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Plaintext of any length.
    Text,
    /// A single emoji.
    Emoji,
    /// A user tag or mention.
    Tag,
    /// A URL.
    Url,
    /// A key to be replaced with live values (e.g. `%ARGS%`).
    Variable,
}

impl ComponentKind {
    /// Whether this kind participates in regex substitution.
    ///
    /// Substitution and injection scan text and URLs; emoji, tags, and
    /// variables pass through untouched.
    pub fn is_substitutable(self) -> bool {
        matches!(self, ComponentKind::Text | ComponentKind::Url)
    }
}

/// One immutable unit of rich text.
///
/// A component pairs a canonical `data` value (raw emoji codepoint,
/// resolved URL, numeric user id for a tag) with the `text` a human sees.
/// When the two are not separately meaningful, `data` equals `text`.
///
/// # Example
///
/// ```
/// use thorn_proto::{Component, ComponentKind};
///
/// let c = Component::text("Hello");
/// assert_eq!(c.data, "Hello");
///
/// let e = Component::pair(ComponentKind::Emoji, "🌵");
/// assert_eq!(e.text, "🌵");
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Component {
    /// Component kind.
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// Canonical payload.
    pub data: String,
    /// Human-displayed text.
    pub text: String,
}

impl Component {
    /// Create a component from explicit kind, data, and text.
    pub fn new(
        kind: ComponentKind,
        data: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Component {
            kind,
            data: data.into(),
            text: text.into(),
        }
    }

    /// Create a component where the display text equals the data.
    pub fn pair(kind: ComponentKind, data: impl Into<String>) -> Self {
        let data = data.into();
        let text = data.clone();
        Component { kind, data, text }
    }

    /// Create a plaintext component.
    pub fn text(text: impl Into<String>) -> Self {
        Component::pair(ComponentKind::Text, text)
    }

    /// Create a URL component with a resolved target and display text.
    pub fn url(data: impl Into<String>, text: impl Into<String>) -> Self {
        Component::new(ComponentKind::Url, data, text)
    }

    /// Whether this component carries addressable characters.
    pub fn is_text(&self) -> bool {
        self.kind == ComponentKind::Text
    }

    /// Number of addressable characters. Zero for non-text components.
    pub fn char_len(&self) -> usize {
        if self.is_text() {
            self.text.chars().count()
        } else {
            0
        }
    }

    /// Return a copy with new display text.
    ///
    /// For text components the data follows the text; other kinds keep
    /// their canonical data.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        let data = if self.is_text() {
            text.clone()
        } else {
            self.data.clone()
        };
        Component {
            kind: self.kind,
            data,
            text,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Component::text(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Component::text(text)
    }
}

impl From<(ComponentKind, &str)> for Component {
    fn from((kind, data): (ComponentKind, &str)) -> Self {
        Component::pair(kind, data)
    }
}

impl From<(ComponentKind, &str, &str)> for Component {
    fn from((kind, data, text): (ComponentKind, &str, &str)) -> Self {
        Component::new(kind, data, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_defaults_text_to_data() {
        let c = Component::pair(ComponentKind::Tag, "Username");
        assert_eq!(c.data, "Username");
        assert_eq!(c.text, "Username");
    }

    #[test]
    fn with_text_tracks_data_only_for_text() {
        let t = Component::text("abc").with_text("xyz");
        assert_eq!(t.data, "xyz");

        let u = Component::url("https://example.com", "example.com").with_text("ex");
        assert_eq!(u.data, "https://example.com");
        assert_eq!(u.text, "ex");
    }

    #[test]
    fn char_len_counts_text_only() {
        assert_eq!(Component::text("héllo").char_len(), 5);
        assert_eq!(Component::pair(ComponentKind::Emoji, "🌵").char_len(), 0);
    }
}
