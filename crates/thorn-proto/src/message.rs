//! The ordered, condensed rich-text message type.

use regex::{Regex, Replacer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::component::Component;
use crate::error::{MessageError, Result};

/// An ordered sequence of [`Component`]s plus sender metadata.
///
/// Two invariants hold after every structural mutation:
///
/// - no two adjacent components are both
///   [`Text`](crate::component::ComponentKind::Text) ("condensed" form);
/// - the sequence is never empty; constructing from nothing yields a
///   single empty text component.
///
/// Character addressing (`char_len`, `char_at`, `slice_from`) is defined
/// over the concatenation of text components only. Non-text components
/// are opaque atoms with no contained characters.
///
/// # Example
///
/// ```
/// use thorn_proto::{Component, ComponentKind, Message};
///
/// let msg = Message::new([
///     Component::text("Hello, world! "),
///     Component::pair(ComponentKind::Emoji, "😃"),
/// ]);
/// assert_eq!(msg.text(), "Hello, world! 😃");
/// assert_eq!(msg.char_len(), 14);
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message content components.
    #[serde(rename = "message")]
    pub components: Vec<Component>,
    /// The sender of the message.
    pub user: String,
    /// The role ID of the sender.
    pub role: i64,
    /// Whether the message was sent in action form (`/me`).
    pub action: bool,
    /// The single user target of a direct message, if any.
    pub target: Option<String>,
}

impl Message {
    /// Construct a condensed message from heterogeneous parts.
    ///
    /// Accepts anything convertible into a [`Component`]: bare strings
    /// (text components), `(kind, data)` pairs (text defaults to data),
    /// and `(kind, data, text)` triples.
    pub fn new<I, C>(parts: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        let mut msg = Message {
            components: parts.into_iter().map(Into::into).collect(),
            user: String::new(),
            role: 1,
            action: false,
            target: None,
        };
        msg.normalize();
        msg
    }

    /// Construct a message holding a single text component.
    pub fn from_text(text: impl Into<String>) -> Self {
        Message::new([Component::text(text)])
    }

    /// Set the sender.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the sender's role ID.
    #[must_use]
    pub fn with_role(mut self, role: i64) -> Self {
        self.role = role;
        self
    }

    /// Set the action flag.
    #[must_use]
    pub fn with_action(mut self, action: bool) -> Self {
        self.action = action;
        self
    }

    /// Set the direct-message target.
    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Re-establish the structural invariants: merge adjacent text
    /// components and guarantee a non-empty sequence.
    fn normalize(&mut self) {
        let mut merged: Vec<Component> = Vec::with_capacity(self.components.len());
        for component in self.components.drain(..) {
            match merged.last_mut() {
                Some(last) if last.is_text() && component.is_text() => {
                    let mut text = last.text.clone();
                    text.push_str(&component.text);
                    *last = last.with_text(text);
                }
                _ => merged.push(component),
            }
        }
        if merged.is_empty() {
            merged.push(Component::text(""));
        }
        self.components = merged;
    }

    /// Copy of this message with replaced components, re-condensed.
    fn copy_with<I>(&self, components: I) -> Message
    where
        I: IntoIterator<Item = Component>,
    {
        let mut msg = Message {
            components: components.into_iter().collect(),
            user: self.user.clone(),
            role: self.role,
            action: self.action,
            target: self.target.clone(),
        };
        msg.normalize();
        msg
    }

    /// Pure text representation: joined `text` of every component.
    pub fn text(&self) -> String {
        self.components.iter().map(|c| c.text.as_str()).collect()
    }

    /// Total characters across text components only.
    pub fn char_len(&self) -> usize {
        self.components.iter().map(Component::char_len).sum()
    }

    /// The `index`-th character of the text-only view.
    pub fn char_at(&self, index: usize) -> Result<char> {
        self.components
            .iter()
            .filter(|c| c.is_text())
            .flat_map(|c| c.text.chars())
            .nth(index)
            .ok_or(MessageError::IndexOutOfRange {
                index,
                len: self.char_len(),
            })
    }

    /// Drop the first `count` characters of the text-only view.
    ///
    /// Non-text components encountered while characters remain to be
    /// consumed are dropped whole (they have no characters to spend);
    /// the text component straddling the cut is trimmed.
    #[must_use]
    pub fn slice_from(&self, count: usize) -> Message {
        let mut remaining = count;
        let mut kept: Vec<Component> = Vec::new();

        for component in &self.components {
            if remaining == 0 {
                kept.push(component.clone());
                continue;
            }
            if component.is_text() {
                let len = component.char_len();
                if len <= remaining {
                    remaining -= len;
                } else {
                    let trimmed: String = component.text.chars().skip(remaining).collect();
                    kept.push(component.with_text(trimmed));
                    remaining = 0;
                }
            }
            // non-text components before the cut are discarded
        }

        self.copy_with(kept)
    }

    /// Whether some text component's text contains `needle`.
    ///
    /// This is not a whole-message scan: a substring spanning two
    /// components is not found.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.is_text() && c.text.contains(needle))
    }

    /// Component-wise concatenation, then condense.
    ///
    /// Metadata takes the left side's non-empty field, falling back to
    /// the right's (a zero role falls back, matching the original
    /// truthiness semantics).
    #[must_use]
    pub fn concat(&self, other: &Message) -> Message {
        let mut msg = Message {
            components: self
                .components
                .iter()
                .chain(other.components.iter())
                .cloned()
                .collect(),
            user: if self.user.is_empty() {
                other.user.clone()
            } else {
                self.user.clone()
            },
            role: if self.role != 0 { self.role } else { other.role },
            action: self.action || other.action,
            target: self.target.clone().or_else(|| other.target.clone()),
        };
        msg.normalize();
        msg
    }

    /// Replace literal substrings, in place.
    ///
    /// Every occurrence of each `old` in every component's text is
    /// replaced. `data` follows the text for text components only.
    /// Pairs with a `None` replacement are skipped.
    pub fn replace_literal(&mut self, pairs: &[(&str, Option<&str>)]) -> &mut Self {
        for component in &mut self.components {
            for (old, new) in pairs {
                if let Some(new) = new {
                    let text = component.text.replace(old, new);
                    *component = component.with_text(text);
                }
            }
        }
        self
    }

    /// Regex substitution, in place, over text and URL components only.
    ///
    /// `rep` accepts the same replacer forms as [`Regex::replace_all`]:
    /// a literal string or a function of the match. Only the display
    /// text is rewritten; canonical data is untouched.
    pub fn substitute<R: Replacer>(&mut self, re: &Regex, mut rep: R) -> &mut Self {
        for component in &mut self.components {
            if component.kind.is_substitutable() {
                component.text = re.replace_all(&component.text, rep.by_ref()).into_owned();
            }
        }
        self
    }

    /// Split the text-only view on a literal separator character.
    ///
    /// Non-text components are never split and pass through as atoms.
    /// When `max` splits have been produced, everything remaining —
    /// separators included — lands unsplit in the final piece. Pieces
    /// with no non-empty text are dropped from the result.
    ///
    /// # Example
    ///
    /// ```
    /// use thorn_proto::Message;
    ///
    /// let msg = Message::from_text("0 1 2 3");
    /// let pieces = msg.split_on(' ', Some(2));
    /// let texts: Vec<String> = pieces.iter().map(Message::text).collect();
    /// assert_eq!(texts, ["0", "1", "2 3"]);
    /// ```
    pub fn split_on(&self, sep: char, max: Option<usize>) -> Vec<Message> {
        let budget = max.unwrap_or(usize::MAX);
        let mut pieces: Vec<Vec<Component>> = Vec::new();
        let mut current: Vec<Component> = Vec::new();

        for component in &self.components {
            if pieces.len() == budget
                || !component.is_text()
                || !component.text.contains(sep)
            {
                current.push(component.clone());
                continue;
            }

            let chars: Vec<char> = component.text.chars().collect();
            let mut acc = String::new();
            for (index, &ch) in chars.iter().enumerate() {
                if pieces.len() == budget {
                    // budget exhausted mid-component: keep the rest verbatim
                    acc.extend(&chars[index..]);
                    break;
                }
                if ch == sep {
                    current.push(Component::text(std::mem::take(&mut acc)));
                    pieces.push(std::mem::take(&mut current));
                } else {
                    acc.push(ch);
                }
            }
            current.push(Component::text(acc));
        }
        pieces.push(current);

        pieces
            .into_iter()
            .filter(|piece| piece.iter().any(|c| !c.text.is_empty()))
            .map(|piece| self.copy_with(piece.into_iter().filter(|c| !c.text.is_empty())))
            .collect()
    }

    /// Serialize to the JSON structural form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize from the JSON structural form.
    pub fn from_json(json: &str) -> serde_json::Result<Message> {
        serde_json::from_str(json)
    }

    /// Concatenate messages with `separator` inserted between each pair.
    ///
    /// Joining zero messages yields the empty message.
    pub fn join_all<'a, I>(messages: I, separator: &str) -> Message
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut iter = messages.into_iter();
        let Some(first) = iter.next() else {
            return Message::from_text("");
        };
        let mut result = first.clone();
        for message in iter {
            result = result.concat(&Message::from_text(separator)).concat(message);
        }
        result
    }
}

impl Add<&Message> for Message {
    type Output = Message;

    fn add(self, rhs: &Message) -> Message {
        self.concat(rhs)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Message: {} - \"{}\">", self.user, self.text())
    }
}
