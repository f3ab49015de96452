//! # thorn-proto
//!
//! A typed rich-text message model for chat bots.
//!
//! Messages are ordered sequences of components — text, emoji, tags,
//! URLs, and variable placeholders — kept in condensed form (no two
//! adjacent text components). Character-addressable operations treat
//! only text components as character-bearing; everything else is an
//! opaque atom.
//!
//! ## Quick Start
//!
//! ```rust
//! use thorn_proto::{Component, ComponentKind, Message};
//!
//! let msg = Message::new([
//!     Component::text("Hi! I'm Thornbot. "),
//!     Component::pair(ComponentKind::Emoji, "🌵"),
//! ])
//! .with_user("thornbot");
//!
//! assert_eq!(msg.text(), "Hi! I'm Thornbot. 🌵");
//!
//! // The structural form round-trips losslessly.
//! let json = serde_json::to_string(&msg).unwrap();
//! let back: Message = serde_json::from_str(&json).unwrap();
//! assert_eq!(msg, back);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod component;
pub mod error;
pub mod message;

pub use self::component::{Component, ComponentKind};
pub use self::error::MessageError;
pub use self::message::Message;
