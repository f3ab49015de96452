//! Command dispatch.
//!
//! The sole entry point of the engine: takes an incoming [`Message`],
//! extracts the command line, resolves root command and subcommand,
//! binds arguments, invokes the handler, and runs the injector over the
//! result. Each dispatch is one logically sequential unit of work; the
//! registry is immutable and shared without locking.

use thorn_proto::{Component, ComponentKind, Message};
use tracing::{debug, warn};

use crate::commands::{Context, Registry, Reply};
use crate::inject::inject;

/// Orchestrates resolution, binding, invocation, and injection.
pub struct Dispatcher {
    prefix: char,
    username: String,
    channel: String,
    builtins: Vec<(&'static str, Message)>,
    registry: Registry,
}

impl Dispatcher {
    /// Build a dispatcher for the given bot identity and registry.
    pub fn new(
        username: impl Into<String>,
        channel: impl Into<String>,
        prefix: char,
        registry: Registry,
    ) -> Self {
        Dispatcher {
            prefix,
            username: username.into(),
            channel: channel.into(),
            builtins: builtin_responses(),
            registry,
        }
    }

    /// Dispatch one incoming message.
    ///
    /// Returns `None` when the input is not a command invocation, when
    /// the bot would be responding to itself, or when a handler
    /// suppresses emission. Recoverable command errors come back as
    /// user-facing text messages; none of them terminate the
    /// dispatcher.
    pub async fn dispatch(&self, message: &Message) -> Option<Message> {
        // never respond to our own messages
        if message.user.eq_ignore_ascii_case(&self.username) {
            return None;
        }

        if message.char_len() < 2
            || message.char_at(0) != Ok(self.prefix)
            || message.char_at(1) == Ok(' ')
        {
            return None;
        }

        let tokens: Vec<String> = message
            .slice_from(1)
            .split_on(' ', None)
            .iter()
            .map(Message::text)
            .collect();
        let (root, rest) = tokens.split_first()?;

        let ctx = Context::new()
            .with("username", message.user.clone())
            .with("channel", self.channel.clone());

        debug!(command = %root, args = rest.len(), user = %message.user, "dispatching");

        let outcome = if let Some(response) = self.builtin(root) {
            Ok(Reply::Message(response.clone()))
        } else if let Some(set) = self.registry.get(root) {
            set.invoke(rest, &ctx).await
        } else {
            // not a registered command; custom-command lookup belongs to
            // an external collaborator
            return None;
        };

        let reply = match outcome {
            Ok(Reply::Suppress) => return None,
            Ok(Reply::Text(text)) => Message::from_text(text),
            Ok(Reply::Message(response)) => response,
            Err(error) => {
                debug!(code = error.error_code(), "command error recovered");
                return Some(error.user_reply());
            }
        };

        let mut reply = reply;
        match inject(&mut reply, rest, &ctx) {
            Ok(()) => Some(reply),
            Err(error) => {
                warn!(code = error.error_code(), "injection failed");
                Some(error.user_reply())
            }
        }
    }

    fn builtin(&self, name: &str) -> Option<&Message> {
        self.builtins
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, response)| response)
    }
}

/// Static builtin responses, matched before registry lookup.
fn builtin_responses() -> Vec<(&'static str, Message)> {
    vec![
        (
            "thorn",
            Message::new([
                Component::text("Hi! I'm Thornbot. "),
                Component::pair(ComponentKind::Emoji, "🌵"),
            ]),
        ),
        (
            "test",
            Message::new([
                Component::text("Test confirmed. "),
                Component::pair(ComponentKind::Emoji, "🌵"),
            ]),
        ),
        (
            "help",
            Message::new([
                Component::text("Check out my documentation at "),
                Component::url("https://thornbot.rtfd.org", "thornbot.rtfd.org"),
                Component::text("."),
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandSet, Handler, Invocation, Param, Subcommand};
    use crate::error::CommandError;
    use async_trait::async_trait;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new("thornbot", "lobby", '!', Registry::new())
    }

    fn incoming(text: &str) -> Message {
        Message::from_text(text).with_user("alice")
    }

    #[tokio::test]
    async fn dispatches_a_registered_command() {
        let reply = dispatcher().dispatch(&incoming("!cube run 3")).await;
        assert_eq!(reply.unwrap().text(), "27");
    }

    #[tokio::test]
    async fn non_command_input_returns_none() {
        assert!(dispatcher().dispatch(&incoming("hello there")).await.is_none());
        assert!(dispatcher().dispatch(&incoming("!")).await.is_none());
        assert!(dispatcher().dispatch(&incoming("! spaced")).await.is_none());
    }

    #[tokio::test]
    async fn own_messages_are_suppressed() {
        let own = Message::from_text("!cube run 3").with_user("ThornBot");
        assert!(dispatcher().dispatch(&own).await.is_none());
    }

    #[tokio::test]
    async fn unknown_root_command_returns_none() {
        assert!(dispatcher().dispatch(&incoming("!nosuch")).await.is_none());
    }

    #[tokio::test]
    async fn builtins_answer_before_the_registry() {
        let reply = dispatcher().dispatch(&incoming("!test")).await.unwrap();
        assert_eq!(reply.text(), "Test confirmed. 🌵");
    }

    #[tokio::test]
    async fn unknown_subcommand_becomes_a_text_reply() {
        let reply = dispatcher().dispatch(&incoming("!cube bogus")).await.unwrap();
        assert_eq!(reply.text(), "Invalid argument: 'bogus'.");
    }

    #[tokio::test]
    async fn handler_replies_are_injected() {
        struct Greet;

        #[async_trait]
        impl Handler for Greet {
            async fn handle(&self, _: Invocation) -> Result<Reply, CommandError> {
                Ok(Reply::Text("hi %USER%, arg: %ARG1|upper%".to_string()))
            }
        }

        let mut registry = Registry::empty();
        registry.register(CommandSet::new("greet").subcommand(Subcommand::new(
            "run",
            vec![Param::variadic("values")],
            Greet,
        )));
        let dispatcher = Dispatcher::new("thornbot", "lobby", '!', registry);

        let reply = dispatcher
            .dispatch(&incoming("!greet run world"))
            .await
            .unwrap();
        assert_eq!(reply.text(), "hi alice, arg: WORLD");
    }

    #[tokio::test]
    async fn injection_failure_becomes_a_text_reply() {
        struct Needy;

        #[async_trait]
        impl Handler for Needy {
            async fn handle(&self, _: Invocation) -> Result<Reply, CommandError> {
                Ok(Reply::Text("%ARG1%".to_string()))
            }
        }

        let mut registry = Registry::empty();
        registry.register(
            CommandSet::new("needy")
                .subcommand(Subcommand::new("run", vec![], Needy)),
        );
        let dispatcher = Dispatcher::new("thornbot", "lobby", '!', registry);

        let reply = dispatcher.dispatch(&incoming("!needy run")).await.unwrap();
        assert_eq!(reply.text(), "Not enough arguments!");
    }

    #[tokio::test]
    async fn suppressing_handlers_emit_nothing() {
        struct Quiet;

        #[async_trait]
        impl Handler for Quiet {
            async fn handle(&self, _: Invocation) -> Result<Reply, CommandError> {
                Ok(Reply::Suppress)
            }
        }

        let mut registry = Registry::empty();
        registry.register(
            CommandSet::new("quiet")
                .subcommand(Subcommand::new("run", vec![], Quiet)),
        );
        let dispatcher = Dispatcher::new("thornbot", "lobby", '!', registry);

        assert!(dispatcher.dispatch(&incoming("!quiet run")).await.is_none());
    }

    #[tokio::test]
    async fn command_extraction_skips_non_text_prefix_components() {
        // the prefix test reads the text-only view
        let msg = Message::new([
            Component::pair(ComponentKind::Emoji, "🌵"),
            Component::text("!cube run 3"),
        ])
        .with_user("alice");
        // emoji carries no characters, so the first text char is '!'
        let reply = dispatcher().dispatch(&msg).await;
        assert_eq!(reply.unwrap().text(), "27");
    }
}
