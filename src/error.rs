//! Unified error handling for command dispatch.
//!
//! Every variant here is recoverable: the dispatcher converts it into a
//! user-facing text [`Message`] instead of letting it terminate the
//! dispatch loop. A malformed validation pattern is deliberately *not* a
//! variant — it is a configuration defect, logged where it is detected,
//! and the affected argument passes through unvalidated.

use thiserror::Error;
use thorn_proto::Message;

/// Errors that can occur while resolving, binding, or injecting a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The first token named no registered subcommand.
    #[error("Invalid argument: '{0}'.")]
    UnknownSubcommand(String),

    /// Fewer tokens than the descriptor's arity window allows.
    #[error("Not enough arguments. ({usage})")]
    NotEnoughArguments {
        /// Synthesized usage string, e.g. `!cube run <value>`.
        usage: String,
    },

    /// More tokens than the descriptor's arity window allows.
    #[error("Too many arguments. ({usage})")]
    TooManyArguments {
        /// Synthesized usage string.
        usage: String,
    },

    /// A positional token failed its validation pattern.
    #[error("Invalid {param}: '{token}'.")]
    InvalidArgument {
        /// The parameter whose pattern rejected the token.
        param: String,
        /// The offending token.
        token: String,
    },

    /// An `%ARGN%`/`%ARGS%` token referenced an argument that was not
    /// supplied and carried no default.
    #[error("Not enough arguments!")]
    MissingArgument,
}

impl CommandError {
    /// Static error code for structured logging.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSubcommand(_) => "unknown_subcommand",
            Self::NotEnoughArguments { .. } => "not_enough_arguments",
            Self::TooManyArguments { .. } => "too_many_arguments",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::MissingArgument => "missing_argument",
        }
    }

    /// Convert into the user-facing reply message.
    pub fn user_reply(&self) -> Message {
        Message::from_text(self.to_string())
    }
}
