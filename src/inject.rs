//! Runtime variable injection.
//!
//! Post-processes a handler's response, substituting `%USER%`,
//! `%CHANNEL%`, `%ARGN%`, and `%ARGS%` tokens with values from the
//! invocation. Consistent with [`Message::substitute`], only text and
//! URL components are scanned.
//!
//! `%ARGN%`/`%ARGS%` tokens may carry a `=default` clause and a
//! pipe-delimited modifier chain, applied left to right:
//! `%ARG0|upper%`, `%ARG1=guest|title%`.

use rand::seq::SliceRandom;
use regex::{Captures, NoExpand, Regex};
use std::sync::OnceLock;
use thorn_proto::Message;

use crate::commands::Context;
use crate::error::CommandError;

fn arg_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"%ARG(\d+|S)(=[^%|]*)?((?:\|[A-Za-z]+)*)%").expect("valid token pattern")
    })
}

fn user_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("%USER%").expect("valid token pattern"))
}

fn channel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("%CHANNEL%").expect("valid token pattern"))
}

/// Substitute variable tokens in `message`, in place.
///
/// `args` is the raw token list as originally supplied: token 0 names
/// the subcommand, tokens 1.. are the positional arguments. `%USER%`
/// and `%CHANNEL%` are left untouched when the context lacks them;
/// `%COUNT%` is reserved and always left untouched.
pub fn inject(
    message: &mut Message,
    args: &[String],
    ctx: &Context,
) -> Result<(), CommandError> {
    let mut failure: Option<CommandError> = None;

    message.substitute(arg_token_re(), |caps: &Captures| {
        match resolve_arg_token(caps, args) {
            Ok(value) => value,
            Err(error) => {
                failure.get_or_insert(error);
                String::new()
            }
        }
    });
    if let Some(error) = failure {
        return Err(error);
    }

    if let Some(user) = ctx.get("username") {
        message.substitute(user_re(), NoExpand(user));
    }
    if let Some(channel) = ctx.get("channel") {
        message.substitute(channel_re(), NoExpand(channel));
    }

    Ok(())
}

/// Resolve one `%ARGN%`/`%ARGS%` token to its substituted value.
fn resolve_arg_token(caps: &Captures, args: &[String]) -> Result<String, CommandError> {
    let selector = &caps[1];
    let default = caps.get(2).map(|m| &m.as_str()[1..]);
    let modifiers = caps.get(3).map_or("", |m| m.as_str());

    let value = if selector == "S" {
        let joined = args.iter().skip(1).cloned().collect::<Vec<_>>().join(" ");
        match (joined.is_empty(), default) {
            (true, Some(default)) => default.to_string(),
            _ => joined,
        }
    } else {
        let index: usize = selector
            .parse()
            .map_err(|_| CommandError::MissingArgument)?;
        match (args.get(index), default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.to_string(),
            (None, None) => return Err(CommandError::MissingArgument),
        }
    };

    Ok(apply_modifiers(value, modifiers))
}

/// Apply a `|mod|mod` chain left to right. Unrecognized names are
/// silently skipped.
fn apply_modifiers(value: String, chain: &str) -> String {
    chain
        .split('|')
        .filter(|name| !name.is_empty())
        .fold(value, |value, name| match name {
            "upper" => value.to_uppercase(),
            "lower" => value.to_lowercase(),
            "title" => title_case(&value),
            "reverse" => value.chars().rev().collect(),
            "tag" => match value.strip_prefix('@') {
                Some(rest) if !rest.is_empty() => rest.to_string(),
                _ => value,
            },
            "shuffle" => {
                let mut chars: Vec<char> = value.chars().collect();
                chars.shuffle(&mut rand::thread_rng());
                chars.into_iter().collect()
            }
            _ => value,
        })
}

/// Uppercase the first letter of each word, lowercase the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn substitutes_a_positional_argument() {
        let mut msg = Message::from_text("%ARG1%");
        inject(&mut msg, &args(&["multi", "beam:x"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "beam:x");
    }

    #[test]
    fn missing_argument_without_default_fails() {
        let mut msg = Message::from_text("%ARG1%");
        let err = inject(&mut msg, &args(&["multi"]), &Context::new()).unwrap_err();
        assert_eq!(err, CommandError::MissingArgument);
    }

    #[test]
    fn missing_argument_with_default_uses_it() {
        let mut msg = Message::from_text("hi %ARG1=guest%");
        inject(&mut msg, &args(&["greet"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "hi guest");
    }

    #[test]
    fn args_joins_the_tail() {
        let mut msg = Message::from_text("%ARGS%");
        inject(&mut msg, &args(&["cmd", "hello", "world"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "hello world");
    }

    #[test]
    fn args_with_modifier_chain() {
        let mut msg = Message::from_text("%ARGS|upper%");
        inject(&mut msg, &args(&["cmd", "hello", "world"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "HELLO WORLD");
    }

    #[test]
    fn empty_args_join_is_not_a_failure() {
        let mut msg = Message::from_text("[%ARGS%]");
        inject(&mut msg, &args(&["cmd"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "[]");
    }

    #[test]
    fn empty_args_join_takes_the_default() {
        let mut msg = Message::from_text("%ARGS=nobody%");
        inject(&mut msg, &args(&["cmd"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "nobody");
    }

    #[test]
    fn user_and_channel_come_from_context() {
        let mut msg = Message::from_text("%USER% in %CHANNEL%");
        let ctx = Context::new().with("username", "alice").with("channel", "lobby");
        inject(&mut msg, &[], &ctx).unwrap();
        assert_eq!(msg.text(), "alice in lobby");
    }

    #[test]
    fn user_is_left_untouched_when_context_lacks_it() {
        let mut msg = Message::from_text("%USER%");
        inject(&mut msg, &[], &Context::new()).unwrap();
        assert_eq!(msg.text(), "%USER%");
    }

    #[test]
    fn count_is_reserved_and_untouched() {
        let mut msg = Message::from_text("%COUNT%");
        inject(&mut msg, &args(&["cmd", "x"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "%COUNT%");
    }

    #[test]
    fn modifier_chain_applies_left_to_right() {
        let mut msg = Message::from_text("%ARG1|reverse|title%");
        inject(&mut msg, &args(&["cmd", "stressed"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "Desserts");
    }

    #[test]
    fn tag_modifier_strips_a_leading_at() {
        let mut msg = Message::from_text("%ARG1|tag%");
        inject(&mut msg, &args(&["cmd", "@alice"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "alice");

        let mut msg = Message::from_text("%ARG1|tag%");
        inject(&mut msg, &args(&["cmd", "@"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "@");
    }

    #[test]
    fn shuffle_permutes_the_characters() {
        let mut msg = Message::from_text("%ARG1|shuffle%");
        inject(&mut msg, &args(&["cmd", "abcdef"]), &Context::new()).unwrap();
        let mut shuffled: Vec<char> = msg.text().chars().collect();
        shuffled.sort_unstable();
        assert_eq!(shuffled, vec!['a', 'b', 'c', 'd', 'e', 'f']);
    }

    #[test]
    fn unknown_modifiers_are_skipped() {
        let mut msg = Message::from_text("%ARG1|frobnicate|upper%");
        inject(&mut msg, &args(&["cmd", "hi"]), &Context::new()).unwrap();
        assert_eq!(msg.text(), "HI");
    }

    #[test]
    fn only_text_and_url_components_are_scanned() {
        use thorn_proto::{Component, ComponentKind};

        let mut msg = Message::new([
            Component::text("%ARG1% "),
            Component::pair(ComponentKind::Emoji, "%ARG1%"),
        ]);
        inject(&mut msg, &args(&["cmd", "ok"]), &Context::new()).unwrap();
        assert_eq!(msg.components[0].text, "ok ");
        assert_eq!(msg.components[1].text, "%ARG1%");
    }
}
