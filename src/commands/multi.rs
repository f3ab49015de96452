//! Generate a multistream link.

use async_trait::async_trait;
use thorn_proto::{Component, Message};

use super::{Arg, CommandSet, Handler, Invocation, Param, Reply, Subcommand};
use crate::error::CommandError;

const BASE_URL: &str = "https://multistream.me/";

/// Single-letter service codes accepted in `service:channel` values.
const SERVICES: &[&str] = &["t", "b", "h", "y"];

/// Handler for the `run` subcommand.
struct Run;

#[async_trait]
impl Handler for Run {
    async fn handle(&self, invocation: Invocation) -> Result<Reply, CommandError> {
        let mut link = String::from(BASE_URL);

        for value in invocation.args.iter().map(Arg::as_str) {
            let Some((service, channel)) = value.split_once(':') else {
                return Ok(Reply::Text(format!("'{value}' is not a valid channel.")));
            };
            if !SERVICES.contains(&service) {
                return Ok(Reply::Text(format!("'{service}' is not a valid service.")));
            }
            link.push_str(service);
            link.push(':');
            link.push_str(channel);
            link.push('/');
        }

        Ok(Reply::Message(Message::new([Component::url(
            link.clone(),
            link,
        )])))
    }
}

/// The `multi` command's descriptor set.
pub fn command_set() -> CommandSet {
    CommandSet::new("multi").default_subcommand(Subcommand::new(
        "run",
        vec![Param::variadic("channels")],
        Run,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Context;
    use thorn_proto::ComponentKind;

    async fn run(tokens: &[&str]) -> Reply {
        let supplied: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        command_set().invoke(&supplied, &Context::new()).await.unwrap()
    }

    #[tokio::test]
    async fn builds_a_link_component() {
        let Reply::Message(msg) = run(&["run", "b:fun", "t:to"]).await else {
            panic!("expected a message reply");
        };
        assert_eq!(msg.components[0].kind, ComponentKind::Url);
        assert_eq!(msg.text(), "https://multistream.me/b:fun/t:to/");
    }

    #[tokio::test]
    async fn rejects_unknown_services() {
        let Reply::Text(text) = run(&["run", "x:someone"]).await else {
            panic!("expected a text reply");
        };
        assert_eq!(text, "'x' is not a valid service.");
    }

    #[tokio::test]
    async fn rejects_values_without_a_service() {
        let Reply::Text(text) = run(&["run", "justachannel"]).await else {
            panic!("expected a text reply");
        };
        assert_eq!(text, "'justachannel' is not a valid channel.");
    }
}
