//! The command system: descriptors, registry, and argument binding.
//!
//! Commands are registered declaratively: each plugin builds a
//! [`CommandSet`] of [`Subcommand`] descriptors at startup and hands it
//! to the [`Registry`]. The registry is immutable afterwards, so
//! concurrent dispatches share it without locking. Each invocation
//! builds its own binding state.

mod cube;
mod multi;
mod temmie;

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::error::CommandError;

/// Resolve a named validation-pattern alias.
///
/// The alias table is fixed; plugins reference entries by name so the
/// same username/command shapes validate identically everywhere.
fn named_pattern(alias: &str) -> Option<&'static str> {
    match alias {
        "username" => Some(r"@?([A-Za-z0-9]{0,32})"),
        "command" => Some(r"!?(.+)"),
        _ => None,
    }
}

/// A validation pattern attached to a positional parameter.
///
/// Applied anchored on both ends. One capture group replaces the token
/// with the group's value; several replace it with the group tuple.
#[derive(Clone, Debug)]
pub enum Pattern {
    /// An alias resolved against the fixed table (`username`, `command`).
    Named(&'static str),
    /// An inline regular expression.
    Inline(&'static str),
}

impl Pattern {
    fn source(&self) -> Option<&str> {
        match self {
            Pattern::Named(alias) => {
                let resolved = named_pattern(alias);
                if resolved.is_none() {
                    warn!(alias, "unknown pattern alias; argument passed through");
                }
                resolved
            }
            Pattern::Inline(src) => Some(src),
        }
    }
}

/// How a parameter binds its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Positional, must be supplied.
    Required,
    /// Positional, may be omitted.
    Optional,
    /// Consumes all remaining positional tokens.
    Variadic {
        /// Whether at least one value must be supplied.
        required: bool,
    },
    /// Bound from the invocation context rather than the token stream.
    Context {
        /// The context key to read.
        key: &'static str,
    },
}

/// One declared parameter of a subcommand.
#[derive(Clone, Debug)]
pub struct Param {
    /// Parameter name, used in usage strings and validation errors.
    pub name: &'static str,
    /// Binding behavior.
    pub kind: ParamKind,
    /// Optional validation pattern (positional parameters only).
    pub pattern: Option<Pattern>,
}

impl Param {
    /// A required positional parameter.
    pub fn required(name: &'static str) -> Self {
        Param { name, kind: ParamKind::Required, pattern: None }
    }

    /// An optional positional parameter.
    pub fn optional(name: &'static str) -> Self {
        Param { name, kind: ParamKind::Optional, pattern: None }
    }

    /// A variadic tail parameter accepting zero or more values.
    pub fn variadic(name: &'static str) -> Self {
        Param { name, kind: ParamKind::Variadic { required: false }, pattern: None }
    }

    /// A variadic tail parameter requiring at least one value.
    pub fn variadic_required(name: &'static str) -> Self {
        Param { name, kind: ParamKind::Variadic { required: true }, pattern: None }
    }

    /// A parameter bound from the invocation context by `key`.
    pub fn context(name: &'static str, key: &'static str) -> Self {
        Param { name, kind: ParamKind::Context { key }, pattern: None }
    }

    /// Attach a validation pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    fn is_positional(&self) -> bool {
        matches!(self.kind, ParamKind::Required | ParamKind::Optional)
    }
}

/// A validated positional argument as a handler receives it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    /// A plain token, or the single capture group that replaced it.
    Text(String),
    /// The capture-group tuple of a multi-group pattern match.
    Groups(Vec<String>),
}

impl Arg {
    /// The textual value: the token itself, or the first group.
    pub fn as_str(&self) -> &str {
        match self {
            Arg::Text(s) => s,
            Arg::Groups(g) => g.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// The capture-group tuple, if this argument matched several groups.
    pub fn groups(&self) -> Option<&[String]> {
        match self {
            Arg::Text(_) => None,
            Arg::Groups(g) => Some(g),
        }
    }
}

/// Per-invocation context values (sender, channel, ...).
#[derive(Clone, Debug, Default)]
pub struct Context {
    values: HashMap<&'static str, String>,
}

impl Context {
    /// Empty context.
    pub fn new() -> Self {
        Context::default()
    }

    /// Add a value.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// The bound arguments handed to a handler.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    /// Validated positional arguments, subcommand-name token excluded.
    pub args: Vec<Arg>,
    named: HashMap<&'static str, Option<String>>,
}

impl Invocation {
    /// A context-keyword parameter's bound value, by parameter name.
    pub fn context_value(&self, name: &str) -> Option<&str> {
        self.named.get(name).and_then(|v| v.as_deref())
    }
}

/// What a handler produced.
#[derive(Clone, Debug)]
pub enum Reply {
    /// A plain text response, converted to a message before injection.
    Text(String),
    /// A fully formed rich-text response.
    Message(thorn_proto::Message),
    /// Stop processing: suppress emission rather than send a reply.
    Suppress,
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<thorn_proto::Message> for Reply {
    fn from(message: thorn_proto::Message) -> Self {
        Reply::Message(message)
    }
}

/// Trait implemented by all subcommand handlers.
///
/// Handlers receive their arguments already validated and bound; they
/// may perform async I/O of their own. Handlers holding shared
/// resources must be internally concurrency-safe — the engine never
/// serializes calls into a handler.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one bound invocation.
    async fn handle(&self, invocation: Invocation) -> Result<Reply, CommandError>;
}

/// Declarative metadata for one invocable unit.
pub struct Subcommand {
    /// Subcommand name, matched exactly against the first token.
    pub name: &'static str,
    /// Ordered parameter list.
    pub params: Vec<Param>,
    handler: Arc<dyn Handler>,
}

impl Subcommand {
    /// Build a descriptor from a name, parameter list, and handler.
    pub fn new(
        name: &'static str,
        params: Vec<Param>,
        handler: impl Handler + 'static,
    ) -> Self {
        Subcommand { name, params, handler: Arc::new(handler) }
    }

    /// Inclusive `[min, max]` count of positional tokens accepted.
    /// `None` max means unbounded (a variadic parameter is present).
    fn arity_window(&self) -> (usize, Option<usize>) {
        let mut min = 0;
        let mut max = Some(0);
        for param in &self.params {
            match param.kind {
                ParamKind::Required => {
                    min += 1;
                    max = max.map(|m| m + 1);
                }
                ParamKind::Optional => {
                    max = max.map(|m| m + 1);
                }
                ParamKind::Variadic { required } => {
                    if required {
                        min += 1;
                    }
                    max = None;
                }
                ParamKind::Context { .. } => {}
            }
        }
        (min, max)
    }
}

/// A root command's set of subcommand descriptors.
///
/// Resolution is strictly by exact-name lookup. The default descriptor
/// is reachable by its own name and by a zero-token invocation of the
/// root command; it is never triggered by an unmatched first token.
pub struct CommandSet {
    name: &'static str,
    subcommands: Vec<Subcommand>,
    default: Option<usize>,
}

impl CommandSet {
    /// An empty set for the given root command name.
    pub fn new(name: &'static str) -> Self {
        CommandSet { name, subcommands: Vec::new(), default: None }
    }

    /// Register a subcommand. Registration order is preserved for usage
    /// listings.
    #[must_use]
    pub fn subcommand(mut self, sub: Subcommand) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Register a subcommand and mark it as the set's default.
    #[must_use]
    pub fn default_subcommand(mut self, sub: Subcommand) -> Self {
        self.subcommands.push(sub);
        self.default = Some(self.subcommands.len() - 1);
        self
    }

    /// The root command name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn find(&self, name: &str) -> Option<&Subcommand> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    /// Usage string listing every subcommand in registration order.
    fn root_usage(&self) -> String {
        let names: Vec<&str> = self.subcommands.iter().map(|s| s.name).collect();
        format!("!{} <{}>", self.name, names.join("|"))
    }

    /// Usage string for one subcommand: `!root sub <p1> <p2>`.
    fn sub_usage(&self, sub: &Subcommand) -> String {
        let params: Vec<String> = sub
            .params
            .iter()
            .filter(|p| !matches!(p.kind, ParamKind::Context { .. }))
            .map(|p| format!("<{}>", p.name))
            .collect();
        if params.is_empty() {
            format!("!{} {}", self.name, sub.name)
        } else {
            format!("!{} {} {}", self.name, sub.name, params.join(" "))
        }
    }

    /// Resolve a subcommand from the token stream, bind arguments, and
    /// invoke its handler.
    ///
    /// `tokens[0]` names the subcommand; the remainder are positional
    /// arguments. A zero-token invocation runs the default descriptor
    /// when one is registered, and otherwise produces a usage error
    /// enumerating every subcommand.
    pub async fn invoke(
        &self,
        tokens: &[String],
        ctx: &Context,
    ) -> Result<Reply, CommandError> {
        let (sub, rest) = match tokens.split_first() {
            None => {
                let Some(index) = self.default else {
                    return Err(CommandError::NotEnoughArguments {
                        usage: self.root_usage(),
                    });
                };
                (&self.subcommands[index], &tokens[..0])
            }
            Some((head, rest)) => {
                let Some(sub) = self.find(head) else {
                    return Err(CommandError::UnknownSubcommand(head.clone()));
                };
                (sub, rest)
            }
        };

        let invocation = self.bind(sub, rest, ctx)?;
        sub.handler.handle(invocation).await
    }

    /// Validate arity and patterns, then build the bound argument set.
    fn bind(
        &self,
        sub: &Subcommand,
        tokens: &[String],
        ctx: &Context,
    ) -> Result<Invocation, CommandError> {
        let (min, max) = sub.arity_window();
        if tokens.len() < min {
            return Err(CommandError::NotEnoughArguments {
                usage: self.sub_usage(sub),
            });
        }
        if let Some(max) = max {
            if tokens.len() > max {
                return Err(CommandError::TooManyArguments {
                    usage: self.sub_usage(sub),
                });
            }
        }

        let mut args = Vec::with_capacity(tokens.len());
        let mut index = 0;
        for param in sub.params.iter().filter(|p| p.is_positional()) {
            if index >= tokens.len() {
                break;
            }
            args.push(validate(param, &tokens[index])?);
            index += 1;
        }
        // the variadic tail is passed through unvalidated
        for token in &tokens[index..] {
            args.push(Arg::Text(token.clone()));
        }

        let mut named = HashMap::new();
        for param in &sub.params {
            if let ParamKind::Context { key } = param.kind {
                named.insert(param.name, ctx.get(key).map(str::to_owned));
            }
        }

        Ok(Invocation { args, named })
    }
}

/// Apply a parameter's anchored pattern to one token.
fn validate(param: &Param, token: &str) -> Result<Arg, CommandError> {
    let Some(pattern) = &param.pattern else {
        return Ok(Arg::Text(token.to_string()));
    };
    let Some(source) = pattern.source() else {
        return Ok(Arg::Text(token.to_string()));
    };
    let regex = match Regex::new(&format!("^{source}$")) {
        Ok(regex) => regex,
        Err(error) => {
            warn!(
                param = param.name,
                pattern = source,
                %error,
                "invalid validation pattern; argument passed through"
            );
            return Ok(Arg::Text(token.to_string()));
        }
    };
    let Some(captures) = regex.captures(token) else {
        return Err(CommandError::InvalidArgument {
            param: param.name.to_string(),
            token: token.to_string(),
        });
    };
    match captures.len() - 1 {
        0 => Ok(Arg::Text(token.to_string())),
        1 => Ok(Arg::Text(
            captures.get(1).map_or("", |m| m.as_str()).to_string(),
        )),
        _ => Ok(Arg::Groups(
            (1..captures.len())
                .map(|i| captures.get(i).map_or("", |m| m.as_str()).to_string())
                .collect(),
        )),
    }
}

/// Registry of root commands.
///
/// Built once at startup from each plugin's declared metadata;
/// read-only thereafter.
pub struct Registry {
    commands: HashMap<&'static str, CommandSet>,
}

impl Registry {
    /// A registry with every builtin command plugin registered.
    pub fn new() -> Self {
        let mut registry = Registry { commands: HashMap::new() };
        registry.register(cube::command_set());
        registry.register(temmie::command_set());
        registry.register(multi::command_set());
        registry
    }

    /// An empty registry.
    pub fn empty() -> Self {
        Registry { commands: HashMap::new() }
    }

    /// Register a root command's descriptor set.
    pub fn register(&mut self, set: CommandSet) {
        self.commands.insert(set.name(), set);
    }

    /// Look up a root command by name.
    pub fn get(&self, name: &str) -> Option<&CommandSet> {
        self.commands.get(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
