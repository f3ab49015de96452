//! Cube things.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{Arg, CommandSet, Handler, Invocation, Param, Reply, Subcommand};
use crate::error::CommandError;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([-+]?\d*\.\d+|[-+]?\d+)$").expect("valid number pattern"))
}

/// Cube a single value.
///
/// Numbers are cubed numerically and formatted to 4 significant digits;
/// `:emote`-style values get a `³` suffix; anything else is wrapped.
fn cube(value: &str) -> String {
    if value.starts_with(':') {
        return format!("{value} ³");
    }
    if number_re().is_match(value) {
        if let Ok(n) = value.parse::<f64>() {
            return fmt_sig4(n.powi(3));
        }
    }
    format!("({value})³")
}

/// Format with 4 significant digits, the way `%.4g` does: fixed-point
/// in the middle of the range, scientific outside it, trailing zeros
/// trimmed.
fn fmt_sig4(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if !x.is_finite() {
        return x.to_string();
    }
    let mut exp = x.abs().log10().floor() as i32;
    // rounding to four digits can carry into the next power of ten
    if (x.abs() / 10f64.powi(exp - 3)).round() >= 10_000.0 {
        exp += 1;
    }
    if (-4..4).contains(&exp) {
        let decimals = (3 - exp).max(0) as usize;
        trim_zeros(format!("{x:.decimals$}"))
    } else {
        let mantissa = x / 10f64.powi(exp);
        let mantissa = trim_zeros(format!("{mantissa:.3}"));
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

fn trim_zeros(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Handler for the `run` subcommand.
struct Run;

#[async_trait]
impl Handler for Run {
    async fn handle(&self, invocation: Invocation) -> Result<Reply, CommandError> {
        let values: Vec<&str> = invocation.args.iter().map(Arg::as_str).collect();

        if values.is_empty() {
            let username = invocation.context_value("username").unwrap_or("");
            return Ok(Reply::Text(cube(username)));
        }
        if values == ["2"] {
            return Ok(Reply::Text("8. Whoa, that's 2Cubed!".to_string()));
        }
        if values.len() > 8 {
            return Ok(Reply::Text("Whoa, that's 2 many cubes".to_string()));
        }

        let cubed: Vec<String> = values.iter().map(|v| cube(v)).collect();
        Ok(Reply::Text(cubed.join(" · ")))
    }
}

/// The `cube` command's descriptor set.
pub fn command_set() -> CommandSet {
    CommandSet::new("cube").default_subcommand(Subcommand::new(
        "run",
        vec![
            Param::variadic("value"),
            Param::context("username", "username"),
        ],
        Run,
    ))
}
