//! hOI!!!!!!

use async_trait::async_trait;
use rand::seq::SliceRandom;
use thorn_proto::Message;

use super::{Arg, CommandSet, Handler, Invocation, Param, Reply, Subcommand};
use crate::error::CommandError;

/// Quote text and whether it is delivered in action form.
const QUOTES: &[(&str, bool)] = &[
    ("fhsdhjfdsfjsddshjfsd", false),
    ("hOI!!!!!! i'm tEMMIE!!", false),
    ("awwAwa cute!! (pets u)", false),
    ("OMG!! humans TOO CUTE (dies)", false),
    ("NO!!!!! muscles r... NOT CUTE", false),
    ("NO!!! so hungr... (dies)", false),
    ("FOOB!!!", false),
    ("can't blame a BARK for tryin'...", false),
    (
        "RATED TEM OUTTA TEM. Loves to pet cute humans. But you're allergic!",
        true,
    ),
    ("Special enemy Temmie appears here to defeat you!!", true),
    ("Temmie is trying to glomp you.", true),
    ("Temmie forgot her other attack.", true),
    ("Temmie is doing her hairs.", true),
    ("Smells like Temmie Flakes.", true),
    ("Temmie vibrates intensely.", true),
    ("Temmiy accidentally misspells her own name.", true),
    ("You flex at Temmie...", true),
    ("Temmie only wants the Temmie Flakes.", true),
    ("You say hello to Temmie.", true),
];

/// Character-bigram Dice coefficient in `[0, 1]`.
///
/// Only has to order candidates sensibly: the closest quote is always
/// returned, however weak the match.
fn similarity(a: &str, b: &str) -> f64 {
    fn bigrams(s: &str) -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    }

    let (left, right) = (bigrams(a), bigrams(b));
    if left.is_empty() && right.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }
    let mut pool = right.clone();
    let mut shared = 0usize;
    for gram in &left {
        if let Some(pos) = pool.iter().position(|g| g == gram) {
            pool.swap_remove(pos);
            shared += 1;
        }
    }
    (2 * shared) as f64 / (left.len() + right.len()) as f64
}

/// Handler for the `get` subcommand.
struct Get;

#[async_trait]
impl Handler for Get {
    async fn handle(&self, invocation: Invocation) -> Result<Reply, CommandError> {
        let query: Vec<&str> = invocation.args.iter().map(Arg::as_str).collect();

        let (quote, action) = if query.is_empty() {
            *QUOTES
                .choose(&mut rand::thread_rng())
                .expect("quote table is not empty")
        } else {
            let needle = query.join(" ").to_lowercase();
            *QUOTES
                .iter()
                .max_by(|(a, _), (b, _)| {
                    similarity(&a.to_lowercase(), &needle)
                        .total_cmp(&similarity(&b.to_lowercase(), &needle))
                })
                .expect("quote table is not empty")
        };

        Ok(Reply::Message(
            Message::from_text(quote).with_action(action),
        ))
    }
}

/// The `temmie` command's descriptor set.
pub fn command_set() -> CommandSet {
    CommandSet::new("temmie").default_subcommand(Subcommand::new(
        "get",
        vec![Param::variadic("query")],
        Get,
    ))
}
