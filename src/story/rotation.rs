//! Figure rotation — which historical figure gets the next generated story.
//!
//! Pure ordering logic over the per-figure usage aggregates: figures that
//! have never been served come first, then ascending total use count, then
//! stalest `last_used`. Ties break on figure name so the ordering is
//! deterministic for a given store state.

use std::collections::HashMap;

use crate::story::store::FigureUsage;
use crate::story::types::FigureSeed;

/// Order seed figures for the next `n` generation slots.
///
/// A figure with no usage entry counts as never served. RFC 3339 strings
/// compare chronologically, so `last_used` ordering is plain string ordering.
pub fn next_figures<'a>(
    seeds: &'a [FigureSeed],
    usage: &HashMap<String, FigureUsage>,
    n: usize,
) -> Vec<&'a FigureSeed> {
    let mut ordered: Vec<&FigureSeed> = seeds.iter().collect();
    ordered.sort_by(|a, b| rotation_key(a, usage).cmp(&rotation_key(b, usage)));
    ordered.truncate(n);
    ordered
}

type RotationKey<'a> = (bool, u32, Option<&'a str>, &'a str);

fn rotation_key<'a>(
    seed: &'a FigureSeed,
    usage: &'a HashMap<String, FigureUsage>,
) -> RotationKey<'a> {
    match usage.get(&seed.figure) {
        Some(entry) => (
            entry.last_used.is_some(),
            entry.use_count,
            entry.last_used.as_deref(),
            seed.figure.as_str(),
        ),
        None => (false, 0, None, seed.figure.as_str()),
    }
}
