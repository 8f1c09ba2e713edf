//! Context assembly: dedup, rank, and budget retrieved candidates

use codemate_core::{AssembledContext, Candidate};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Select candidates for generation under a size budget.
///
/// Duplicates by (file path, symbol) keep the highest-scoring instance.
/// Ordering is score descending, ties broken by file path then symbol, so
/// identical inputs always assemble identically. Candidates that do not fit
/// the remaining budget are skipped silently; fewer sources is acceptable
/// and an empty result is valid (the generator handles it).
pub fn assemble(candidates: Vec<Candidate>, budget: usize) -> AssembledContext {
    let mut best: HashMap<(String, String), Candidate> = HashMap::new();
    for candidate in candidates {
        let key = (candidate.file_path.clone(), candidate.symbol.clone());
        match best.entry(key) {
            Entry::Occupied(mut entry) => {
                let incumbent = entry.get();
                // Equal scores fall back to snippet order so the winner does
                // not depend on input order.
                if candidate.score > incumbent.score
                    || (candidate.score == incumbent.score
                        && candidate.snippet < incumbent.snippet)
                {
                    entry.insert(candidate);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(candidate);
            }
        }
    }

    let mut deduped: Vec<Candidate> = best.into_values().collect();
    deduped.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let mut selected = Vec::new();
    let mut consumed = 0usize;
    for candidate in deduped {
        let size = candidate.size();
        if consumed + size > budget {
            continue;
        }
        consumed += size;
        selected.push(candidate);
    }

    AssembledContext {
        candidates: selected,
        consumed,
    }
}
