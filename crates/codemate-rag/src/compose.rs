//! Result composition

use codemate_core::{Answer, QueryResult, Source};
use std::collections::HashMap;

/// Project an `Answer` into the externally visible `QueryResult`.
///
/// Sources are deduplicated by (file path, name): the first occurrence
/// keeps its position, and the score shown is the highest seen for that
/// key. Pure projection, no failure modes.
pub fn compose(answer: Answer) -> QueryResult {
    let mut sources: Vec<Source> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for candidate in &answer.cited {
        let key = (candidate.file_path.clone(), candidate.symbol.clone());
        match index.get(&key) {
            Some(&i) => {
                if candidate.score > sources[i].score {
                    sources[i].score = candidate.score;
                }
            }
            None => {
                index.insert(key, sources.len());
                sources.push(Source::from(candidate));
            }
        }
    }

    QueryResult {
        answer: answer.text,
        sources,
    }
}
