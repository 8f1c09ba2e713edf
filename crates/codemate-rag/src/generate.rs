//! Prompt construction and answer generation

use crate::deadline::{bounded, RequestCtx};
use codemate_core::{
    Answer, AssembledContext, BackendError, Candidate, LlmClient, PipelineConfig, PipelineError,
    Result,
};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Answer returned when the assembled context is empty. Not an error:
/// retrieval finding nothing relevant is a valid outcome.
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant context was found in the indexed codebase for this question.";

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[source:\s*(\d+)\]").expect("citation pattern compiles"))
}

/// Generates an answer from assembled context via the model backend.
///
/// Transient backend failures are retried with exponential backoff up to
/// `max_retries`; a malformed response fails immediately. The whole
/// sequence runs under `generation_timeout`, which is configured longer
/// than the retrieval timeout.
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
    config: PipelineConfig,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    /// Produce an answer for the question given the assembled context.
    pub async fn generate(
        &self,
        question: &str,
        context: &AssembledContext,
        ctx: &RequestCtx,
    ) -> Result<Answer> {
        if context.is_empty() {
            debug!("empty context, skipping backend call");
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                cited: Vec::new(),
            });
        }

        let prompt = build_prompt(question, context);
        debug!(prompt_len = prompt.len(), sources = context.len(), "prompt built");

        let text = bounded(
            ctx,
            self.config.generation_timeout(),
            self.generate_with_retry(&prompt),
        )
        .await
        .ok_or(PipelineError::GenerationTimeout)??;

        let cited = extract_citations(&text, &context.candidates);
        Ok(Answer { text, cited })
    }

    async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        let mut last_err: Option<BackendError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.backoff_base() * 2u32.pow(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying generation");
                tokio::time::sleep(delay).await;
            }

            match self.llm.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => last_err = Some(e),
                Err(e) => return Err(PipelineError::GenerationFailed(e.to_string())),
            }
        }

        let detail = last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(PipelineError::GenerationFailed(format!(
            "retries exhausted: {detail}"
        )))
    }
}

/// Build the generation prompt from a fixed template: instructions,
/// enumerated sources, question. Same input, same prompt.
pub fn build_prompt(question: &str, context: &AssembledContext) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are an assistant answering questions about a codebase.\n");
    prompt.push_str("Use only the numbered sources below.\n");
    prompt.push_str("Mark every source you rely on as [source: N].\n");
    prompt.push_str("If the sources do not contain the answer, say so.\n\n");

    prompt.push_str("<sources>\n");
    for (i, candidate) in context.candidates.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] {} `{}` in {}\n",
            i + 1,
            candidate.kind,
            candidate.symbol,
            candidate.file_path
        ));
        prompt.push_str(&candidate.snippet);
        prompt.push_str("\n\n");
    }
    prompt.push_str("</sources>\n\n");

    prompt.push_str("<question>\n");
    prompt.push_str(question);
    prompt.push_str("\n</question>\n");

    prompt
}

/// Map `[source: N]` markers in the answer back to context candidates,
/// preserving context order.
///
/// A reply without any markers cites the entire assembled context: with no
/// signal from the backend there is no way to tell which sources were used,
/// so the answer is attributed to everything it was shown.
pub fn extract_citations(answer: &str, candidates: &[Candidate]) -> Vec<Candidate> {
    let mut cited: BTreeSet<usize> = BTreeSet::new();

    for cap in citation_pattern().captures_iter(answer) {
        let Some(num) = cap.get(1) else {
            continue;
        };
        let Ok(num) = num.as_str().parse::<usize>() else {
            continue;
        };
        if num == 0 || num > candidates.len() {
            continue;
        }
        cited.insert(num - 1);
    }

    if cited.is_empty() {
        return candidates.to_vec();
    }

    cited.into_iter().map(|i| candidates[i].clone()).collect()
}
