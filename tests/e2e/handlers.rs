//! Deterministic prompt handlers for E2E tests

use ascp_server_core::{PromptHandler, SessionRecord};
use async_trait::async_trait;

/// Answers "What is X+Y?" prompts deterministically, the way the E2E suite
/// expects a backend to answer its fixed arithmetic prompts.
pub struct ArithmeticPromptHandler;

#[async_trait]
impl PromptHandler for ArithmeticPromptHandler {
    async fn complete(&self, _session: &SessionRecord, prompt: &str) -> String {
        answer_arithmetic(prompt).unwrap_or_else(|| "I cannot help with that.".to_string())
    }
}

fn answer_arithmetic(prompt: &str) -> Option<String> {
    let cleaned = prompt.trim().trim_end_matches(['?', '.']);
    let expr = cleaned.rsplit(' ').next()?;
    let (a, b) = expr.split_once('+')?;
    let a: i64 = a.trim().parse().ok()?;
    let b: i64 = b.trim().parse().ok()?;
    Some(format!("{} + {} = {}", a, b, a + b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_the_fixture_prompts() {
        assert_eq!(answer_arithmetic("What is 2+2?").unwrap(), "2 + 2 = 4");
        assert_eq!(answer_arithmetic("What is 7+7?").unwrap(), "7 + 7 = 14");
        assert!(answer_arithmetic("What is the weather?").is_none());
    }
}
