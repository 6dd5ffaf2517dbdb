//! Prompt templates for RAG generation

use crate::error::{Error, Result};
use crate::retrieval::ScoredChunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from search results, numbered from 1
    pub fn build_context(results: &[ScoredChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&Self::format_entry(i + 1, result));
        }

        context
    }

    fn format_entry(number: usize, result: &ScoredChunk) -> String {
        format!(
            "[{}] {}\n\nContent:\n{}\n\n---\n\n",
            number, result.chunk.document_id, result.chunk.content
        )
    }

    /// Build a simple question-answering prompt
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Based on the following context, answer the question. Only use information from the context.

Context:
{context}

Question: {question}

Answer:"#,
            context = context,
            question = question
        )
    }

    /// Build a prompt that refines an earlier answer with one more chunk
    pub fn build_refine_prompt(question: &str, existing_answer: &str, context: &str) -> String {
        format!(
            r#"Refine the existing answer to the question using the additional context. If the context is not useful, repeat the existing answer unchanged.

Existing answer:
{existing_answer}

Context:
{context}

Question: {question}

Refined answer:"#,
            existing_answer = existing_answer,
            context = context,
            question = question
        )
    }

    /// Build the single compact-mode prompt within `max_chars`.
    ///
    /// Chunks are dropped from the low-similarity end until the prompt fits;
    /// a chunk is never cut. Returns the prompt and how many chunks it holds.
    pub fn fit_compact(
        question: &str,
        results: &[ScoredChunk],
        max_chars: usize,
    ) -> Result<(String, usize)> {
        let base_len = Self::build_qa_prompt(question, "").chars().count();
        if base_len > max_chars {
            return Err(Error::InvalidQuery(format!(
                "question is too long: prompt needs {} characters, limit is {}",
                base_len, max_chars
            )));
        }

        let mut kept = results.len();
        while kept > 0 {
            let context = Self::build_context(&results[..kept]);
            if base_len + context.chars().count() <= max_chars {
                return Ok((Self::build_qa_prompt(question, &context), kept));
            }
            kept -= 1;
        }

        Ok((Self::build_qa_prompt(question, ""), 0))
    }

    /// Refine-mode prompt for one chunk, or `None` if it would exceed `max_chars`
    pub fn fit_refine(
        question: &str,
        existing_answer: Option<&str>,
        number: usize,
        result: &ScoredChunk,
        max_chars: usize,
    ) -> Option<String> {
        let context = Self::format_entry(number, result);
        let prompt = match existing_answer {
            Some(answer) => Self::build_refine_prompt(question, answer, &context),
            None => Self::build_qa_prompt(question, &context),
        };

        (prompt.chars().count() <= max_chars).then_some(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn scored(doc: &str, content: &str, similarity: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(doc.to_string(), 0, content.to_string()),
            similarity,
        }
    }

    #[test]
    fn test_context_is_numbered_with_sources() {
        let results = vec![
            scored("x.md", "X is a protocol for Y", 0.9),
            scored("z.txt", "Z is unrelated", 0.1),
        ];
        let context = PromptBuilder::build_context(&results);

        assert!(context.starts_with("[1] x.md"));
        assert!(context.contains("[2] z.txt"));
        assert!(context.find("X is a protocol").unwrap() < context.find("Z is unrelated").unwrap());
    }

    #[test]
    fn test_fit_compact_keeps_everything_when_it_fits() {
        let results = vec![scored("a.txt", "alpha", 0.9), scored("b.txt", "beta", 0.5)];
        let (prompt, kept) = PromptBuilder::fit_compact("What?", &results, 10_000).unwrap();

        assert_eq!(kept, 2);
        assert!(prompt.contains("alpha") && prompt.contains("beta"));
        assert!(prompt.contains("Question: What?"));
    }

    #[test]
    fn test_fit_compact_drops_lowest_similarity_first() {
        let results = vec![
            scored("a.txt", &"a".repeat(100), 0.9),
            scored("b.txt", &"b".repeat(100), 0.8),
            scored("c.txt", &"c".repeat(100), 0.7),
        ];
        let base = PromptBuilder::build_qa_prompt("Q?", "").chars().count();
        let two = PromptBuilder::build_context(&results[..2]).chars().count();

        let (prompt, kept) = PromptBuilder::fit_compact("Q?", &results, base + two).unwrap();
        assert_eq!(kept, 2);
        assert!(prompt.contains(&"b".repeat(100)));
        assert!(!prompt.contains(&"c".repeat(100)));
    }

    #[test]
    fn test_fit_compact_question_too_long() {
        let question = "why ".repeat(100);
        let err = PromptBuilder::fit_compact(&question, &[], 50).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_fit_refine_skips_oversized_chunk() {
        let small = scored("a.txt", "short", 0.9);
        let large = scored("b.txt", &"x".repeat(500), 0.8);

        let first = PromptBuilder::fit_refine("Q?", None, 1, &small, 400).unwrap();
        assert!(first.contains("short"));
        assert!(PromptBuilder::fit_refine("Q?", Some("draft"), 2, &large, 400).is_none());

        let refine = PromptBuilder::fit_refine("Q?", Some("draft"), 2, &small, 400).unwrap();
        assert!(refine.contains("Existing answer:\ndraft"));
    }
}
