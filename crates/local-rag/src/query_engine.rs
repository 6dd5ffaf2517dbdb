//! Query engine: retrieve the closest chunks and generate a grounded answer

use std::sync::Arc;
use std::time::Instant;

use crate::config::{RagConfig, ResponseMode};
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{DirectoryStatus, DocumentLoader, TextChunker};
use crate::providers::{EmbeddingProvider, GenerationParams, LlmProvider};
use crate::retrieval::{IndexBuilder, ScoredChunk, VectorIndex};
use crate::types::{preview, Answer, RetrievedChunk};

/// Per-query knobs taken from configuration
#[derive(Debug, Clone)]
pub struct QuerySettings {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Characters of each source returned to the caller
    pub preview_chars: usize,
    /// Generator input limit in characters
    pub max_prompt_chars: usize,
    /// How retrieved chunks become generator calls
    pub response_mode: ResponseMode,
    /// Sampling parameters
    pub generation: GenerationParams,
}

impl From<&RagConfig> for QuerySettings {
    fn from(config: &RagConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            preview_chars: config.retrieval.preview_chars,
            max_prompt_chars: config.llm.max_prompt_chars,
            response_mode: config.retrieval.response_mode,
            generation: GenerationParams::from(&config.llm),
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

/// Owns the index; shared read-only across requests
pub struct QueryEngine {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    settings: QuerySettings,
}

impl QueryEngine {
    /// Create an engine over a built index
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            settings,
        }
    }

    /// Provision the document directory, load it and build the index
    pub async fn bootstrap(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let start = Instant::now();

        match DocumentLoader::prepare_directory(&config.documents)? {
            DirectoryStatus::Created => tracing::warn!(
                "Document directory {} was just created and is empty",
                config.documents.dir.display()
            ),
            DirectoryStatus::Missing => tracing::warn!(
                "Document directory {} is missing and auto-creation is disabled",
                config.documents.dir.display()
            ),
            DirectoryStatus::Existing => {}
        }

        let loader = DocumentLoader::new(&config.documents);
        let documents = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| Error::internal(format!("Document loading task failed: {}", e)))??;

        let builder = IndexBuilder::new(
            Arc::clone(&embedder),
            TextChunker::from_config(&config.chunking),
            config.embeddings.dimensions,
            config.embeddings.batch_size,
        );
        let index = builder.build(documents).await?;

        tracing::info!("Query engine ready in {:?}", start.elapsed());
        Ok(Self::new(index, embedder, llm, QuerySettings::from(config)))
    }

    /// Answer with the configured `top_k`
    pub async fn query(&self, question: &str) -> Result<Answer> {
        self.answer(question, self.settings.top_k).await
    }

    /// Answer `question` from the `top_k` most similar chunks.
    ///
    /// Surrounding whitespace is ignored for retrieval and generation; the
    /// returned `Answer` echoes the question as submitted.
    pub async fn answer(&self, submitted: &str, top_k: usize) -> Result<Answer> {
        let question = submitted.trim();
        if question.is_empty() {
            return Err(Error::InvalidQuery("question must not be blank".to_string()));
        }
        if top_k == 0 {
            return Err(Error::InvalidQuery("top_k must be at least 1".to_string()));
        }

        let start = Instant::now();
        let query_embedding = self.embedder.embed(question).await?;
        let results = self.index.search(&query_embedding, top_k)?;

        tracing::debug!(
            "Retrieved {} chunks (best similarity {:.3})",
            results.len(),
            results.first().map(|r| r.similarity).unwrap_or_default()
        );

        let text = match self.settings.response_mode {
            ResponseMode::Compact => self.generate_compact(question, &results).await?,
            ResponseMode::Refine => self.generate_refine(question, &results).await?,
        };

        tracing::info!(
            "Answered in {:?} with {} sources ({:?} mode)",
            start.elapsed(),
            results.len(),
            self.settings.response_mode
        );

        Ok(Answer {
            question: submitted.to_string(),
            text,
            sources: results
                .into_iter()
                .map(|r| RetrievedChunk {
                    preview: preview(&r.chunk.content, self.settings.preview_chars),
                    chunk_id: r.chunk.id,
                    document_id: r.chunk.document_id,
                    similarity: r.similarity,
                })
                .collect(),
        })
    }

    async fn generate_compact(&self, question: &str, results: &[ScoredChunk]) -> Result<String> {
        let (prompt, kept) =
            PromptBuilder::fit_compact(question, results, self.settings.max_prompt_chars)?;
        if kept < results.len() {
            tracing::warn!(
                "Dropped {} of {} chunks to fit the {} character prompt limit",
                results.len() - kept,
                results.len(),
                self.settings.max_prompt_chars
            );
        }

        self.complete(&prompt).await
    }

    async fn generate_refine(&self, question: &str, results: &[ScoredChunk]) -> Result<String> {
        let mut answer: Option<String> = None;

        for (i, result) in results.iter().enumerate() {
            let Some(prompt) = PromptBuilder::fit_refine(
                question,
                answer.as_deref(),
                i + 1,
                result,
                self.settings.max_prompt_chars,
            ) else {
                tracing::warn!("Skipping chunk {} in refine: prompt too large", result.chunk.id);
                continue;
            };

            answer = Some(self.complete(&prompt).await?);
        }

        match answer {
            Some(answer) => Ok(answer),
            None => self.generate_compact(question, &[]).await,
        }
    }

    /// One generator call; a blank completion is an error
    async fn complete(&self, prompt: &str) -> Result<String> {
        let text = self.llm.generate(prompt, &self.settings.generation).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::generation(format!(
                "{} returned an empty completion",
                self.llm.model()
            )));
        }
        Ok(text.to_string())
    }

    /// Number of indexed chunks
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Number of indexed documents
    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{FnEmbedder, ScriptedLlm};
    use crate::providers::HashingEmbedder;
    use crate::types::response::TRUNCATION_MARKER;
    use crate::types::Chunk;
    use std::fs;

    fn engine_over(
        texts: &[(&str, &str)],
        llm: Arc<ScriptedLlm>,
        settings: QuerySettings,
    ) -> QueryEngine {
        let embedder = HashingEmbedder::new(128);
        let mut index = VectorIndex::new();
        for (doc, text) in texts {
            index
                .insert(Chunk::new(*doc, 0, text.to_string()), embedder.embed_text(text))
                .unwrap();
        }
        QueryEngine::new(index, Arc::new(embedder), llm, settings)
    }

    #[tokio::test]
    async fn test_what_is_x_scenario() {
        let llm = ScriptedLlm::echo_context();
        let engine = engine_over(
            &[
                ("x.md", "X is a protocol for Y"),
                ("fruit.txt", "Bananas grow in tropical climates"),
            ],
            llm.clone(),
            QuerySettings::default(),
        );

        let answer = engine.answer("What is X?", 3).await.unwrap();

        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].preview, "X is a protocol for Y");
        assert_eq!(answer.sources[0].document_id, "x.md");
        assert!(answer.text.contains('Y'));
        assert_eq!(llm.calls(), 1);
        assert_eq!(llm.params()[0], QuerySettings::default().generation);
    }

    #[tokio::test]
    async fn test_answer_echoes_question_as_submitted() {
        let llm = ScriptedLlm::answering("ok");
        let engine = engine_over(
            &[("x.md", "X is a protocol for Y")],
            llm.clone(),
            QuerySettings::default(),
        );

        let answer = engine.answer("  What is X?\n", 1).await.unwrap();

        assert_eq!(answer.question, "  What is X?\n");
        assert!(llm.prompts()[0].contains("Question: What is X?\n"));
    }

    #[tokio::test]
    async fn test_result_length_is_bounded_by_index_size() {
        let llm = ScriptedLlm::answering("ok");
        let engine = engine_over(
            &[("a.txt", "alpha"), ("b.txt", "beta")],
            llm,
            QuerySettings::default(),
        );

        assert_eq!(engine.answer("alpha?", 1).await.unwrap().sources.len(), 1);
        assert_eq!(engine.answer("alpha?", 10).await.unwrap().sources.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_queries_are_deterministic() {
        let engine = engine_over(
            &[
                ("a.txt", "rust ownership rules"),
                ("b.txt", "rust borrowing rules"),
                ("c.txt", "python garbage collection"),
            ],
            ScriptedLlm::answering("ok"),
            QuerySettings::default(),
        );

        let first = engine.answer("rust rules", 3).await.unwrap();
        for _ in 0..5 {
            let again = engine.answer("rust rules", 3).await.unwrap();
            assert_eq!(again.sources, first.sources);
        }
    }

    #[tokio::test]
    async fn test_previews_are_truncated_with_marker() {
        let long = "word ".repeat(100);
        let engine = engine_over(
            &[("long.txt", long.as_str())],
            ScriptedLlm::answering("ok"),
            QuerySettings::default(),
        );

        let answer = engine.answer("word", 1).await.unwrap();
        let source = &answer.sources[0].preview;
        assert!(source.ends_with(TRUNCATION_MARKER));
        assert_eq!(source.chars().count(), 200 + TRUNCATION_MARKER.len());
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_before_embedding() {
        let embedder = Arc::new(FnEmbedder::hashing());
        let llm = ScriptedLlm::answering("ok");
        let engine = QueryEngine::new(
            VectorIndex::new(),
            embedder.clone(),
            llm.clone(),
            QuerySettings::default(),
        );

        assert!(matches!(engine.answer("   ", 3).await, Err(Error::InvalidQuery(_))));
        assert!(matches!(engine.answer("ok?", 0).await, Err(Error::InvalidQuery(_))));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_errors_propagate_with_their_kind() {
        let engine = engine_over(
            &[("a.txt", "alpha")],
            ScriptedLlm::failing("timed out"),
            QuerySettings::default(),
        );
        assert!(matches!(engine.query("alpha?").await, Err(Error::Generation(_))));

        let engine = QueryEngine::new(
            VectorIndex::new(),
            Arc::new(FnEmbedder::new(|_: &str| Err(Error::embedding("refused")))),
            ScriptedLlm::answering("unused"),
            QuerySettings::default(),
        );
        assert!(matches!(engine.query("alpha?").await, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_blank_completion_is_generation_error() {
        let engine = engine_over(
            &[("a.txt", "alpha")],
            ScriptedLlm::answering("  \n "),
            QuerySettings::default(),
        );
        assert!(matches!(engine.query("alpha?").await, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn test_refine_calls_generator_per_chunk() {
        let llm = ScriptedLlm::answering("refined");
        let settings = QuerySettings {
            response_mode: ResponseMode::Refine,
            ..QuerySettings::default()
        };
        let engine = engine_over(
            &[("a.txt", "alpha one"), ("b.txt", "alpha two"), ("c.txt", "alpha three")],
            llm.clone(),
            settings,
        );

        let answer = engine.answer("alpha", 3).await.unwrap();
        assert_eq!(answer.text, "refined");
        assert_eq!(answer.sources.len(), 3);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(!prompts[0].contains("Existing answer:"));
        assert!(prompts[1].contains("Existing answer:\nrefined"));
    }

    #[tokio::test]
    async fn test_compact_reports_all_sources_even_when_dropped_from_prompt() {
        let llm = ScriptedLlm::answering("short answer");
        let settings = QuerySettings {
            max_prompt_chars: 300,
            ..QuerySettings::default()
        };
        let big = "alpha ".repeat(40);
        let engine = engine_over(
            &[("a.txt", "alpha"), ("b.txt", big.as_str())],
            llm.clone(),
            settings,
        );

        let answer = engine.answer("alpha", 2).await.unwrap();
        assert_eq!(answer.sources.len(), 2);
        assert!(llm.prompts()[0].chars().count() <= 300);
    }

    #[tokio::test]
    async fn test_bootstrap_from_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("x.md"), "X is a protocol for Y.").unwrap();
        fs::write(temp.path().join("z.txt"), "Zebras are striped animals.").unwrap();

        let mut config = RagConfig::default();
        config.documents.dir = temp.path().to_path_buf();

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(64));
        let engine = QueryEngine::bootstrap(&config, embedder, ScriptedLlm::echo_context())
            .await
            .unwrap();

        assert_eq!(engine.document_count(), 2);
        assert_eq!(engine.chunk_count(), 2);

        let answer = engine.query("What is X?").await.unwrap();
        assert_eq!(answer.sources[0].document_id, "x.md");
    }

    #[tokio::test]
    async fn test_bootstrap_empty_directory_is_configuration_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.documents.dir = temp.path().join("sample_docs");

        let embedder = Arc::new(FnEmbedder::hashing());
        let result =
            QueryEngine::bootstrap(&config, embedder.clone(), ScriptedLlm::answering("x")).await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert!(config.documents.dir.is_dir());
        assert_eq!(embedder.calls(), 0);
    }
}
