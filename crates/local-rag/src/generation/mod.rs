//! Answer generation: prompt assembly for the configured response mode

pub mod prompt;

pub use prompt::PromptBuilder;
