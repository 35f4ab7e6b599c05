//! Seams between the adapter and the inference engine.

use std::path::Path;

use bertqa_core::{Answer, Delegate, QaConfig};

/// Options a handle is built with. The delegate is chosen per load; the span
/// limits come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswererOptions {
    pub delegate: Delegate,
    /// Maximum tokens in the combined `[CLS] question [SEP] context [SEP]` input.
    pub max_seq_len: usize,
    pub max_query_len: usize,
    pub max_answer_len: usize,
    pub num_answers: usize,
}

impl AnswererOptions {
    pub fn from_config(delegate: Delegate, config: &QaConfig) -> Self {
        Self {
            delegate,
            max_seq_len: config.max_seq_len,
            max_query_len: config.max_query_len,
            max_answer_len: config.max_answer_len,
            num_answers: config.num_answers,
        }
    }
}

/// A loaded model that can answer questions about a context passage.
///
/// Dropping the value releases whatever native resources it holds.
pub trait QuestionAnswerer {
    fn answer(&mut self, context: &str, question: &str) -> anyhow::Result<Vec<Answer>>;
}

/// Builds handles from a bundled model.
pub trait AnswererFactory {
    type Answerer: QuestionAnswerer;

    fn create(
        &self,
        model_dir: &Path,
        options: &AnswererOptions,
    ) -> anyhow::Result<Self::Answerer>;
}
