//! Answer types produced by a question-answering engine.

use serde::Serialize;

/// Location of an answer inside the context passage.
///
/// `start` and `end` are byte offsets into the context (`end` exclusive), so
/// `&context[span.start..span.end]` recovers the answer text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Sum of the start and end logits for this span. Higher is better.
    pub logit: f32,
}

/// A single extracted answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub pos: Span,
}

impl Answer {
    pub fn new(text: impl Into<String>, start: usize, end: usize, logit: f32) -> Self {
        Self {
            text: text.into(),
            pos: Span { start, end, logit },
        }
    }
}
