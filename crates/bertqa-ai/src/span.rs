//! Answer span decoding from BERT start/end logits.
//!
//! Picks the best-scoring `(start, end)` token pairs restricted to context
//! tokens. Scores are `start_logit + end_logit`; no softmax is needed to rank.

use bertqa_core::Answer;

/// Number of start and end positions considered before pairing.
pub const N_BEST: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanLimits {
    pub n_best: usize,
    /// Longest answer allowed, in tokens (inclusive span length).
    pub max_answer_len: usize,
    pub num_answers: usize,
}

/// A candidate answer as inclusive token indices into the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanCandidate {
    pub start: usize,
    pub end: usize,
    pub logit: f32,
}

/// Decode up to `limits.num_answers` spans, best first.
///
/// `is_context[i]` marks tokens that belong to the context passage; spans never
/// start or end outside it.
pub fn best_spans(
    start_logits: &[f32],
    end_logits: &[f32],
    is_context: &[bool],
    limits: &SpanLimits,
) -> Vec<SpanCandidate> {
    let len = start_logits.len().min(end_logits.len()).min(is_context.len());
    let starts = top_indices(&start_logits[..len], &is_context[..len], limits.n_best);
    let ends = top_indices(&end_logits[..len], &is_context[..len], limits.n_best);

    let mut candidates = Vec::with_capacity(starts.len() * ends.len());
    for &s in &starts {
        for &e in &ends {
            if e < s || e - s + 1 > limits.max_answer_len {
                continue;
            }
            candidates.push(SpanCandidate {
                start: s,
                end: e,
                logit: start_logits[s] + end_logits[e],
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.logit
            .partial_cmp(&a.logit)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(limits.num_answers);
    candidates
}

/// Marks tokens of the second (context) sequence. Special tokens carry no
/// sequence id and question tokens have id 0.
pub fn context_mask(sequence_ids: &[Option<usize>]) -> Vec<bool> {
    sequence_ids.iter().map(|s| *s == Some(1)).collect()
}

/// Turn token spans into answers with byte offsets into `context`.
///
/// `offsets[i]` is the byte range of token `i` within its own sequence, so for
/// context tokens it indexes `context` directly. Spans touching a non-context
/// token are skipped.
pub fn spans_to_answers(
    context: &str,
    offsets: &[(usize, usize)],
    is_context: &[bool],
    spans: &[SpanCandidate],
) -> Vec<Answer> {
    let in_context = |i: usize| is_context.get(i).copied().unwrap_or(false);
    spans
        .iter()
        .filter(|span| in_context(span.start) && in_context(span.end))
        .filter_map(|span| {
            let start = offsets.get(span.start)?.0;
            let end = offsets.get(span.end)?.1;
            context
                .get(start..end)
                .map(|text| Answer::new(text, start, end, span.logit))
        })
        .collect()
}

/// Indices of the `k` largest logits among masked-in positions, largest first.
fn top_indices(logits: &[f32], mask: &[bool], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..logits.len()).filter(|&i| mask[i]).collect();
    indices.sort_by(|&a, &b| {
        logits[b]
            .partial_cmp(&logits[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices.truncate(k);
    indices
}
