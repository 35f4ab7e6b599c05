//! ONNX Runtime engine for extractive BERT question answering.
//!
//! Expects a SQuAD-style model (e.g. MobileBERT) exported with `input_ids`,
//! `attention_mask`, `token_type_ids` inputs and `start_logits`, `end_logits`
//! outputs. The model directory must contain `model.onnx` and `tokenizer.json`.

use std::path::Path;

use bertqa_core::{Answer, Delegate, DeviceCapabilities};
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider, NNAPIExecutionProvider};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use crate::engine::{AnswererFactory, AnswererOptions, QuestionAnswerer};
use crate::span::{N_BEST, SpanLimits, best_spans, context_mask, spans_to_answers};

/// Builds [`OnnxBertAnswerer`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrtAnswererFactory;

impl AnswererFactory for OrtAnswererFactory {
    type Answerer = OnnxBertAnswerer;

    fn create(
        &self,
        model_dir: &Path,
        options: &AnswererOptions,
    ) -> anyhow::Result<OnnxBertAnswerer> {
        OnnxBertAnswerer::load(model_dir, options)
    }
}

/// Capabilities as seen by ONNX Runtime on this host.
///
/// GPU support is detected from the CUDA execution provider. The platform
/// version cannot be detected portably and is supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct OrtDeviceCapabilities {
    platform_version: u32,
}

impl OrtDeviceCapabilities {
    pub fn new(platform_version: u32) -> Self {
        Self { platform_version }
    }
}

impl DeviceCapabilities for OrtDeviceCapabilities {
    fn gpu_delegate_supported(&self) -> bool {
        CUDAExecutionProvider::default()
            .is_available()
            .unwrap_or(false)
    }

    fn platform_version(&self) -> u32 {
        self.platform_version
    }
}

pub struct OnnxBertAnswerer {
    session: Session,
    tokenizer: Tokenizer,
    /// Same vocabulary, truncating a lone question to `max_query_len` tokens.
    query_tokenizer: Tokenizer,
    options: AnswererOptions,
}

impl OnnxBertAnswerer {
    /// Load a QA model from a directory containing `model.onnx` and `tokenizer.json`,
    /// running on the delegate named in `options`.
    pub fn load(model_dir: &Path, options: &AnswererOptions) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let builder = Session::builder()?;
        let builder = match options.delegate {
            Delegate::Gpu => builder.with_execution_providers([CUDAExecutionProvider::default()
                .build()
                .error_on_failure()])?,
            Delegate::Nnapi => builder.with_execution_providers([NNAPIExecutionProvider::default()
                .build()
                .error_on_failure()])?,
            Delegate::Cpu { num_threads } => builder.with_intra_threads(num_threads)?,
        };
        let session = builder.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        // Only the context is cut when the pair is too long; questions are
        // already within `max_query_len`.
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_seq_len,
                strategy: TruncationStrategy::OnlySecond,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(None);
        let query_tokenizer = query_tokenizer(&tokenizer, options.max_query_len)?;

        info!(
            delegate = %options.delegate,
            model = %model_path.display(),
            "loaded bert qa model"
        );
        Ok(Self {
            session,
            tokenizer,
            query_tokenizer,
            options: *options,
        })
    }
}

impl QuestionAnswerer for OnnxBertAnswerer {
    fn answer(&mut self, context: &str, question: &str) -> anyhow::Result<Vec<Answer>> {
        let question = truncate_question(&self.query_tokenizer, question)?;
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encoding.get_ids().len();
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let shape = [1i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        let (_, start_logits) = outputs["start_logits"].try_extract_tensor::<f32>()?;
        let (_, end_logits) = outputs["end_logits"].try_extract_tensor::<f32>()?;
        anyhow::ensure!(
            start_logits.len() == seq_len && end_logits.len() == seq_len,
            "unexpected logits length: start {}, end {}, expected {seq_len}",
            start_logits.len(),
            end_logits.len()
        );

        let is_context = context_mask(&encoding.get_sequence_ids());
        let limits = SpanLimits {
            n_best: N_BEST,
            max_answer_len: self.options.max_answer_len,
            num_answers: self.options.num_answers,
        };
        let spans = best_spans(start_logits, end_logits, &is_context, &limits);

        let answers = spans_to_answers(context, encoding.get_offsets(), &is_context, &spans);

        debug!(seq_len, answers = answers.len(), "decoded answer spans");
        Ok(answers)
    }
}

fn query_tokenizer(tokenizer: &Tokenizer, max_query_len: usize) -> anyhow::Result<Tokenizer> {
    let mut query = tokenizer.clone();
    query
        .with_truncation(Some(TruncationParams {
            max_length: max_query_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("set query truncation: {e}"))?;
    Ok(query)
}

/// Cut `question` after its last token that fits the query limit.
fn truncate_question<'q>(
    query_tokenizer: &Tokenizer,
    question: &'q str,
) -> anyhow::Result<&'q str> {
    let encoding = query_tokenizer
        .encode(question, false)
        .map_err(|e| anyhow::anyhow!("tokenize question: {e}"))?;
    if encoding.get_overflowing().is_empty() {
        return Ok(question);
    }
    let end = encoding.get_offsets().last().map_or(0, |&(_, end)| end);
    debug!(kept_bytes = end, "truncated question to query limit");
    Ok(question.get(..end).unwrap_or(question))
}
