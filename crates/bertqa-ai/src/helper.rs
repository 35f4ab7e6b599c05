//! Lazy question-answerer adapter.
//!
//! Holds at most one loaded handle. The handle is built on first use with a
//! delegate chosen from the device's capabilities, reused across calls, and
//! dropped by [`BertQaHelper::clear_question_answerer`].

use std::sync::Arc;
use std::time::Instant;

use bertqa_core::{Answer, Delegate, DeviceCapabilities, QaConfig, select_delegate};
use tracing::{debug, error, info};

use crate::engine::{AnswererFactory, AnswererOptions, QuestionAnswerer};

/// Message reported through [`AnswerListener::on_error`] when the model cannot be loaded.
pub const INIT_FAILED_MESSAGE: &str = "Bert Question Answerer failed to initialize";

/// Receives the outcome of [`BertQaHelper::get_question_answer`].
pub trait AnswerListener {
    fn on_error(&self, error: &str);
    fn on_result(&self, results: &[Answer], inference_time_ms: u64);
}

pub struct BertQaHelper<F: AnswererFactory, D: DeviceCapabilities> {
    config: QaConfig,
    factory: F,
    device: D,
    forced_delegate: Option<Delegate>,
    listener: Option<Arc<dyn AnswerListener>>,
    answerer: Option<F::Answerer>,
}

impl<F: AnswererFactory, D: DeviceCapabilities> BertQaHelper<F, D> {
    pub fn new(
        config: QaConfig,
        factory: F,
        device: D,
        listener: Option<Arc<dyn AnswerListener>>,
    ) -> Self {
        Self {
            config,
            factory,
            device,
            forced_delegate: None,
            listener,
            answerer: None,
        }
    }

    /// Skip capability-based selection and always load with `delegate`.
    pub fn with_delegate(mut self, delegate: Delegate) -> Self {
        self.forced_delegate = Some(delegate);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.answerer.is_some()
    }

    /// The delegate the next load would use.
    pub fn delegate(&self) -> Delegate {
        self.forced_delegate
            .unwrap_or_else(|| select_delegate(&self.device, &self.config.delegate_policy()))
    }

    /// Load the handle if it is not loaded yet.
    ///
    /// Load failure is reported once through the listener and logged; the
    /// handle stays unset so the next call tries again. Returns whether a
    /// handle is available.
    pub fn ensure_loaded(&mut self) -> bool {
        if self.answerer.is_some() {
            return true;
        }

        let delegate = self.delegate();
        let options = AnswererOptions::from_config(delegate, &self.config);
        let model_dir = self.config.model_dir();

        match self.factory.create(&model_dir, &options) {
            Ok(answerer) => {
                info!(%delegate, model = %model_dir.display(), "loaded question answerer");
                self.answerer = Some(answerer);
                true
            }
            Err(e) => {
                if let Some(listener) = &self.listener {
                    listener.on_error(INIT_FAILED_MESSAGE);
                }
                error!(%delegate, model = %model_dir.display(), "setup question answerer: {e:#}");
                false
            }
        }
    }

    /// Answer `question` about `context` and deliver the answers with the
    /// inference time in milliseconds.
    ///
    /// Nothing is delivered when the model could not be loaded. Engine errors
    /// during the call are returned to the caller untouched.
    pub fn get_question_answer(&mut self, context: &str, question: &str) -> anyhow::Result<()> {
        if !self.ensure_loaded() {
            return Ok(());
        }
        let Some(answerer) = self.answerer.as_mut() else {
            return Ok(());
        };

        let start = Instant::now();
        let answers = answerer.answer(context, question)?;
        let inference_time_ms = start.elapsed().as_millis() as u64;

        debug!(answers = answers.len(), inference_time_ms, "answered question");
        if let Some(listener) = &self.listener {
            listener.on_result(&answers, inference_time_ms);
        }
        Ok(())
    }

    /// Release the loaded handle, if any. The next call loads a fresh one.
    pub fn clear_question_answerer(&mut self) {
        if self.answerer.take().is_some() {
            debug!("released question answerer");
        }
    }
}
