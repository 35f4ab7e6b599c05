//! Question answering layer: lazy answerer adapter over a pluggable engine,
//! with an ONNX Runtime BERT engine behind the `onnx` feature.

mod engine;
mod helper;
pub mod span;

pub use engine::{AnswererFactory, AnswererOptions, QuestionAnswerer};
pub use helper::{AnswerListener, BertQaHelper, INIT_FAILED_MESSAGE};

#[cfg(feature = "onnx")]
mod bert;
#[cfg(feature = "onnx")]
pub use bert::{OnnxBertAnswerer, OrtAnswererFactory, OrtDeviceCapabilities};
