//! Core types, delegate selection, and shared configuration.

pub mod answer;
pub mod config;
pub mod delegate;
mod error;

pub use answer::{Answer, Span};
pub use config::{BERT_QA_MODEL, QaConfig};
pub use delegate::{Delegate, DelegatePolicy, DeviceCapabilities, DeviceProfile, select_delegate};
pub use error::CoreError;
