//! Conversion façade.
//!
//! [`Converter`] wraps one call to a [`ConversionBackend`] in a uniform
//! [`ConversionResult`]. Backend errors and panics never reach the caller;
//! they come back as [`ConversionResult::Failure`].
//!
//! ```text
//! ConversionRequest ──► Converter::convert ──► InitState::ensure(backend.init)
//!                                         └──► backend.convert ──► Success | Failure
//!                              observer ◄── progress notifications (0..n)
//! ```
//!
//! The backend's one-time setup is tracked by an [`InitState`] owned by the
//! caller and handed to the converter. Several converters may share one
//! state; the first conversion initializes, later ones skip it.

use crate::imaging::{BackendError, CompressionFactor, ConversionBackend};
use crate::progress::ProgressObserver;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Input is empty")]
    EmptyInput,
    #[error("Missing {0} type")]
    MissingType(&'static str),
    #[error("Compression level must be between 0 and 1, got {0}")]
    CompressionOutOfRange(f32),
}

/// A validated conversion request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    input_bytes: Vec<u8>,
    input_type: String,
    output_type: String,
    compression_level: f32,
}

impl ConversionRequest {
    pub const DEFAULT_OUTPUT_TYPE: &'static str = "image/webp";
    pub const DEFAULT_COMPRESSION: f32 = 0.5;

    pub fn builder(
        input_bytes: impl Into<Vec<u8>>,
        input_type: impl Into<String>,
    ) -> ConversionRequestBuilder {
        ConversionRequestBuilder {
            input_bytes: input_bytes.into(),
            input_type: input_type.into(),
            output_type: None,
            compression_level: None,
        }
    }

    pub fn input_bytes(&self) -> &[u8] {
        &self.input_bytes
    }

    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    pub fn output_type(&self) -> &str {
        &self.output_type
    }

    pub fn compression_level(&self) -> f32 {
        self.compression_level
    }

    pub fn compression(&self) -> CompressionFactor {
        CompressionFactor::from_level(Some(self.compression_level))
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequestBuilder {
    input_bytes: Vec<u8>,
    input_type: String,
    output_type: Option<String>,
    compression_level: Option<f32>,
}

impl ConversionRequestBuilder {
    pub fn output_type(mut self, output_type: impl Into<String>) -> Self {
        self.output_type = Some(output_type.into());
        self
    }

    pub fn compression_level(mut self, level: f32) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn build(self) -> Result<ConversionRequest, RequestError> {
        if self.input_bytes.is_empty() {
            return Err(RequestError::EmptyInput);
        }
        if self.input_type.is_empty() {
            return Err(RequestError::MissingType("input"));
        }
        let output_type = self
            .output_type
            .unwrap_or_else(|| ConversionRequest::DEFAULT_OUTPUT_TYPE.to_string());
        if output_type.is_empty() {
            return Err(RequestError::MissingType("output"));
        }
        let compression_level = self
            .compression_level
            .unwrap_or(ConversionRequest::DEFAULT_COMPRESSION);
        if !(0.0..=1.0).contains(&compression_level) {
            return Err(RequestError::CompressionOutOfRange(compression_level));
        }

        Ok(ConversionRequest {
            input_bytes: self.input_bytes,
            input_type: self.input_type,
            output_type,
            compression_level,
        })
    }
}

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { output_bytes: Vec<u8> },
    Failure { error_message: String },
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }

    pub fn output_bytes(&self) -> Option<&[u8]> {
        match self {
            ConversionResult::Success { output_bytes } => Some(output_bytes),
            ConversionResult::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConversionResult::Success { .. } => None,
            ConversionResult::Failure { error_message } => Some(error_message),
        }
    }

    pub fn into_result(self) -> Result<Vec<u8>, String> {
        match self {
            ConversionResult::Success { output_bytes } => Ok(output_bytes),
            ConversionResult::Failure { error_message } => Err(error_message),
        }
    }
}

/// Write-once record of whether backend setup has completed.
///
/// Starts uninitialized and flips exactly once, on the first successful
/// setup. A failed setup leaves it uninitialized so the next call retries.
#[derive(Debug, Default)]
pub struct InitState {
    initialized: Mutex<bool>,
}

impl InitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        *self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `setup` unless a previous call already succeeded.
    ///
    /// Concurrent callers wait for the one running `setup`.
    pub fn ensure<E>(&self, setup: impl FnOnce() -> Result<(), E>) -> Result<(), E> {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*initialized {
            setup()?;
            *initialized = true;
            tracing::debug!("conversion backend initialized");
        }
        Ok(())
    }
}

/// Runs conversions against a backend.
pub struct Converter<B> {
    backend: B,
    init: Arc<InitState>,
}

impl<B: ConversionBackend> Converter<B> {
    pub fn new(backend: B) -> Self {
        Self::with_init_state(backend, Arc::new(InitState::new()))
    }

    pub fn with_init_state(backend: B, init: Arc<InitState>) -> Self {
        Self { backend, init }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn init_state(&self) -> &InitState {
        &self.init
    }

    /// Convert once. Never panics and never returns an error type: every
    /// failure is a [`ConversionResult::Failure`] with a non-empty message.
    ///
    /// `observer` is handed to the backend untouched.
    pub fn convert(
        &self,
        request: &ConversionRequest,
        observer: Option<&dyn ProgressObserver>,
    ) -> ConversionResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Vec<u8>, BackendError> {
            self.init.ensure(|| self.backend.init())?;
            self.backend.convert(
                request.input_bytes(),
                request.input_type(),
                request.output_type(),
                request.compression(),
                observer,
            )
        }));

        match outcome {
            Ok(Ok(output_bytes)) => ConversionResult::Success { output_bytes },
            Ok(Err(e)) => {
                tracing::warn!(
                    from = request.input_type(),
                    to = request.output_type(),
                    "conversion failed: {e}"
                );
                ConversionResult::Failure {
                    error_message: e.to_string(),
                }
            }
            Err(payload) => {
                let error_message = format!("Conversion panicked: {}", panic_message(&*payload));
                tracing::warn!("{error_message}");
                ConversionResult::Failure { error_message }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown cause"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;

    fn request(bytes: &[u8]) -> ConversionRequest {
        ConversionRequest::builder(bytes.to_vec(), "image/png")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_applies_defaults() {
        let req = request(&[1]);
        assert_eq!(req.output_type(), "image/webp");
        assert_eq!(req.compression_level(), 0.5);
        assert_eq!(req.compression(), CompressionFactor::Value(0.5));
    }

    #[test]
    fn builder_validates_fields() {
        assert_eq!(
            ConversionRequest::builder(Vec::new(), "image/png").build(),
            Err(RequestError::EmptyInput)
        );
        assert_eq!(
            ConversionRequest::builder(vec![1], "").build(),
            Err(RequestError::MissingType("input"))
        );
        assert_eq!(
            ConversionRequest::builder(vec![1], "image/png")
                .output_type("")
                .build(),
            Err(RequestError::MissingType("output"))
        );
        assert_eq!(
            ConversionRequest::builder(vec![1], "image/png")
                .compression_level(1.5)
                .build(),
            Err(RequestError::CompressionOutOfRange(1.5))
        );
        assert!(
            ConversionRequest::builder(vec![1], "image/png")
                .compression_level(f32::NAN)
                .build()
                .is_err()
        );
    }

    #[test]
    fn level_one_means_skip() {
        let req = ConversionRequest::builder(vec![1], "image/png")
            .compression_level(1.0)
            .build()
            .unwrap();
        assert_eq!(req.compression(), CompressionFactor::Skip);
    }

    #[test]
    fn success_returns_backend_bytes_exactly() {
        let converter = Converter::new(MockBackend::returning(vec![0, 255, 7, 0]));
        let result = converter.convert(&request(&[1, 2]), None);
        assert_eq!(
            result,
            ConversionResult::Success {
                output_bytes: vec![0, 255, 7, 0]
            }
        );
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn backend_called_once_with_request_fields() {
        let converter = Converter::new(MockBackend::returning(vec![1]));
        let req = ConversionRequest::builder(vec![5, 6], "image/jpeg")
            .output_type("image/png")
            .compression_level(0.25)
            .build()
            .unwrap();
        converter.convert(&req, None);

        let calls = converter.backend().get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input, vec![5, 6]);
        assert_eq!(calls[0].from_type, "image/jpeg");
        assert_eq!(calls[0].to_type, "image/png");
        assert_eq!(calls[0].compression, CompressionFactor::Value(0.25));
    }

    #[test]
    fn backend_error_becomes_failure() {
        let converter = Converter::new(MockBackend::failing("bad header"));
        let result = converter.convert(&request(&[1]), None);
        assert!(!result.is_success());
        let message = result.error_message().unwrap();
        assert!(!message.is_empty());
        assert!(message.contains("bad header"));
    }

    #[test]
    fn backend_panic_becomes_failure() {
        let converter = Converter::new(MockBackend::panicking("decoder exploded"));
        let result = converter.convert(&request(&[1]), None);
        assert_eq!(
            result.error_message(),
            Some("Conversion panicked: decoder exploded")
        );
    }

    #[test]
    fn init_runs_once_across_conversions() {
        let converter = Converter::new(MockBackend::returning(vec![1]));
        assert!(!converter.init_state().is_initialized());
        for _ in 0..3 {
            assert!(converter.convert(&request(&[1]), None).is_success());
        }
        assert!(converter.init_state().is_initialized());
        assert_eq!(converter.backend().init_count(), 1);
    }

    #[test]
    fn failed_init_is_reported_and_retried() {
        let converter = Converter::new(MockBackend::returning(vec![1]).with_init_failures(1));

        let first = converter.convert(&request(&[1]), None);
        assert!(first.error_message().unwrap().contains("module not ready"));
        assert!(converter.backend().get_calls().is_empty());
        assert!(!converter.init_state().is_initialized());

        assert!(converter.convert(&request(&[1]), None).is_success());
        assert_eq!(converter.backend().init_count(), 2);
    }

    #[test]
    fn shared_init_state_skips_setup() {
        let state = Arc::new(InitState::new());
        let first = Converter::with_init_state(MockBackend::returning(vec![1]), Arc::clone(&state));
        first.convert(&request(&[1]), None);

        let second = Converter::with_init_state(MockBackend::returning(vec![2]), state);
        second.convert(&request(&[1]), None);
        assert_eq!(second.backend().init_count(), 0);
    }

    #[test]
    fn progress_passes_through_unmodified() {
        let converter = Converter::new(MockBackend::returning(vec![1]).with_progress(&[
            (40.0, "Decoding"),
            (10.0, "Restarting"),
            (100.0, "Done"),
        ]));
        let seen = Mutex::new(Vec::new());
        let observer = |percent: f32, message: &str| {
            seen.lock().unwrap().push((percent, message.to_string()));
        };
        let result = converter.convert(&request(&[1]), Some(&observer));

        assert!(result.is_success());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (40.0, "Decoding".to_string()),
                (10.0, "Restarting".to_string()),
                (100.0, "Done".to_string()),
            ]
        );
    }

    #[test]
    fn concurrent_conversions_run_independently() {
        let converter = Converter::new(MockBackend::returning(vec![9]));
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert!(converter.convert(&request(&[1]), None).is_success()));
            }
        });
        assert_eq!(converter.backend().get_calls().len(), 4);
        assert_eq!(converter.backend().init_count(), 1);
    }

    #[test]
    fn into_result_splits_outcome() {
        let ok = ConversionResult::Success {
            output_bytes: vec![1],
        };
        assert_eq!(ok.into_result(), Ok(vec![1]));
        let err = ConversionResult::Failure {
            error_message: "nope".into(),
        };
        assert_eq!(err.into_result(), Err("nope".to_string()));
    }
}
