//! Test-only scripted question generator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{GenerationRequest, QuestionGenerator};

#[derive(Debug, Clone)]
pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    calls: Arc<AtomicUsize>,
    failures_left: Arc<AtomicUsize>,
    pub default_response: String,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            failures_left: Arc::new(AtomicUsize::new(0)),
            default_response: "What is the main idea of the text?".into(),
        }
    }
}

impl MockGenerator {
    /// Answers with `responses` in order, then with `default_response`.
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// Fails every call.
    #[must_use]
    pub fn failing() -> Self {
        Self::default().failing_times(usize::MAX)
    }

    /// Fails the next `n` calls, then behaves normally.
    #[must_use]
    pub fn failing_times(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl QuestionGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if failing {
            return Err(LlmError::Inference("mock generation error".into()));
        }

        let mut responses = self.responses.lock().unwrap();
        Ok(responses
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone()))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::GenerationConfig;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt, GenerationConfig::nucleus())
    }

    #[tokio::test]
    async fn scripted_then_default() {
        let mock = MockGenerator::with_responses(vec!["Q1?".into()]);
        assert_eq!(mock.generate(&request("a")).await.unwrap(), "Q1?");
        assert_eq!(
            mock.generate(&request("b")).await.unwrap(),
            mock.default_response
        );
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.requests()[1].prompt, "b");
    }

    #[tokio::test]
    async fn failing_times_recovers() {
        let mock = MockGenerator::default().failing_times(1);
        assert!(mock.generate(&request("a")).await.is_err());
        assert!(mock.generate(&request("a")).await.is_ok());
    }

    #[tokio::test]
    async fn always_failing() {
        let mock = MockGenerator::failing();
        for _ in 0..3 {
            assert!(matches!(
                mock.generate(&request("a")).await,
                Err(LlmError::Inference(_))
            ));
        }
    }
}
