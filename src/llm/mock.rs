use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{LlmClient, LlmError};

/// Mock LLM client for testing: replays scripted replies, then repeats the
/// last one.
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    last: Mutex<Result<String, LlmError>>,
    call_count: AtomicUsize,
}

impl MockLlmClient {
    /// Always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self::scripted(vec![Ok(response.to_string())])
    }

    /// Always fails with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::scripted(vec![Err(error)])
    }

    /// Answers with each reply in turn; the final one repeats.
    pub fn scripted(replies: Vec<Result<String, LlmError>>) -> Self {
        let last = replies
            .last()
            .cloned()
            .unwrap_or_else(|| Err(LlmError::ResponseParsing("no scripted reply".into())));
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(last),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let next = match self.replies.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };
        match next {
            Some(reply) => reply,
            None => match self.last.lock() {
                Ok(last) => last.clone(),
                Err(_) => Err(LlmError::ResponseParsing("mock state poisoned".into())),
            },
        }
    }
}
