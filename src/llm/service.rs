use crate::error::Result;
use std::future::Future;

/// One system + user exchange with the completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub top_p: f32,
}

/// Text-in, text-out access to a language model.
///
/// Implementations return the raw completion text. Transport, authentication
/// and model selection belong to the implementation; retries are left to callers.
pub trait CompletionService {
    fn complete(&self, request: CompletionRequest<'_>) -> impl Future<Output = Result<String>> + Send;
}

impl<T: CompletionService> CompletionService for &T {
    fn complete(&self, request: CompletionRequest<'_>) -> impl Future<Output = Result<String>> + Send {
        (**self).complete(request)
    }
}
