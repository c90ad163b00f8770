//! Per-operation status for interactive callers.

use std::fmt;
use std::future::Future;

/// Where a single operation stands, from a caller's point of view.
///
/// One value per operation replaces separate loading / error / result
/// flags; the variants are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState<T> {
    Idle,
    Loading,
    Success(T),
    /// Failure, rendered with its full cause chain.
    Failed(String),
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        OperationState::Idle
    }
}

impl<T> OperationState<T> {
    pub fn begin(&mut self) {
        *self = OperationState::Loading;
    }

    pub fn finish<E: fmt::Display>(&mut self, result: Result<T, E>) {
        *self = Self::from_result(result);
    }

    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => OperationState::Success(value),
            Err(e) => OperationState::Failed(format!("{e:#}")),
        }
    }

    /// Run a future, passing through `Loading` while it is pending.
    pub async fn track<F, E>(&mut self, operation: F) -> &Self
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.begin();
        let result = operation.await;
        self.finish(result);
        self
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, OperationState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OperationState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OperationState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationState<U> {
        match self {
            OperationState::Idle => OperationState::Idle,
            OperationState::Loading => OperationState::Loading,
            OperationState::Success(value) => OperationState::Success(f(value)),
            OperationState::Failed(message) => OperationState::Failed(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        let mut state: OperationState<u32> = OperationState::default();
        assert!(state.is_idle());

        state.begin();
        assert!(state.is_loading());
        assert!(state.value().is_none());

        state.finish::<String>(Ok(7));
        assert_eq!(state.value(), Some(&7));
        assert_eq!(state.clone().map(|v| v * 2), OperationState::Success(14));

        state.finish(Err("quota exceeded"));
        assert_eq!(state.error(), Some("quota exceeded"));
        assert!(state.value().is_none());
    }

    #[tokio::test]
    async fn track_resolves_future() {
        let mut state = OperationState::Idle;
        state
            .track(async { Ok::<_, anyhow::Error>("generated".to_string()) })
            .await;
        assert_eq!(state.value().map(String::as_str), Some("generated"));

        let mut failing: OperationState<()> = OperationState::Idle;
        failing
            .track(async {
                Err(anyhow::anyhow!("HTTP 500").context("text generation failed"))
            })
            .await;
        assert_eq!(failing.error(), Some("text generation failed: HTTP 500"));
    }
}
