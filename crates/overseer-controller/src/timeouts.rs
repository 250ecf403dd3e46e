//! Deadline wrappers for dependency calls.

use std::future::Future;
use std::time::Duration;

use overseer_core::errors::{OverseerError, OverseerResult};

fn elapsed(step: &str, limit: Duration) -> OverseerError {
    OverseerError::Timeout {
        step: step.to_string(),
        millis: limit.as_millis() as u64,
    }
}

/// Run a synchronous store call on the blocking pool under `limit`.
pub(crate) async fn blocking<T, F>(step: &str, limit: Duration, f: F) -> OverseerResult<T>
where
    F: FnOnce() -> OverseerResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(OverseerError::dependency(step, join.to_string())),
        Err(_) => Err(elapsed(step, limit)),
    }
}

/// Await a collaborator future under `limit`.
pub(crate) async fn bounded<T, Fut>(step: &str, limit: Duration, fut: Fut) -> OverseerResult<T>
where
    Fut: Future<Output = OverseerResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| elapsed(step, limit))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_future_times_out() {
        let err = bounded("operator", Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, OverseerError>(())
        })
        .await
        .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("operator"));
    }

    #[tokio::test]
    async fn blocking_result_passes_through() {
        let value = blocking("recall_db", Duration::from_secs(1), || Ok(7))
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn blocking_panic_is_a_dependency_failure() {
        let err = blocking::<(), _>("recall_db", Duration::from_secs(1), || panic!("boom"))
            .await
            .unwrap_err();
        assert!(matches!(err, OverseerError::DependencyFailed { .. }));
    }
}
