use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ReframeError;

/// Run an external call under an explicit deadline.
///
/// Expiry is reported as a recoverable [`ReframeError::Transport`].
pub async fn with_timeout<T, F>(service: &str, limit: Duration, fut: F) -> Result<T, ReframeError>
where
    F: Future<Output = Result<T, ReframeError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(service, timeout_ms = limit.as_millis() as u64, "External call timed out");
            Err(ReframeError::transport(
                service,
                format!("timed out after {}ms", limit.as_millis()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_is_a_transport_failure() {
        let result: Result<(), _> = with_timeout("search", Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("search"));
    }

    #[tokio::test]
    async fn passes_through_inner_result() {
        let ok = with_timeout("openai", Duration::from_secs(1), async { Ok::<_, ReframeError>(7) })
            .await
            .unwrap();
        assert_eq!(ok, 7);
    }
}
