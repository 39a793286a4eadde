//! Per-call timeouts.

use corag_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Await `call`, failing with `category` if it outlives `limit`.
///
/// A timeout is reported exactly like a failure of the call itself.
pub async fn within<T, F>(
    limit: Option<Duration>,
    category: fn(String) -> AppError,
    what: &str,
    call: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| category(format!("{} timed out after {:?}", what, limit)))?,
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_limit_passes_through() {
        let value = within(None, AppError::Retrieval, "search", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_category() {
        let result: AppResult<()> = within(
            Some(Duration::from_millis(10)),
            AppError::Generation,
            "generation",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        match result {
            Err(AppError::Generation(msg)) => assert!(msg.contains("timed out")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inner_error_kept() {
        let result: AppResult<()> = within(
            Some(Duration::from_secs(1)),
            AppError::Retrieval,
            "search",
            async { Err(AppError::Classification("bad".into())) },
        )
        .await;
        assert!(matches!(result, Err(AppError::Classification(_))));
    }
}
