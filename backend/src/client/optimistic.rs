//! Optimistic updates with rollback.

use std::future::Future;

/// Apply a local change immediately, then confirm it with `request`.
///
/// `apply` runs before the request is started. On success the response goes
/// to `reconcile`; if the request fails, or `reconcile` itself fails,
/// `revert` restores the pre-`apply` state and the error is returned.
pub async fn optimistic_update<T, E, Fut>(
    apply: impl FnOnce(),
    revert: impl FnOnce(),
    request: impl FnOnce() -> Fut,
    reconcile: impl FnOnce(T) -> Result<(), E>,
) -> Result<(), E>
where
    Fut: Future<Output = Result<T, E>>,
{
    apply();

    let outcome = match request().await {
        Ok(value) => reconcile(value),
        Err(e) => Err(e),
    };

    if outcome.is_err() {
        revert();
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_success_reconciles() {
        let value = Cell::new(2);
        let result: Result<(), String> = optimistic_update(
            || value.set(3),
            || value.set(2),
            || async { Ok(10) },
            |server| {
                value.set(server);
                Ok(())
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(value.get(), 10);
    }

    #[tokio::test]
    async fn test_request_failure_reverts() {
        let value = Cell::new(2);
        let seen_during_request = Cell::new(0);
        let result: Result<(), String> = optimistic_update(
            || value.set(3),
            || value.set(2),
            || {
                seen_during_request.set(value.get());
                async { Err::<i32, _>("offline".to_string()) }
            },
            |_| panic!("reconcile must not run"),
        )
        .await;

        assert_eq!(result, Err("offline".to_string()));
        assert_eq!(seen_during_request.get(), 3);
        assert_eq!(value.get(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_failure_reverts() {
        let value = Cell::new(2);
        let result: Result<(), String> = optimistic_update(
            || value.set(3),
            || value.set(2),
            || async { Ok(3) },
            |_| Err("disk full".to_string()),
        )
        .await;

        assert_eq!(result, Err("disk full".to_string()));
        assert_eq!(value.get(), 2);
    }
}
