use std::future::Future;
use std::time::Duration;

use crate::PersistError;

/// Run a network-facing call, failing with `Timeout` once `limit` elapses.
///
/// `None` waits indefinitely. Dropping the returned future cancels the call.
pub async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T, PersistError>
where
    F: Future<Output = Result<T, PersistError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| PersistError::Timeout(limit))?,
        None => fut.await,
    }
}
