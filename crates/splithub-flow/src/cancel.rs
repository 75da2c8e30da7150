use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Awaits `fut`, giving up early with `on_cancel()` once `token` is cancelled.
///
/// Without a token this is a plain `.await`. The abandoned future is dropped,
/// which is all the control a caller has over an in-flight chip or RPC call.
pub(crate) async fn until_cancelled<T, E0, E, F>(
    token: Option<&CancellationToken>,
    fut: F,
    on_cancel: impl FnOnce() -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E0>>,
    E: From<E0>,
{
    match token {
        None => fut.await.map_err(E::from),
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(on_cancel()),
                result = fut => result.map_err(E::from),
            }
        }
    }
}
