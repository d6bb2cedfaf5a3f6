//! Rejection reporting for detached tokio tasks

use super::fatal::FatalError;
use super::hook::report_rejection;
use tokio::task::JoinHandle;

/// Watch a detached task and report its `Err` result as a rejection.
///
/// Successful and cancelled tasks are ignored. Panicking tasks are left to the
/// panic hook, which already saw them.
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() {
/// use logfan::capture::watch_task;
///
/// let task = tokio::spawn(async {
///     Err::<(), std::io::Error>(std::io::Error::new(std::io::ErrorKind::Other, "upload failed"))
/// });
/// watch_task(task).await.unwrap();
/// # }
/// ```
pub fn watch_task<T, E>(task: JoinHandle<Result<T, E>>) -> JoinHandle<()>
where
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let err = match task.await {
            Ok(Err(err)) => FatalError::from_error(err),
            Ok(Ok(_)) | Err(_) => return,
        };
        // Exit handlers may block for the capture timeout
        let _ = tokio::task::spawn_blocking(move || report_rejection(err)).await;
    })
}
