//! C5: background per-language image pre-pull at startup (spec §4.5).
//!
//! Mirrors the original's fire-and-forget pull-on-boot behavior (see
//! SPEC_FULL.md §11): one detached task per language, never awaited by
//! the caller. Errors are logged, non-fatal — the first real judgement
//! pulls on demand if warming hasn't finished or failed.

use std::sync::Arc;

use crate::runner::container::ContainerRuntime;

/// Spawn one `tokio::spawn`'d pull per `(language, image)` pair. Returns
/// immediately; none of the spawned tasks are awaited.
pub fn warm(runtime: Arc<dyn ContainerRuntime>, images: Vec<(String, String)>) {
    for (language, image) in images {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move {
            tracing::info!(%language, %image, "pre-pulling image");
            if let Err(e) = runtime.pull_image(&image).await {
                tracing::warn!(%language, %image, error = %e, "image pre-pull failed, will retry on demand");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::container::MockContainerRuntime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn spawns_one_pull_per_language() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let mut mock = MockContainerRuntime::new();
        let counter = Arc::clone(&pulled);
        mock.expect_pull_image().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        warm(
            Arc::new(mock),
            vec![
                ("python".to_string(), "judge/python:3.12".to_string()),
                ("java".to_string(), "judge/java:21".to_string()),
            ],
        );

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pull_failure_does_not_panic() {
        let mut mock = MockContainerRuntime::new();
        mock.expect_pull_image()
            .returning(|_| Err(crate::error::CoreError::Docker("no such image".to_string())));

        warm(Arc::new(mock), vec![("python".to_string(), "missing:latest".to_string())]);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
