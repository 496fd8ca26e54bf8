//! Long-running video render workflow: submit, poll on a fixed interval,
//! resolve the resource locator, download, and materialize a locally
//! playable file.
//!
//! The loop is bounded and cancellable; running out of the check budget is
//! a distinct `TimedOut` failure rather than an endless wait. The workflow
//! runs on its own task and never blocks image editing or chat.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::StudioError;
use crate::gemini::{GeminiClient, VideoOperation};
use crate::session::ImageData;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// 60 checks at five seconds apart: five minutes before giving up.
pub const MAX_POLL_CHECKS: u32 = 60;

/// Decision for one iteration of the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Not done yet; wait one interval and re-check.
    Wait,
    /// Done with a downloadable resource locator.
    Resolve(String),
}

/// Pure step function for the `Submitted -> Polling -> Done | Failed`
/// state machine. `checks_used` counts polls already performed.
pub fn evaluate(
    operation: &VideoOperation,
    checks_used: u32,
    max_checks: u32,
) -> Result<PollStep, StudioError> {
    if operation.done {
        return match &operation.uri {
            Some(uri) => Ok(PollStep::Resolve(uri.clone())),
            None => Err(StudioError::NoVideoReturned),
        };
    }
    if checks_used >= max_checks {
        return Err(StudioError::TimedOut(max_checks));
    }
    Ok(PollStep::Wait)
}

/// Drives a submitted render to completion and writes the bytes to a temp
/// file, the locally playable reference. `on_check` reports each poll so
/// the UI can show progress; `cancelled` is consulted on both sides of
/// each sleep and aborts the workflow once it returns true. The caller
/// decides what cancellation means (here: the render generation it was
/// started with is no longer the active one).
pub async fn render_animation(
    client: &GeminiClient,
    image: &ImageData,
    prompt: Option<&str>,
    cancelled: impl Fn() -> bool,
    mut on_check: impl FnMut(u32),
) -> Result<PathBuf, StudioError> {
    let mut operation = client.animate(image, prompt).await?;
    let mut checks = 0;

    let resolved = loop {
        match evaluate(&operation, checks, MAX_POLL_CHECKS)? {
            PollStep::Resolve(uri) => break uri,
            PollStep::Wait => {
                if cancelled() {
                    return Err(StudioError::Cancelled);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
                if cancelled() {
                    return Err(StudioError::Cancelled);
                }
                operation = client.poll_operation(&operation).await?;
                checks += 1;
                on_check(checks);
            }
        }
    };

    info!(uri = %resolved, "video render resolved, downloading");
    let bytes = client.fetch_video_bytes(&operation).await?;
    let path = temp_video_path();
    std::fs::write(&path, &bytes).map_err(|err| StudioError::Decode {
        what: "video file",
        detail: err.to_string(),
    })?;
    Ok(path)
}

fn temp_video_path() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "maison_render_{}_{sequence}.mp4",
        std::process::id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(name: &str) -> VideoOperation {
        VideoOperation {
            name: name.to_string(),
            done: false,
            uri: None,
        }
    }

    fn finished(name: &str, uri: &str) -> VideoOperation {
        VideoOperation {
            name: name.to_string(),
            done: true,
            uri: Some(uri.to_string()),
        }
    }

    #[test]
    fn two_pending_polls_then_done_waits_exactly_twice() {
        let script = [
            pending("operations/render-1"),
            pending("operations/render-1"),
            finished("operations/render-1", "https://files.example/render.mp4"),
        ];

        let mut waits = 0;
        let mut resolved = None;
        for (checks, operation) in script.iter().enumerate() {
            match evaluate(operation, checks as u32, MAX_POLL_CHECKS)
                .expect("scripted operation should not fail")
            {
                PollStep::Wait => waits += 1,
                PollStep::Resolve(uri) => {
                    resolved = Some(uri);
                    break;
                }
            }
        }

        assert_eq!(waits, 2);
        assert_eq!(
            resolved.as_deref(),
            Some("https://files.example/render.mp4")
        );
    }

    #[test]
    fn exhausted_check_budget_times_out() {
        let operation = pending("operations/render-2");
        let result = evaluate(&operation, MAX_POLL_CHECKS, MAX_POLL_CHECKS);
        assert!(matches!(result, Err(StudioError::TimedOut(n)) if n == MAX_POLL_CHECKS));
    }

    #[test]
    fn done_without_locator_is_a_failure_not_a_silent_noop() {
        let operation = VideoOperation {
            name: "operations/render-3".to_string(),
            done: true,
            uri: None,
        };
        assert!(matches!(
            evaluate(&operation, 0, MAX_POLL_CHECKS),
            Err(StudioError::NoVideoReturned)
        ));
    }

    #[test]
    fn temp_paths_are_unique_per_call() {
        assert_ne!(temp_video_path(), temp_video_path());
    }
}
