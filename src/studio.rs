//! Bridges UI actions to the media client. Every method spawns a task on
//! the shared runtime and reports back over the event channel; the UI
//! thread stays free while requests are in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::audio;
use crate::error::StudioError;
use crate::event::AppEvent;
use crate::gemini::GeminiClient;
use crate::session::{DesignStyle, ImageData, ImageSize};
use crate::video;

#[derive(Clone)]
pub struct StudioClient {
    gemini: Arc<RwLock<GeminiClient>>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    /// The currently active render generation. A render task is cancelled
    /// the moment this counter moves past the generation it was started
    /// with, so a cancel can never be undone by a later render starting.
    video_generation: Arc<AtomicU64>,
}

impl StudioClient {
    /// The media client is constructed once here and threaded through
    /// every task; there is no ambient global instance.
    pub fn new(api_key: String, tx: mpsc::Sender<AppEvent>) -> Result<Self, StudioError> {
        let runtime_handle =
            Handle::try_current().map_err(|err| StudioError::Runtime(err.to_string()))?;
        Ok(Self {
            gemini: Arc::new(RwLock::new(GeminiClient::new(api_key))),
            tx,
            runtime_handle,
            video_generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Swaps in a freshly selected credential; in-flight requests keep
    /// the key they started with.
    pub fn set_credential(&self, api_key: String) {
        let gemini = Arc::clone(&self.gemini);
        self.runtime_handle.spawn(async move {
            gemini.write().await.set_api_key(api_key);
        });
    }

    pub fn reimagine(&self, image: ImageData, style: DesignStyle) {
        let tx = self.tx.clone();
        let gemini = Arc::clone(&self.gemini);
        self.runtime_handle.spawn(async move {
            let client = gemini.read().await.clone();
            match client.reimagine(&image, style).await {
                Ok(updated) => {
                    let _ = tx.send(AppEvent::DesignUpdated(updated));
                }
                Err(err) => {
                    warn!("reimagine failed: {err}");
                    let _ = tx.send(AppEvent::DesignFailed {
                        message: "Failed to reimagine space.".to_string(),
                        from_chat: false,
                    });
                }
            }
        });
    }

    pub fn refine(&self, image: ImageData, instruction: String, from_chat: bool) {
        let tx = self.tx.clone();
        let gemini = Arc::clone(&self.gemini);
        self.runtime_handle.spawn(async move {
            let client = gemini.read().await.clone();
            match client.refine(&image, &instruction).await {
                Ok(updated) => {
                    let _ = tx.send(AppEvent::DesignUpdated(updated));
                }
                Err(err) => {
                    warn!("refine failed: {err}");
                    let _ = tx.send(AppEvent::DesignFailed {
                        message: "Failed to update design.".to_string(),
                        from_chat,
                    });
                }
            }
        });
    }

    pub fn generate(&self, prompt: String, size: ImageSize) {
        let tx = self.tx.clone();
        let gemini = Arc::clone(&self.gemini);
        self.runtime_handle.spawn(async move {
            let client = gemini.read().await.clone();
            match client.generate_from_text(&prompt, size).await {
                Ok(image) => {
                    let _ = tx.send(AppEvent::InspirationReady(image));
                }
                Err(err) => {
                    warn!("text-to-image generation failed: {err}");
                    let _ = tx.send(AppEvent::InspirationFailed(
                        "Failed to generate design.".to_string(),
                    ));
                }
            }
        });
    }

    /// Starts the long-running render workflow and returns its
    /// generation, which the UI keeps to match incoming video events
    /// against. The workflow runs independently of image edits and chat;
    /// starting a new render supersedes (and thereby cancels) any render
    /// still in flight.
    pub fn animate(&self, image: ImageData) -> u64 {
        let generation = self.video_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = self.tx.clone();
        let gemini = Arc::clone(&self.gemini);
        let active = Arc::clone(&self.video_generation);
        self.runtime_handle.spawn(async move {
            let client = gemini.read().await.clone();
            let progress_tx = tx.clone();
            let cancelled = move || active.load(Ordering::SeqCst) != generation;
            let outcome =
                video::render_animation(&client, &image, None, cancelled, |checks| {
                    let _ = progress_tx.send(AppEvent::VideoChecked { generation, checks });
                })
                .await;

            match outcome {
                Ok(path) => {
                    let _ = tx.send(AppEvent::VideoRendered { generation, path });
                }
                // Cancellation is a user decision, not a failure; the UI
                // already returned to idle when it was requested.
                Err(StudioError::Cancelled) => {
                    debug!(generation, "video render cancelled");
                }
                Err(err) => {
                    warn!("video render failed: {err}");
                    let _ = tx.send(AppEvent::VideoFailed {
                        generation,
                        credential_missing: err.is_credential_missing(),
                        message: err.to_string(),
                    });
                }
            }
        });
        generation
    }

    /// Invalidates the in-flight render, if any, by moving the active
    /// generation past it.
    pub fn cancel_video(&self) {
        self.video_generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Informational branch of the chat router: grounded Q&A with the
    /// latest image as context, narrated on success.
    pub fn ask(&self, message: String, image: Option<ImageData>) {
        let tx = self.tx.clone();
        let gemini = Arc::clone(&self.gemini);
        let narrator = self.clone();
        self.runtime_handle.spawn(async move {
            let client = gemini.read().await.clone();
            match client.grounded_chat(&message, image.as_ref()).await {
                Ok(answer) => {
                    narrator.narrate(answer.text.clone());
                    let _ = tx.send(AppEvent::AssistantReply {
                        text: answer.text,
                        sources: answer.sources,
                    });
                }
                Err(err) => {
                    warn!("grounded chat failed: {err}");
                    let _ = tx.send(AppEvent::AssistantFailed);
                }
            }
        });
    }

    /// Best-effort narration. Failures are logged and swallowed; they
    /// never block or alter the transcript.
    pub fn narrate(&self, text: String) {
        let gemini = Arc::clone(&self.gemini);
        self.runtime_handle.spawn(async move {
            let client = gemini.read().await.clone();
            match client.synthesize_speech(&text).await {
                Ok(clip) => audio::play_clip(clip),
                Err(err) => warn!("speech narration failed: {err}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelling_permanently_retires_the_old_render_generation() {
        let (tx, _rx) = mpsc::channel();
        let studio = StudioClient::new("test-key".to_string(), tx)
            .expect("studio client should build inside a runtime");
        let image = ImageData::new(vec![1, 2, 3, 4], "image/png");

        let first = studio.animate(image.clone());
        studio.cancel_video();
        let second = studio.animate(image);

        // The cancel consumed a generation, so the first render's
        // cancellation check (active != first) stays true forever even
        // after a new render starts.
        assert!(second > first + 1);
        assert_ne!(
            studio.video_generation.load(Ordering::SeqCst),
            first,
            "active generation should never equal a cancelled render's again"
        );
    }
}
