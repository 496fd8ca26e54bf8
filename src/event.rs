use std::path::PathBuf;

use crate::gemini::wire::Citation;
use crate::session::ImageData;

/// Events flowing from backend tasks to the UI thread. The UI applies all
/// session and transcript side effects when it drains these.
#[derive(Debug)]
pub enum AppEvent {
    /// A reimagine or refine call produced a new current image.
    DesignUpdated(ImageData),
    /// A reimagine or refine call failed; `from_chat` marks edits that
    /// were dispatched from the chat router and already acknowledged
    /// optimistically.
    DesignFailed { message: String, from_chat: bool },
    /// A from-scratch generation produced a new original image.
    InspirationReady(ImageData),
    InspirationFailed(String),
    /// The video workflow completed one status check. `generation`
    /// identifies which render the report belongs to; the UI drops
    /// reports from renders that are no longer active.
    VideoChecked { generation: u64, checks: u32 },
    /// The render finished and was materialized as a playable local file.
    VideoRendered { generation: u64, path: PathBuf },
    VideoFailed {
        generation: u64,
        message: String,
        credential_missing: bool,
    },
    AssistantReply {
        text: String,
        sources: Vec<Citation>,
    },
    AssistantFailed,
}
