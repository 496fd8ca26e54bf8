use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque handle to encoded image bytes (an upload or a generated
/// result). Nothing outside the media client inspects the bytes; the UI
/// only decodes a copy for display.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Arc<Vec<u8>>,
    pub mime: String,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime: mime.into(),
        }
    }
}

/// The fixed decor style enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignStyle {
    Scandinavian,
    MidCenturyModern,
    Industrial,
    Bohemian,
    Minimalist,
    Japandi,
    ArtDeco,
}

impl DesignStyle {
    /// Label used both in the UI and in the prompt contract.
    pub fn label(&self) -> &'static str {
        match self {
            DesignStyle::Scandinavian => "Scandinavian",
            DesignStyle::MidCenturyModern => "Mid-Century Modern",
            DesignStyle::Industrial => "Industrial",
            DesignStyle::Bohemian => "Bohemian",
            DesignStyle::Minimalist => "Minimalist",
            DesignStyle::Japandi => "Japandi",
            DesignStyle::ArtDeco => "Art Deco",
        }
    }
}

/// Static gallery configuration; never mutated at runtime.
#[derive(Debug, Clone, Copy)]
pub struct StylePreset {
    pub style: DesignStyle,
    pub preview: &'static str,
    pub swatch: (u8, u8, u8),
}

pub const STYLE_PRESETS: [StylePreset; 7] = [
    StylePreset {
        style: DesignStyle::Scandinavian,
        preview: "https://picsum.photos/id/106/400/600",
        swatch: (0xE8, 0xE2, 0xD4),
    },
    StylePreset {
        style: DesignStyle::MidCenturyModern,
        preview: "https://picsum.photos/id/10/400/600",
        swatch: (0xB0, 0x6A, 0x3A),
    },
    StylePreset {
        style: DesignStyle::Industrial,
        preview: "https://picsum.photos/id/20/400/600",
        swatch: (0x5A, 0x5F, 0x66),
    },
    StylePreset {
        style: DesignStyle::Bohemian,
        preview: "https://picsum.photos/id/42/400/600",
        swatch: (0xC2, 0x74, 0x64),
    },
    StylePreset {
        style: DesignStyle::Minimalist,
        preview: "https://picsum.photos/id/50/400/600",
        swatch: (0xDD, 0xDD, 0xD8),
    },
    StylePreset {
        style: DesignStyle::Japandi,
        preview: "https://picsum.photos/id/60/400/600",
        swatch: (0x8F, 0x83, 0x6C),
    },
    StylePreset {
        style: DesignStyle::ArtDeco,
        preview: "https://picsum.photos/id/88/400/600",
        swatch: (0xC9, 0xA2, 0x4B),
    },
];

/// Output resolution tiers for from-scratch generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    OneK,
    TwoK,
    FourK,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::OneK, ImageSize::TwoK, ImageSize::FourK];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

/// Client-side design state: original upload, latest edit result, and the
/// lineage of superseded results. Transitions are atomic from the UI's
/// perspective; only `is_generating` is observable mid-flight.
#[derive(Debug, Default)]
pub struct DesignSession {
    pub original: Option<ImageData>,
    pub current: Option<ImageData>,
    pub history: Vec<ImageData>,
    pub style: Option<DesignStyle>,
    pub is_generating: bool,
    pub error: Option<String>,
}

impl DesignSession {
    /// A fresh upload starts a new makeover: prior results, history and
    /// errors are discarded.
    pub fn upload(&mut self, image: ImageData) {
        self.original = Some(image);
        self.current = None;
        self.history.clear();
        self.error = None;
    }

    /// Marks one outstanding media call; switches the active style when
    /// the transition was triggered from the gallery.
    pub fn begin_generation(&mut self, style: Option<DesignStyle>) {
        if let Some(style) = style {
            self.style = Some(style);
        }
        self.is_generating = true;
        self.error = None;
    }

    /// An edit result replaces `current`; the superseded image joins the
    /// history so the lineage stays ordered oldest-first.
    pub fn apply_result(&mut self, image: ImageData) {
        if let Some(previous) = self.current.take() {
            self.history.push(previous);
        }
        self.current = Some(image);
        self.is_generating = false;
    }

    /// A from-scratch generation replaces the original wholesale. History
    /// belongs to the replaced room, so it is cleared as well.
    pub fn adopt_generated(&mut self, image: ImageData) {
        self.original = Some(image);
        self.current = None;
        self.history.clear();
        self.is_generating = false;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.is_generating = false;
        self.error = Some(message.into());
    }

    /// Edits always operate on whichever of current/original is most
    /// recent.
    pub fn latest_image(&self) -> Option<&ImageData> {
        self.current.as_ref().or(self.original.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub timestamp_ms: u64,
}

/// Append-only chat transcript. Messages are never mutated or removed and
/// timestamps stay strictly monotonic even when the wall clock stalls.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        let floor = self
            .messages
            .last()
            .map(|m| m.timestamp_ms + 1)
            .unwrap_or(0);
        self.messages.push(ChatMessage {
            role,
            text: text.into(),
            timestamp_ms: now_millis().max(floor),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn now_millis() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis() as u64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: u8) -> ImageData {
        ImageData::new(vec![tag; 4], "image/png")
    }

    #[test]
    fn upload_clears_prior_results_and_error() {
        let mut session = DesignSession::default();
        session.upload(image(1));
        session.begin_generation(Some(DesignStyle::Minimalist));
        session.apply_result(image(2));
        session.fail("something went wrong");

        session.upload(image(3));
        assert!(session.original.is_some());
        assert!(session.current.is_none());
        assert!(session.history.is_empty());
        assert!(session.error.is_none());
    }

    #[test]
    fn style_transform_scenario_settles_state() {
        let mut session = DesignSession::default();
        session.upload(image(1));
        session.begin_generation(Some(DesignStyle::Minimalist));
        assert!(session.is_generating);

        session.apply_result(image(2));
        assert_eq!(session.style, Some(DesignStyle::Minimalist));
        assert!(!session.is_generating);
        assert!(session.error.is_none());
        assert_eq!(session.current.as_ref().map(|i| i.bytes[0]), Some(2));
    }

    #[test]
    fn refine_operates_on_latest_image_and_records_history() {
        let mut session = DesignSession::default();
        session.upload(image(1));
        assert_eq!(session.latest_image().map(|i| i.bytes[0]), Some(1));

        session.begin_generation(None);
        session.apply_result(image(2));
        assert_eq!(session.latest_image().map(|i| i.bytes[0]), Some(2));

        session.begin_generation(None);
        session.apply_result(image(3));
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].bytes[0], 2);
    }

    #[test]
    fn failed_generation_clears_busy_and_sets_error() {
        let mut session = DesignSession::default();
        session.upload(image(1));
        session.begin_generation(Some(DesignStyle::Industrial));
        session.fail("Failed to reimagine space.");

        assert!(!session.is_generating);
        assert_eq!(session.error.as_deref(), Some("Failed to reimagine space."));
        assert!(session.current.is_none());
    }

    #[test]
    fn adopt_generated_replaces_original_wholesale() {
        let mut session = DesignSession::default();
        session.upload(image(1));
        session.begin_generation(None);
        session.apply_result(image(2));
        session.begin_generation(None);
        session.apply_result(image(3));

        session.adopt_generated(image(9));
        assert_eq!(session.original.as_ref().map(|i| i.bytes[0]), Some(9));
        assert!(session.current.is_none());
        assert!(session.history.is_empty());
    }

    #[test]
    fn transcript_is_append_only_with_monotonic_timestamps() {
        let mut transcript = Transcript::default();
        transcript.push(Role::User, "make the walls white");
        transcript.push(Role::Model, "Coming right up!");
        transcript.push(Role::User, "thanks");

        let stamps: Vec<u64> = transcript
            .messages()
            .iter()
            .map(|m| m.timestamp_ms)
            .collect();
        assert_eq!(transcript.messages().len(), 3);
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
