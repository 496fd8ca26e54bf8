use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use eframe::egui::{self, Color32, RichText, ScrollArea, TextureHandle};
use tracing::warn;

use crate::chat::{self, ChatIntent};
use crate::event::AppEvent;
use crate::gemini::wire::Citation;
use crate::host::CredentialHost;
use crate::session::{DesignSession, ImageData, ImageSize, Role, Transcript, STYLE_PRESETS};
use crate::studio::StudioClient;
use crate::theme::Theme;

const QUICK_ADJUSTMENTS: [(&str, &str); 4] = [
    ("Brighter", "Make the room brighter and airier"),
    ("Add Plants", "Add several lush indoor plants and succulents"),
    ("Change Rug", "Replace the rug with a more modern pattern"),
    ("Paint Walls", "Paint the walls a soft off-white"),
];

#[derive(Debug)]
enum VideoState {
    Idle,
    Rendering { checks: u32 },
    Ready(PathBuf),
    Failed(String),
}

pub struct MaisonApp {
    rx: Receiver<AppEvent>,
    studio: StudioClient,
    theme: Theme,
    theme_applied: bool,

    session: DesignSession,
    transcript: Transcript,
    latest_sources: Vec<Citation>,
    chat_input: String,
    awaiting_answer: bool,

    inspiration_prompt: String,
    selected_size: ImageSize,

    video: VideoState,
    video_generation: u64,
    show_key_dialog: bool,
    key_input: String,

    compare_fraction: f32,
    original_tex: Option<TextureHandle>,
    current_tex: Option<TextureHandle>,
    scroll_to_bottom: bool,
}

impl MaisonApp {
    pub fn new(rx: Receiver<AppEvent>, studio: StudioClient, host: &dyn CredentialHost) -> Self {
        Self {
            rx,
            studio,
            theme: Theme::default(),
            theme_applied: false,
            session: DesignSession::default(),
            transcript: Transcript::default(),
            latest_sources: Vec::new(),
            chat_input: String::new(),
            awaiting_answer: false,
            inspiration_prompt: String::new(),
            selected_size: ImageSize::OneK,
            video: VideoState::Idle,
            video_generation: 0,
            show_key_dialog: !host.has_credential(),
            key_input: String::new(),
            compare_fraction: 0.5,
            original_tex: None,
            current_tex: None,
            scroll_to_bottom: false,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DesignUpdated(image) => {
                self.session.apply_result(image);
                self.current_tex = None;
            }
            AppEvent::DesignFailed { message, from_chat } => {
                self.session.fail(message);
                if from_chat {
                    // The optimistic acknowledgement must not stand.
                    self.transcript.push(Role::Model, chat::EDIT_CORRECTION);
                    self.scroll_to_bottom = true;
                }
            }
            AppEvent::InspirationReady(image) => {
                self.session.adopt_generated(image);
                self.original_tex = None;
                self.current_tex = None;
                self.inspiration_prompt.clear();
            }
            AppEvent::InspirationFailed(message) => {
                self.session.fail(message);
            }
            AppEvent::VideoChecked { generation, checks } => {
                if generation == self.video_generation
                    && matches!(self.video, VideoState::Rendering { .. })
                {
                    self.video = VideoState::Rendering { checks };
                }
            }
            AppEvent::VideoRendered { generation, path } => {
                if generation == self.video_generation {
                    self.video = VideoState::Ready(path);
                }
            }
            AppEvent::VideoFailed {
                generation,
                message,
                credential_missing,
            } => {
                if generation != self.video_generation {
                    return;
                }
                self.video = VideoState::Failed(message);
                if credential_missing {
                    self.show_key_dialog = true;
                }
            }
            AppEvent::AssistantReply { text, sources } => {
                self.transcript.push(Role::Model, text);
                self.latest_sources = sources;
                self.awaiting_answer = false;
                self.scroll_to_bottom = true;
            }
            AppEvent::AssistantFailed => {
                self.transcript.push(Role::Model, chat::CHAT_FAILURE);
                self.awaiting_answer = false;
                self.scroll_to_bottom = true;
            }
        }
    }

    fn pick_upload(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
            .pick_file();
        let Some(path) = picked else {
            return;
        };
        match std::fs::read(&path) {
            Ok(bytes) => {
                let mime = image::guess_format(&bytes)
                    .map(|format| format.to_mime_type().to_string())
                    .unwrap_or_else(|_| "image/png".to_string());
                self.session.upload(ImageData::new(bytes, mime));
                self.original_tex = None;
                self.current_tex = None;
                self.video = VideoState::Idle;
                self.compare_fraction = 0.5;
            }
            Err(err) => {
                warn!("upload read failed: {err}");
                self.session.fail(format!("Could not read {}.", path.display()));
            }
        }
    }

    fn submit_chat(&mut self) {
        let message = self.chat_input.trim().to_string();
        if message.is_empty() || self.session.is_generating || self.awaiting_answer {
            return;
        }
        self.transcript.push(Role::User, &message);
        self.chat_input.clear();
        self.scroll_to_bottom = true;

        match chat::classify(&message) {
            ChatIntent::Edit => {
                let Some(image) = self.session.latest_image().cloned() else {
                    self.transcript
                        .push(Role::Model, "Upload a room photo first, then I can make edits.");
                    return;
                };
                self.transcript.push(Role::Model, chat::EDIT_ACK);
                self.studio.narrate(chat::EDIT_ACK.to_string());
                self.session.begin_generation(None);
                self.studio.refine(image, message, true);
            }
            ChatIntent::Question => {
                self.awaiting_answer = true;
                let context = self.session.latest_image().cloned();
                self.studio.ask(message, context);
            }
        }
    }

    fn ensure_textures(&mut self, ctx: &egui::Context) {
        if self.original_tex.is_none() {
            if let Some(image) = &self.session.original {
                self.original_tex = load_texture(ctx, "room_original", image);
            }
        }
        if self.current_tex.is_none() {
            if let Some(image) = &self.session.current {
                self.current_tex = load_texture(ctx, "room_current", image);
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Maison");
                ui.separator();
                ui.label(
                    RichText::new("AI Interior Design Studio").color(self.theme.text_muted),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Upload Space").clicked() {
                        self.pick_upload();
                    }
                    if ui.button("API Key").clicked() {
                        self.show_key_dialog = true;
                    }
                });
            });
        });
    }

    fn render_style_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("style_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Choose a Style");
                ui.add_space(self.theme.spacing_8);

                let styles_enabled =
                    self.session.original.is_some() && !self.session.is_generating;
                let mut chosen = None;
                for preset in &STYLE_PRESETS {
                    let selected = self.session.style == Some(preset.style);
                    ui.horizontal(|ui| {
                        let (rect, _) = ui
                            .allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                        ui.painter().rect_filled(
                            rect,
                            egui::CornerRadius::same(4),
                            Color32::from_rgb(preset.swatch.0, preset.swatch.1, preset.swatch.2),
                        );
                        let label = if selected {
                            RichText::new(preset.style.label())
                                .color(self.theme.accent_primary)
                                .strong()
                        } else {
                            RichText::new(preset.style.label())
                        };
                        let response = ui
                            .add_enabled(styles_enabled, egui::Button::new(label))
                            .on_hover_text(preset.preview);
                        if response.clicked() {
                            chosen = Some(preset.style);
                        }
                    });
                }
                if let Some(style) = chosen {
                    if let Some(original) = self.session.original.clone() {
                        self.session.begin_generation(Some(style));
                        self.studio.reimagine(original, style);
                    }
                }

                ui.separator();
                ui.heading("Quick Adjustments");
                ui.add_space(self.theme.spacing_8);
                let mut adjustment = None;
                for (label, command) in QUICK_ADJUSTMENTS {
                    if ui
                        .add_enabled(styles_enabled, egui::Button::new(label))
                        .on_hover_text(command)
                        .clicked()
                    {
                        adjustment = Some(command.to_string());
                    }
                }
                if let Some(instruction) = adjustment {
                    if let Some(image) = self.session.latest_image().cloned() {
                        self.session.begin_generation(None);
                        self.studio.refine(image, instruction, false);
                    }
                }

                ui.separator();
                ui.heading("Inspiration Generator");
                ui.label(
                    RichText::new("Render a brand new room from a description.")
                        .color(self.theme.text_muted)
                        .small(),
                );
                ui.add(
                    egui::TextEdit::multiline(&mut self.inspiration_prompt)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY)
                        .hint_text("A dreamy living room with velvet emerald sofas..."),
                );
                ui.horizontal(|ui| {
                    for size in ImageSize::ALL {
                        ui.selectable_value(&mut self.selected_size, size, size.as_str());
                    }
                    let can_generate = !self.session.is_generating
                        && !self.inspiration_prompt.trim().is_empty();
                    if ui
                        .add_enabled(can_generate, egui::Button::new("Generate"))
                        .clicked()
                    {
                        let prompt = self.inspiration_prompt.trim().to_string();
                        self.session.begin_generation(None);
                        self.studio.generate(prompt, self.selected_size);
                    }
                });
            });
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("chat_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Design Assistant");
                ui.separator();

                let transcript_height = (ui.available_height() - 80.0).max(120.0);
                ScrollArea::vertical()
                    .id_salt("chat_transcript")
                    .max_height(transcript_height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if self.transcript.is_empty() {
                            ui.label(
                                RichText::new(
                                    "Ask me to change something or where to find furniture!\n\
                                     \"Make the rug blue\" or \"Where can I find a sofa like this?\"",
                                )
                                .color(self.theme.text_muted)
                                .italics(),
                            );
                        }
                        for message in self.transcript.messages() {
                            let (fill, layout) = match message.role {
                                Role::User => (
                                    self.theme.user_bubble,
                                    egui::Layout::right_to_left(egui::Align::TOP),
                                ),
                                Role::Model => (
                                    self.theme.model_bubble,
                                    egui::Layout::left_to_right(egui::Align::TOP),
                                ),
                            };
                            ui.with_layout(layout, |ui| {
                                self.theme
                                    .bubble_frame(fill)
                                    .show(ui, |ui| {
                                        ui.set_max_width(240.0);
                                        ui.label(&message.text);
                                    })
                                    .response
                                    .on_hover_text(clock_label(message.timestamp_ms));
                            });
                        }
                        if !self.latest_sources.is_empty() {
                            ui.label(
                                RichText::new("Sources").color(self.theme.text_muted).small(),
                            );
                            for source in &self.latest_sources {
                                ui.hyperlink_to(&source.title, &source.uri);
                            }
                        }
                        if self.awaiting_answer {
                            ui.label(RichText::new("...").color(self.theme.text_muted));
                        }
                        if self.scroll_to_bottom {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });
                self.scroll_to_bottom = false;

                ui.separator();
                let input_enabled = !self.session.is_generating && !self.awaiting_answer;
                let hint = if self.session.is_generating {
                    "Updating your design..."
                } else if self.awaiting_answer {
                    "Waiting for an answer..."
                } else {
                    "Type your design feedback..."
                };

                let mut send_now = false;
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        input_enabled,
                        egui::TextEdit::singleline(&mut self.chat_input)
                            .desired_width(f32::INFINITY)
                            .hint_text(hint),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }
                    let clicked = ui
                        .add_enabled(
                            input_enabled && !self.chat_input.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked();
                    send_now |= clicked;
                });
                if send_now && input_enabled {
                    self.submit_chat();
                }
            });
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        let frame = self
            .theme
            .panel_frame(self.theme.surface_0, self.theme.spacing_16 as i8);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            if self.session.original.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("Start Your Room Makeover");
                        ui.label(
                            RichText::new(
                                "Upload a photo of your living room, bedroom, or office \
                                 to see it reimagined by AI.",
                            )
                            .color(self.theme.text_muted),
                        );
                        ui.add_space(self.theme.spacing_16);
                        if ui.button("Choose Photo").clicked() {
                            self.pick_upload();
                        }
                    });
                });
                return;
            }

            ui.heading("Your Vision");
            if let Some(error) = self.session.error.clone() {
                ui.label(RichText::new(error).color(self.theme.danger));
            }
            if !self.session.history.is_empty() {
                ui.label(
                    RichText::new(format!(
                        "{} earlier version(s) kept in this session",
                        self.session.history.len()
                    ))
                    .color(self.theme.text_muted)
                    .small(),
                );
            }
            ui.add_space(self.theme.spacing_8);

            self.draw_comparison(ui);

            ui.add_space(self.theme.spacing_12);
            let card = self.theme.card_frame();
            card.show(ui, |ui| {
                ui.set_width(ui.available_width());
                self.render_video_section(ui);
            });
        });
    }

    fn draw_comparison(&mut self, ui: &mut egui::Ui) {
        let Some(original) = self.original_tex.clone() else {
            return;
        };
        let tex_size = original.size_vec2();
        let scale = (ui.available_width() / tex_size.x).min(1.0);
        let display = tex_size * scale;
        let (rect, _) = ui.allocate_exact_size(display, egui::Sense::hover());
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        ui.painter().image(original.id(), rect, uv, Color32::WHITE);

        if let Some(current) = self.current_tex.clone() {
            let split_x = rect.left() + rect.width() * self.compare_fraction;
            let clip =
                egui::Rect::from_min_max(rect.min, egui::pos2(split_x, rect.bottom()));
            ui.painter()
                .with_clip_rect(clip)
                .image(current.id(), rect, uv, Color32::WHITE);
            ui.painter().line_segment(
                [
                    egui::pos2(split_x, rect.top()),
                    egui::pos2(split_x, rect.bottom()),
                ],
                egui::Stroke::new(2.0, self.theme.accent_primary),
            );
        }

        if self.session.is_generating {
            ui.painter().rect_filled(
                rect,
                egui::CornerRadius::ZERO,
                Color32::from_rgba_premultiplied(0, 0, 0, 110),
            );
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Reimagining your space...",
                egui::FontId::proportional(16.0),
                self.theme.text_primary,
            );
        }

        if self.current_tex.is_some() {
            ui.add(
                egui::Slider::new(&mut self.compare_fraction, 0.0..=1.0)
                    .show_value(false)
                    .text("Before / After"),
            );
        }
    }

    fn render_video_section(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Animation");
            match &self.video {
                VideoState::Rendering { .. } => {
                    ui.spinner();
                }
                VideoState::Ready(_) => {
                    ui.label(RichText::new("ready").color(self.theme.success).small());
                }
                _ => {}
            }
        });

        let mut start_render = false;
        let mut cancel_requested = false;
        let mut reset = false;
        match &self.video {
            VideoState::Idle => {
                if ui
                    .add_enabled(
                        self.session.latest_image().is_some(),
                        egui::Button::new("Animate Space")
                            .stroke(self.theme.subtle_button_stroke()),
                    )
                    .clicked()
                {
                    start_render = true;
                }
            }
            VideoState::Rendering { checks } => {
                ui.label(
                    RichText::new(format!(
                        "Rendering a cinematic pass... status checks: {checks}"
                    ))
                    .color(self.theme.warning),
                );
                if ui.button("Cancel").clicked() {
                    cancel_requested = true;
                }
            }
            VideoState::Ready(path) => {
                ui.label(
                    RichText::new(path.display().to_string())
                        .color(self.theme.text_muted)
                        .small(),
                );
                if ui.button("Play Video").clicked() {
                    open_externally(path);
                }
                if ui.button("Animate Again").clicked() {
                    reset = true;
                }
            }
            VideoState::Failed(message) => {
                ui.label(RichText::new(message.clone()).color(self.theme.danger));
                if ui.button("Try Again").clicked() {
                    reset = true;
                }
            }
        }

        if start_render {
            if let Some(image) = self.session.latest_image().cloned() {
                self.video = VideoState::Rendering { checks: 0 };
                self.video_generation = self.studio.animate(image);
            }
        }
        if cancel_requested {
            self.cancel_render();
        }
        if reset {
            self.video = VideoState::Idle;
        }
    }

    /// Cancels the in-flight render and returns the video section to
    /// idle. The tracked generation moves past the superseded render's,
    /// so a late report from it cannot pull the UI out of idle.
    fn cancel_render(&mut self) {
        self.studio.cancel_video();
        self.video_generation += 1;
        self.video = VideoState::Idle;
    }

    fn render_key_dialog(&mut self, ctx: &egui::Context) {
        if !self.show_key_dialog {
            return;
        }
        egui::Window::new("Activation Required")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(
                    "High-fidelity features like video rendering and 4K generation need a \
                     configured API key.",
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.key_input)
                        .password(true)
                        .hint_text("Paste your API key"),
                );
                ui.horizontal(|ui| {
                    let usable = !self.key_input.trim().is_empty();
                    if ui.add_enabled(usable, egui::Button::new("Use This Key")).clicked() {
                        self.studio.set_credential(self.key_input.trim().to_string());
                        self.key_input.clear();
                        self.show_key_dialog = false;
                    }
                    if ui.button("Later").clicked() {
                        self.show_key_dialog = false;
                    }
                });
                ui.hyperlink_to(
                    "Learn about Billing & API Keys",
                    "https://ai.google.dev/gemini-api/docs/billing",
                );
            });
    }
}

impl eframe::App for MaisonApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            self.theme.apply_visuals(ctx);
            self.theme_applied = true;
        }

        self.drain_events(ctx);
        self.ensure_textures(ctx);

        self.render_top_bar(ctx);
        self.render_style_panel(ctx);
        self.render_chat_panel(ctx);
        self.render_center_panel(ctx);
        self.render_key_dialog(ctx);

        // Backend tasks report over a plain channel; keep polling while
        // anything is in flight so their events are drained promptly.
        if self.session.is_generating
            || self.awaiting_answer
            || matches!(self.video, VideoState::Rendering { .. })
        {
            ctx.request_repaint_after(Duration::from_millis(150));
        }
    }
}

fn load_texture(ctx: &egui::Context, name: &str, image: &ImageData) -> Option<TextureHandle> {
    let decoded = match image::load_from_memory(&image.bytes) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("display decode failed: {err}");
            return None;
        }
    };
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Some(ctx.load_texture(name, pixels, egui::TextureOptions::LINEAR))
}

fn clock_label(timestamp_ms: u64) -> String {
    let secs = timestamp_ms / 1000;
    format!("{:02}:{:02} UTC", (secs / 3600) % 24, (secs / 60) % 60)
}

fn open_externally(path: &Path) {
    #[cfg(target_os = "macos")]
    let command = "open";
    #[cfg(target_os = "windows")]
    let command = "explorer";
    #[cfg(all(unix, not(target_os = "macos")))]
    let command = "xdg-open";

    if let Err(err) = std::process::Command::new(command).arg(path).spawn() {
        warn!("could not open {}: {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct FixedHost;

    impl CredentialHost for FixedHost {
        fn credential(&self) -> Option<String> {
            Some("test-key".to_string())
        }
    }

    // Spawned backend tasks never get polled on the test runtime's
    // current thread, so building the real studio client is safe: every
    // assertion below is about synchronous UI-side state.
    fn build_app() -> MaisonApp {
        let (tx, rx) = mpsc::channel();
        let studio = StudioClient::new("test-key".to_string(), tx)
            .expect("studio client should build inside a runtime");
        MaisonApp::new(rx, studio, &FixedHost)
    }

    fn room_photo() -> ImageData {
        ImageData::new(vec![1, 2, 3, 4], "image/png")
    }

    #[tokio::test]
    async fn edit_message_appends_user_entry_then_one_acknowledgement() {
        let mut app = build_app();
        app.session.upload(room_photo());
        app.chat_input = "change the rug to blue".to_string();
        app.submit_chat();

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "change the rug to blue");
        assert_eq!(messages[1].role, Role::Model);
        assert_eq!(messages[1].text, chat::EDIT_ACK);
        assert!(app.session.is_generating);
    }

    #[tokio::test]
    async fn failed_chat_edit_corrects_the_acknowledgement() {
        let mut app = build_app();
        app.session.upload(room_photo());
        app.chat_input = "change the rug to blue".to_string();
        app.submit_chat();

        app.apply_event(AppEvent::DesignFailed {
            message: "Failed to update design.".to_string(),
            from_chat: true,
        });

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Model);
        assert_eq!(messages[2].text, chat::EDIT_CORRECTION);
        assert!(!app.session.is_generating);
        assert!(app.session.error.is_some());
    }

    #[tokio::test]
    async fn failed_button_edit_leaves_the_transcript_alone() {
        let mut app = build_app();
        app.session.upload(room_photo());
        app.session.begin_generation(None);

        app.apply_event(AppEvent::DesignFailed {
            message: "Failed to update design.".to_string(),
            from_chat: false,
        });

        assert!(app.transcript.is_empty());
        assert!(app.session.error.is_some());
    }

    #[tokio::test]
    async fn question_gets_exactly_one_model_reply() {
        let mut app = build_app();
        app.chat_input = "where can I buy a sofa like this".to_string();
        app.submit_chat();

        assert_eq!(app.transcript.messages().len(), 1);
        assert_eq!(app.transcript.messages()[0].role, Role::User);
        assert!(app.awaiting_answer);

        app.apply_event(AppEvent::AssistantReply {
            text: "Try these shops.".to_string(),
            sources: Vec::new(),
        });

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Model);
        assert_eq!(messages[1].text, "Try these shops.");
        assert!(!app.awaiting_answer);
    }

    #[tokio::test]
    async fn failed_question_appends_the_generic_apology() {
        let mut app = build_app();
        app.chat_input = "where can I buy a sofa like this".to_string();
        app.submit_chat();

        app.apply_event(AppEvent::AssistantFailed);

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, chat::CHAT_FAILURE);
        assert!(!app.awaiting_answer);
    }

    #[tokio::test]
    async fn edit_without_an_image_still_answers_once() {
        let mut app = build_app();
        app.chat_input = "change the rug to blue".to_string();
        app.submit_chat();

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Model);
        assert!(!app.session.is_generating);
    }

    #[tokio::test]
    async fn cancelled_render_report_cannot_leave_idle() {
        let mut app = build_app();
        app.video = VideoState::Rendering { checks: 2 };
        app.video_generation = 4;

        app.cancel_render();
        assert!(matches!(app.video, VideoState::Idle));

        // A report the superseded render managed to emit before it
        // observed the cancellation.
        app.apply_event(AppEvent::VideoFailed {
            generation: 4,
            message: "backend returned 500: transient".to_string(),
            credential_missing: false,
        });
        assert!(matches!(app.video, VideoState::Idle));
    }

    #[tokio::test]
    async fn superseded_render_events_do_not_clobber_the_active_one() {
        let mut app = build_app();
        app.video = VideoState::Rendering { checks: 0 };
        app.video_generation = 7;

        app.apply_event(AppEvent::VideoChecked {
            generation: 6,
            checks: 40,
        });
        assert!(matches!(app.video, VideoState::Rendering { checks: 0 }));

        app.apply_event(AppEvent::VideoChecked {
            generation: 7,
            checks: 3,
        });
        assert!(matches!(app.video, VideoState::Rendering { checks: 3 }));

        app.apply_event(AppEvent::VideoRendered {
            generation: 6,
            path: PathBuf::from("/tmp/stale.mp4"),
        });
        assert!(matches!(app.video, VideoState::Rendering { checks: 3 }));

        app.apply_event(AppEvent::VideoRendered {
            generation: 7,
            path: PathBuf::from("/tmp/current.mp4"),
        });
        assert!(matches!(app.video, VideoState::Ready(_)));
    }
}
