mod app;
mod audio;
mod chat;
mod error;
mod event;
mod gemini;
mod host;
mod session;
mod studio;
mod theme;
mod video;

use std::sync::mpsc;

use app::MaisonApp;
use eframe::egui;
use host::{CredentialHost, EnvCredentialHost};
use studio::StudioClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maison=info".into()),
        )
        .init();

    let host = EnvCredentialHost::new();
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("maison-runtime")
        .build()?;

    let api_key = host.credential().unwrap_or_default();
    let studio = runtime.block_on(async { StudioClient::new(api_key, tx.clone()) })?;

    let app = MaisonApp::new(rx, studio, &host);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Maison",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
