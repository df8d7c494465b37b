use std::sync::Arc;

use anyhow::Context;
use eframe::egui;
use ksot_live::{config::AppConfig, gui, gui::state::AppState, storage::AuthStore};
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ksot-worker")
        .build()
        .context("failed to build the tokio runtime")?;

    let auth = Arc::new(AuthStore::load(config.token_cache_path.clone()));
    let mut state = AppState::new(config, auth, runtime.handle().clone());

    let builder = egui::ViewportBuilder::default()
        .with_title("Live Quiz")
        .with_inner_size(egui::vec2(520.0, 640.0));

    let options = eframe::NativeOptions {
        viewport: builder,
        ..Default::default()
    };

    info!("Opening window");
    eframe::run_simple_native("Live Quiz", options, move |ctx, _frame| {
        gui::ui_main(ctx, &mut state);
    })
    .map_err(|e| anyhow::anyhow!("window closed with an error: {e}"))?;

    runtime.shutdown_background();
    Ok(())
}
