//! Screen Capture Bridge - screen recording for mobile app shells.
//!
//! Runs a foreground capture session on the host platform: permission
//! negotiation, the screen-capture token handshake, a fixed hardware encoder
//! pipeline and a single MPEG-4 output file. With the `shell` feature this
//! crate is also the Tauri application exposing those operations as commands.

pub mod capture;
#[cfg(feature = "shell")]
pub mod commands;
pub mod config;
pub mod presence;
pub mod recorder;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screen_capture_bridge=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize the application
#[cfg(feature = "shell")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::recording::RecorderState;
    use config::RecorderConfig;
    use recorder::RecordingCoordinator;
    use tauri::Manager;

    init_tracing();

    tracing::info!("Starting Screen Capture Bridge v{}", env!("CARGO_PKG_VERSION"));

    let builder = tauri::Builder::default();
    #[cfg(target_os = "android")]
    let builder = builder.plugin(capture::android::init());

    let app = builder
        .invoke_handler(tauri::generate_handler![
            commands::recording::start_recording,
            commands::recording::stop_recording,
            commands::recording::get_recording_state,
            commands::recording::move_recording,
        ])
        .setup(|app| {
            let config_path = app.path().app_config_dir()?.join("recorder.json");
            let mut config = RecorderConfig::load(&config_path)?;

            // Relative output directories live under the app's data directory.
            if config.output_dir.is_relative() {
                config.output_dir = app.path().app_data_dir()?.join(&config.output_dir);
            }
            tracing::info!("Recordings will be written to {:?}", config.output_dir);

            let providers = build_providers(app.handle(), &config);
            app.manage(RecorderState::new(RecordingCoordinator::new(providers, config)));
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| {
        if let tauri::RunEvent::Exit = event {
            if let Some(state) = handle.try_state::<RecorderState>() {
                state.coordinator.on_host_destroy();
            }
        }
    });
}

#[cfg(all(feature = "shell", target_os = "android"))]
fn build_providers<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    config: &config::RecorderConfig,
) -> recorder::Providers {
    use tauri::Manager;

    let bridge = app
        .state::<capture::android::AndroidBridge<R>>()
        .inner()
        .clone();
    capture::android::providers(bridge, config.notification.clone())
}

#[cfg(all(feature = "shell", not(target_os = "android")))]
fn build_providers<R: tauri::Runtime>(
    _app: &tauri::AppHandle<R>,
    config: &config::RecorderConfig,
) -> recorder::Providers {
    tracing::warn!("Screen capture is not available on {}", std::env::consts::OS);
    capture::UnsupportedPlatform::providers(config.notification.clone())
}
