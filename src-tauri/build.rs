fn main() {
    // The Tauri context (tauri.conf.json, capabilities) is only needed when
    // the application shell is compiled in.
    #[cfg(feature = "shell")]
    tauri_build::build();
}
