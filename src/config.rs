use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Veritox";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Veritox/ on all platforms (user-visible, clinic staff back it up directly)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Veritox")
}

/// Path of the clinic database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("veritox.db")
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "info,veritox=debug".to_string()
}
