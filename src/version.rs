// Build metadata from Cargo.toml

/// Package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `name version`, used in the startup log line and the landing page.
pub fn banner() -> String {
    format!("{NAME} {VERSION}")
}
