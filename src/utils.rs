use std::{env::current_dir, fs, path::PathBuf};

/// Retrieves the data directory path for the application.
///
/// Falls back to the current directory when the platform has no notion of a
/// per-user data directory.
pub(crate) fn data_dir() -> anyhow::Result<PathBuf> {
    if let Some(base_dirs) = directories::BaseDirs::new() {
        let mut dir = base_dirs.data_dir().to_path_buf();
        dir.push(env!("CARGO_PKG_NAME"));

        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    } else {
        #[cfg(feature = "log")]
        log::warn!("Failed to get local data directory, using current directory instead");
        Ok(current_dir().unwrap_or_default())
    }
}
