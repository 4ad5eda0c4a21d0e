use std::path::{Path, PathBuf};

/// Directory holding the config file.
pub const CONFIG_DIR: &str = ".cliwrap";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Environment variable naming a config file explicitly.
pub const CONFIG_ENV_VAR: &str = "CLIWRAP_CONFIG";

/// Search upward from `start_dir` for `.cliwrap/config.toml`.
///
/// Stops at the first repository root marker (`.git`, `.hg`, `.svn`) or the
/// filesystem root, whichever comes first.
#[must_use]
pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current_dir = Some(start_dir);

    while let Some(dir) = current_dir {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.is_file() {
            return Some(config_path);
        }

        if [".git", ".hg", ".svn"]
            .iter()
            .any(|marker| dir.join(marker).exists())
        {
            break;
        }

        current_dir = dir.parent();
    }

    None
}
