use serde::{Deserialize, Serialize};

/// Permission bits for what the store creates. Ignored off unix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Mode of newly created parent directories, before the umask.
    pub dir_mode: u32,
    /// Mode of written record files.
    pub file_mode: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}
