use std::env;
use std::path::PathBuf;

const MIB: usize = 1024 * 1024;

/// Where uploads go and how large each kind may be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub temp_dir: PathBuf,
    pub avatar_max_bytes: usize,
    pub test_file_max_bytes: usize,
    pub test_item_file_max_bytes: usize,
    pub test_item_option_file_max_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("temp-files"),
            avatar_max_bytes: 5 * MIB,
            test_file_max_bytes: 3 * MIB,
            test_item_file_max_bytes: 2 * MIB,
            test_item_option_file_max_bytes: MIB,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temp_dir: env::var("TEMP_FILES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            ..defaults
        }
    }

    /// Upper bound for a whole multipart body: every allowed file at its limit.
    pub fn max_body_bytes(&self) -> usize {
        self.test_file_max_bytes
            + 30 * self.test_item_file_max_bytes
            + 150 * self.test_item_option_file_max_bytes
            + MIB
    }
}
