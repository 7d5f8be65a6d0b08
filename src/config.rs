use camino::{Utf8Path, Utf8PathBuf};

pub const SAMPLE_DATA_URL: &str = "https://github.com/anitaxokojie/AURA-Legal-Framework/releases/download/v1.0-data/aura_sample_data.zip";
pub const RELEASES_PAGE_URL: &str =
    "https://github.com/anitaxokojie/AURA-Legal-Framework/releases";
pub const DATA_DIR_NAME: &str = "data";
pub const ARCHIVE_FILE_NAME: &str = "aura_sample_data.zip";
pub const CHUNK_SIZE: usize = 8192;

/// Everything the provisioner needs to know about where data comes from and
/// where it lands. The executable always runs with [`ProvisionConfig::default`].
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub source_url: String,
    pub root: Utf8PathBuf,
    pub data_dir_name: String,
    pub archive_file_name: String,
    pub chunk_size: usize,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self::with_root(Utf8PathBuf::from("."))
    }
}

impl ProvisionConfig {
    pub fn with_root(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_url: SAMPLE_DATA_URL.to_string(),
            root: root.into(),
            data_dir_name: DATA_DIR_NAME.to_string(),
            archive_file_name: ARCHIVE_FILE_NAME.to_string(),
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.data_dir_name)
    }

    pub fn archive_path(&self) -> Utf8PathBuf {
        self.root.join(&self.archive_file_name)
    }
}

pub fn manual_instructions() -> Vec<String> {
    vec![
        format!("1. Visit: {RELEASES_PAGE_URL}"),
        format!("2. Download {ARCHIVE_FILE_NAME}"),
        "3. Extract it in this directory".to_string(),
    ]
}
