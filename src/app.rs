use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::config::ProvisionConfig;
use crate::download::ArchiveClient;
use crate::error::ProvisionError;
use crate::fs_util::{self, ExtractJournal};

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    AlreadyPresent { data_dir: Utf8PathBuf, entries: usize },
    DownloadStarted { url: String },
    Progress { downloaded: u64, total: Option<u64> },
    Extracting { archive: Utf8PathBuf },
    Completed { data_dir: Utf8PathBuf, entries: usize },
}

impl ProgressEvent {
    /// Percentage complete for a `Progress` event whose total size is known.
    pub fn percent(&self) -> Option<f64> {
        match self {
            ProgressEvent::Progress {
                downloaded,
                total: Some(total),
            } if *total > 0 => Some(*downloaded as f64 / *total as f64 * 100.0),
            _ => None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    AlreadyPresent { entries: usize },
    Downloaded { bytes: u64, entries: usize },
}

impl ProvisionOutcome {
    pub fn entries(&self) -> usize {
        match self {
            ProvisionOutcome::AlreadyPresent { entries }
            | ProvisionOutcome::Downloaded { entries, .. } => *entries,
        }
    }
}

#[derive(Clone)]
pub struct Provisioner<C: ArchiveClient> {
    config: ProvisionConfig,
    client: C,
}

impl<C: ArchiveClient> Provisioner<C> {
    pub fn new(config: ProvisionConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Makes sure the data directory holds something, downloading and
    /// extracting the sample archive when it does not. A non-empty data
    /// directory is trusted as-is.
    ///
    /// On failure the temporary archive and every path created by the
    /// extraction are removed before the error is returned.
    pub fn ensure_data_present(
        &self,
        sink: &dyn ProgressSink,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let data_dir = self.config.data_dir();
        if fs_util::has_entries(data_dir.as_std_path())? {
            let entries = fs_util::count_entries(data_dir.as_std_path())?;
            info!("{data_dir} already holds {entries} entries, skipping download");
            sink.event(ProgressEvent::AlreadyPresent { data_dir, entries });
            return Ok(ProvisionOutcome::AlreadyPresent { entries });
        }

        let archive = self.config.archive_path();
        let mut journal = ExtractJournal::new();
        let bytes = match self.fetch_and_extract(&archive, &mut journal, sink) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.discard_partial(&archive, journal);
                return Err(err);
            }
        };

        let entries = fs_util::count_entries(data_dir.as_std_path())?;
        info!("provisioned {data_dir} with {entries} entries ({bytes} bytes downloaded)");
        sink.event(ProgressEvent::Completed { data_dir, entries });
        Ok(ProvisionOutcome::Downloaded { bytes, entries })
    }

    fn fetch_and_extract(
        &self,
        archive: &Utf8PathBuf,
        journal: &mut ExtractJournal,
        sink: &dyn ProgressSink,
    ) -> Result<u64, ProvisionError> {
        let url = self.config.source_url.as_str();
        info!("downloading {url} to {archive}");
        sink.event(ProgressEvent::DownloadStarted {
            url: url.to_string(),
        });
        let bytes = self.client.download(
            url,
            archive.as_std_path(),
            self.config.chunk_size,
            sink,
        )?;

        info!("extracting {archive} into {}", self.config.root());
        sink.event(ProgressEvent::Extracting {
            archive: archive.clone(),
        });
        fs_util::extract_zip(
            archive.as_std_path(),
            self.config.root().as_std_path(),
            journal,
        )?;

        fs_util::remove_if_exists(archive.as_std_path())?;
        Ok(bytes)
    }

    fn discard_partial(&self, archive: &Utf8PathBuf, journal: ExtractJournal) {
        if let Err(err) = fs_util::remove_if_exists(archive.as_std_path()) {
            warn!("failed to remove {archive}: {err}");
        }
        journal.rollback();
    }
}
