use std::cell::Cell;
use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::app::{ProgressEvent, ProgressSink};
use crate::config::manual_instructions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

impl OutputMode {
    pub fn detect() -> Self {
        if io::stdout().is_terminal() {
            OutputMode::Interactive
        } else {
            OutputMode::NonInteractive
        }
    }
}

/// Human-readable rendering of provisioning progress on stdout.
pub struct ConsoleOutput {
    mode: OutputMode,
    progress_line: Cell<bool>,
}

impl ConsoleOutput {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            progress_line: Cell::new(false),
        }
    }

    pub fn print_failure(&self, error: &dyn Display) {
        self.finish_progress_line();
        for line in failure_lines(error) {
            println!("{line}");
        }
    }

    fn redraw_progress(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        match self.mode {
            OutputMode::Interactive => {
                queue!(
                    stdout,
                    MoveToColumn(0),
                    Clear(ClearType::CurrentLine),
                    Print(text)
                )?;
            }
            OutputMode::NonInteractive => write!(stdout, "\r{text}")?,
        }
        stdout.flush()
    }

    fn finish_progress_line(&self) {
        if self.progress_line.replace(false) {
            println!();
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        if let Some(text) = progress_text(&event) {
            if self.redraw_progress(&text).is_ok() {
                self.progress_line.set(true);
            }
            return;
        }
        if matches!(event, ProgressEvent::Progress { .. }) {
            return;
        }
        self.finish_progress_line();
        for line in event_lines(&event) {
            println!("{line}");
        }
    }
}

/// The in-place progress indicator, only when the total size is known.
pub fn progress_text(event: &ProgressEvent) -> Option<String> {
    event.percent().map(|percent| format!("Progress: {percent:.1}%"))
}

pub fn event_lines(event: &ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::AlreadyPresent { .. } => {
            vec![" Data already present! No download needed.".to_string()]
        }
        ProgressEvent::DownloadStarted { .. } => vec![
            " Downloading AURA sample data from GitHub Releases...".to_string(),
            " Downloading...".to_string(),
        ],
        ProgressEvent::Progress { .. } => Vec::new(),
        ProgressEvent::Extracting { .. } => vec![" Extracting files...".to_string()],
        ProgressEvent::Completed { data_dir, entries } => {
            let name = data_dir.file_name().unwrap_or(data_dir.as_str());
            vec![
                " Data setup complete!".to_string(),
                format!("   └─ Created {name}/ folder with {entries} matter folders"),
            ]
        }
    }
}

pub fn failure_lines(error: &dyn Display) -> Vec<String> {
    let mut lines = vec![
        format!(" Error downloading data: {error}"),
        String::new(),
        "Manual download instructions:".to_string(),
    ];
    lines.extend(manual_instructions());
    lines
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn progress_text_uses_one_decimal() {
        let event = ProgressEvent::Progress {
            downloaded: 1,
            total: Some(3),
        };
        assert_eq!(progress_text(&event).unwrap(), "Progress: 33.3%");

        let done = ProgressEvent::Progress {
            downloaded: 3,
            total: Some(3),
        };
        assert_eq!(progress_text(&done).unwrap(), "Progress: 100.0%");
    }

    #[test]
    fn no_progress_text_without_content_length() {
        let event = ProgressEvent::Progress {
            downloaded: 4096,
            total: None,
        };
        assert!(progress_text(&event).is_none());
        assert!(event_lines(&event).is_empty());
    }

    #[test]
    fn completion_cites_entry_count() {
        let event = ProgressEvent::Completed {
            data_dir: Utf8PathBuf::from("./data"),
            entries: 3,
        };
        let lines = event_lines(&event);
        assert_eq!(lines[0], " Data setup complete!");
        assert_eq!(lines[1], "   └─ Created data/ folder with 3 matter folders");
    }

    #[test]
    fn failure_lists_three_manual_steps() {
        let lines = failure_lines(&"connection refused");
        assert_eq!(lines[0], " Error downloading data: connection refused");
        assert_eq!(lines[2], "Manual download instructions:");
        assert_eq!(lines.len(), 6);
        assert!(lines[5].starts_with("3. "));
    }
}
