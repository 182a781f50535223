//! File selection and rotation (spec §4.4, §6 "File layout").
//!
//! Filenames are literal: `<dir>/<program>.YYYYMMDD.<pid>.log` for the live
//! file, and `…log.1`, `…log.2`, … for archives, where `…log.1` is always
//! the most recently rotated. Rotation never retries a failed write; it
//! only decides *where* the persister's next write should land.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A single (year, month, day) date stamp, as encoded in the live
/// filename.
pub type Date = (i32, u32, u32);

/// Chooses and opens the active log file, renaming the numbered chain on
/// rollover. Owned exclusively by the persister after construction (spec
/// §5 "Ownership").
pub struct FileRotator {
    log_dir: PathBuf,
    program_name: String,
    pid: u32,
    /// Whether `log_dir` was creatable/writable at init. When false, every
    /// `select_target` call opens `/dev/null` instead (spec §4.4 step 1,
    /// §7 "Bad log directory").
    dir_is_legal: bool,
    bad_dir_logged: bool,
    date: Option<Date>,
    seq: u32,
    file: Option<File>,
}

impl FileRotator {
    /// Create a rotator rooted at `log_dir`. Creates the directory (mode
    /// `0o777` on unix, matching spec §6 init contract) if it does not
    /// exist; if creation or a writability probe fails, the rotator
    /// degrades to a `/dev/null` sink rather than erroring (spec §7).
    pub fn new(log_dir: impl Into<PathBuf>, program_name: impl Into<String>, pid: u32) -> Self {
        let log_dir = log_dir.into();
        let dir_is_legal = Self::prepare_dir(&log_dir).is_ok();
        if !dir_is_legal {
            tracing::warn!(
                dir = %log_dir.display(),
                "log directory is not usable; degrading to a /dev/null sink"
            );
        }
        Self {
            log_dir,
            program_name: program_name.into(),
            pid,
            dir_is_legal,
            bad_dir_logged: false,
            date: None,
            seq: 0,
            file: None,
        }
    }

    fn prepare_dir(dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(dir)?.permissions();
            perms.set_mode(0o777);
            fs::set_permissions(dir, perms)?;
        }
        // Writability probe: touch and remove a throwaway file.
        let probe = dir.join(".appendlog-write-probe");
        fs::write(&probe, b"")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    fn live_path(&self) -> PathBuf {
        self.log_dir.join(format!(
            "{}.{:04}{:02}{:02}.{}.log",
            self.program_name,
            self.date.map(|d| d.0).unwrap_or(0),
            self.date.map(|d| d.1).unwrap_or(0),
            self.date.map(|d| d.2).unwrap_or(0),
            self.pid
        ))
    }

    fn numbered_path(&self, n: u32) -> PathBuf {
        let mut path = self.live_path().into_os_string();
        path.push(format!(".{n}"));
        PathBuf::from(path)
    }

    /// Implements spec §4.4 `select_target`. Returns whether `fp` is now a
    /// valid, open target.
    pub fn select_target(&mut self, date: Date, file_size_limit_bytes: u64) -> bool {
        if !self.dir_is_legal {
            if self.file.is_none() {
                match OpenOptions::new().write(true).open("/dev/null") {
                    Ok(f) => self.file = Some(f),
                    Err(err) => {
                        if !self.bad_dir_logged {
                            tracing::error!(%err, "failed to open /dev/null sink");
                            self.bad_dir_logged = true;
                        }
                    }
                }
            }
            return self.file.is_some();
        }

        if self.file.is_none() {
            self.date = Some(date);
            return self.open_fresh_live();
        }

        if self.date != Some(date) {
            self.close();
            self.date = Some(date);
            return self.open_fresh_live();
        }

        match self.current_size() {
            Ok(size) if size >= file_size_limit_bytes => self.rollover_by_size(),
            Ok(_) => true,
            Err(err) => {
                tracing::error!(%err, "failed to stat active log file");
                false
            }
        }
    }

    fn open_fresh_live(&mut self) -> bool {
        match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.live_path())
        {
            Ok(f) => {
                self.file = Some(f);
                self.seq = 1;
                true
            }
            Err(err) => {
                tracing::error!(path = %self.live_path().display(), %err, "failed to open live log file");
                self.file = None;
                false
            }
        }
    }

    fn current_size(&mut self) -> io::Result<u64> {
        match &mut self.file {
            Some(f) => f.seek(SeekFrom::End(0)),
            None => Ok(0),
        }
    }

    fn rollover_by_size(&mut self) -> bool {
        self.close();
        for i in (1..self.seq).rev() {
            let from = self.numbered_path(i);
            let to = self.numbered_path(i + 1);
            if from.exists() {
                if let Err(err) = fs::rename(&from, &to) {
                    tracing::error!(?from, ?to, %err, "failed to shift rotated log file");
                }
            }
        }
        let live = self.live_path();
        let archived = self.numbered_path(1);
        if let Err(err) = fs::rename(&live, &archived) {
            tracing::error!(?live, ?archived, %err, "failed to archive live log file on rollover");
            // Fall through and try to reopen a fresh live file anyway; the
            // persister retries rotation on the next cycle if this fails too.
        }
        let opened = self.open_fresh_live();
        if opened {
            self.seq += 1;
        }
        opened
    }

    fn close(&mut self) {
        self.file = None;
    }

    /// The currently open file handle, if any.
    pub fn writer(&mut self) -> Option<&mut File> {
        self.file.as_mut()
    }
}
