use std::{
    io::Write,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::{record::LogRecord, stream::LogStreamHandle};

const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_BACKUPS: u32 = 5;

/// A destination for [`LogRecord`]s that have already passed a worker's
/// [`crate::AttributionFilter`]. A sink failure is always local: it is
/// logged and the sink left in place (or dropped, for a dead stream
/// subscriber) rather than propagated up to the worker.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &LogRecord);
}

/// Size-rotated file sink, grounded on `log_config.py`'s
/// `RotatingFileHandler(maxBytes=.., backupCount=..)`. The teacher's stack
/// has no rotation crate dependency, so rotation is hand-rolled on top of
/// `std::fs` the way `jackbot-data`'s `redis_store.rs` hand-rolls a small
/// trait plus concrete backing rather than pulling in an external store
/// client.
pub struct FileSink {
    inner: Mutex<FileSinkState>,
}

struct FileSinkState {
    path: PathBuf,
    file: std::fs::File,
    written: u64,
}

impl FileSink {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            inner: Mutex::new(FileSinkState {
                path,
                file,
                written,
            }),
        })
    }

    /// `<log_root>/workers/<user_id>_<symbol>_<strategy_key>.log`.
    pub fn path_for_worker(log_root: &Path, worker_key: &str) -> PathBuf {
        log_root.join("workers").join(format!("{worker_key}.log"))
    }

    fn rotate(state: &mut FileSinkState) -> std::io::Result<()> {
        for generation in (1..MAX_BACKUPS).rev() {
            let from = backup_path(&state.path, generation);
            let to = backup_path(&state.path, generation + 1);
            if from.exists() {
                std::fs::rename(from, to)?;
            }
        }
        std::fs::rename(&state.path, backup_path(&state.path, 1))?;
        state.file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&state.path)?;
        state.written = 0;
        Ok(())
    }
}

fn backup_path(path: &Path, generation: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

impl LogSink for FileSink {
    fn write(&self, record: &LogRecord) {
        let mut state = self.inner.lock();
        let Ok(json) = record.to_json() else {
            return;
        };
        let line = format!("{json}\n");

        if state.written + line.len() as u64 > MAX_FILE_BYTES {
            if let Err(err) = Self::rotate(&mut state) {
                tracing::warn!(path = %state.path.display(), %err, "log file rotation failed");
            }
        }

        match state.file.write_all(line.as_bytes()) {
            Ok(()) => state.written += line.len() as u64,
            Err(err) => {
                tracing::warn!(path = %state.path.display(), %err, "log file write failed");
            }
        }
    }
}

/// Forwards allowed records to a worker's [`crate::LogStreamEndpoint`] via a
/// cloned [`LogStreamHandle`] rather than a borrow — the endpoint and the
/// router that owns this sink both end up fields of the same adapter struct,
/// so a lifetime parameter here would make that struct self-referential.
pub struct StreamSink {
    handle: LogStreamHandle,
}

impl StreamSink {
    pub fn new(handle: LogStreamHandle) -> Self {
        Self { handle }
    }
}

impl LogSink for StreamSink {
    fn write(&self, record: &LogRecord) {
        self.handle.broadcast(record.clone());
    }
}
