//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to stderr and to a size-rotated
//! log file, and keeps the most recent lines in a circular buffer so the
//! console can show them without reading the file back.
//!
//! `log` records are bridged into `tracing`, so crates that only use the `log`
//! macros end up in the same file.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILE_NAME: &str = "phrasebank.log";
const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 3;
const DEFAULT_BUFFER_LINES: usize = 500;

static BUFFER: OnceLock<Arc<Mutex<RingBuffer>>> = OnceLock::new();

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory holding the log file and its rotations
    pub dir: PathBuf,
    pub file_name: String,
    /// Rotate once the active file would grow past this size
    pub max_file_bytes: u64,
    /// Active file plus rotated ones
    pub max_files: usize,
    /// Lines kept in memory for `recent_lines`
    pub buffer_lines: usize,
    pub level: LevelFilter,
}

impl LoggerConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            level: LevelFilter::INFO,
        }
    }
}

/// Fixed-capacity line buffer, oldest lines dropped first
#[derive(Debug)]
pub struct RingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

struct RollingState {
    dir: PathBuf,
    file_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingState {
    fn open(config: &LoggerConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.dir)?;
        let path = config.dir.join(&config.file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: config.dir.clone(),
            file_name: config.file_name.clone(),
            max_bytes: config.max_file_bytes,
            max_files: config.max_files.max(1),
            file,
            written,
        })
    }

    fn path_for(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(&self.file_name)
        } else {
            self.dir.join(format!("{}.{}", self.file_name, index))
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.max_files > 1 {
            let oldest = self.path_for(self.max_files - 1);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (0..self.max_files - 1).rev() {
                let from = self.path_for(index);
                if from.exists() {
                    fs::rename(&from, self.path_for(index + 1))?;
                }
            }
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path_for(0))?;
        self.written = 0;
        Ok(())
    }

    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }
}

/// Size-rotated log file usable as a `tracing_subscriber` writer
#[derive(Clone)]
pub struct RollingFile {
    state: Arc<Mutex<RollingState>>,
    buffer: Arc<Mutex<RingBuffer>>,
}

impl RollingFile {
    pub fn new(config: &LoggerConfig) -> io::Result<Self> {
        Ok(Self {
            state: Arc::new(Mutex::new(RollingState::open(config)?)),
            buffer: Arc::new(Mutex::new(RingBuffer::new(config.buffer_lines))),
        })
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.state.lock().ok().map(|state| state.path_for(0))
    }

    pub fn buffer(&self) -> Arc<Mutex<RingBuffer>> {
        Arc::clone(&self.buffer)
    }
}

/// Handle produced per event by `RollingFile`
pub struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
    buffer: Arc<Mutex<RingBuffer>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            state.append(buf)?;
        }
        if let Ok(mut buffer) = self.buffer.lock() {
            for line in String::from_utf8_lossy(buf).lines() {
                if !line.trim().is_empty() {
                    buffer.push(line.trim_end().to_string());
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter {
            state: Arc::clone(&self.state),
            buffer: Arc::clone(&self.buffer),
        }
    }
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: LoggerConfig) -> Result<PathBuf, String> {
    let file = RollingFile::new(&config)
        .map_err(|e| format!("Failed to open log file in {}: {}", config.dir.display(), e))?;
    let path = file.path().unwrap_or_else(|| config.dir.join(&config.file_name));
    let _ = BUFFER.set(file.buffer());

    tracing_subscriber::registry()
        .with(config.level)
        .with(fmt::layer().with_timer(LocalTimer).with_writer(io::stderr))
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_ansi(false)
                .with_writer(file),
        )
        .try_init()
        .map_err(|e| format!("Failed to install logger: {}", e))?;

    tracing::info!(path = %path.display(), "rolling logger initialized");
    Ok(path)
}

/// Most recent log lines, oldest first. Empty before `init`.
pub fn recent_lines() -> Vec<String> {
    BUFFER
        .get()
        .and_then(|buffer| buffer.lock().ok().map(|b| b.lines()))
        .unwrap_or_default()
}
