//! ==============================================================================
//! store.rs - append-only csv log of sensor readings
//! ==============================================================================
//!
//! purpose:
//!     a single flat file holding one header line followed by one line per
//!     reading. rows are never rewritten or removed.
//!
//! relationships:
//!     - used by: routes.rs (upload appends, /data reads the latest row)
//!     - uses: domain.rs (row codec and header)
//!
//! io model:
//!     every call is synchronous std::fs io. handlers run these calls on
//!     tokio's blocking pool. there is no cache: every read re-parses the
//!     whole file, so /data always reflects what is on disk.
//!
//! ==============================================================================

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::domain::{SensorRecord, CSV_HEADER};
use crate::error::{TelemetryError, TelemetryResult};

pub struct AppendStore {
    path: PathBuf,
    // serializes appends made by this process; other processes are not coordinated
    write_lock: Mutex<()>,
}

impl AppendStore {
    /// bind to `path` and make sure the file exists with its header
    pub fn open(path: impl Into<PathBuf>) -> TelemetryResult<Self> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        store.ensure_initialized()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// create the file with only the header if it is missing
    ///
    /// idempotent; an existing file is left untouched.
    pub fn ensure_initialized(&self) -> TelemetryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(mut file) => {
                writeln!(file, "{}", CSV_HEADER)?;
                info!(path = %self.path.display(), "created sensor store");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %self.path.display(), "sensor store already present");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// append one row; the handle is dropped on every exit path
    pub fn append(&self, record: &SensorRecord) -> TelemetryResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        // one write call per row so the line lands in a single append
        let line = format!("{}\n", record.to_csv_line());
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// every data row in file order
    ///
    /// returns `EmptyStore` when the file holds no data rows.
    pub fn read_all(&self) -> TelemetryResult<Vec<SensorRecord>> {
        let content = fs::read_to_string(&self.path)?;

        let mut lines = content
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        match lines.next() {
            None => return Err(TelemetryError::EmptyStore),
            Some((_, header)) if header == CSV_HEADER => {}
            Some((line, header)) => {
                return Err(TelemetryError::CorruptRow {
                    line,
                    reason: format!("unexpected header {:?}", header),
                })
            }
        }

        let rows = lines
            .map(|(line_no, line)| SensorRecord::from_csv_line(line, line_no))
            .collect::<TelemetryResult<Vec<_>>>()?;

        if rows.is_empty() {
            return Err(TelemetryError::EmptyStore);
        }
        Ok(rows)
    }

    /// the most recently appended row
    pub fn latest(&self) -> TelemetryResult<SensorRecord> {
        self.read_all()?
            .pop()
            .ok_or(TelemetryError::EmptyStore)
    }
}
