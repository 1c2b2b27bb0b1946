use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::checkpoint::ProgressStore;
use crate::errors::GenerationError;

/// Commits between two progress log lines.
const PROGRESS_LOG_EVERY: u64 = 10;

/// Append-only destination behind [`SharedOutput`].
pub trait OutputFile: Write + Send {
    /// Current length in bytes.
    fn byte_len(&self) -> io::Result<u64>;
    /// Cut the destination back to `len` bytes.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    /// Make everything written so far durable.
    fn sync(&self) -> io::Result<()>;
}

impl OutputFile for File {
    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Output file and progress store behind one lock.
///
/// Workers never touch the file directly: they hand over a buffer of
/// complete lines and the marker it advances to, and both are applied in a
/// single critical section. The bytes are synced before the marker moves,
/// and the store records the output length it covers, so anything past that
/// length is uncommitted and gets cut off.
pub struct SharedOutput<F: OutputFile = File> {
    state: Mutex<OutputState<F>>,
    progress_path: PathBuf,
}

struct OutputState<F: OutputFile> {
    writer: CountingWriter<F>,
    store: ProgressStore,
    numbers_written: u64,
    commits: u64,
}

impl SharedOutput<File> {
    /// Open `output_path` for appending. See [`SharedOutput::from_file`] for
    /// how `fresh` and the store's committed length are applied.
    pub fn open(
        output_path: &Path,
        fresh: bool,
        store: ProgressStore,
        progress_path: &Path,
    ) -> Result<Self, GenerationError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)?;
        Self::from_file(file, fresh, store, progress_path)
    }
}

impl<F: OutputFile> SharedOutput<F> {
    /// Take over an opened destination.
    ///
    /// A fresh run persists its empty store before the old contents are
    /// truncated, so a stale store never outlives the lines it covers. A
    /// resumed run cuts the destination back to the store's committed
    /// length, dropping lines and fragments written after the last commit.
    pub fn from_file(
        mut file: F,
        fresh: bool,
        mut store: ProgressStore,
        progress_path: &Path,
    ) -> Result<Self, GenerationError> {
        if fresh {
            store.output_bytes = 0;
            store.save(progress_path)?;
            file.truncate_to(0)?;
            file.sync()?;
        } else {
            let len = file.byte_len()?;
            if len < store.output_bytes {
                return Err(GenerationError::Checkpoint(format!(
                    "output holds {len} bytes but {} were committed",
                    store.output_bytes
                )));
            }
            if len > store.output_bytes {
                warn!(
                    committed = store.output_bytes,
                    found = len,
                    "dropping uncommitted output tail"
                );
                file.truncate_to(store.output_bytes)?;
                file.sync()?;
            }
            store.save(progress_path)?;
        }

        Ok(Self {
            state: Mutex::new(OutputState {
                writer: CountingWriter::new(file),
                store,
                numbers_written: 0,
                commits: 0,
            }),
            progress_path: progress_path.to_path_buf(),
        })
    }

    /// Append `batch` (complete lines only), sync it, then advance the marker
    /// of `area`/`range` to `next` and persist the store.
    ///
    /// On failure the destination is cut back to the last committed length
    /// and the in-memory store is left untouched.
    pub fn commit(
        &self,
        area: &str,
        range: usize,
        batch: &[u8],
        numbers: u64,
        next: u64,
    ) -> Result<(), GenerationError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let committed = state.store.output_bytes;
        let counted = state.writer.bytes_written();

        let result = append_synced(&mut state.writer, batch)
            .map_err(GenerationError::from)
            .and_then(|()| {
                let mut updated = state.store.clone();
                updated.record(area, range, next)?;
                updated.output_bytes = committed + batch.len() as u64;
                updated.save(&self.progress_path)?;
                Ok(updated)
            });
        match result {
            Ok(updated) => state.store = updated,
            Err(err) => {
                if let Err(rollback) = state.writer.rewind(committed, counted) {
                    warn!(
                        area_code = %area,
                        range,
                        error = %rollback,
                        "could not cut output back to its committed length"
                    );
                }
                return Err(err);
            }
        }

        state.numbers_written += numbers;
        state.commits += 1;
        debug!(area_code = %area, range, next, numbers, "batch committed");
        if state.commits % PROGRESS_LOG_EVERY == 0 {
            info!(
                numbers_written = state.numbers_written,
                remaining = state.store.remaining(),
                "progress"
            );
        }
        Ok(())
    }

    pub fn numbers_written(&self) -> Result<u64, GenerationError> {
        Ok(self.lock()?.numbers_written)
    }

    /// Release the destination and return the final store and bytes written.
    pub fn into_parts(self) -> Result<(ProgressStore, u64), GenerationError> {
        let state = self.state.into_inner().map_err(|_| poisoned())?;
        let bytes = state.writer.bytes_written();
        Ok((state.store, bytes))
    }

    fn lock(&self) -> Result<MutexGuard<'_, OutputState<F>>, GenerationError> {
        self.state.lock().map_err(|_| poisoned())
    }
}

fn append_synced<F: OutputFile>(writer: &mut CountingWriter<F>, batch: &[u8]) -> io::Result<()> {
    writer.write_all(batch)?;
    writer.flush()?;
    writer.get_ref().sync()
}

fn poisoned() -> GenerationError {
    GenerationError::Io(io::Error::other("output lock poisoned by a panicking worker"))
}

struct CountingWriter<W: OutputFile> {
    inner: W,
    bytes: u64,
}

impl<W: OutputFile> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn get_ref(&self) -> &W {
        &self.inner
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Drop everything past `len` and reset the counter to `bytes`.
    fn rewind(&mut self, len: u64, bytes: u64) -> io::Result<()> {
        self.bytes = bytes;
        self.inner.truncate_to(len)?;
        self.inner.sync()
    }
}

impl<W: OutputFile> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use phonelist_core::{AreaCode, CountryCode, DialingPlan, Enumerator, partition};

    use super::*;
    use crate::{GenerateOptions, GenerationEngine, GenerationRequest};

    /// Accepts `budget` bytes, then fails like a full disk.
    struct FullDisk {
        file: File,
        budget: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::other("no space left on device"));
            }
            let take = buf.len().min(self.budget);
            let written = self.file.write(&buf[..take])?;
            self.budget -= written;
            Ok(written)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl OutputFile for FullDisk {
        fn byte_len(&self) -> io::Result<u64> {
            self.file.byte_len()
        }

        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            self.file.truncate_to(len)
        }

        fn sync(&self) -> io::Result<()> {
            self.file.sync()
        }
    }

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("phonelist_sink_{label}_{}", uuid::Uuid::new_v4()));
        create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn failed_append_is_cut_back_and_resume_completes_every_line() {
        let dir = temp_dir("full_disk");
        let plan = DialingPlan::new(3, 2).expect("plan");
        let country = CountryCode::parse("1").expect("country");
        let area = AreaCode::parse("212", &plan).expect("area");
        let output_path = dir.join("numbers.txt");
        let progress_path = GenerationRequest::default_progress_path(&output_path);

        let mut store = ProgressStore::new(&country, &plan, false, &output_path);
        store.ensure_area(&area, &partition(plan.space_size(), 2).expect("partition"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&output_path)
            .expect("open output");
        // Room for one batch of 20 lines and three bytes of the next one.
        let disk = FullDisk {
            file,
            budget: 20 * 7 + 3,
        };
        let output = SharedOutput::from_file(disk, true, store, &progress_path)
            .expect("shared output");

        let mut enumerator = Enumerator::range(&plan, &country, &area, 0, 50).expect("range");
        let mut buf = Vec::new();
        let count = enumerator.fill(&mut buf, 20);
        output
            .commit("212", 0, &buf, count as u64, enumerator.position())
            .expect("first batch fits");

        buf.clear();
        let count = enumerator.fill(&mut buf, 20);
        let err = output
            .commit("212", 0, &buf, count as u64, enumerator.position())
            .expect_err("disk is full");
        assert!(matches!(err, GenerationError::Io(_)));
        drop(output);

        let bytes = std::fs::read(&output_path).expect("read output");
        assert_eq!(bytes.len(), 20 * 7);
        assert_eq!(bytes.last(), Some(&b'\n'));
        let persisted = ProgressStore::load(&progress_path)
            .expect("load progress")
            .expect("progress kept");
        assert_eq!(persisted.output_bytes, 20 * 7);
        assert_eq!(persisted.area("212").expect("area").ranges[0].next, 20);

        let request = GenerationRequest {
            country_code: "1".to_string(),
            area_codes: vec!["212".to_string()],
            plan,
            output_path: output_path.clone(),
            progress_path: progress_path.clone(),
            resume: true,
        };
        let options = GenerateOptions {
            workers: 2,
            batch_size: 20,
            plus_prefix: false,
        };
        GenerationEngine::new(options)
            .run(&request)
            .expect("resumed run");

        let contents = std::fs::read_to_string(&output_path).expect("read output");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 100);
        assert!(lines.iter().all(|line| line.len() == 6 && line.starts_with("1212")));
        let unique: BTreeSet<&str> = lines.iter().copied().collect();
        assert_eq!(unique.len(), 100);
        assert!(!progress_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
