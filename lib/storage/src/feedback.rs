//! Feedback sinks
//!
//! [`FeedbackLog`] appends JSON lines from a background writer thread so that
//! recording never waits on disk. Its queue is bounded; events arriving while
//! it is full are dropped with a warning. [`MemoryFeedbackSink`] keeps events
//! in memory for tests and dry runs.

use anyhow::Context;
use courserec_core::{FeedbackEnvelope, FeedbackEvent, FeedbackSink, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

/// Events waiting for the writer before new ones are dropped
pub const FEEDBACK_QUEUE_CAPACITY: usize = 10_000;

/// State shared between the log handle and its writer thread
struct Queue {
    events: Mutex<VecDeque<FeedbackEnvelope>>,
    capacity: usize,
    wake: Condvar,
    running: AtomicBool,
    submitted: AtomicU64,
    dropped: AtomicU64,
    /// Events written or given up on; guarded by `done_lock` for waiting
    done: AtomicU64,
    done_lock: Mutex<()>,
    done_signal: Condvar,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            wake: Condvar::new(),
            running: AtomicBool::new(true),
            submitted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            done: AtomicU64::new(0),
            done_lock: Mutex::new(()),
            done_signal: Condvar::new(),
        }
    }

    /// Enqueue for the writer; false when shut down or full
    fn push(&self, envelope: FeedbackEnvelope) -> bool {
        let mut events = self.events.lock();
        if !self.running.load(Ordering::Acquire) {
            warn!("Feedback log is shut down, dropping event {}", envelope.id);
            return false;
        }
        if events.len() >= self.capacity {
            self.dropped.fetch_add(1, Ordering::AcqRel);
            warn!(
                "Feedback queue full ({} pending), dropping event {}",
                events.len(),
                envelope.id
            );
            return false;
        }
        events.push_back(envelope);
        self.submitted.fetch_add(1, Ordering::AcqRel);
        self.wake.notify_one();
        true
    }

    fn mark_done(&self, n: u64) {
        let _guard = self.done_lock.lock();
        self.done.fetch_add(n, Ordering::AcqRel);
        self.done_signal.notify_all();
    }
}

/// Append-only JSONL feedback log with a single background writer
pub struct FeedbackLog {
    queue: Arc<Queue>,
    worker: Mutex<Option<JoinHandle<()>>>,
    path: PathBuf,
}

impl FeedbackLog {
    /// Open (or create) the log at `path` and start the writer thread
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_capacity(path, FEEDBACK_QUEUE_CAPACITY)
    }

    /// Like [`FeedbackLog::open`] with at most `capacity` events waiting for the writer
    pub fn with_capacity<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let queue = Arc::new(Queue::new(capacity));
        let worker_queue = queue.clone();
        let worker_path = path.clone();
        let worker = thread::Builder::new()
            .name("feedback-writer".to_string())
            .spawn(move || run_writer(worker_queue, BufWriter::new(file), worker_path))?;

        debug!("Feedback log open at {}", path.display());
        Ok(Self {
            queue,
            worker: Mutex::new(Some(worker)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events accepted but not yet written
    pub fn pending(&self) -> u64 {
        self.queue
            .submitted
            .load(Ordering::Acquire)
            .saturating_sub(self.queue.done.load(Ordering::Acquire))
    }

    /// Events refused because the queue was full
    pub fn dropped(&self) -> u64 {
        self.queue.dropped.load(Ordering::Acquire)
    }

    /// Stop accepting events, drain the queue and join the writer
    pub fn shutdown(&self) {
        {
            let _events = self.queue.events.lock();
            self.queue.running.store(false, Ordering::Release);
            self.queue.wake.notify_all();
        }
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("Feedback writer thread panicked");
            }
        }
    }
}

impl FeedbackSink for FeedbackLog {
    fn record(&self, event: FeedbackEvent) {
        self.queue.push(FeedbackEnvelope::new(event));
    }

    fn flush(&self) {
        let target = self.queue.submitted.load(Ordering::Acquire);
        let mut guard = self.queue.done_lock.lock();
        while self.queue.done.load(Ordering::Acquire) < target {
            self.queue.done_signal.wait(&mut guard);
        }
    }
}

impl Drop for FeedbackLog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_writer(queue: Arc<Queue>, mut writer: BufWriter<File>, path: PathBuf) {
    loop {
        let batch: Vec<FeedbackEnvelope> = {
            let mut events = queue.events.lock();
            while events.is_empty() && queue.running.load(Ordering::Acquire) {
                queue.wake.wait(&mut events);
            }
            if events.is_empty() {
                break;
            }
            events.drain(..).collect()
        };

        let n = batch.len() as u64;
        if let Err(e) = write_batch(&mut writer, &batch) {
            error!("Failed to write {} feedback events to {}: {:#}", n, path.display(), e);
        }
        queue.mark_done(n);
    }
    debug!("Feedback writer for {} stopped", path.display());
}

fn write_batch(writer: &mut BufWriter<File>, batch: &[FeedbackEnvelope]) -> anyhow::Result<()> {
    for envelope in batch {
        serde_json::to_writer(&mut *writer, envelope)
            .with_context(|| format!("serializing feedback {}", envelope.id))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    writer.get_ref().sync_data()?;
    Ok(())
}

/// Read every entry of a feedback log, skipping lines that fail to parse
pub fn read_feedback_log<P: AsRef<Path>>(path: P) -> Result<Vec<FeedbackEnvelope>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping malformed feedback line {}: {}", lineno + 1, e),
        }
    }
    Ok(entries)
}

/// Keeps stamped events in memory
#[derive(Debug, Default)]
pub struct MemoryFeedbackSink {
    events: Mutex<Vec<FeedbackEnvelope>>,
}

impl MemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FeedbackEnvelope> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FeedbackSink for MemoryFeedbackSink {
    fn record(&self, event: FeedbackEvent) {
        self.events.lock().push(FeedbackEnvelope::new(event));
    }
}
