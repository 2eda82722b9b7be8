//! Walk progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Stage of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkPhase {
    /// Traversing directories and collecting entry paths.
    Discovering,
    /// Stat'ing and hashing entries.
    Fingerprinting,
    /// Snapshot assembled.
    Done,
}

/// Progress information during a walk.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    pub phase: WalkPhase,
    /// Entries found by the traversal so far.
    pub entries_discovered: u64,
    /// Entries whose fingerprint has been built.
    pub entries_fingerprinted: u64,
    /// Bytes fed through a hash function.
    pub bytes_hashed: u64,
    /// Path most recently visited.
    pub current_path: PathBuf,
    /// Entries recorded as skipped or whose listing failed.
    pub faults: u64,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            phase: WalkPhase::Discovering,
            entries_discovered: 0,
            entries_fingerprinted: 0,
            bytes_hashed: 0,
            current_path: PathBuf::new(),
            faults: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate hashing rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for WalkProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress accumulator owned by the walker.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    progress: WalkProgress,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            progress: WalkProgress::new(),
        }
    }

    pub fn record_discovered(&mut self, path: PathBuf) {
        self.progress.entries_discovered += 1;
        self.progress.current_path = path;
    }

    pub fn record_fault(&mut self) {
        self.progress.faults += 1;
    }

    pub fn discovered(&self) -> u64 {
        self.progress.entries_discovered
    }

    pub fn set_phase(&mut self, phase: WalkPhase) {
        self.progress.phase = phase;
    }

    pub fn finish(&mut self, fingerprinted: u64, bytes_hashed: u64, faults: u64) {
        self.progress.entries_fingerprinted = fingerprinted;
        self.progress.bytes_hashed = bytes_hashed;
        self.progress.faults += faults;
        self.progress.phase = WalkPhase::Done;
    }

    pub fn snapshot(&self) -> WalkProgress {
        WalkProgress {
            elapsed: self.start_time.elapsed(),
            ..self.progress.clone()
        }
    }
}
