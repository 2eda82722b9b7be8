//! Bounded operation log served by `GET /log`.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

/// Marker appended each time the log is read.
pub const READ_MARKER: &str = "end;";

/// Ring buffer of operation lines shared by all request handlers.
///
/// Cloning yields another handle to the same buffer. Once `capacity`
/// lines are held, recording a new line drops the oldest.
#[derive(Debug, Clone)]
pub struct OperationLog {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOG_CAPACITY)
    }
}

impl OperationLog {
    /// Create a log holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1000)))),
            capacity,
        }
    }

    /// Append a timestamped line.
    pub fn record(&self, message: impl AsRef<str>) {
        let line = format!(
            "{} {}",
            Local::now().format("%Y/%m/%d %H:%M:%S"),
            message.as_ref()
        );
        self.push(line);
    }

    /// Append the read marker and return the whole buffer as text.
    ///
    /// Each call leaves its marker in the buffer, so consecutive reads show
    /// where the previous read ended.
    pub fn read_with_marker(&self) -> String {
        let mut lines = self.inner.lock();
        Self::push_bounded(&mut lines, self.capacity, READ_MARKER.to_string());

        let mut text = String::new();
        for line in lines.iter() {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Number of lines currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&self, line: String) {
        let mut lines = self.inner.lock();
        Self::push_bounded(&mut lines, self.capacity, line);
    }

    fn push_bounded(lines: &mut VecDeque<String>, capacity: usize, line: String) {
        while lines.len() >= capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_appends_marker() {
        let log = OperationLog::new(10);
        log.record("upload file: a.txt");

        let first = log.read_with_marker();
        assert!(first.contains("upload file: a.txt\n"));
        assert!(first.ends_with("end;\n"));

        let second = log.read_with_marker();
        assert!(second.ends_with("end;\nend;\n"));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let log = OperationLog::new(2);
        log.record("one");
        log.record("two");
        log.record("three");

        assert_eq!(log.len(), 2);
        let text = log.read_with_marker();
        assert!(!text.contains("one"));
        assert!(!text.contains("two"));
        assert!(text.contains("three"));
    }

    #[test]
    fn test_clones_share_buffer() {
        let log = OperationLog::new(5);
        let handle = log.clone();
        handle.record("from clone");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let log = OperationLog::new(0);
        assert_eq!(log.capacity(), 1);
        assert!(log.is_empty());
        assert_eq!(log.read_with_marker(), "end;\n");
    }
}
