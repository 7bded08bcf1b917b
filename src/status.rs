use chrono::Local;
use std::collections::VecDeque;

/// Most recent diagnostic entries kept in a [`DebugLog`]
pub const DEBUG_LOG_CAPACITY: usize = 20;

/// The single user-visible outcome of the last operation
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Status {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Status {
    pub fn succeed(&mut self, message: impl Into<String>) {
        self.success = Some(message.into());
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.success = None;
    }
}

/// Append-only diagnostic log holding the most recent entries
#[derive(Debug, Default, Clone)]
pub struct DebugLog {
    entries: VecDeque<String>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a timestamped entry, dropping the oldest past capacity
    pub fn push(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!("{}", message);
        if self.entries.len() == DEBUG_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries
            .push_back(format!("[{}] {}", Local::now().format("%H:%M:%S"), message));
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
