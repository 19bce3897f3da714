//! Navigation side effects requested by the session layer.

use parking_lot::Mutex;

pub trait Navigator: Send + Sync {
    /// Leave the current view entirely, discarding any in-memory view state.
    fn hard_redirect(&self, path: &str);
}

/// Records redirects instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.redirects.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
    }
}
