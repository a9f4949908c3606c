use std::time::Duration;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Quiet period before an edited card is saved.
    pub autosave_debounce_ms: u64,
    /// Columns created with every new board, left to right.
    pub default_columns: Vec<String>,
    /// Capacity of the change notification channel. Slow subscribers past
    /// this many pending changes observe a lag instead of blocking.
    pub notify_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 500,
            default_columns: vec![
                "To Do".to_string(),
                "In Progress".to_string(),
                "Done".to_string(),
            ],
            notify_capacity: 64,
        }
    }
}

impl BoardConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
