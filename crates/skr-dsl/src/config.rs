//! Configuration for parsing.

/// Options for [`crate::parse_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfig {
    /// Columns a tab advances to (next multiple of this width).
    pub tab_width: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self { tab_width: 8 }
    }
}

impl ParseConfig {
    /// Set the tab width (clamped to at least 1).
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }
}
