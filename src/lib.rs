pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod process;
pub mod summary;
pub mod viz;

use std::collections::BTreeSet;

pub use config::Config;

/// Years a pipeline stage is restricted to. Empty means every year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Years(BTreeSet<i32>);

impl Years {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.0.is_empty() || self.0.contains(&year)
    }
}

impl FromIterator<i32> for Years {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Years(iter.into_iter().collect())
    }
}
