//! Terminal progress bars for interactive downloads.

use async_trait::async_trait;
use dashmap::DashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::download::ProgressObserver;

/// Renders one `indicatif` bar per download key.
///
/// `started` creates the bar, `updated` moves it, `ended` finishes and
/// clears it. Bars for distinct keys coexist under a single
/// [`MultiProgress`], so concurrent downloads render independently.
pub struct ProgressBarObserver {
    bars: MultiProgress,
    active: DashMap<String, ProgressBar>,
}

impl std::fmt::Debug for ProgressBarObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBarObserver")
            .field("active_bars", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBarObserver {
    /// Creates an observer drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bars: MultiProgress::new(),
            active: DashMap::new(),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<32} [{bar:32}] {percent:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

#[async_trait]
impl ProgressObserver for ProgressBarObserver {
    async fn started(&self, key: &str) {
        let bar = self.bars.add(ProgressBar::new(100));
        bar.set_style(Self::bar_style());
        bar.set_message(key.to_string());
        self.active.insert(key.to_string(), bar);
    }

    async fn updated(&self, key: &str, fraction: f64, status: &str) {
        if let Some(bar) = self.active.get(key) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            bar.set_position((fraction * 100.0).round() as u64);
            bar.set_message(format!("{key}: {status}"));
        }
    }

    async fn ended(&self, key: &str) {
        if let Some((_, bar)) = self.active.remove(key) {
            bar.finish_and_clear();
        }
    }
}
