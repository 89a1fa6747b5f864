use std::time::Duration;

use serde::Deserialize;

/// Tunables for the stream controller. Deserializable so the CLI can layer a
/// TOML file over the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Load more content when the viewport is within this many columns of an
    /// edge of the loaded range.
    pub edge_threshold_columns: f64,
    /// Chapters requested per same-book batch load.
    pub batch_size: u32,
    /// Quiet period after the last scroll before edge checks run.
    pub scroll_quiet_ms: u64,
    /// Longer quiet period before the address/navigation sync runs.
    pub nav_quiet_ms: u64,
    /// Delay between the first real scroll and loading becoming enabled for
    /// the rest of the session.
    pub arm_delay_ms: u64,
    /// Leftward loads are suppressed inside this dead zone until the initial
    /// preload has completed.
    pub dead_zone_px: f64,
    /// Used when the surface cannot report an effective column width.
    pub column_width_fallback: f64,
    /// Preload one chapter before the initial one so leftward scrolling has
    /// somewhere to go.
    pub preload_before: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            edge_threshold_columns: 3.0,
            batch_size: 2,
            scroll_quiet_ms: 150,
            nav_quiet_ms: 400,
            arm_delay_ms: 1000,
            dead_zone_px: 48.0,
            column_width_fallback: 360.0,
            preload_before: true,
        }
    }
}

impl StreamConfig {
    pub(crate) fn scroll_quiet(&self) -> Duration {
        Duration::from_millis(self.scroll_quiet_ms)
    }

    pub(crate) fn nav_quiet(&self) -> Duration {
        Duration::from_millis(self.nav_quiet_ms)
    }

    pub(crate) fn arm_delay(&self) -> Duration {
        Duration::from_millis(self.arm_delay_ms)
    }
}
