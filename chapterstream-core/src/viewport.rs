use std::time::Instant;

use crate::config::StreamConfig;
use crate::stream::ChapterStream;
use crate::types::{Direction, Geometry};

/// Work owed after a scroll settles, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAction {
    /// The viewport is close to an edge of loaded content; load more.
    Edge(Direction),
    /// Sync the address bar and navigation chrome to the viewport.
    NavSync,
}

impl ChapterStream {
    /// Feed one scroll event of the content container. Programmatic
    /// corrections made by the splicer raise the suppression flag and are
    /// not counted as real scrolls.
    pub fn on_scroll(&mut self, now: Instant) {
        if self.suppress_scroll {
            self.suppress_scroll = false;
            return;
        }
        if self.first_scroll_at.is_none() {
            self.first_scroll_at = Some(now);
        }
        self.last_scroll_at = Some(now);
        self.edge_pending = true;
        self.nav_pending = true;
    }

    /// Debounce pump, called by the driver. Edge checks fire after the short
    /// quiet period (once loading is armed), the navigation sync after the
    /// longer one. Edge checks stay pending while disarmed so the first
    /// settled scroll after arming still triggers them.
    pub fn poll(&mut self, now: Instant) -> Option<StreamAction> {
        self.update_arming(now);
        let last = self.last_scroll_at?;
        let quiet = now.duration_since(last);

        if self.edge_pending && quiet >= self.config.scroll_quiet() && self.loading_enabled {
            self.edge_pending = false;
            let geometry = self.surface.geometry();
            if let Some(direction) = decide_edge(&geometry, &self.config, self.preload_done) {
                return Some(StreamAction::Edge(direction));
            }
        }

        if self.nav_pending && quiet >= self.config.nav_quiet() {
            self.nav_pending = false;
            return Some(StreamAction::NavSync);
        }
        None
    }

    /// Sentinel intersection trigger: an invisible marker at the given edge
    /// of loaded content entered the viewport. More reliable than scroll
    /// polling for flung scrolls that skip past the detection zone.
    pub fn on_sentinel(&mut self, direction: Direction, now: Instant) -> Option<StreamAction> {
        self.update_arming(now);
        if !self.loading_enabled {
            return None;
        }
        Some(StreamAction::Edge(direction))
    }

    /// Loading stays disabled on pure page-load; a short delay after the
    /// first real scroll flips it on for the rest of the session.
    fn update_arming(&mut self, now: Instant) {
        if self.loading_enabled {
            return;
        }
        if let Some(first) = self.first_scroll_at {
            if now.duration_since(first) >= self.config.arm_delay() {
                self.loading_enabled = true;
            }
        }
    }
}

/// Pure edge decision from container geometry. The right edge wins over the
/// left so a narrow viewport never requests both directions at once; the
/// left edge additionally requires either a completed preload or a scroll
/// position past the dead zone.
pub(crate) fn decide_edge(
    geometry: &Geometry,
    config: &StreamConfig,
    preload_done: bool,
) -> Option<Direction> {
    let column = if geometry.column_width > 0.0 {
        geometry.column_width
    } else {
        config.column_width_fallback
    };
    let columns_from_left = geometry.scroll_left / column;
    let columns_from_right =
        (geometry.scroll_width - geometry.scroll_left - geometry.client_width) / column;

    if columns_from_right < config.edge_threshold_columns {
        return Some(Direction::After);
    }
    if columns_from_left < config.edge_threshold_columns
        && (preload_done || geometry.scroll_left > config.dead_zone_px)
    {
        return Some(Direction::Before);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(scroll_left: f64, scroll_width: f64) -> Geometry {
        Geometry {
            scroll_left,
            scroll_width,
            client_width: 400.0,
            column_width: 100.0,
        }
    }

    #[test]
    fn right_edge_takes_priority() {
        let config = StreamConfig::default();
        // 2 columns left of the viewport, 2 right of it: both within the
        // threshold, After wins
        let geo = geometry(200.0, 800.0);
        assert_eq!(decide_edge(&geo, &config, true), Some(Direction::After));
    }

    #[test]
    fn left_edge_when_right_is_far() {
        let config = StreamConfig::default();
        let geo = geometry(200.0, 2000.0);
        assert_eq!(decide_edge(&geo, &config, true), Some(Direction::Before));
    }

    #[test]
    fn dead_zone_suppresses_left_edge_before_preload() {
        let config = StreamConfig::default();
        let geo = geometry(20.0, 2000.0);
        assert_eq!(decide_edge(&geo, &config, false), None);
        assert_eq!(decide_edge(&geo, &config, true), Some(Direction::Before));
    }

    #[test]
    fn middle_of_content_requests_nothing() {
        let config = StreamConfig::default();
        let geo = geometry(1000.0, 3000.0);
        assert_eq!(decide_edge(&geo, &config, true), None);
    }

    #[test]
    fn zero_column_width_falls_back() {
        let config = StreamConfig::default();
        let geo = Geometry {
            scroll_left: 0.0,
            scroll_width: 10_000.0,
            client_width: 400.0,
            column_width: 0.0,
        };
        // falls back to the configured width instead of dividing by zero
        assert_eq!(decide_edge(&geo, &config, true), Some(Direction::Before));
    }
}
