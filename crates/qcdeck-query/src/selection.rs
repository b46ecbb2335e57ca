use qcdeck_core::time::millis_to_seconds;

/// Selected time interval in milliseconds since epoch. `Empty` is the
/// identity filter: consumers must treat it as "no time constraint", never
/// as "exclude everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSelection {
    #[default]
    Empty,
    Range {
        start_ms: i64,
        end_ms: i64,
    },
}

impl TimeSelection {
    /// Build a range from two unordered bounds; ordering is normalized
    /// here, never trusted from the event source.
    #[must_use]
    pub fn from_bounds(a: f64, b: f64) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        #[allow(clippy::cast_possible_truncation)]
        Self::Range {
            start_ms: lo.floor() as i64,
            end_ms: hi.floor() as i64,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub const fn bounds_ms(&self) -> Option<(i64, i64)> {
        match self {
            Self::Empty => None,
            Self::Range { start_ms, end_ms } => Some((*start_ms, *end_ms)),
        }
    }

    /// Bounds converted to the store's native unit (seconds).
    #[must_use]
    pub fn bounds_seconds(&self) -> Option<(i64, i64)> {
        self.bounds_ms()
            .map(|(start, end)| (millis_to_seconds(start), millis_to_seconds(end)))
    }

    /// Closed-interval membership for a millisecond instant; everything is
    /// inside the empty selection.
    #[must_use]
    pub fn contains_ms(&self, instant_ms: i64) -> bool {
        match self {
            Self::Empty => true,
            Self::Range { start_ms, end_ms } => {
                *start_ms <= instant_ms && instant_ms <= *end_ms
            }
        }
    }
}

/// Raw brush-gesture rectangle from the timeline chart. Only the x extent
/// carries meaning; either x bound missing means the selection was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrushBounds {
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    pub x1: Option<f64>,
    pub y1: Option<f64>,
}

/// Selection state plus the generation it was issued under. A consumer
/// applies a derived query result only while its generation is still
/// current; superseded results are discarded instead of applied out of
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionUpdate {
    pub selection: TimeSelection,
    pub generation: u64,
}

/// Holds the current brush-driven selection for one timeline view.
#[derive(Debug, Default)]
pub struct TimeRangeSelector {
    current: TimeSelection,
    generation: u64,
}

impl TimeRangeSelector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn selection(&self) -> TimeSelection {
        self.current
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn accepts(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Ingest a brush gesture. Every call, including transitions to and
    /// from empty, bumps the generation and yields the new selection.
    pub fn on_brush(&mut self, raw_bounds: Option<BrushBounds>) -> SelectionUpdate {
        self.current = match raw_bounds {
            Some(BrushBounds {
                x0: Some(x0),
                x1: Some(x1),
                ..
            }) => TimeSelection::from_bounds(x0, x1),
            _ => TimeSelection::Empty,
        };
        self.generation += 1;
        SelectionUpdate {
            selection: self.current,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bounds_clear_the_selection() {
        let mut selector = TimeRangeSelector::new();
        assert_eq!(selector.on_brush(None).selection, TimeSelection::Empty);
        let partial = BrushBounds {
            x0: None,
            y0: Some(1.0),
            x1: None,
            y1: Some(2.0),
        };
        assert_eq!(
            selector.on_brush(Some(partial)).selection,
            TimeSelection::Empty
        );
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let bounds = BrushBounds {
            x0: Some(2_000.0),
            y0: None,
            x1: Some(1_000.0),
            y1: None,
        };
        let mut selector = TimeRangeSelector::new();
        let update = selector.on_brush(Some(bounds));
        assert_eq!(
            update.selection,
            TimeSelection::Range {
                start_ms: 1_000,
                end_ms: 2_000
            }
        );
    }

    #[test]
    fn empty_selection_is_the_identity_filter() {
        let empty = TimeSelection::Empty;
        assert!(empty.contains_ms(i64::MIN));
        assert!(empty.contains_ms(0));
        assert!(empty.contains_ms(i64::MAX));
        assert_eq!(empty.bounds_seconds(), None);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = TimeSelection::from_bounds(1_000.0, 2_000.0);
        assert!(range.contains_ms(1_000));
        assert!(range.contains_ms(2_000));
        assert!(!range.contains_ms(999));
        assert!(!range.contains_ms(2_001));
    }

    #[test]
    fn seconds_conversion_floors_milliseconds() {
        let range = TimeSelection::from_bounds(1_700_000_000_500.0, 1_700_003_600_900.0);
        assert_eq!(
            range.bounds_seconds(),
            Some((1_700_000_000, 1_700_003_600))
        );
    }

    #[test]
    fn every_brush_bumps_the_generation() {
        let mut selector = TimeRangeSelector::new();
        let first = selector.on_brush(None);
        let second = selector.on_brush(Some(BrushBounds {
            x0: Some(0.0),
            y0: None,
            x1: Some(10.0),
            y1: None,
        }));
        assert!(second.generation > first.generation);
        assert!(selector.accepts(second.generation));
        assert!(!selector.accepts(first.generation));
    }
}
