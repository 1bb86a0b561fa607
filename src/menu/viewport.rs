//! Pure scroll-window model for long lists.
//!
//! No I/O: given a total item count, a visible height, and a focus index,
//! compute the scroll offset keeping the focus a margin away from the window
//! edges. Recomputed fully on every focus change so there is no incremental
//! drift, and `update` is idempotent for a fixed focus.

/// Scroll window over `total` items, `height` of which are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub total: usize,
    pub height: usize,
    pub offset: usize,
    pub focus: usize,
}

/// The visible index window plus scroll-indicator flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    /// First visible index.
    pub start: usize,
    /// One past the last visible index.
    pub end: usize,
    pub more_above: bool,
    pub more_below: bool,
}

/// Default distance kept between the focus and the window edges.
pub const SCROLL_MARGIN: usize = 2;

impl ViewportState {
    pub fn new(total: usize, height: usize) -> Self {
        Self {
            total,
            height: height.max(1),
            offset: 0,
            focus: 0,
        }
    }

    /// Move the focus and recompute the scroll offset.
    ///
    /// Invariant on the result: `offset <= max(0, total - height)`, and the
    /// focus lies inside the visible window whenever the margin allows it.
    #[must_use]
    pub fn update(self, focus: usize, margin: usize) -> Self {
        if self.total == 0 {
            return Self {
                offset: 0,
                focus: 0,
                ..self
            };
        }

        let focus = focus.min(self.total - 1);
        // A window shorter than 2*margin+1 cannot honor the margin at both
        // edges; cap it or the top/bottom rules fight each other.
        let margin = margin.min(self.height.saturating_sub(1) / 2);
        let mut offset = self.offset;

        if focus < offset + margin {
            offset = focus.saturating_sub(margin);
        } else if focus + margin + 1 > offset + self.height {
            offset = (focus + margin + 1).saturating_sub(self.height);
        }

        offset = offset.min(self.total.saturating_sub(self.height));

        Self {
            offset,
            focus,
            ..self
        }
    }

    /// The currently visible window.
    pub fn range(&self) -> VisibleRange {
        let start = self.offset;
        let end = (self.offset + self.height).min(self.total);
        VisibleRange {
            start,
            end,
            more_above: start > 0,
            more_below: end < self.total,
        }
    }
}
