//! Visible-range math for virtualized lists and grids.
//!
//! Everything here is a pure function of its inputs. Extents are in pixels
//! (`f32`); indices are item positions.

use std::ops::Range;

/// Columns in the key-button grid.
pub const GRID_COLUMNS: usize = 5;

/// Smallest scrollbar thumb, in pixels.
pub const MIN_SCROLL_BAR_EXTENT: f32 = 20.0;

/// First row under the viewport and one past the last row (one extra row of overscan).
fn visible_rows(scroll_offset: f32, item_extent: f32, viewport_extent: f32) -> (usize, usize) {
  if !(item_extent > 0.0) {
    return (0, 0);
  }
  let start = (scroll_offset / item_extent).floor().max(0.0) as usize;
  let span = ((viewport_extent.max(0.0) / item_extent).ceil() as usize).saturating_add(1);
  (start, start.saturating_add(span))
}

/// Lines `[start, end)` to materialize for a single-column list.
pub fn visible_line_range(
  scroll_offset: f32,
  item_extent: f32,
  viewport_extent: f32,
  total_items: usize,
) -> Range<usize> {
  let (start, end) = visible_rows(scroll_offset, item_extent, viewport_extent);
  let end = end.min(total_items);
  start.min(end)..end
}

/// Item indices `[start, end)` to materialize for a grid laid out row by row.
pub fn visible_grid_range(
  scroll_offset: f32,
  row_extent: f32,
  viewport_extent: f32,
  total_items: usize,
  columns: usize,
) -> Range<usize> {
  let columns = columns.max(1);
  let (start_row, end_row) = visible_rows(scroll_offset, row_extent, viewport_extent);
  let end = end_row.saturating_mul(columns).min(total_items);
  start_row.saturating_mul(columns).min(end)..end
}

/// Clamp a scroll offset into `[0, max(0, content - viewport)]`.
pub fn clamp_scroll(offset: f32, content_extent: f32, viewport_extent: f32) -> f32 {
  if offset.is_nan() {
    return 0.0;
  }
  let max = (content_extent - viewport_extent).max(0.0);
  offset.clamp(0.0, max)
}

/// Thumb length for a proportional scrollbar, or `None` when everything fits.
pub fn scroll_bar_extent(
  viewport_extent: f32,
  content_extent: f32,
  min_extent: f32,
) -> Option<f32> {
  if content_extent <= viewport_extent {
    return None;
  }
  let extent = viewport_extent * viewport_extent / content_extent.max(viewport_extent);
  Some(extent.max(min_extent))
}

/// Thumb position along the track for a given scroll offset.
pub fn scroll_bar_offset(
  scroll_offset: f32,
  content_extent: f32,
  viewport_extent: f32,
  thumb_extent: f32,
) -> f32 {
  let max_scroll = content_extent - viewport_extent;
  if !(max_scroll > 0.0) {
    return 0.0;
  }
  let track = (viewport_extent - thumb_extent).max(0.0);
  clamp_scroll(scroll_offset, content_extent, viewport_extent) / max_scroll * track
}

/// Scroll position over `item_count` items laid out in `columns` columns.
///
/// A single column is a plain line list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
  scroll_offset: f32,
  item_extent: f32,
  viewport_extent: f32,
  item_count: usize,
  columns: usize,
}

impl ViewportState {
  pub fn lines(item_extent: f32, viewport_extent: f32) -> Self {
    Self::new(item_extent, viewport_extent, 1)
  }

  pub fn grid(row_extent: f32, viewport_extent: f32, columns: usize) -> Self {
    Self::new(row_extent, viewport_extent, columns)
  }

  fn new(item_extent: f32, viewport_extent: f32, columns: usize) -> Self {
    Self {
      scroll_offset: 0.0,
      item_extent,
      viewport_extent,
      item_count: 0,
      columns: columns.max(1),
    }
  }

  pub fn scroll_offset(&self) -> f32 {
    self.scroll_offset
  }

  pub fn item_count(&self) -> usize {
    self.item_count
  }

  pub fn viewport_extent(&self) -> f32 {
    self.viewport_extent
  }

  pub fn total_extent(&self) -> f32 {
    self.item_count.div_ceil(self.columns) as f32 * self.item_extent
  }

  /// Change the item count, re-clamping the offset.
  pub fn set_item_count(&mut self, item_count: usize) {
    self.item_count = item_count;
    self.scroll_to(self.scroll_offset);
  }

  pub fn scroll_to(&mut self, offset: f32) {
    self.scroll_offset = clamp_scroll(offset, self.total_extent(), self.viewport_extent);
  }

  pub fn scroll_by(&mut self, delta: f32) {
    self.scroll_to(self.scroll_offset + delta);
  }

  pub fn visible_range(&self) -> Range<usize> {
    if self.columns == 1 {
      visible_line_range(
        self.scroll_offset,
        self.item_extent,
        self.viewport_extent,
        self.item_count,
      )
    } else {
      visible_grid_range(
        self.scroll_offset,
        self.item_extent,
        self.viewport_extent,
        self.item_count,
        self.columns,
      )
    }
  }

  pub fn first_visible_index(&self) -> usize {
    self.visible_range().start
  }

  pub fn last_visible_index(&self) -> usize {
    self.visible_range().end
  }

  /// `(thumb_offset, thumb_extent)` along the track, or `None` when content fits.
  pub fn scroll_bar(&self, min_extent: f32) -> Option<(f32, f32)> {
    let content = self.total_extent();
    let extent = scroll_bar_extent(self.viewport_extent, content, min_extent)?;
    let offset = scroll_bar_offset(self.scroll_offset, content, self.viewport_extent, extent);
    Some((offset, extent))
  }
}
