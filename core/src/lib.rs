mod app;
mod document;
mod engine;
mod keyboard;
mod models;
mod navigator;
mod path;
mod storage;
mod tasks;
mod viewport;
mod widgets;

pub use crate::app::{AppLayout, AppState, Frame};
pub use crate::document::{coerce, write_value, JsonDocument};
pub use crate::engine::{CoreEngine, CoreError, CoreOptions};
pub use crate::keyboard::{
  BackspaceRepeat, InputEvent, Key, RepeatAction, RepeatPhase, CLEAR_AFTER_FRACTION,
  REPEAT_DELAY_MS, REPEAT_INTERVAL_MS,
};
pub use crate::models::{
  JsonNodeKind, JsonPathSegment, KeyButton, KeyGridPage, NavCommand, NavState, NavigatorView,
  SessionInfo, Task, TaskInfo, TaskKind, TextLinesPage,
};
pub use crate::navigator::{NavigationFrame, Navigator};
pub use crate::path::PathTracker;
pub use crate::storage::{RecentDocument, Storage, StorageOptions};
pub use crate::viewport::{
  clamp_scroll, scroll_bar_extent, scroll_bar_offset, visible_grid_range, visible_line_range,
  ViewportState, GRID_COLUMNS, MIN_SCROLL_BAR_EXTENT,
};
pub use crate::widgets::{Button, LabeledRect, Point, Rect, TextInput, TextLine};
