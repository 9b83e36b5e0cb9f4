//! Application state for one window: the text box, the control buttons, the
//! key grid and the JSON text view, driven by input events and read back as a
//! [`Frame`] each tick.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  engine::{CoreEngine, CoreError},
  keyboard::{BackspaceRepeat, InputEvent, Key, RepeatAction},
  models::{JsonNodeKind, NavCommand, NavigatorView, SessionInfo},
  path::PathTracker,
  viewport::{scroll_bar_extent, scroll_bar_offset},
  widgets::{Button, LabeledRect, Point, Rect, TextInput, TextLine},
};

/// Pixel geometry of the window.
#[derive(Debug, Clone)]
pub struct AppLayout {
  pub window: Rect,
  pub input: Rect,
  pub back_button: Rect,
  pub delete_button: Rect,
  /// Area the key grid scrolls inside.
  pub grid: Rect,
  pub key_button_width: f32,
  pub key_button_height: f32,
  pub column_stride: f32,
  pub text_view: Rect,
  pub scroll_bar_width: f32,
  /// Lines moved per wheel notch.
  pub wheel_lines: f32,
  pub placeholder: String,
  pub max_input_length: usize,
}

impl Default for AppLayout {
  fn default() -> Self {
    Self {
      window: Rect::new(0.0, 0.0, 1280.0, 720.0),
      input: Rect::new(20.0, 20.0, 400.0, 50.0),
      back_button: Rect::new(440.0, 20.0, 150.0, 50.0),
      delete_button: Rect::new(610.0, 20.0, 150.0, 50.0),
      grid: Rect::new(20.0, 100.0, 800.0, 600.0),
      key_button_width: 150.0,
      key_button_height: 50.0,
      column_stride: 160.0,
      text_view: Rect::new(840.0, 100.0, 410.0, 600.0),
      scroll_bar_width: 10.0,
      wheel_lines: 3.0,
      placeholder: "Enter text here".into(),
      max_input_length: 50,
    }
  }
}

/// Everything a renderer needs for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
  /// Breadcrumb of the current position, e.g. `root / a / b`.
  pub caption: String,
  pub input: LabeledRect,
  pub input_active: bool,
  pub controls: Vec<LabeledRect>,
  pub key_buttons: Vec<LabeledRect>,
  pub lines: Vec<TextLine>,
  pub scroll_bars: Vec<Rect>,
}

pub struct AppState {
  engine: CoreEngine,
  session: SessionInfo,
  layout: AppLayout,
  input: TextInput,
  back_button: Button,
  delete_button: Button,
  backspace: BackspaceRepeat,
  mouse: Point,
  grid_scroll: f32,
  text_scroll: f32,
  running: bool,
}

impl AppState {
  pub fn open(
    engine: CoreEngine,
    path: impl AsRef<Path>,
    layout: AppLayout,
  ) -> Result<Self, CoreError> {
    let (session, _) = engine.open_document(path)?;
    Ok(Self {
      input: TextInput::new(layout.input, layout.placeholder.clone(), layout.max_input_length),
      back_button: Button::new(layout.back_button, "Back"),
      delete_button: Button::new(layout.delete_button, "Delete"),
      engine,
      session,
      layout,
      backspace: BackspaceRepeat::default(),
      mouse: Point::default(),
      grid_scroll: 0.0,
      text_scroll: 0.0,
      running: true,
    })
  }

  pub fn is_running(&self) -> bool {
    self.running
  }

  pub fn session(&self) -> &SessionInfo {
    &self.session
  }

  pub fn engine(&self) -> &CoreEngine {
    &self.engine
  }

  pub fn input(&self) -> &TextInput {
    &self.input
  }

  pub fn navigator_view(&self) -> Result<NavigatorView, CoreError> {
    self.engine.view(&self.session.session_id)
  }

  /// Apply one discrete input event.
  pub fn handle_event(&mut self, event: &InputEvent) -> Result<(), CoreError> {
    match event {
      InputEvent::Quit => self.running = false,
      InputEvent::MouseMove { pos } => self.mouse = *pos,
      InputEvent::MouseWheel { dy } => self.scroll(*dy)?,
      InputEvent::MouseDown { pos } => {
        self.mouse = *pos;
        self.click(*pos)?;
      }
      InputEvent::KeyDown { key, text, ctrl } if self.input.is_active() => match key {
        Key::Backspace if *ctrl => self.input.delete_word(),
        Key::Backspace => self.input.backspace(),
        Key::Return => self.submit()?,
        Key::Escape => self.input.deactivate(),
        Key::Char => self.input.insert(text),
        Key::Other => {}
      },
      InputEvent::KeyDown { .. } | InputEvent::KeyUp { .. } => {}
    }
    Ok(())
  }

  /// Per-frame update from held-key state.
  pub fn tick(&mut self, backspace_held: bool, now_ms: u64) {
    let held = backspace_held && self.input.is_active();
    match self.backspace.tick(held, now_ms, self.input.text().chars().count()) {
      RepeatAction::DeleteChar => self.input.backspace(),
      RepeatAction::Clear => self.input.clear(),
      RepeatAction::None => {}
    }
  }

  pub fn frame(&self) -> Result<Frame, CoreError> {
    let view = self.navigator_view()?;
    let caption = PathTracker::from(view.path.clone()).to_string();
    let at_root = view.path.is_empty();

    let input = LabeledRect {
      rect: self.input.rect,
      label: self.input.text().to_string(),
      hovered: self.input.is_clicked(self.mouse),
      action: None,
    };

    let mut controls = Vec::new();
    if !at_root {
      controls.push(self.back_button.to_labeled(self.mouse, Some(NavCommand::Back)));
      controls.push(self.delete_button.to_labeled(self.mouse, Some(NavCommand::Delete)));
    }

    let key_buttons = self.key_buttons()?;
    let (lines, text_bar) = self.text_view()?;
    let mut scroll_bars = Vec::new();
    if let Some(bar) = self.grid_scroll_bar(view.keys.len()) {
      scroll_bars.push(bar);
    }
    scroll_bars.extend(text_bar);

    Ok(Frame {
      caption,
      input,
      input_active: self.input.is_active(),
      controls,
      key_buttons,
      lines,
      scroll_bars,
    })
  }

  fn click(&mut self, pos: Point) -> Result<(), CoreError> {
    if self.input.is_clicked(pos) {
      self.input.activate();
      return Ok(());
    }
    if self.input.is_active() {
      self.input.deactivate();
    }

    let at_root = self.navigator_view()?.path.is_empty();
    let cmd = if !at_root && self.back_button.is_clicked(pos) {
      Some(NavCommand::Back)
    } else if !at_root && self.delete_button.is_clicked(pos) {
      Some(NavCommand::Delete)
    } else if self.layout.grid.contains(pos) {
      self
        .key_buttons()?
        .into_iter()
        .find(|b| b.rect.contains(pos))
        .and_then(|b| b.action)
    } else {
      None
    };

    if let Some(cmd) = cmd {
      debug!(cmd = ?cmd, "button clicked");
      self.engine.navigate(&self.session.session_id, cmd)?;
      self.grid_scroll = 0.0;
    }
    Ok(())
  }

  fn submit(&mut self) -> Result<(), CoreError> {
    if let Some(raw) = self.input.submit() {
      self.engine.write_value(&self.session.session_id, &raw)?;
    }
    Ok(())
  }

  fn scroll(&mut self, dy: f32) -> Result<(), CoreError> {
    let delta = dy * self.layout.wheel_lines * self.engine.options().line_extent;
    let sid = &self.session.session_id;
    if self.layout.text_view.contains(self.mouse) {
      let page = self
        .engine
        .text_lines(sid, self.text_scroll + delta, self.layout.text_view.h)?;
      self.text_scroll = page.scroll_offset;
    } else if self.layout.grid.contains(self.mouse) {
      let page = self
        .engine
        .visible_keys(sid, self.grid_scroll + delta, self.layout.grid.h)?;
      self.grid_scroll = page.scroll_offset;
    }
    Ok(())
  }

  fn key_buttons(&self) -> Result<Vec<LabeledRect>, CoreError> {
    let grid = self.layout.grid;
    let page = self
      .engine
      .visible_keys(&self.session.session_id, self.grid_scroll, grid.h)?;
    let opts = self.engine.options();
    let columns = opts.grid_columns.max(1);

    Ok(
      page
        .buttons
        .into_iter()
        .filter_map(|b| {
          let row = (b.index / columns) as f32;
          let col = (b.index % columns) as f32;
          let rect = Rect::new(
            grid.x + col * self.layout.column_stride,
            grid.y + row * opts.row_extent - page.scroll_offset,
            self.layout.key_button_width,
            self.layout.key_button_height,
          );
          if !rect.intersects(&grid) {
            return None;
          }
          let label = match b.kind {
            JsonNodeKind::Object | JsonNodeKind::Array => format!("{}/", b.key),
            _ => b.key.to_string(),
          };
          Some(LabeledRect {
            rect,
            label,
            hovered: rect.contains(self.mouse),
            action: Some(NavCommand::Enter(b.key)),
          })
        })
        .collect(),
    )
  }

  fn text_view(&self) -> Result<(Vec<TextLine>, Option<Rect>), CoreError> {
    let view = self.layout.text_view;
    let line_extent = self.engine.options().line_extent;
    let page = self
      .engine
      .text_lines(&self.session.session_id, self.text_scroll, view.h)?;

    let lines = page
      .lines
      .into_iter()
      .enumerate()
      .map(|(i, text)| {
        let index = page.first_line + i;
        TextLine {
          index,
          x: view.x,
          y: view.y + index as f32 * line_extent - page.scroll_offset,
          text,
        }
      })
      .filter(|l| l.y + line_extent > view.y && l.y < view.bottom())
      .collect();

    let content = page.total as f32 * line_extent;
    let bar = self.scroll_bar_rect(view, page.scroll_offset, content);
    Ok((lines, bar))
  }

  fn grid_scroll_bar(&self, total_keys: usize) -> Option<Rect> {
    let opts = self.engine.options();
    let content = total_keys.div_ceil(opts.grid_columns.max(1)) as f32 * opts.row_extent;
    self.scroll_bar_rect(self.layout.grid, self.grid_scroll, content)
  }

  fn scroll_bar_rect(&self, area: Rect, scroll: f32, content: f32) -> Option<Rect> {
    let min = self.engine.options().scroll_bar_min_extent;
    let extent = scroll_bar_extent(area.h, content, min)?;
    let offset = scroll_bar_offset(scroll, content, area.h, extent);
    Some(Rect::new(
      area.right() - self.layout.scroll_bar_width,
      area.y + offset,
      self.layout.scroll_bar_width,
      extent,
    ))
  }
}
