//! Headless widget primitives. Nothing here draws; the frame output is a list
//! of rectangles and text for whatever surface renders it.

use serde::{Deserialize, Serialize};

use crate::models::NavCommand;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
  pub x: f32,
  pub y: f32,
}

impl Point {
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
  pub x: f32,
  pub y: f32,
  pub w: f32,
  pub h: f32,
}

impl Rect {
  pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
    Self { x, y, w, h }
  }

  /// Left/top edges are inside, right/bottom edges are not.
  pub fn contains(&self, p: Point) -> bool {
    p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.h
  }

  pub fn right(&self) -> f32 {
    self.x + self.w
  }

  pub fn intersects(&self, other: &Rect) -> bool {
    self.x < other.right()
      && other.x < self.right()
      && self.y < other.bottom()
      && other.y < self.bottom()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
  pub rect: Rect,
  pub label: String,
}

impl Button {
  pub fn new(rect: Rect, label: impl Into<String>) -> Self {
    Self {
      rect,
      label: label.into(),
    }
  }

  pub fn is_clicked(&self, mouse: Point) -> bool {
    self.rect.contains(mouse)
  }

  pub fn to_labeled(&self, mouse: Point, action: Option<NavCommand>) -> LabeledRect {
    LabeledRect {
      rect: self.rect,
      label: self.label.clone(),
      hovered: self.rect.contains(mouse),
      action,
    }
  }
}

/// Single-line text box with a placeholder shown while it is empty and unfocused.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
  pub rect: Rect,
  placeholder: String,
  max_length: usize,
  text: String,
  active: bool,
}

impl TextInput {
  pub fn new(rect: Rect, placeholder: impl Into<String>, max_length: usize) -> Self {
    let placeholder = placeholder.into();
    Self {
      rect,
      text: placeholder.clone(),
      placeholder,
      max_length,
      active: false,
    }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn placeholder(&self) -> &str {
    &self.placeholder
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn shows_placeholder(&self) -> bool {
    self.text == self.placeholder
  }

  pub fn is_clicked(&self, mouse: Point) -> bool {
    self.rect.contains(mouse)
  }

  pub fn activate(&mut self) {
    self.active = true;
    if self.shows_placeholder() {
      self.text.clear();
    }
  }

  pub fn deactivate(&mut self) {
    self.active = false;
    if self.text.is_empty() {
      self.text = self.placeholder.clone();
    }
  }

  /// Append typed text, stopping at the length limit. Ignored while inactive.
  pub fn insert(&mut self, typed: &str) {
    if !self.active {
      return;
    }
    let room = self.max_length.saturating_sub(self.text.chars().count());
    self.text.extend(typed.chars().take(room));
  }

  pub fn backspace(&mut self) {
    if !self.shows_placeholder() {
      self.text.pop();
    }
  }

  /// Drop the last space-separated word.
  pub fn delete_word(&mut self) {
    if !self.active {
      return;
    }
    match self.text.rfind(' ') {
      Some(i) => self.text.truncate(i),
      None => self.text.clear(),
    }
  }

  pub fn clear(&mut self) {
    if !self.shows_placeholder() {
      self.text.clear();
    }
  }

  /// Finish editing. Returns the entered value, if any, and shows the placeholder again.
  pub fn submit(&mut self) -> Option<String> {
    self.active = false;
    if self.text.is_empty() || self.shows_placeholder() {
      self.text = self.placeholder.clone();
      return None;
    }
    let value = std::mem::replace(&mut self.text, self.placeholder.clone());
    Some(value)
  }
}

/// A clickable rectangle in the frame output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRect {
  pub rect: Rect,
  pub label: String,
  pub hovered: bool,
  pub action: Option<NavCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
  pub index: usize,
  pub x: f32,
  pub y: f32,
  pub text: String,
}
