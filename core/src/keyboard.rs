use serde::{Deserialize, Serialize};

use crate::widgets::Point;

/// Hold time before backspace starts repeating.
pub const REPEAT_DELAY_MS: u64 = 600;
/// Time between repeated deletions.
pub const REPEAT_INTERVAL_MS: u64 = 50;
/// Once repeat has deleted this share of the remaining text, the rest goes at once.
pub const CLEAR_AFTER_FRACTION: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
  Backspace,
  Return,
  Escape,
  /// A printable key; the produced text travels in the event.
  Char,
  Other,
}

/// Decoded input, as handed over by the windowing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum InputEvent {
  KeyDown { key: Key, text: String, ctrl: bool },
  KeyUp { key: Key },
  MouseDown { pos: Point },
  MouseMove { pos: Point },
  /// Positive `dy` scrolls content up (towards later items).
  MouseWheel { dy: f32 },
  Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPhase {
  Idle,
  ArmedAt(u64),
  Repeating(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatAction {
  None,
  DeleteChar,
  Clear,
}

/// Held-backspace repeat, driven once per frame from the frame clock.
#[derive(Debug, Clone)]
pub struct BackspaceRepeat {
  phase: RepeatPhase,
  delay_ms: u64,
  interval_ms: u64,
  deleted: usize,
}

impl Default for BackspaceRepeat {
  fn default() -> Self {
    Self::new(REPEAT_DELAY_MS, REPEAT_INTERVAL_MS)
  }
}

impl BackspaceRepeat {
  pub fn new(delay_ms: u64, interval_ms: u64) -> Self {
    Self {
      phase: RepeatPhase::Idle,
      delay_ms,
      interval_ms,
      deleted: 0,
    }
  }

  pub fn phase(&self) -> RepeatPhase {
    self.phase
  }

  pub fn tick(&mut self, held: bool, now_ms: u64, text_len: usize) -> RepeatAction {
    if !held {
      self.phase = RepeatPhase::Idle;
      self.deleted = 0;
      return RepeatAction::None;
    }

    match self.phase {
      RepeatPhase::Idle => {
        self.phase = RepeatPhase::ArmedAt(now_ms);
        self.deleted = 0;
        RepeatAction::None
      }
      RepeatPhase::ArmedAt(t) if now_ms.saturating_sub(t) >= self.delay_ms => {
        self.phase = RepeatPhase::Repeating(now_ms);
        self.step(text_len)
      }
      RepeatPhase::Repeating(last) if now_ms.saturating_sub(last) >= self.interval_ms => {
        self.phase = RepeatPhase::Repeating(now_ms);
        self.step(text_len)
      }
      _ => RepeatAction::None,
    }
  }

  /// The clear threshold is taken against the text left at this step.
  fn step(&mut self, text_len: usize) -> RepeatAction {
    if text_len == 0 {
      return RepeatAction::None;
    }
    if self.deleted as f32 >= text_len as f32 * CLEAR_AFTER_FRACTION {
      self.deleted = 0;
      return RepeatAction::Clear;
    }
    self.deleted += 1;
    RepeatAction::DeleteChar
  }
}
