use std::fmt;

use crate::models::JsonPathSegment;

/// Keys from the document root to the current position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTracker {
  segments: Vec<JsonPathSegment>,
}

impl PathTracker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, seg: JsonPathSegment) {
    self.segments.push(seg);
  }

  pub fn pop(&mut self) -> Option<JsonPathSegment> {
    self.segments.pop()
  }

  pub fn segments(&self) -> &[JsonPathSegment] {
    &self.segments
  }

  pub fn depth(&self) -> usize {
    self.segments.len()
  }

  pub fn is_root(&self) -> bool {
    self.segments.is_empty()
  }

  pub fn last(&self) -> Option<&JsonPathSegment> {
    self.segments.last()
  }

  /// Everything but the last segment.
  pub fn parent(&self) -> &[JsonPathSegment] {
    match self.segments.split_last() {
      Some((_, parent)) => parent,
      None => &[],
    }
  }

  pub fn clear(&mut self) {
    self.segments.clear();
  }
}

impl From<Vec<JsonPathSegment>> for PathTracker {
  fn from(segments: Vec<JsonPathSegment>) -> Self {
    Self { segments }
  }
}

impl fmt::Display for PathTracker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("root")?;
    for seg in &self.segments {
      write!(f, " / {seg}")?;
    }
    Ok(())
  }
}

pub(crate) fn join_segments(segments: &[JsonPathSegment]) -> String {
  if segments.is_empty() {
    return "/".into();
  }
  segments.iter().fold(String::new(), |mut acc, seg| {
    acc.push('/');
    acc.push_str(&seg.to_string());
    acc
  })
}
