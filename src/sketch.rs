//! Drawing widget seam.
//!
//! The autosave core treats the drawing as an opaque string: it asks the
//! widget to export its state, compares exports to detect change, and
//! forwards them to the persistence API. [`DrawingSurface`] is that contract.
//! [`Sketch`] is a small freehand implementation (strokes of points, JSON
//! export) for hosts that do not bring their own widget.

#[cfg(test)]
#[path = "sketch_test.rs"]
mod sketch_test;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    #[error("drawing data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl crate::error::ErrorCode for SketchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_SKETCH_PARSE",
        }
    }
}

/// Operations the core needs from a drawing widget.
pub trait DrawingSurface {
    /// Serialize the current drawing. Equal drawings must export equal strings.
    fn export_state(&self) -> String;

    /// Replace the current drawing with a previously exported one.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a valid export.
    fn load_state(&mut self, data: &str) -> Result<(), SketchError>;

    /// Undo the most recent edit. Returns `false` when there is nothing to undo.
    fn undo(&mut self) -> bool;

    /// Remove everything from the drawing.
    fn clear(&mut self);
}

// =============================================================================
// SKETCH
// =============================================================================

/// A point in canvas coordinates. JSON has no NaN or infinity, so [`Sketch`]
/// only accepts finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One continuous pen stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub points: Vec<Point>,
}

/// Freehand drawing made of strokes. Undo removes the most recent stroke.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    strokes: Vec<Stroke>,
}

impl Sketch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new stroke at `start`. Returns `false` and starts nothing if
    /// `width` or `start` is not finite.
    pub fn begin_stroke(&mut self, color: &str, width: f64, start: Point) -> bool {
        if !width.is_finite() || !start.is_finite() {
            return false;
        }
        self.strokes.push(Stroke { color: color.to_owned(), width, points: vec![start] });
        true
    }

    /// Extend the stroke in progress. Returns `false` if no stroke has been
    /// started or `point` is not finite.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        match self.strokes.last_mut() {
            Some(stroke) if point.is_finite() => {
                stroke.points.push(point);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

impl DrawingSurface for Sketch {
    fn export_state(&self) -> String {
        // EDGE: an empty sketch exports "" to match items created without a drawing.
        if self.strokes.is_empty() {
            return String::new();
        }
        serde_json::to_string(self).unwrap_or_default()
    }

    fn load_state(&mut self, data: &str) -> Result<(), SketchError> {
        if data.trim().is_empty() {
            self.strokes.clear();
            return Ok(());
        }
        let loaded: Sketch = serde_json::from_str(data)?;
        self.strokes = loaded.strokes;
        Ok(())
    }

    fn undo(&mut self) -> bool {
        self.strokes.pop().is_some()
    }

    fn clear(&mut self) {
        self.strokes.clear();
    }
}
