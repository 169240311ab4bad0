//! Dataflow values exchanged between node attributes during a pass.
//!
//! `GenValue` is the closed union of everything a link can carry. Each
//! variant is either a compile-time literal (fully known while generating)
//! or a runtime variant bound to a generated variable whose contents only
//! exist when the emitted pipeline runs. Mat values additionally carry
//! their color space and a binary flag, enforced at consumption points via
//! `require_binary` / `require_non_binary`.

use crate::codegen::resolvable::Resolvable;
use crate::codegen::value::Value;
use crate::graph::attribute::ElementKind;
use serde::{Deserialize, Serialize};

/// Color space of an image buffer flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    Rgba,
    Rgb,
    Bgr,
    Hsv,
    YCrCb,
    Lab,
    Gray,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 7] = [
        ColorSpace::Rgba,
        ColorSpace::Rgb,
        ColorSpace::Bgr,
        ColorSpace::Hsv,
        ColorSpace::YCrCb,
        ColorSpace::Lab,
        ColorSpace::Gray,
    ];

    pub fn channels(self) -> u32 {
        match self {
            ColorSpace::Rgba => 4,
            ColorSpace::Gray => 1,
            _ => 3,
        }
    }

    /// Spelling used inside OpenCV conversion constants (`COLOR_RGBA2GRAY`).
    pub fn constant_name(self) -> &'static str {
        match self {
            ColorSpace::Rgba => "RGBA",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Bgr => "BGR",
            ColorSpace::Hsv => "HSV",
            ColorSpace::YCrCb => "YCrCb",
            ColorSpace::Lab => "LAB",
            ColorSpace::Gray => "GRAY",
        }
    }

    /// Lowercase spelling used when deriving variable names.
    pub fn variable_name(self) -> &'static str {
        match self {
            ColorSpace::Rgba => "rgba",
            ColorSpace::Rgb => "rgb",
            ColorSpace::Bgr => "bgr",
            ColorSpace::Hsv => "hsv",
            ColorSpace::YCrCb => "ycrcb",
            ColorSpace::Lab => "lab",
            ColorSpace::Gray => "gray",
        }
    }
}

/// An inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const ZERO: Range = Range { min: 0.0, max: 0.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Per-channel ranges for in-range thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarRange {
    pub a: Range,
    pub b: Range,
    pub c: Range,
    pub d: Range,
}

impl ScalarRange {
    pub const ZERO: ScalarRange = ScalarRange {
        a: Range::ZERO,
        b: Range::ZERO,
        c: Range::ZERO,
        d: Range::ZERO,
    };
}

/// An image buffer value: the generated expression holding it, its color
/// space, and whether it is a two-level (thresholded) image. Color and
/// binary flag may be deferred when the value itself is a placeholder.
#[derive(Debug, Clone)]
pub struct MatValue {
    pub value: Value,
    pub color: Resolvable<ColorSpace>,
    pub binary: Resolvable<bool>,
}

impl MatValue {
    pub fn new(value: Value, color: ColorSpace) -> Self {
        Self {
            value,
            color: Resolvable::Now(color),
            binary: Resolvable::Now(false),
        }
    }

    pub fn binary_of(value: Value, color: ColorSpace) -> Self {
        Self {
            value,
            color: Resolvable::Now(color),
            binary: Resolvable::Now(true),
        }
    }
}

/// A dataflow value passed along a link.
#[derive(Debug, Clone)]
pub enum GenValue {
    Mat(MatValue),
    Int(i32),
    Double(f64),
    Bool(bool),
    Text(String),
    Scalar {
        a: f64,
        b: f64,
        c: f64,
        d: f64,
    },
    ScalarRange(ScalarRange),
    /// Compile-time list of literal elements.
    List {
        element: ElementKind,
        items: Vec<GenValue>,
    },
    /// List materialized in a generated variable.
    RuntimeList {
        element: ElementKind,
        value: Value,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
    RuntimeRect(Value),
    RotatedRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        angle: f64,
    },
    RuntimeRotatedRect(Value),
    KeyPoints(Value),
    LineParameters {
        color: [f64; 4],
        thickness: i32,
    },
    RuntimeLineParameters {
        color: Value,
        thickness: Value,
    },
    None,
}

impl GenValue {
    /// The generated expression backing a runtime variant, if any.
    pub fn runtime_value(&self) -> Option<&Value> {
        match self {
            GenValue::Mat(mat) => Some(&mat.value),
            GenValue::RuntimeList { value, .. } => Some(value),
            GenValue::RuntimeRect(value) => Some(value),
            GenValue::RuntimeRotatedRect(value) => Some(value),
            GenValue::KeyPoints(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::jvm;

    #[test]
    fn test_color_space_channels() {
        assert_eq!(ColorSpace::Rgba.channels(), 4);
        assert_eq!(ColorSpace::Hsv.channels(), 3);
        assert_eq!(ColorSpace::Gray.channels(), 1);
    }

    #[test]
    fn test_mat_value_defaults_non_binary() {
        let mat = MatValue::new(Value::raw(jvm::mat(), "input"), ColorSpace::Rgba);
        assert_eq!(mat.binary.now(), Some(&false));
        assert_eq!(mat.color.now(), Some(&ColorSpace::Rgba));
    }

    #[test]
    fn test_binary_mat_flagged() {
        let mat = MatValue::binary_of(Value::raw(jvm::mat(), "thresh"), ColorSpace::Gray);
        assert_eq!(mat.binary.now(), Some(&true));
    }

    #[test]
    fn test_runtime_value_extraction() {
        let list = GenValue::RuntimeList {
            element: ElementKind::Points,
            value: Value::raw(jvm::array_list(jvm::mat_of_point()), "contours"),
        };
        assert!(list.runtime_value().is_some());
        assert!(GenValue::Int(3).runtime_value().is_none());
    }
}
