//! Screen → document coordinate conversion.
//!
//! The host renders the canvas inside an element carrying a CSS transform
//! (`matrix(...)` or `matrix3d(...)` once computed). Inverting that
//! transform turns a pointer position into canvas document space, which
//! is what node footprints are stored in.
//!
//! Only uniform scale + translation is modeled. The two diagonal scale
//! components are averaged so rounding skew in computed styles does not
//! shift hit-tests.

use kurbo::{Point, Vec2};
use winnow::ascii::{float, multispace0};
use winnow::combinator::{alt, delimited, separated};
use winnow::prelude::*;

/// Snapshot of a DOM element relevant to coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFrame {
    /// Top-left of the element's bounding box in screen space.
    pub origin: Point,
    /// Computed CSS `transform` value (`"none"` when untransformed).
    pub transform: Option<String>,
}

impl ElementFrame {
    pub fn new(origin: Point, transform: Option<&str>) -> Self {
        Self {
            origin,
            transform: transform.map(str::to_string),
        }
    }

    /// Parsed transform, `None` when the element is not transformed.
    pub fn view_transform(&self) -> Option<ViewTransform> {
        ViewTransform::parse(self.transform.as_deref()?)
    }
}

/// Uniform scale + translation extracted from a CSS matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    /// Parse a computed CSS transform. `None` for `none`, empty, or
    /// anything that is not a `matrix`/`matrix3d` with enough components.
    pub fn parse(css: &str) -> Option<Self> {
        let css = css.trim();
        if css.is_empty() || css == "none" {
            return None;
        }
        let (func, args) = parse_matrix.parse(css).ok()?;
        // (a, d, e, f) positions differ between the 2-D and 3-D forms
        let (a, d, e, f) = match func {
            MatrixFn::Matrix if args.len() >= 6 => (args[0], args[3], args[4], args[5]),
            MatrixFn::Matrix3d if args.len() >= 16 => (args[0], args[5], args[12], args[13]),
            _ => return None,
        };
        let mut scale = (a.abs() + d.abs()) / 2.0;
        if !scale.is_finite() || scale == 0.0 {
            scale = 1.0;
        }
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Some(Self {
            scale,
            translate: Vec2::new(finite_or_zero(e), finite_or_zero(f)),
        })
    }

    /// Map a point relative to the transformed element back into
    /// untransformed (document) space.
    pub fn invert(&self, local: Point) -> Point {
        let p = local - self.translate;
        Point::new(p.x / self.scale, p.y / self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatrixFn {
    Matrix,
    Matrix3d,
}

fn parse_matrix(input: &mut &str) -> ModalResult<(MatrixFn, Vec<f64>)> {
    let func = alt((
        "matrix3d".value(MatrixFn::Matrix3d),
        "matrix".value(MatrixFn::Matrix),
    ))
    .parse_next(input)?;
    let args: Vec<f64> = delimited(
        ('(', multispace0),
        separated(1.., parse_component, (multispace0, ',', multispace0)),
        (multispace0, ')'),
    )
    .parse_next(input)?;
    Ok((func, args))
}

fn parse_component(input: &mut &str) -> ModalResult<f64> {
    float.parse_next(input)
}

/// Convert a screen point into canvas document coordinates.
///
/// `frames` are candidate elements nearest-first; the first one carrying a
/// parseable transform wins and its bounding-box origin is the reference.
/// Without one, `viewport`'s origin is used at scale 1, and without a
/// viewport the point passes through unchanged. Never fails.
pub fn screen_to_document_point<'a>(
    frames: impl IntoIterator<Item = &'a ElementFrame>,
    viewport: Option<&ElementFrame>,
    screen: Point,
) -> Point {
    for frame in frames {
        if let Some(t) = frame.view_transform() {
            let local = screen - frame.origin.to_vec2();
            return t.invert(local);
        }
    }
    match viewport {
        Some(v) => screen - v.origin.to_vec2(),
        None => screen,
    }
}
