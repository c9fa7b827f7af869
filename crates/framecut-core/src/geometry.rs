//! Rectangles for the track view and affine placement of clips on the canvas.

use bytemuck::{Pod, Zeroable};
use glam::Affine2;
use serde::{Deserialize, Serialize};

pub type Vec2 = glam::Vec2;

/// Axis-aligned rectangle in view pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    #[inline]
    pub fn contains(self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// 2D affine transform. Composition reads left to right with [`then`](Self::then).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    inner: Affine2,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        inner: Affine2::IDENTITY,
    };

    #[inline]
    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            inner: Affine2::from_translation(Vec2::new(x, y)),
        }
    }

    #[inline]
    pub fn scale_uniform(s: f32) -> Self {
        Self {
            inner: Affine2::from_scale(Vec2::splat(s)),
        }
    }

    /// Rotation by `degrees`, clockwise on a y-down canvas.
    #[inline]
    pub fn rotate_degrees(degrees: f32) -> Self {
        Self {
            inner: Affine2::from_angle(degrees.to_radians()),
        }
    }

    /// Place a `source` sized image on a `canvas`: centred, scaled about its
    /// own centre, rotated, then offset by `position` pixels.
    pub fn placement(source: Vec2, canvas: Vec2, scale: f32, rotation_degrees: f32, position: Vec2) -> Self {
        let centre = canvas * 0.5 + position;
        Self::translate(-source.x * 0.5, -source.y * 0.5)
            .then(Self::scale_uniform(scale))
            .then(Self::rotate_degrees(rotation_degrees))
            .then(Self::translate(centre.x, centre.y))
    }

    /// Apply `self` first, then `next`.
    #[inline]
    pub fn then(self, next: Self) -> Self {
        Self {
            inner: next.inner * self.inner,
        }
    }

    #[inline]
    pub fn transform_point(self, point: Vec2) -> Vec2 {
        self.inner.transform_point2(point)
    }

    /// The inverse, or `None` for a degenerate (zero scale) transform.
    pub fn try_inverse(self) -> Option<Self> {
        (self.inner.matrix2.determinant().abs() > f32::EPSILON).then(|| Self {
            inner: self.inner.inverse(),
        })
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}
