//! Geometric primitives for layout analysis.
//!
//! This module provides the bounding-box kernel shared by line and paragraph
//! clustering and by the overlay projector. Rectangles carry no notion of
//! orientation: in document space `y` grows upward, in overlay space it grows
//! downward, and the same operations apply to both.

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the origin corner
    pub x: f32,
    /// Y coordinate of the origin corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the lower y-coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Get the upper y-coordinate (`y + height`).
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Check if this rectangle contains a point (inclusive edges).
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::{Point, Rect};
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// assert!(rect.contains_point(&Point::new(50.0, 50.0)));
    /// assert!(rect.contains_point(&Point::new(100.0, 0.0)));
    /// assert!(!rect.contains_point(&Point::new(150.0, 150.0)));
    /// ```
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Compute the union of this rectangle with another.
    ///
    /// Returns the smallest rectangle that contains both rectangles. The
    /// result never shrinks either input.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 50.0, 50.0);
    /// let r2 = Rect::new(25.0, 25.0, 50.0, 50.0);
    /// let union = r1.union(&r2);
    ///
    /// assert_eq!(union.x, 0.0);
    /// assert_eq!(union.y, 0.0);
    /// assert_eq!(union.right(), 75.0);
    /// assert_eq!(union.bottom(), 75.0);
    /// ```
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.top().min(other.top());
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Strict AABB overlap test with inclusive bounds.
    ///
    /// Both axis projections must overlap; touching edges count as overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 10.0, 10.0);
    /// let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
    /// let below = Rect::new(0.0, 50.0, 10.0, 10.0);
    ///
    /// assert!(r1.overlaps(&touching));
    /// assert!(!r1.overlaps(&below));
    /// ```
    pub fn overlaps(&self, other: &Rect) -> bool {
        let x_overlap = self.left() <= other.right() && other.left() <= self.right();
        let y_overlap = self.top() <= other.bottom() && other.top() <= self.bottom();
        x_overlap && y_overlap
    }

    /// Swap the extents of a box produced for vertical-writing text.
    ///
    /// The box pivots on its left edge and its `y + height` edge: width and
    /// height trade places and `y` is re-derived so that `bottom()` stays
    /// put. Applying `flip` twice returns the original box.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::Rect;
    ///
    /// let r = Rect::new(10.0, 20.0, 40.0, 8.0);
    /// let flipped = r.flip();
    /// assert_eq!(flipped.width, 8.0);
    /// assert_eq!(flipped.height, 40.0);
    /// assert_eq!(flipped.bottom(), r.bottom());
    /// assert_eq!(flipped.flip(), r);
    /// ```
    pub fn flip(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y - (self.width - self.height),
            width: self.height,
            height: self.width,
        }
    }

    /// Vertical distance between two boxes, zero when their y-ranges meet.
    pub fn vertical_gap(&self, other: &Rect) -> f32 {
        (other.top() - self.bottom()).max(self.top() - other.bottom()).max(0.0)
    }
}

/// A 2D affine transformation matrix `[a b c d e f]`.
///
/// Uses the row-vector convention of PDF content streams:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create an identity matrix.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Multiply this matrix with another matrix.
    ///
    /// The result represents first applying `self`, then applying `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_narrator::geometry::Matrix;
    ///
    /// let scale = Matrix::scaling(2.0, 2.0);
    /// let shift = Matrix::new(1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
    /// let p = scale.multiply(&shift).transform_point(5.0, 5.0);
    /// assert_eq!(p.x, 20.0);
    /// assert_eq!(p.y, 10.0);
    /// ```
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// The matrix as the six-number array used by SVG `matrix(...)`.
    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}
