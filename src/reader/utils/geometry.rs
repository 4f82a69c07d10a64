use std::ops::{Add, Sub};

use super::super::binarize::BinaryImage;

// Point
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

// Sub-pixel point for centres and projected coordinates
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist(&self, other: &PointF) -> f64 {
        (*self - *other).norm()
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: &PointF) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(&self, other: &PointF) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn scale(&self, k: f64) -> Self {
        Self { x: self.x * k, y: self.y * k }
    }

    pub fn round(&self) -> Point {
        Point { x: self.x.round() as i32, y: self.y.round() as i32 }
    }
}

impl Add for PointF {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for PointF {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl From<PointF> for (f64, f64) {
    fn from(p: PointF) -> Self {
        (p.x, p.y)
    }
}

// Axis markers to walk a line of pixels horizontally or vertically
//------------------------------------------------------------------------------

pub trait Axis {
    fn shift(pt: &mut Point, by: i32);

    fn bound_check(img: &BinaryImage, pt: &Point) -> bool {
        0 <= pt.x && (pt.x as u32) < img.w && 0 <= pt.y && (pt.y as u32) < img.h
    }
}

pub struct X;

impl Axis for X {
    #[inline]
    fn shift(pt: &mut Point, by: i32) {
        pt.x += by;
    }
}

pub struct Y;

impl Axis for Y {
    #[inline]
    fn shift(pt: &mut Point, by: i32) {
        pt.y += by;
    }
}
