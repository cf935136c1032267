use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::Centroid;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

/// Axis-aligned box in frame pixel coordinates.
///
/// Serialized as a bare `[i32; 4]` array in whatever format `F` names.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct BBox<F: BBoxFormat>([i32; 4], #[serde(skip)] PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [i32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[i32; 4] {
        &self.0
    }

    // Use carefully when you REALLY sure that slice have needed format
    #[inline(always)]
    pub fn assigned(slice: &[i32; 4]) -> Self {
        BBox(*slice, PhantomData)
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        BBox([left, top, right, bottom], PhantomData)
    }

    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.0[3]
    }

    /// Center of the box, truncated toward zero.
    #[inline]
    pub fn centroid(&self) -> Centroid {
        let cx = (self.left() as f64 + self.right() as f64) / 2.0;
        let cy = (self.top() as f64 + self.bottom() as f64) / 2.0;

        Centroid::new(cx as i32, cy as i32)
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(left: i32, top: i32, width: i32, height: i32) -> Self {
        BBox([left, top, width, height], PhantomData)
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl BBox<Xywh> {
    #[inline]
    pub fn xywh(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        BBox([cx, cy, width, height], PhantomData)
    }

    #[inline(always)]
    pub fn cx(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> i32 {
        self.0[1]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] + v.0[0], v.0[3] + v.0[1]],
            PhantomData,
        )
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            PhantomData,
        )
    }
}

impl<'a> From<&'a BBox<Xywh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Xywh>) -> Self {
        let (w2, h2) = (v.0[2] / 2, v.0[3] / 2);

        Self(
            [v.0[0] - w2, v.0[1] - h2, v.0[0] - w2 + v.0[2], v.0[1] - h2 + v.0[3]],
            PhantomData,
        )
    }
}
