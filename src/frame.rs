use chrono::{DateTime, Utc};

use crate::bbox::{BBox, Ltrb};

pub struct Frame {
    // (width, height) in px
    pub dims: (u32, u32),
    pub boxes: Vec<BBox<Ltrb>>,
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    pub fn new(dims: (u32, u32), boxes: Vec<BBox<Ltrb>>, timestamp: DateTime<Utc>) -> Self {
        Self {
            dims,
            boxes,
            timestamp,
        }
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dims.1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &BBox<Ltrb>> {
        self.boxes.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
