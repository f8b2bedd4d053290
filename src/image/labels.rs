//! Dense per-pixel orientation labels.
//!
//! Labels `0` and `1` mark walls whose normal is along the corresponding
//! horizontal Manhattan axis; [`VERTICAL_AXIS`] marks floor and ceiling.
use crate::camera::VERTICAL_AXIS;

/// Label stored for floor and ceiling pixels.
pub const HORIZONTAL_SURFACE: u8 = VERTICAL_AXIS as u8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    pub w: usize,
    pub h: usize,
    pub data: Vec<u8>,
}

impl LabelMap {
    pub fn new(w: usize, h: usize, fill: u8) -> Self {
        Self {
            w,
            h,
            data: vec![fill; w * h],
        }
    }

    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, label: u8) {
        self.data[y * self.w + x] = label;
    }

    /// Number of pixels carrying `label`.
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|&&px| px == label).count()
    }
}

impl crate::image::traits::ImageView for LabelMap {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl crate::image::traits::ImageViewMut for LabelMap {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
