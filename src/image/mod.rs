//! Owned row-major buffers used for cost fields, label maps and depth maps.
pub mod f32;
pub mod io;
pub mod labels;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::labels::LabelMap;
pub use self::traits::{ImageView, ImageViewMut, Rows};
