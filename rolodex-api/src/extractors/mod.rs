//! Custom request extractors.

mod image;

pub use image::ImageForm;
