pub mod color;
pub mod convolution;

pub use color::*;
pub use convolution::*;
