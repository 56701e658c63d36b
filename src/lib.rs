pub mod field;
pub mod surface;
pub mod term;

pub use field::Starfield;
pub use surface::{Raster, Rgba, Surface, SurfaceError};
