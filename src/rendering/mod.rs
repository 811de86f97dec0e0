pub mod raster_line;
/// Two-pass parallel sprite rasterization
/// Pass A distributes sprites to raster lines, Pass B renders rows independently
pub mod renderer;

pub use raster_line::RasterLine;
pub use renderer::{pack_argb8888, PixelPacker, SpriteRenderer};
