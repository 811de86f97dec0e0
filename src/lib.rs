pub mod geometry;
pub mod perf;
/// Sprite Engine - parallel scanline sprite rasterizer
/// Renders layered sprites with binary transparency into a caller-supplied framebuffer
pub mod rendering;
pub mod sprite;

pub use geometry::{IRect, ScreenRect};
pub use rendering::{pack_argb8888, PixelPacker, RasterLine, SpriteRenderer};
pub use sprite::{PixelSource, Sprite, SpritePixel};
