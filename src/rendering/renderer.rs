/// Two-pass parallel sprite renderer.
///
/// Pass A distributes sprites onto the raster lines they cover, working in
/// block stripes so each worker owns a disjoint set of rows. Pass B renders
/// every row independently into the caller's framebuffer. Between frames
/// all scratch state is empty; storage is retained.
use rayon::prelude::*;

use crate::geometry::ScreenRect;
use crate::rendering::raster_line::RasterLine;
use crate::sprite::Sprite;

/// Packs R, G and B into one opaque framebuffer pixel. Must be pure: it is
/// called concurrently from every row worker.
pub type PixelPacker = fn(u8, u8, u8) -> u32;

/// Reference packer: ARGB8888 with full alpha.
#[inline]
pub const fn pack_argb8888(r: u8, g: u8, b: u8) -> u32 {
    0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Rows per distribution block. One worker owns all begin-lists of a block,
/// so Pass A needs no locks.
const BLOCK_ROWS: usize = 8;

// Block-bin wastage guard: a bin whose capacity exceeds
// max(binned * BIN_MAX_WASTAGE_FACTOR, BIN_MIN_CAPACITY) after a frame is
// shrunk back to binned * BIN_MIN_EXTRA_FACTOR, so a transient sprite spike
// doesn't pin its peak allocation forever.
const BIN_MIN_EXTRA_FACTOR: usize = 2;
const BIN_MAX_WASTAGE_FACTOR: usize = 4;
const BIN_MIN_CAPACITY: usize = 128;

pub struct SpriteRenderer {
    width: usize,
    height: usize,
    packer: PixelPacker,

    /// All raster lines of the frame, one per output row.
    raster_lines: Vec<RasterLine>,

    /// Per-block sprite index bins, filled serially each frame and read by
    /// the parallel distribution pass. Persistent across frames.
    block_bins: Vec<Vec<u32>>,
}

impl SpriteRenderer {
    /// A renderer for a `width` x `height` target. All row storage is
    /// allocated here; `render` allocates nothing per frame beyond
    /// transient stack growth.
    pub fn new(width: usize, height: usize, packer: PixelPacker) -> Self {
        let num_blocks = (height + BLOCK_ROWS - 1) / BLOCK_ROWS;
        Self {
            width,
            height,
            packer,
            raster_lines: (0..height).map(|_| RasterLine::new(width)).collect(),
            block_bins: vec![Vec::new(); num_blocks],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Render one frame of `sprites` into `framebuffer`.
    ///
    /// `framebuffer` must hold at least `height * pitch` bytes, start on a
    /// 4-byte boundary, and `pitch` must be a multiple of 4 no smaller than
    /// `width * 4`. The first `width * 4` bytes of each row are overwritten
    /// with packed pixels; any per-row slack is left untouched.
    ///
    /// Not re-entrant: concurrent calls on one renderer are a caller bug.
    pub fn render(&mut self, sprites: &[Sprite], framebuffer: &mut [u8], pitch: usize) {
        debug_assert!(pitch >= self.width * 4);
        debug_assert_eq!(pitch % 4, 0);
        debug_assert!(framebuffer.len() >= self.height * pitch);
        debug_assert!(sprites.len() <= u32::MAX as usize);

        if self.width == 0 || self.height == 0 {
            return;
        }

        self.distribute_sprites(sprites);

        // Every raster line now holds exactly the sprites visible on it, so
        // the rows are independent: disjoint scratch, disjoint framebuffer
        // slices. Each row clears its own line on completion, restoring the
        // all-lines-empty invariant by the end of the pass.
        let width = self.width;
        let packer = self.packer;
        framebuffer[..self.height * pitch]
            .par_chunks_exact_mut(pitch)
            .zip(self.raster_lines.par_iter_mut())
            .enumerate()
            .for_each(|(y, (row, line))| {
                let row_pixels: &mut [u32] = bytemuck::cast_slice_mut(&mut row[..width * 4]);
                line.render(sprites, row_pixels, y as i32, packer);
            });

        self.trim_bins();
    }

    /// Pass A: associate every visible sprite with the raster lines it
    /// covers.
    ///
    /// Binning is serial and in input order, which makes the begin-list
    /// order on every row a deterministic function of the input sequence.
    /// The per-block fill then runs in parallel; a sprite spanning several
    /// blocks is enqueued in each, and each block writes only its own rows.
    fn distribute_sprites(&mut self, sprites: &[Sprite]) {
        let viewport = ScreenRect::new(0, 0, self.width as u32, self.height as u32);

        for (index, sprite) in sprites.iter().enumerate() {
            let visible = viewport.intersection(&sprite.position);
            if visible.is_empty() {
                continue;
            }

            let first_block = visible.y as usize / BLOCK_ROWS;
            let last_block = visible.last_y() as usize / BLOCK_ROWS;
            for block in first_block..=last_block {
                self.block_bins[block].push(index as u32);
            }
        }

        let width = self.width as u32;
        let bins = &self.block_bins;
        self.raster_lines
            .par_chunks_mut(BLOCK_ROWS)
            .enumerate()
            .for_each(|(block, lines)| {
                let block_viewport = ScreenRect::new(
                    0,
                    (block * BLOCK_ROWS) as i32,
                    width,
                    lines.len() as u32,
                );

                for &index in &bins[block] {
                    let sprite = &sprites[index as usize];
                    let visible = block_viewport.intersection(&sprite.position);
                    if visible.is_empty() {
                        continue;
                    }

                    let last_y = visible.last_y();
                    for y in visible.y..=last_y {
                        lines[(y - block_viewport.y) as usize].add_sprite(index, visible.x);
                    }
                }
            });
    }

    /// Clear the block bins and claw back capacity left over from a sprite
    /// spike.
    fn trim_bins(&mut self) {
        for bin in &mut self.block_bins {
            let used = bin.len();
            bin.clear();

            let cap_limit = (used * BIN_MAX_WASTAGE_FACTOR).max(BIN_MIN_CAPACITY);
            if bin.capacity() > cap_limit {
                bin.shrink_to(used * BIN_MIN_EXTRA_FACTOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_frame(renderer: &mut SpriteRenderer, sprites: &[Sprite]) -> Vec<u32> {
        let mut buffer = vec![0u32; renderer.width() * renderer.height()];
        let pitch = renderer.width() * 4;
        renderer.render(sprites, bytemuck::cast_slice_mut(&mut buffer), pitch);
        buffer
    }

    #[test]
    fn scratch_is_empty_after_a_frame() {
        let mut renderer = SpriteRenderer::new(32, 32, pack_argb8888);
        let sprites = vec![
            Sprite::solid(ScreenRect::new(-4, -4, 16, 16), 0, 1, 2, 3),
            Sprite::solid(ScreenRect::new(8, 20, 40, 40), 1, 4, 5, 6),
        ];
        render_frame(&mut renderer, &sprites);

        assert!(renderer.raster_lines.iter().all(|line| line.is_clear()));
        assert!(renderer.block_bins.iter().all(|bin| bin.is_empty()));
    }

    #[test]
    fn bin_capacity_shrinks_after_a_sprite_spike() {
        let mut renderer = SpriteRenderer::new(16, 8, pack_argb8888);

        // Spike: far more sprites than the steady state that follows.
        let spike: Vec<Sprite> = (0..4096)
            .map(|i| Sprite::solid(ScreenRect::new(0, 0, 4, 4), i, 1, 1, 1))
            .collect();
        render_frame(&mut renderer, &spike);
        assert!(renderer.block_bins[0].capacity() >= 4096);

        let steady: Vec<Sprite> = (0..4)
            .map(|i| Sprite::solid(ScreenRect::new(0, 0, 4, 4), i, 1, 1, 1))
            .collect();
        render_frame(&mut renderer, &steady);

        // The spike's capacity must not survive a steady frame.
        assert!(renderer.block_bins[0].capacity() <= BIN_MIN_CAPACITY);
    }

    #[test]
    fn sprite_spanning_block_boundary_renders_on_both_sides() {
        let mut renderer = SpriteRenderer::new(4, 24, pack_argb8888);
        let sprites = vec![Sprite::solid(ScreenRect::new(0, 6, 4, 4), 0, 255, 255, 255)];
        let frame = render_frame(&mut renderer, &sprites);

        for y in 0..24 {
            let expected = if (6..10).contains(&y) { 0xFFFFFFFF } else { 0xFF000000 };
            for x in 0..4 {
                assert_eq!(frame[y * 4 + x], expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn zero_sized_renderer_is_a_no_op() {
        let mut renderer = SpriteRenderer::new(0, 0, pack_argb8888);
        let mut buffer: Vec<u8> = Vec::new();
        renderer.render(&[], &mut buffer, 0);
    }
}
