/// Demo entry point
/// Opens a window and drives the sprite rasterizer with an animated scene:
/// a static background grid under a swarm of bouncing gradient sprites.
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sprite_engine::perf::FpsCounter;
use sprite_engine::{pack_argb8888, perf_scope, ScreenRect, Sprite, SpritePixel, SpriteRenderer};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

const WINDOW_WIDTH: u32 = 1600;
const WINDOW_HEIGHT: u32 = 900;

const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(5);

const BACKGROUND_SPRITE_SIZE: u32 = 32;
const NUM_FOREGROUND_SPRITES: usize = 1000;
const FOREGROUND_SPRITE_SIZE: u32 = 16;
const MAX_SPRITE_SPEED: i32 = 3;

const SCENE_SEED: u64 = 0x5EED;

/// Velocity state for one foreground sprite.
struct Bouncer {
    index: usize,
    x_speed: i32,
    y_speed: i32,
}

/// The demo scene: one flat sprite list (what the renderer consumes) plus
/// the bounce state driving the foreground subset.
struct Scene {
    sprites: Vec<Sprite>,
    bouncers: Vec<Bouncer>,
    bounds: ScreenRect,
}

impl Scene {
    fn build() -> Self {
        perf_scope!("scene build");

        let bounds = ScreenRect::new(0, 0, WINDOW_WIDTH, WINDOW_HEIGHT);
        let mut sprites = Vec::new();
        let mut layer = 0u32;

        // Background: a full-screen grid of solid tiles, colored by grid
        // position so seams are visible.
        let tile = BACKGROUND_SPRITE_SIZE;
        for spr_x in (0..WINDOW_WIDTH as i32).step_by(tile as usize) {
            for spr_y in (0..WINDOW_HEIGHT as i32).step_by(tile as usize) {
                sprites.push(Sprite::solid(
                    ScreenRect::new(spr_x, spr_y, tile, tile),
                    layer,
                    (spr_x % 256) as u8,
                    (spr_y % 256) as u8,
                    0,
                ));
                layer += 1;
            }
        }
        println!("Got {} background sprites", sprites.len());

        // Foreground: small gradient sprites with random positions and
        // speeds, always layered above the background.
        let mut rng = ChaCha8Rng::seed_from_u64(SCENE_SEED);
        let size = FOREGROUND_SPRITE_SIZE;
        let mut bouncers = Vec::with_capacity(NUM_FOREGROUND_SPRITES);

        for i in 0..NUM_FOREGROUND_SPRITES {
            let x = rng.gen_range(0..=(WINDOW_WIDTH - size) as i32);
            let y = rng.gen_range(0..=(WINDOW_HEIGHT - size) as i32);
            let position = ScreenRect::new(x, y, size, size);

            let sprite = if i % 2 == 1 {
                Sprite::new(position, layer, move |u: u32, v: u32| {
                    SpritePixel::opaque((u * 256 / size) as u8, (v * 256 / size) as u8, 0)
                })
            } else {
                Sprite::new(position, layer, move |u: u32, v: u32| {
                    SpritePixel::opaque((u * 256 / size) as u8, 0, (v * 256 / size) as u8)
                })
            };

            bouncers.push(Bouncer {
                index: sprites.len(),
                x_speed: rng.gen_range(-MAX_SPRITE_SPEED..=MAX_SPRITE_SPEED),
                y_speed: rng.gen_range(-MAX_SPRITE_SPEED..=MAX_SPRITE_SPEED),
            });
            sprites.push(sprite);
            layer += 1;
        }
        println!("Got {} foreground sprites", bouncers.len());

        Self {
            sprites,
            bouncers,
            bounds,
        }
    }

    /// Advance every bouncing sprite one step, reflecting speeds at the
    /// scene bounds.
    fn tick(&mut self) {
        for bouncer in &mut self.bouncers {
            let position = &mut self.sprites[bouncer.index].position;

            if self.bounds.x > position.x {
                bouncer.x_speed = bouncer.x_speed.abs();
            }
            if self.bounds.last_x() < position.last_x() {
                bouncer.x_speed = -bouncer.x_speed.abs();
            }
            if self.bounds.y > position.y {
                bouncer.y_speed = bouncer.y_speed.abs();
            }
            if self.bounds.last_y() < position.last_y() {
                bouncer.y_speed = -bouncer.y_speed.abs();
            }

            position.x += bouncer.x_speed;
            position.y += bouncer.y_speed;
        }
    }
}

fn main() {
    println!("=== Sprite Engine - Parallel Scanline Rasterizer ===");
    println!("Controls:");
    println!("  ESC - Exit");
    println!();

    let event_loop = EventLoop::new().unwrap();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Sprite Engine")
            .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .build(&event_loop)
            .unwrap(),
    );

    let context = softbuffer::Context::new(window.clone()).unwrap();
    let mut surface = softbuffer::Surface::new(&context, window.clone()).unwrap();

    let window_size = window.inner_size();
    let mut renderer = SpriteRenderer::new(
        window_size.width as usize,
        window_size.height as usize,
        pack_argb8888,
    );

    let mut scene = Scene::build();
    let mut fps = FpsCounter::new(FPS_REPORT_INTERVAL);

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        renderer = SpriteRenderer::new(
                            new_size.width as usize,
                            new_size.height as usize,
                            pack_argb8888,
                        );
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        let pressed = event.state == ElementState::Pressed;
                        if let PhysicalKey::Code(KeyCode::Escape) = event.physical_key {
                            if pressed {
                                elwt.exit();
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        scene.tick();

                        let width = renderer.width();
                        let height = renderer.height();
                        if width == 0 || height == 0 {
                            return;
                        }

                        surface
                            .resize(
                                NonZeroU32::new(width as u32).unwrap(),
                                NonZeroU32::new(height as u32).unwrap(),
                            )
                            .unwrap();

                        let mut buffer = surface.buffer_mut().unwrap();
                        let pitch = width * 4;
                        renderer.render(
                            &scene.sprites,
                            bytemuck::cast_slice_mut(&mut buffer[..]),
                            pitch,
                        );
                        buffer.present().unwrap();

                        if let Some(rate) = fps.tick() {
                            println!("FPS: {:.1} | Sprites: {}", rate, scene.sprites.len());
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}
