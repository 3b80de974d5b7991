use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{debug, error, info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use desk_viewer::{
    Camera, ChannelLayout, ControlRequest, DrawCall, DrawSink, FrameClock, FrameRenderer,
    GpuRenderer, KeyCode, NamedKey, Scene, SceneSettings, TextureStore, Viewer, ViewerConfig,
    Viewport, VirtualCursor,
};

/// Pixel scroll deltas are converted to lines with this divisor.
const PIXELS_PER_SCROLL_LINE: f32 = 20.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    info!(
        "configuration: {}",
        options
            .config
            .as_deref()
            .map_or_else(|| "defaults".to_string(), |path| path.display().to_string())
    );

    let settings = SceneSettings {
        light_position: config.lighting.light_position,
        bottle_texture: config.textures.bottle_label.clone(),
        tablet_texture: config.textures.leather.clone(),
    };
    let scene = Scene::reference(&settings).context("failed to build desk scene")?;
    info!("desk scene built, light at {}", settings.light_position);

    println!("Loaded desk scene with {} objects", scene.objects.len());
    for object in &scene.objects {
        println!(" - {} ({})", object.name, object.material.shading_model());
    }

    let textures = load_textures(&options.assets, &settings);
    let mut renderer = FrameRenderer::new(scene);

    if options.summary_only {
        return run_headless(&mut renderer, &config, &textures);
    }

    match run_interactive(&mut renderer, &config, &textures) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!("{err}. Falling back to --summary-only mode.");
            run_headless(&mut renderer, &config, &textures)
        }
        Err(err) => Err(err),
    }
}

fn load_textures(assets: &Path, settings: &SceneSettings) -> TextureStore {
    let mut store = TextureStore::new();
    for name in [&settings.bottle_texture, &settings.tablet_texture] {
        let path = assets.join(name);
        let decoded = match image::open(&path) {
            Ok(image) => Some(decoded_pixels(image)),
            Err(err) => {
                warn!("failed to decode {}: {err}", path.display());
                None
            }
        };
        let loaded = match &decoded {
            Some((pixels, width, height, layout)) => {
                store.load_texture(name, Some(pixels.as_slice()), *width, *height, *layout)
            }
            None => store.load_texture(name, None, 0, 0, ChannelLayout::Rgb),
        };
        if let Err(err) = loaded {
            debug!("{name} unavailable ({err}); draws keep the previous binding");
        }
    }
    if store.is_empty() {
        warn!("no textures loaded from {}; textured objects sample white", assets.display());
    } else {
        info!("{} texture(s) loaded", store.len());
    }
    store
}

fn decoded_pixels(image: image::DynamicImage) -> (Vec<u8>, u32, u32, ChannelLayout) {
    let (width, height) = (image.width(), image.height());
    match image {
        image::DynamicImage::ImageLuma8(buffer) => (buffer.into_raw(), width, height, ChannelLayout::Gray),
        image::DynamicImage::ImageLumaA8(buffer) => {
            (buffer.into_raw(), width, height, ChannelLayout::GrayAlpha)
        }
        image::DynamicImage::ImageRgb8(buffer) => (buffer.into_raw(), width, height, ChannelLayout::Rgb),
        other => (other.into_rgba8().into_raw(), width, height, ChannelLayout::Rgba),
    }
}

fn run_headless(renderer: &mut FrameRenderer, config: &ViewerConfig, textures: &TextureStore) -> Result<()> {
    let camera = Camera::new(&config.camera);
    let viewport = Viewport::new(config.window.width as f32, config.window.height as f32);
    let mut sink = SummarySink;
    println!("Frame summary ({}x{}):", config.window.width, config.window.height);
    let stats = renderer.render_frame(&camera, viewport, textures, &mut sink);
    println!(
        "Frame: {} draws, {} skipped, {} triangles",
        stats.draws, stats.skipped, stats.triangles
    );
    Ok(())
}

/// Prints one line per draw instead of rasterizing it.
struct SummarySink;

impl DrawSink for SummarySink {
    fn draw(&mut self, call: &DrawCall<'_>) {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for index in 0..call.mesh.vertex_count() {
            let Some(clip) = call.program.clip_position(call.mesh.position(index)) else {
                continue;
            };
            if clip.w <= f32::EPSILON {
                continue;
            }
            let ndc = Vec2::new(clip.x, clip.y) / clip.w;
            min = min.min(ndc);
            max = max.max(ndc);
        }

        let bounds = if min.x <= max.x {
            format!(
                "ndc x=[{:.2}, {:.2}] y=[{:.2}, {:.2}]",
                min.x, max.x, min.y, max.y
            )
        } else {
            "behind camera".to_string()
        };
        println!(
            " - {} [{}] {} vertices, {} triangles, {bounds}",
            call.name,
            call.shading_model,
            call.mesh.vertex_count(),
            call.mesh.triangle_count()
        );
    }
}

fn run_interactive(renderer: &mut FrameRenderer, config: &ViewerConfig, textures: &TextureStore) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DeskApp {
        config,
        renderer,
        textures,
        viewer: Viewer::new(config),
        clock: FrameClock::new(config.frame.max_delta()),
        cursor: VirtualCursor::new(),
        focused: true,
        gpu: None,
        last_error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;

    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct DeskApp<'a> {
    config: &'a ViewerConfig,
    renderer: &'a mut FrameRenderer,
    textures: &'a TextureStore,
    viewer: Viewer,
    clock: FrameClock,
    cursor: VirtualCursor,
    focused: bool,
    gpu: Option<GpuRenderer>,
    last_error: Option<anyhow::Error>,
}

impl DeskApp<'_> {
    fn create_gpu(&self, event_loop: &ActiveEventLoop) -> Result<GpuRenderer> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );
        grab_cursor(&window);
        let gpu = block_on(GpuRenderer::new(window))
            .map_err(|err| WindowInitError::from_error("GPU", format!("{err:#}")))?;
        Ok(gpu)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        if self.viewer.update(dt) == ControlRequest::Exit {
            event_loop.exit();
            return;
        }

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        match gpu.render(self.renderer, self.viewer.camera(), self.textures) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU is out of memory"));
            }
            Err(err) => info!("skipping frame: {err}"),
        }
    }
}

impl ApplicationHandler for DeskApp<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.create_gpu(event_loop) {
            Ok(gpu) => {
                gpu.window().request_redraw();
                self.gpu = Some(gpu);
                self.clock.reset();
            }
            Err(err) => {
                error!("{err:#}");
                self.fail(event_loop, err);
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if !self.focused || self.gpu.is_none() {
            return;
        }
        if let DeviceEvent::MouseMotion { delta } = event {
            let cursor = self.cursor.motion(Vec2::new(delta.0 as f32, delta.1 as f32));
            self.viewer.input_mut().push_cursor(cursor);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window().request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.gpu.as_ref().map(GpuRenderer::window_id) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                self.viewer.focus_changed(focused);
                if focused {
                    if let Some(gpu) = &self.gpu {
                        grab_cursor(gpu.window());
                    }
                    self.clock.reset();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = map_keycode(code) else {
                    return;
                };
                let input = self.viewer.input_mut();
                match event.state {
                    ElementState::Pressed => input.set_key_down(key),
                    ElementState::Released => input.set_key_up(key),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(cursor) = self.cursor.moved(Vec2::new(position.x as f32, position.y as f32)) {
                    self.viewer.input_mut().push_cursor(cursor);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_SCROLL_LINE,
                };
                self.viewer.input_mut().add_scroll(lines);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("cursor grab unavailable: {err}");
    }
    window.set_cursor_visible(false);
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    use WinitKey as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Enter => KeyCode::Named(NamedKey::Enter),
        Key::Tab => KeyCode::Named(NamedKey::Tab),
        Key::ArrowLeft => KeyCode::Named(NamedKey::Left),
        Key::ArrowRight => KeyCode::Named(NamedKey::Right),
        Key::ArrowUp => KeyCode::Named(NamedKey::Up),
        Key::ArrowDown => KeyCode::Named(NamedKey::Down),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::Backspace => KeyCode::Named(NamedKey::Backspace),
        Key::Home => KeyCode::Named(NamedKey::Home),
        Key::End => KeyCode::Named(NamedKey::End),
        Key::PageUp => KeyCode::Named(NamedKey::PageUp),
        Key::PageDown => KeyCode::Named(NamedKey::PageDown),
        Key::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        Key::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        Key::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        Key::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        Key::AltLeft => KeyCode::Named(NamedKey::LeftAlt),
        Key::AltRight => KeyCode::Named(NamedKey::RightAlt),
        Key::Digit0 => KeyCode::Digit(0),
        Key::Digit1 => KeyCode::Digit(1),
        Key::Digit2 => KeyCode::Digit(2),
        Key::Digit3 => KeyCode::Digit(3),
        Key::Digit4 => KeyCode::Digit(4),
        Key::Digit5 => KeyCode::Digit(5),
        Key::Digit6 => KeyCode::Digit(6),
        Key::Digit7 => KeyCode::Digit(7),
        Key::Digit8 => KeyCode::Digit(8),
        Key::Digit9 => KeyCode::Digit(9),
        Key::KeyA => KeyCode::Character('A'),
        Key::KeyB => KeyCode::Character('B'),
        Key::KeyC => KeyCode::Character('C'),
        Key::KeyD => KeyCode::Character('D'),
        Key::KeyE => KeyCode::Character('E'),
        Key::KeyF => KeyCode::Character('F'),
        Key::KeyG => KeyCode::Character('G'),
        Key::KeyH => KeyCode::Character('H'),
        Key::KeyI => KeyCode::Character('I'),
        Key::KeyJ => KeyCode::Character('J'),
        Key::KeyK => KeyCode::Character('K'),
        Key::KeyL => KeyCode::Character('L'),
        Key::KeyM => KeyCode::Character('M'),
        Key::KeyN => KeyCode::Character('N'),
        Key::KeyO => KeyCode::Character('O'),
        Key::KeyP => KeyCode::Character('P'),
        Key::KeyQ => KeyCode::Character('Q'),
        Key::KeyR => KeyCode::Character('R'),
        Key::KeyS => KeyCode::Character('S'),
        Key::KeyT => KeyCode::Character('T'),
        Key::KeyU => KeyCode::Character('U'),
        Key::KeyV => KeyCode::Character('V'),
        Key::KeyW => KeyCode::Character('W'),
        Key::KeyX => KeyCode::Character('X'),
        Key::KeyY => KeyCode::Character('Y'),
        Key::KeyZ => KeyCode::Character('Z'),
        Key::F1 => KeyCode::Function(1),
        Key::F2 => KeyCode::Function(2),
        Key::F3 => KeyCode::Function(3),
        Key::F4 => KeyCode::Function(4),
        Key::F5 => KeyCode::Function(5),
        Key::F6 => KeyCode::Function(6),
        Key::F7 => KeyCode::Function(7),
        Key::F8 => KeyCode::Function(8),
        Key::F9 => KeyCode::Function(9),
        Key::F10 => KeyCode::Function(10),
        Key::F11 => KeyCode::Function(11),
        Key::F12 => KeyCode::Function(12),
        _ => return None,
    })
}

struct CliOptions {
    config: Option<PathBuf>,
    assets: PathBuf,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut config = None;
        let mut assets = PathBuf::from(".");
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or_else(|| anyhow!("--config expects a file path"))?;
                    config = Some(PathBuf::from(path));
                }
                "--assets" => {
                    let path = args.next().ok_or_else(|| anyhow!("--assets expects a directory"))?;
                    assets = PathBuf::from(path);
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: desk-viewer [--config <file.json>] [--assets <dir>] [--summary-only]"
                    ));
                }
            }
        }
        Ok(Self {
            config,
            assets,
            summary_only,
        })
    }
}
