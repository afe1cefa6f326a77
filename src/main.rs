use clap::Parser;
use hero_shapes::assets::SoundSet;
use hero_shapes::audio::AudioMixer;
use hero_shapes::camera::SceneCamera;
use hero_shapes::cli::Cli;
use hero_shapes::clock::Clock;
use hero_shapes::config::AppConfig;
use hero_shapes::cursor::{HoverTracker, WindowCursor};
use hero_shapes::picking;
use hero_shapes::renderer::SceneRenderer;
use hero_shapes::rng::{RandomSource, SeededRandom, ThreadRandom};
use hero_shapes::scene::Scene;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

// === Constants ===

const FPS_UPDATE_INTERVAL: f32 = 1.0;

// === Type Aliases ===

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

// === Application ===

struct App {
    config: AppConfig,
    no_ui: bool,
    window: Option<Arc<Window>>,
    renderer: Option<SceneRenderer>,
    scene: Option<Scene>,
    sound_rx: Option<mpsc::Receiver<SoundSet>>,
    mixer: AudioMixer,
    camera: SceneCamera,
    rng: Box<dyn RandomSource>,
    hover: HoverTracker,
    window_cursor: Option<WindowCursor>,
    cursor_pos: Option<(f32, f32)>,
    clock: Clock,
    frame_count: u32,
    fps: f32,
    fps_update_timer: f32,
}

impl App {
    fn new(config: AppConfig, cli: &Cli) -> Self {
        let rng: Box<dyn RandomSource> = match cli.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        };

        let mixer = if cli.mute || !config.audio.enabled {
            AudioMixer::disabled()
        } else {
            let mut mixer = AudioMixer::new();
            mixer.set_volume(config.audio.volume);
            mixer
        };

        let camera = config.camera.to_camera();

        Self {
            config,
            no_ui: cli.no_ui,
            window: None,
            renderer: None,
            scene: None,
            sound_rx: None,
            mixer,
            camera,
            rng,
            hover: HoverTracker::new(),
            window_cursor: None,
            cursor_pos: None,
            clock: Clock::new(),
            frame_count: 0,
            fps: 0.0,
            fps_update_timer: 0.0,
        }
    }

    fn update_fps(&mut self, delta: f32) {
        self.frame_count += 1;
        self.fps_update_timer += delta;

        if self.fps_update_timer >= FPS_UPDATE_INTERVAL {
            self.fps = self.frame_count as f32 / self.fps_update_timer;
            if !self.no_ui {
                println!("FPS: {:.1}", self.fps);
            }
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    /// Mount the scene once the loader thread hands over the sound set
    fn poll_sounds(&mut self) {
        let sounds = match self.sound_rx.as_ref().map(|rx| rx.try_recv()) {
            Some(Ok(sounds)) => Some(sounds),
            Some(Err(TryRecvError::Disconnected)) => {
                log::warn!("sound loader died; using synthesized clips");
                Some(SoundSet::synthesized())
            }
            _ => None,
        };

        if let Some(sounds) = sounds {
            self.sound_rx = None;
            self.scene = Some(Scene::mount(sounds, self.rng.as_mut()));
            self.clock.reset();
        }
    }

    fn hit_under_cursor(&self) -> Option<usize> {
        let (px, py) = self.cursor_pos?;
        let scene = self.scene.as_ref()?;
        let window = self.window.as_ref()?;

        let size = window.inner_size();
        let ray = self
            .camera
            .screen_ray(px, py, size.width as f32, size.height as f32);
        picking::pick(&ray, &scene.instances, scene.elapsed).map(|hit| hit.index)
    }

    fn refresh_hover(&mut self) {
        let hit = self.hit_under_cursor();
        if let Some(cursor) = self.window_cursor.as_mut() {
            self.hover.update(hit, cursor);
        }
    }

    fn handle_click(&mut self) {
        let Some(index) = self.hit_under_cursor() else {
            return;
        };
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        if let Some(feedback) = scene.click(index, self.rng.as_mut()) {
            if let Some(clip) = scene.sounds.clip(feedback.clip_index) {
                let clip = Arc::clone(clip);
                self.mixer.play(&clip);
            }
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(scene) = self.scene.as_mut() {
            scene.unmount();
        }
        self.scene = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop.create_window(
                Window::default_attributes()
                    .with_title(self.config.window.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        self.config.window.width,
                        self.config.window.height,
                    )),
            ) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

            let renderer =
                match pollster::block_on(SceneRenderer::new(window.clone(), &self.config)) {
                    Ok(r) => r,
                    Err(e) => {
                        log::error!("failed to initialize renderer: {e}");
                        event_loop.exit();
                        return;
                    }
                };

            // Load sounds off the main thread; the scene mounts on arrival
            let (tx, rx) = mpsc::channel();
            let sound_dir = self.config.audio.sound_dir.clone();
            std::thread::spawn(move || {
                let _ = tx.send(SoundSet::load(&sound_dir));
            });
            self.sound_rx = Some(rx);

            self.window_cursor = Some(WindowCursor::new(window.clone()));
            self.window = Some(window);
            self.renderer = Some(renderer);
            self.clock.reset();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            if renderer.handle_event(window, &event) {
                return; // egui consumed the event
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(new_size) => {
                if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
                    renderer.resize(new_size, window.scale_factor());
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
                    renderer.resize(window.inner_size(), scale_factor);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_pos = Some((position.x as f32, position.y as f32));
                self.refresh_hover();
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_pos = None;
                if let Some(cursor) = self.window_cursor.as_mut() {
                    self.hover.reset(cursor);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),
            WindowEvent::RedrawRequested => {
                let delta = self.clock.tick();
                self.update_fps(delta);

                self.poll_sounds();
                if let Some(scene) = self.scene.as_mut() {
                    scene.update(delta);
                }
                self.mixer.update();

                if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
                    match renderer.render(
                        window,
                        self.scene.as_ref(),
                        &self.camera,
                        self.fps,
                        !self.no_ui,
                    ) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            renderer.resize(window.inner_size(), window.scale_factor());
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("out of GPU memory");
                            event_loop.exit();
                        }
                        Err(e) => log::error!("render error: {e}"),
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref());

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, &cli);

    println!("Hero Shapes - click the shapes, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
