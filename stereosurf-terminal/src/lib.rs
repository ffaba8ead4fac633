/// Terminal anaglyph viewer for the parametric surface
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::Point3;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use stereosurf_core::{
    AudioSpatializer, RotationState, Scene, ShapeParameters, ViewerConfig, SPHERE_TICK,
};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 0.5;
/// Shape coefficient change per key press
const SHAPE_STEP: f32 = 0.1;
const PARAMETER_NAMES: [char; 4] = ['a', 'b', 'c', 'd'];
/// Rows above the rendered image
const STATUS_ROWS: u16 = 1;

/// Camera aspect ratio for the renderer's grid of cells
fn viewport_aspect(renderer: &AsciiRenderer) -> f32 {
    renderer.width() as f32 * CELL_ASPECT / renderer.height().max(1) as f32
}

/// Stand-in for the audio graph: remembers the last update and logs it
#[derive(Debug)]
pub struct LoggingSpatializer {
    position: Point3<f32>,
    filter_enabled: bool,
}

impl Default for LoggingSpatializer {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            filter_enabled: false,
        }
    }
}

impl LoggingSpatializer {
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }
}

impl AudioSpatializer for LoggingSpatializer {
    fn set_position(&mut self, position: Point3<f32>) {
        log::trace!("audio source moved to {}", position);
        self.position = position;
    }

    fn set_filter_enabled(&mut self, enabled: bool) {
        log::debug!("audio filter {}", if enabled { "on" } else { "off" });
        self.filter_enabled = enabled;
    }
}

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    scene: Scene,
    rotation: RotationState,
    renderer: AsciiRenderer,
    audio: LoggingSpatializer,
    selected: usize,
    running: bool,
    started: Instant,
    last_tick: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let now = Instant::now();

        let mut app = Self {
            scene: Scene::new(config),
            rotation: RotationState::zero(),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            audio: LoggingSpatializer::default(),
            selected: 0,
            running: true,
            started: now,
            last_tick: now,
            last_frame: now,
            frame_count: 0,
            fps: 0.0,
        };
        app.resize(width, height);
        Ok(app)
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Sphere timer, independent of the frame rate
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) {
        // The top row is the status line
        let rows = height.saturating_sub(STATUS_ROWS).max(1);
        self.renderer = AsciiRenderer::new(width as usize, rows as usize);
        self.scene.camera_mut().aspect_ratio = viewport_aspect(&self.renderer);
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, .. }) => self.handle_key(code),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let mut camera = self.scene.camera().settings();

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => {
                self.rotation.rotate(0.1, 0.0, 0.0);
            }
            KeyCode::Char('s') | KeyCode::Down => {
                self.rotation.rotate(-0.1, 0.0, 0.0);
            }
            KeyCode::Char('a') | KeyCode::Left => {
                self.rotation.rotate(0.0, -0.1, 0.0);
            }
            KeyCode::Char('d') | KeyCode::Right => {
                self.rotation.rotate(0.0, 0.1, 0.0);
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.selected = c as usize - '1' as usize;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_shape(SHAPE_STEP),
            KeyCode::Char('-') => self.adjust_shape(-SHAPE_STEP),
            KeyCode::Char(']') => camera.eye_separation += 0.05,
            KeyCode::Char('[') => camera.eye_separation = (camera.eye_separation - 0.05).max(0.0),
            KeyCode::Char('.') => camera.convergence *= 1.25,
            KeyCode::Char(',') => camera.convergence /= 1.25,
            KeyCode::Char('f') => {
                let enabled = !self.audio.filter_enabled();
                self.audio.set_filter_enabled(enabled);
            }
            _ => {}
        }

        // Camera values are re-applied on every input, like UI fields read per frame
        self.scene.update_camera(camera);
    }

    fn adjust_shape(&mut self, delta: f32) {
        let mut shape: ShapeParameters = self.scene.shape();
        if let Some(value) = shape.get_mut(self.selected) {
            *value += delta;
        }
        if let Err(e) = shape.validate() {
            log::warn!("degenerate shape {:?}: {}", shape, e);
        }
        self.scene.set_shape(shape);
    }

    fn update(&mut self) {
        if self.last_tick.elapsed() >= SPHERE_TICK {
            self.scene.tick_sphere(self.started.elapsed(), &mut self.audio);
            self.last_tick = Instant::now();
        }
    }

    fn render(&mut self) -> io::Result<()> {
        // Clear renderer
        self.renderer.clear();

        // Both eyes, surface and sphere
        let meshes = [self.scene.surface(), self.scene.sphere_mesh()];
        self.scene.render(&mut self.renderer, &self.rotation, None, &meshes);

        // Output to terminal
        let mut stdout = stdout();
        self.renderer.present(&mut stdout, STATUS_ROWS)?;

        // Draw UI overlay
        let shape = self.scene.shape().as_array();
        let camera = self.scene.camera();
        let params = PARAMETER_NAMES
            .iter()
            .zip(shape)
            .enumerate()
            .map(|(i, (name, value))| {
                let marker = if i == self.selected { '>' } else { ' ' };
                format!("{marker}{name}={value:.1}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        let sound = self.audio.position();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "FPS {:.1} | {} | conv {:.2} sep {:.2} | sound ({:.2},{:.2},{:.2}){} filter {} | 1-4 +/- [ ] , . f q",
                self.fps,
                params,
                camera.convergence,
                camera.eye_separation,
                sound.x,
                sound.y,
                sound.z,
                if self.scene.sphere().z_axis_enabled() { "" } else { " z-fixed" },
                if self.audio.filter_enabled() { "on" } else { "off" },
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
