/// stereosurf terminal viewer - red/cyan anaglyph surface
///
/// Renders the parametric surface and the orbiting sphere as two masked
/// passes. View with red/cyan glasses.
/// Controls:
///   - WASD / Arrow Keys: Rotate the surface
///   - 1-4: Select coefficient a, b, c or d; +/-: change it
///   - [ ]: Eye separation; , .: Convergence
///   - F: Toggle the audio filter flag
///   - Q/ESC: Quit
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stereosurf_core::{ShapeParameters, ViewerConfig};
use stereosurf_terminal::TerminalApp;

#[derive(Parser, Debug)]
#[command(name = "stereosurf-terminal", version, about = "Anaglyph parametric surface viewer")]
struct Cli {
    /// Shape coefficients "a,b,c,d"
    #[arg(long, allow_hyphen_values = true)]
    shape: Option<ShapeParameters>,

    /// Config file with `key = value` lines
    #[arg(long)]
    config: Option<PathBuf>,

    /// Distance of the zero-parallax plane
    #[arg(long)]
    convergence: Option<f32>,

    /// Distance between the two eyes
    #[arg(long)]
    eye_separation: Option<f32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov: Option<f32>,
}

impl Cli {
    fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                ViewerConfig::parse(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => ViewerConfig::default(),
        };

        if let Some(shape) = self.shape {
            config.shape = shape;
        }
        if let Some(convergence) = self.convergence {
            config.camera.convergence = convergence;
        }
        if let Some(eye_separation) = self.eye_separation {
            config.camera.eye_separation = eye_separation;
        }
        if let Some(fov) = self.fov {
            config.camera.field_of_view = fov.to_radians();
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.viewer_config()?;

    // Degenerate values still render (as nothing); only warn about them
    if let Err(e) = config.shape.validate() {
        log::warn!("shape {:?}: {}", config.shape, e);
    }
    if let Err(e) = config.camera.validate() {
        log::warn!("camera: {}", e);
    }

    println!("stereosurf terminal viewer - building surface...");

    let mut app = TerminalApp::new(config).context("failed to query terminal size")?;

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    app.run()?;

    println!("Thank you for using stereosurf!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "stereosurf-terminal",
            "--shape",
            "2,1,-0.5,0",
            "--convergence",
            "12",
            "--fov",
            "90",
        ]);
        let config = cli.viewer_config().unwrap();
        assert_eq!(config.shape, ShapeParameters::new(2.0, 1.0, -0.5, 0.0));
        assert_eq!(config.camera.convergence, 12.0);
        assert_eq!(config.camera.eye_separation, 0.1);
        assert!((config.camera.field_of_view - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_cli_rejects_bad_shape() {
        let result = Cli::try_parse_from(["stereosurf-terminal", "--shape", "1,2"]);
        assert!(result.is_err());
    }
}
