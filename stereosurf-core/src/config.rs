/// Viewer configuration and parameter-string parsing
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, multispace0, multispace1, space0},
    combinator::all_consuming,
    multi::separated_list1,
    number::complete::float,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};

use crate::error::{ConfigError, Result};
use crate::projection::StereoCamera;
use crate::surface::ShapeParameters;

/// Start-up values for the shape and the stereo camera
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewerConfig {
    pub shape: ShapeParameters,
    pub camera: StereoCamera,
}

impl ViewerConfig {
    /// Parse `key = value` lines over the defaults.
    ///
    /// Blank lines and `#` comments are skipped. Keys: `a`, `b`, `c`, `d`,
    /// `convergence`, `eye_separation`, `aspect_ratio`, `fov` (degrees),
    /// `near`, `far`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default();
            if content.trim().is_empty() {
                continue;
            }

            let (_, (key, value)) =
                key_value(content).map_err(|_| ConfigError::Syntax { line })?;
            let number = parse_number(value).ok_or_else(|| ConfigError::InvalidNumber {
                line,
                key: key.to_string(),
                value: value.to_string(),
            })?;

            config.set(line, key, number)?;
        }

        Ok(config)
    }

    fn set(&mut self, line: usize, key: &str, value: f32) -> Result<()> {
        match key {
            "a" => self.shape.a = value,
            "b" => self.shape.b = value,
            "c" => self.shape.c = value,
            "d" => self.shape.d = value,
            "convergence" => self.camera.convergence = value,
            "eye_separation" => self.camera.eye_separation = value,
            "aspect_ratio" => self.camera.aspect_ratio = value,
            "fov" => self.camera.field_of_view = value.to_radians(),
            "near" => self.camera.near_plane = value,
            "far" => self.camera.far_plane = value,
            _ => {
                return Err(ConfigError::UnknownKey {
                    line,
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }
}

impl FromStr for ViewerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for ShapeParameters {
    type Err = ConfigError;

    /// Four numbers separated by commas and/or whitespace, e.g. `"1, 1, 0, 0"`
    fn from_str(s: &str) -> Result<Self> {
        let values = parse_number_list(s, 4)?;
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

/// Parse exactly `expected` numbers separated by commas and/or whitespace
pub fn parse_number_list(input: &str, expected: usize) -> Result<Vec<f32>> {
    let error = || ConfigError::ParameterList {
        expected,
        input: input.to_string(),
    };

    let (_, values) = number_list(input).map_err(|_| error())?;
    if values.len() != expected {
        return Err(error());
    }
    Ok(values)
}

fn parse_number(input: &str) -> Option<f32> {
    all_consuming(float::<&str, nom::error::Error<&str>>)(input)
        .ok()
        .map(|(_, value)| value)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(separated_pair(
        preceded(space0, identifier),
        delimited(space0, char('='), space0),
        terminated(take_till1(|c: char| c.is_whitespace()), space0),
    ))(input)
}

fn number_list(input: &str) -> IResult<&str, Vec<f32>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(
            alt((delimited(multispace0, tag(","), multispace0), multispace1)),
            float,
        ),
        multispace0,
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = ViewerConfig::parse("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.camera.convergence, 1000.0);
        assert_eq!(config.shape, ShapeParameters::new(1.0, 1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_config() {
        let text = "\
# shape
a = 1.5
b=0.5
d = -2   # trailing comment

convergence = 12
fov = 90
far = 40
";
        let config = ViewerConfig::parse(text).unwrap();
        assert_eq!(config.shape, ShapeParameters::new(1.5, 0.5, 0.0, -2.0));
        assert_eq!(config.camera.convergence, 12.0);
        assert_eq!(config.camera.far_plane, 40.0);
        assert_eq!(config.camera.eye_separation, 0.1);
        assert!((config.camera.field_of_view - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_key() {
        let err = ViewerConfig::parse("a = 1\nzoom = 2").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownKey {
                line: 2,
                key: "zoom".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = ViewerConfig::parse("near = 1.x").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { line: 1, .. }));
    }

    #[test]
    fn test_syntax_error() {
        let err = ViewerConfig::parse("convergence 12").unwrap_err();
        assert_eq!(err, ConfigError::Syntax { line: 1 });
    }

    #[test]
    fn test_shape_from_str() {
        let params: ShapeParameters = "1, 2.5, -0.5, 0".parse().unwrap();
        assert_eq!(params, ShapeParameters::new(1.0, 2.5, -0.5, 0.0));

        let params: ShapeParameters = " 1 2 3 4 ".parse().unwrap();
        assert_eq!(params, ShapeParameters::new(1.0, 2.0, 3.0, 4.0));

        assert!("1, 2, 3".parse::<ShapeParameters>().is_err());
        assert!("1, 2, x, 4".parse::<ShapeParameters>().is_err());
    }
}
