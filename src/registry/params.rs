//! Typed arguments for the commands that take any, parsed from the raw tokens.

use crate::error::ConsoleError;
use crate::protocol::{LsSubCommand, ShapeSpec, ShapeType};

use super::validation::{
    parse_numbers, validate_inner_ratio, validate_positive, validate_vertex_count,
};

/// Render a number the way the console prints geometry: integral values
/// without a fractional part, and no negative zero.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

// ── selection ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionParams {
    pub verbose: bool,
}

impl SelectionParams {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
        }
    }
}

// ── ls ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LsParams {
    pub sub_command: LsSubCommand,
    pub list_current: bool,
}

impl LsParams {
    /// The sub-command is the first argument that is not a flag, `help` when
    /// there is none.
    pub fn from_args(args: &[String]) -> Result<Self, ConsoleError> {
        let list_current = args.iter().any(|a| a == "--current");
        let sub_command = match args.iter().find(|a| !a.starts_with("--") && !a.is_empty()) {
            None => LsSubCommand::Help,
            Some(name) => LsSubCommand::from_slug(name).ok_or_else(|| {
                ConsoleError::validation(format!("Unsupported subcommand: {name}"))
            })?,
        };
        Ok(Self {
            sub_command,
            list_current,
        })
    }

    /// Transcript echo, e.g. `ls fonts --current`.
    pub fn echo(&self) -> String {
        if self.list_current {
            format!("ls {} --current", self.sub_command.slug())
        } else {
            format!("ls {}", self.sub_command.slug())
        }
    }
}

// ── shape ───────────────────────────────────────────────────────

/// A fully validated shape request. Positions default to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeParams {
    Rect {
        width: f64,
        height: f64,
        x: f64,
        y: f64,
    },
    Ellipse {
        width: f64,
        height: f64,
        x: f64,
        y: f64,
    },
    Circle {
        diameter: f64,
        x: f64,
        y: f64,
    },
    Polygon {
        sides: u32,
        radius: f64,
        x: f64,
        y: f64,
    },
    Star {
        points: u32,
        radius: f64,
        inner_ratio: f64,
        x: f64,
        y: f64,
    },
}

fn position(rest: &[f64]) -> (f64, f64) {
    (
        rest.first().copied().unwrap_or(0.0),
        rest.get(1).copied().unwrap_or(0.0),
    )
}

impl ShapeParams {
    /// Parse `<type> [...numbers]`. The type is matched case-insensitively;
    /// every following token must be a finite number before arity and
    /// geometry are checked.
    pub fn parse(type_token: &str, rest: &[String]) -> Result<Self, ConsoleError> {
        let slug = type_token.to_lowercase();
        let shape_type = ShapeType::from_slug(&slug).ok_or_else(|| {
            let valid: Vec<&str> = ShapeType::all().iter().map(|t| t.slug()).collect();
            ConsoleError::validation(format!(
                "Invalid shape type \"{slug}\".\n Available types: {}",
                valid.join(", ")
            ))
        })?;
        let nums = parse_numbers(rest)?;

        match shape_type {
            ShapeType::Rect | ShapeType::Ellipse => {
                let [width, height, tail @ ..] = nums.as_slice() else {
                    return Err(ConsoleError::usage(format!(
                        "{slug} requires at least width and height. Usage: shape {slug} <width> <height> [x] [y]"
                    )));
                };
                if *width <= 0.0 || *height <= 0.0 {
                    return Err(ConsoleError::validation(
                        "Width and height must be greater than 0",
                    ));
                }
                let (x, y) = position(tail);
                let (width, height) = (*width, *height);
                Ok(if shape_type == ShapeType::Rect {
                    Self::Rect {
                        width,
                        height,
                        x,
                        y,
                    }
                } else {
                    Self::Ellipse {
                        width,
                        height,
                        x,
                        y,
                    }
                })
            }
            ShapeType::Circle => {
                let [diameter, tail @ ..] = nums.as_slice() else {
                    return Err(ConsoleError::usage(
                        "Circle requires diameter. Usage: shape circle <diameter> [x] [y]",
                    ));
                };
                validate_positive(*diameter, "Diameter")?;
                let (x, y) = position(tail);
                Ok(Self::Circle {
                    diameter: *diameter,
                    x,
                    y,
                })
            }
            ShapeType::Polygon => {
                let [sides, radius, tail @ ..] = nums.as_slice() else {
                    return Err(ConsoleError::usage(
                        "Polygon requires sides and radius. Usage: shape polygon <sides> <radius> [x] [y]",
                    ));
                };
                let sides = validate_vertex_count(*sides, "Sides")?;
                validate_positive(*radius, "Radius")?;
                let (x, y) = position(tail);
                Ok(Self::Polygon {
                    sides,
                    radius: *radius,
                    x,
                    y,
                })
            }
            ShapeType::Star => {
                let [points, radius, inner_ratio, tail @ ..] = nums.as_slice() else {
                    return Err(ConsoleError::usage(
                        "Star requires points, outer radius, and inner radius ratio. Usage: shape star <points> <radius> <inner-ratio> [x] [y]\ninner-ratio should be between 0 and 1",
                    ));
                };
                let points = validate_vertex_count(*points, "Points")?;
                validate_positive(*radius, "Radius")?;
                validate_inner_ratio(*inner_ratio)?;
                let (x, y) = position(tail);
                Ok(Self::Star {
                    points,
                    radius: *radius,
                    inner_ratio: *inner_ratio,
                    x,
                    y,
                })
            }
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Rect { .. } => ShapeType::Rect,
            Self::Ellipse { .. } => ShapeType::Ellipse,
            Self::Circle { .. } => ShapeType::Circle,
            Self::Polygon { .. } => ShapeType::Polygon,
            Self::Star { .. } => ShapeType::Star,
        }
    }

    /// The `create-shape` payload. A circle travels as an equal width and height.
    pub fn to_spec(&self) -> ShapeSpec {
        let mut spec = ShapeSpec::new(self.shape_type());
        match *self {
            Self::Rect {
                width,
                height,
                x,
                y,
            }
            | Self::Ellipse {
                width,
                height,
                x,
                y,
            } => {
                spec.width = Some(width);
                spec.height = Some(height);
                spec.x = Some(x);
                spec.y = Some(y);
            }
            Self::Circle { diameter, x, y } => {
                spec.width = Some(diameter);
                spec.height = Some(diameter);
                spec.x = Some(x);
                spec.y = Some(y);
            }
            Self::Polygon {
                sides,
                radius,
                x,
                y,
            } => {
                spec.sides = Some(sides);
                spec.radius = Some(radius);
                spec.x = Some(x);
                spec.y = Some(y);
            }
            Self::Star {
                points,
                radius,
                inner_ratio,
                x,
                y,
            } => {
                spec.sides = Some(points);
                spec.radius = Some(radius);
                spec.inner_radius = Some(inner_ratio);
                spec.x = Some(x);
                spec.y = Some(y);
            }
        }
        spec
    }

    /// One-line creation summary shown in the transcript.
    pub fn summary(&self) -> String {
        let n = format_number;
        match *self {
            Self::Rect {
                width,
                height,
                x,
                y,
            } => format!(
                "rect created: {}x{} at ({}, {})",
                n(width),
                n(height),
                n(x),
                n(y)
            ),
            Self::Ellipse {
                width,
                height,
                x,
                y,
            } => format!(
                "ellipse created: {}x{} at ({}, {})",
                n(width),
                n(height),
                n(x),
                n(y)
            ),
            Self::Circle { diameter, x, y } => format!(
                "Circle created: diameter {} at ({}, {})",
                n(diameter),
                n(x),
                n(y)
            ),
            Self::Polygon {
                sides,
                radius,
                x,
                y,
            } => format!(
                "{sides}-sided polygon created: radius {} at ({}, {})",
                n(radius),
                n(x),
                n(y)
            ),
            Self::Star {
                points,
                radius,
                inner_ratio,
                x,
                y,
            } => format!(
                "{points}-pointed star created: radius {}, inner ratio {} at ({}, {})",
                n(radius),
                n(inner_ratio),
                n(x),
                n(y)
            ),
        }
    }
}

/// Listing shown by a bare `shape`.
pub const SHAPE_USAGE: &str = "Available shapes:\n\
rect <width> <height> [x] [y]\n\
circle <diameter> [x] [y]\n\
ellipse <width> <height> [x] [y]\n\
polygon <sides> <radius> [x] [y]\n\
star <points> <outer-radius> <inner-radius> [x] [y]";
