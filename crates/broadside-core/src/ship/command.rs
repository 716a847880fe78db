//! Ship orders.
//!
//! Orders arrive either typed ([`ShipCommand`]) or as the loose
//! `{action, parameters}` shape produced by an external front end
//! ([`RawCommand`]). Raw orders are parsed when the ship drains its queue;
//! anything that fails to parse is logged and dropped there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ShipId;
use crate::error::CommandError;

/// A typed ship order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
pub enum ShipCommand {
    /// Order a speed in knots.
    SetSpeed {
        /// Ordered speed
        knots: f64,
    },
    /// Order a heading in degrees, `[0, 360)`.
    SetDirection {
        /// Ordered heading
        degrees: f64,
    },
    /// Fire the first ready gun at a ship.
    FireGuns {
        /// Target ship
        #[serde(rename = "target_id")]
        target: ShipId,
    },
    /// Launch from the first ready torpedo launcher at a ship.
    LaunchTorpedoes {
        /// Target ship
        #[serde(rename = "target_id")]
        target: ShipId,
    },
}

impl ShipCommand {
    /// The action tag this order is known by.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::SetSpeed { .. } => "set_speed",
            Self::SetDirection { .. } => "set_direction",
            Self::FireGuns { .. } => "fire_guns",
            Self::LaunchTorpedoes { .. } => "launch_torpedoes",
        }
    }
}

/// An order in its loose, untyped form.
///
/// Numeric parameters may be JSON numbers or numeric strings.
///
/// ```
/// use broadside_core::ship::{RawCommand, ShipCommand};
///
/// let raw: RawCommand = serde_json::from_str(
///     r#"{ "action": "set_speed", "parameters": { "knots": "25" } }"#,
/// ).unwrap();
/// let command = ShipCommand::try_from(&raw).unwrap();
/// assert_eq!(command, ShipCommand::SetSpeed { knots: 25.0 });
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    /// Action tag, e.g. `set_speed`.
    pub action: String,
    /// Action parameters by name.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl RawCommand {
    /// Creates a raw command with no parameters.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            parameters: Map::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

impl TryFrom<&RawCommand> for ShipCommand {
    type Error = CommandError;

    fn try_from(raw: &RawCommand) -> Result<Self, Self::Error> {
        let params = &raw.parameters;
        match raw.action.as_str() {
            "set_speed" => Ok(Self::SetSpeed {
                knots: number(params, "set_speed", "knots")?,
            }),
            "set_direction" => Ok(Self::SetDirection {
                degrees: number(params, "set_direction", "degrees")?,
            }),
            "fire_guns" => Ok(Self::FireGuns {
                target: ship_id(params, "fire_guns", "target_id")?,
            }),
            "launch_torpedoes" => Ok(Self::LaunchTorpedoes {
                target: ship_id(params, "launch_torpedoes", "target_id")?,
            }),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

/// What sits in a ship's queue.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingCommand {
    Typed(ShipCommand),
    Raw(RawCommand),
}

fn parameter<'a>(
    params: &'a Map<String, Value>,
    action: &'static str,
    parameter: &'static str,
) -> Result<&'a Value, CommandError> {
    match params.get(parameter) {
        Some(Value::Null) | None => Err(CommandError::MissingParameter { action, parameter }),
        Some(value) => Ok(value),
    }
}

fn number(
    params: &Map<String, Value>,
    action: &'static str,
    name: &'static str,
) -> Result<f64, CommandError> {
    let value = parameter(params, action, name)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| CommandError::InvalidParameter {
            action,
            parameter: name,
            reason: format!("expected a number, got {value}"),
        })
}

fn ship_id(
    params: &Map<String, Value>,
    action: &'static str,
    name: &'static str,
) -> Result<ShipId, CommandError> {
    let value = parameter(params, action, name)?;
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .map(ShipId::new)
        .ok_or_else(|| CommandError::InvalidParameter {
            action,
            parameter: name,
            reason: format!("expected a ship id, got {value}"),
        })
}
