/// Navigation state accumulated from the receiver's sentences.
///
/// Different sentence kinds carry different fields and arrive at different rates, so the state
/// keeps the last known good value of each field. A field is only written by the sentence kind
/// that owns it, and only when that sentence actually carries a usable value.
use tracing::debug;

use crate::extract::NavUpdate;

/// Side of the course line to steer towards, as reported by the RMB sentence.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "L" => Some(Direction::Left),
            "R" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Validity of the most recent positioning fix (RMC status field).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FixStatus {
    /// `A`, autonomous fix.
    Valid,
    /// `V`, receiver warning.
    Void,
    #[default]
    Unknown,
}

impl FixStatus {
    pub fn from_field(field: &str) -> Self {
        match field {
            "A" => FixStatus::Valid,
            "V" => FixStatus::Void,
            _ => FixStatus::Unknown,
        }
    }

    /// Whether a frame may be sent for this status. Void fixes are passed on as well; the
    /// autopilot gets best effort data rather than nothing.
    pub fn allows_frame(self) -> bool {
        matches!(self, FixStatus::Valid | FixStatus::Void)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NavigationState {
    /// True course over ground, degrees.
    pub track: f64,
    /// Knots.
    pub ground_speed: f64,
    /// Nautical miles, magnitude only.
    pub cross_track_error: f64,
    pub cross_track_direction: Direction,
    /// Degrees.
    pub desired_track: f64,
    /// Feet.
    pub altitude: f64,
    pub fix_status: FixStatus,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the fields owned by the sentence kind behind `update`. Absent values leave the
    /// previous value in place.
    pub fn apply(&mut self, update: &NavUpdate) {
        match update {
            NavUpdate::CrossTrack { error, direction } => {
                if let Some(error) = error {
                    self.cross_track_error = error.abs();
                }
                if let Some(direction) = direction {
                    self.cross_track_direction = *direction;
                }
            }
            NavUpdate::Course {
                track,
                ground_speed,
                fix_status,
                ..
            } => {
                if let Some(track) = track {
                    self.track = *track;
                }
                if let Some(ground_speed) = ground_speed {
                    self.ground_speed = *ground_speed;
                }
                // The gate needs the status of *this* fix, so it is always replaced.
                self.fix_status = *fix_status;
            }
            NavUpdate::DesiredTrack(desired) => {
                if let Some(desired) = desired {
                    self.desired_track = *desired;
                }
            }
            NavUpdate::Altitude(altitude) => {
                if let Some(altitude) = altitude {
                    self.altitude = *altitude;
                }
            }
        }
        debug!("navigation state: {:?}", self);
    }
}
