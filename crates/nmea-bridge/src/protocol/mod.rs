pub mod gdc31;
pub mod nmea;

use crate::{nav::NavigationState, BridgeResult};

/// Trait implemented by autopilot protocols for encoding navigation state into a frame.
pub trait AutopilotMsg {
    fn from_state(state: &NavigationState) -> Self;
    fn to_bytes(&self) -> BridgeResult<Vec<u8>>;
}
