use crate::{
    nav::{Direction, NavigationState},
    BridgeResult, Error,
};

use super::AutopilotMsg;

/// Navigation frame for the DAC GDC31 autopilot head.
///
/// The frame is a run of ASCII items, each an identifier letter, a fixed width zero padded
/// value and a CR, wrapped in STX / ETX:
///
/// ```text
/// <STX>C ddd <CR>D sss <CR>G Rnnnn <CR>I dddd <CR>z aaaaa <CR><ETX>
/// ```
///
/// | id | width | value |
/// |----|-------|-------|
/// | C  | 3     | track, degrees |
/// | D  | 3     | ground speed, knots |
/// | G  | 1+4   | steer letter, cross track error in 1/100 nm |
/// | I  | 4     | desired track, 1/10 degree |
/// | z  | 5     | altitude, feet (not used by the GDC31 itself) |
///
/// The steer letter is the opposite of the receiver's correction direction: a receiver
/// `L` is sent as `R` and vice versa. With no direction the letter is left out.
/// Values are rounded, never clamped; a value wider than its field simply takes more digits.
#[derive(Debug, Clone, PartialEq)]
pub struct Gdc31Frame {
    pub track: f64,
    pub ground_speed: f64,
    pub cross_track_direction: Direction,
    pub cross_track_error: f64,
    pub desired_track: f64,
    pub altitude: f64,
}

pub const STX: char = '\u{02}';
pub const ETX: char = '\u{03}';

impl Gdc31Frame {
    /// Frame text before byte encoding.
    pub fn compose(&self) -> String {
        let mut frame = String::with_capacity(32);
        frame.push(STX);
        frame.push_str(&format!("C{:03.0}\r", self.track));
        frame.push_str(&format!("D{:03.0}\r", self.ground_speed));
        frame.push_str(&format!(
            "G{}{:04.0}\r",
            steer_letter(self.cross_track_direction),
            self.cross_track_error * 100.0
        ));
        frame.push_str(&format!("I{:04.0}\r", self.desired_track * 10.0));
        frame.push_str(&format!("z{:05.0}\r", self.altitude));
        frame.push(ETX);
        frame
    }
}

impl AutopilotMsg for Gdc31Frame {
    fn from_state(state: &NavigationState) -> Self {
        Self {
            track: state.track,
            ground_speed: state.ground_speed,
            cross_track_direction: state.cross_track_direction,
            cross_track_error: state.cross_track_error,
            desired_track: state.desired_track,
            altitude: state.altitude,
        }
    }

    fn to_bytes(&self) -> BridgeResult<Vec<u8>> {
        latin1(&self.compose())
    }
}

fn steer_letter(direction: Direction) -> &'static str {
    match direction {
        Direction::Left => "R",
        Direction::Right => "L",
        Direction::None => "",
    }
}

/// One byte per character. Anything above U+00FF is an error rather than being mangled.
pub fn latin1(text: &str) -> BridgeResult<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(c).map_err(|_| Error::Encoding(c)))
        .collect()
}
