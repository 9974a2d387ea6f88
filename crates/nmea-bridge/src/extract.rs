/// Field extraction: turns a parsed [`Sentence`] into the navigation update it carries.
///
/// Missing, empty or non numeric fields are routine (no cross-track data before a route is
/// active, for instance). They are reported as [`FieldError`] by the accessors and become "no
/// update" for that one field; the rest of the sentence is still used.
use chrono::NaiveTime;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    nav::{Direction, FixStatus},
    protocol::nmea::{Address, Sentence},
};

/// Why a field did not yield a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("field not present")]
    Absent,
    #[error("field is empty")]
    Empty,
    #[error("not a number: {0:?}")]
    NotNumeric(String),
    #[error("not a direction: {0:?}")]
    UnknownDirection(String),
}

/// Sentence kinds the bridge consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SentenceKind {
    /// `--RMB`, recommended minimum navigation information.
    MinimumNavigation,
    /// `--RMC`, recommended minimum course. Triggers a frame.
    MinimumCourse,
    /// `PGRMH`, Garmin desired track extension.
    DesiredTrack,
    /// `PGRMZ`, Garmin altitude extension.
    Altitude,
    Unrecognized,
}

impl SentenceKind {
    pub fn of(sentence: &Sentence) -> Self {
        match &sentence.address {
            Address::Talker { kind, .. } if kind == "RMB" => SentenceKind::MinimumNavigation,
            Address::Talker { kind, .. } if kind == "RMC" => SentenceKind::MinimumCourse,
            Address::Proprietary { manufacturer, kind } if manufacturer == "GRM" => {
                match kind.as_str() {
                    "H" => SentenceKind::DesiredTrack,
                    "Z" => SentenceKind::Altitude,
                    _ => SentenceKind::Unrecognized,
                }
            }
            _ => SentenceKind::Unrecognized,
        }
    }

    pub fn is_trigger(self) -> bool {
        self == SentenceKind::MinimumCourse
    }

    /// RMB and RMC must carry a `*hh` checksum, otherwise a line cut short in transit would
    /// still parse.
    pub fn requires_checksum(self) -> bool {
        matches!(
            self,
            SentenceKind::MinimumNavigation | SentenceKind::MinimumCourse
        )
    }
}

/// Garmin proprietary values, which are read by position rather than decoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GarminField {
    /// PGRMH position 7, degrees.
    DesiredTrack,
    /// PGRMZ position 1, feet.
    Altitude,
}

impl GarminField {
    pub fn index(self) -> usize {
        match self {
            GarminField::DesiredTrack => 7,
            GarminField::Altitude => 1,
        }
    }

    pub fn read(self, sentence: &Sentence) -> Result<f64, FieldError> {
        number(sentence.proprietary_field(self.index()))
    }
}

// RMB and RMC comma positions
const RMB_CROSS_TRACK_ERROR: usize = 1;
const RMB_CORRECTION_DIR: usize = 2;
const RMC_TIME: usize = 0;
const RMC_STATUS: usize = 1;
const RMC_LATITUDE: usize = 2;
const RMC_LONGITUDE: usize = 4;
const RMC_SPEED_OVER_GROUND: usize = 6;
const RMC_TRUE_COURSE: usize = 7;

/// What one sentence contributes to the navigation state.
#[derive(Debug, Clone, PartialEq)]
pub enum NavUpdate {
    CrossTrack {
        error: Option<f64>,
        direction: Option<Direction>,
    },
    Course {
        track: Option<f64>,
        ground_speed: Option<f64>,
        fix_status: FixStatus,
        /// UTC time of fix, only used for reporting.
        time: Option<NaiveTime>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
    DesiredTrack(Option<f64>),
    Altitude(Option<f64>),
}

/// Classify `sentence` and pull out the relevant fields. Unrecognized kinds carry no update.
pub fn extract(sentence: &Sentence) -> (SentenceKind, Option<NavUpdate>) {
    let kind = SentenceKind::of(sentence);
    let update = match kind {
        SentenceKind::MinimumNavigation => {
            let error = number(sentence.field(RMB_CROSS_TRACK_ERROR));
            let direction = direction(sentence.field(RMB_CORRECTION_DIR));
            debug!("Cross error: {:?}", error);
            debug!("Cross direction: {:?}", direction);
            NavUpdate::CrossTrack {
                error: usable("cross track error", error),
                direction: usable("correction direction", direction),
            }
        }
        SentenceKind::MinimumCourse => {
            let fix_status = FixStatus::from_field(sentence.field(RMC_STATUS).unwrap_or(""));
            let ground_speed = number(sentence.field(RMC_SPEED_OVER_GROUND));
            let track = number(sentence.field(RMC_TRUE_COURSE));
            let latitude = coordinate(sentence, RMC_LATITUDE);
            let longitude = coordinate(sentence, RMC_LONGITUDE);
            debug!("Fix status: {:?}", fix_status);
            debug!("Latitude: {:?}", latitude);
            debug!("Longitude: {:?}", longitude);
            debug!("Speed: {:?}", ground_speed);
            debug!("Track: {:?}", track);
            NavUpdate::Course {
                track: usable("true course", track),
                ground_speed: usable("speed over ground", ground_speed),
                fix_status,
                time: sentence.field(RMC_TIME).and_then(fix_time),
                latitude,
                longitude,
            }
        }
        SentenceKind::DesiredTrack => {
            let desired = GarminField::DesiredTrack.read(sentence);
            debug!("Desired track: {:?}", desired);
            NavUpdate::DesiredTrack(usable("desired track", desired))
        }
        SentenceKind::Altitude => {
            let altitude = GarminField::Altitude.read(sentence);
            debug!("Altitude: {:?}", altitude);
            NavUpdate::Altitude(usable("altitude", altitude))
        }
        SentenceKind::Unrecognized => {
            trace!("ignoring sentence {:?}", sentence.address);
            return (kind, None);
        }
    };
    (kind, Some(update))
}

fn usable<T>(name: &str, value: Result<T, FieldError>) -> Option<T> {
    value
        .map_err(|e| trace!("no update for {}: {}", name, e))
        .ok()
}

fn present(field: Option<&str>) -> Result<&str, FieldError> {
    match field {
        None => Err(FieldError::Absent),
        Some("") => Err(FieldError::Empty),
        Some(text) => Ok(text),
    }
}

fn number(field: Option<&str>) -> Result<f64, FieldError> {
    let text = present(field)?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FieldError::NotNumeric(text.to_string())),
    }
}

fn direction(field: Option<&str>) -> Result<Direction, FieldError> {
    let text = present(field)?;
    Direction::from_field(text).ok_or_else(|| FieldError::UnknownDirection(text.to_string()))
}

/// `hhmmss[.sss]`
fn fix_time(field: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(field.get(..6)?, "%H%M%S").ok()
}

/// `[d]ddmm.mmmm` plus hemisphere in the following field, as signed decimal degrees.
fn coordinate(sentence: &Sentence, index: usize) -> Option<f64> {
    let value = number(sentence.field(index)).ok()?;
    let degrees = (value / 100.0).floor();
    let decimal = degrees + (value - degrees * 100.0) / 60.0;
    match sentence.field(index + 1)? {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{lazy_init_tracing, protocol::nmea::parse};

    fn extract_line(line: &str) -> Option<NavUpdate> {
        extract(&parse(line).unwrap()).1
    }

    #[test]
    fn test_classify() {
        let test_cases = [
            ("$GPRMB,A,0.66,L*75", SentenceKind::MinimumNavigation),
            ("$GPRMC,123519,A", SentenceKind::MinimumCourse),
            ("$GNRMC,123519,A", SentenceKind::MinimumCourse),
            ("$PGRMH,A,-4", SentenceKind::DesiredTrack),
            ("$PGRMZ,93,f,3*21", SentenceKind::Altitude),
            ("$PGRME,15.0,M", SentenceKind::Unrecognized),
            ("$PSRFZ,1,2", SentenceKind::Unrecognized),
            ("$GPGGA,123519", SentenceKind::Unrecognized),
        ];
        for (line, kind) in test_cases.iter() {
            let sentence = parse(line).unwrap();
            assert_eq!(SentenceKind::of(&sentence), *kind, "{}", line);
            assert_eq!(extract(&sentence).0, *kind, "{}", line);
        }
    }

    #[test]
    fn test_checksum_required_for_rmb_and_rmc_only() {
        let test_cases = [
            (SentenceKind::MinimumNavigation, true),
            (SentenceKind::MinimumCourse, true),
            (SentenceKind::DesiredTrack, false),
            (SentenceKind::Altitude, false),
            (SentenceKind::Unrecognized, false),
        ];
        for (kind, required) in test_cases.iter() {
            assert_eq!(kind.requires_checksum(), *required, "{:?}", kind);
        }
    }

    #[test]
    fn test_extract_rmb() {
        lazy_init_tracing();
        let update =
            extract_line("$GPRMB,A,0.66,L,003,004,4917.24,N,12309.57,W,001.3,052.5,000.5,V*20");
        assert_eq!(
            update,
            Some(NavUpdate::CrossTrack {
                error: Some(0.66),
                direction: Some(Direction::Left)
            })
        );
        let update =
            extract_line("$GPRMB,A,,,003,004,4917.24,N,12309.57,W,001.3,052.5,000.5,V*72");
        assert_eq!(
            update,
            Some(NavUpdate::CrossTrack {
                error: None,
                direction: None
            })
        );
    }

    #[test]
    fn test_extract_rmc() {
        let update =
            extract_line("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A")
                .unwrap();
        let NavUpdate::Course {
            track,
            ground_speed,
            fix_status,
            time,
            latitude,
            longitude,
        } = update
        else {
            panic!("expected course update, got {update:?}");
        };
        assert_eq!(track, Some(84.4));
        assert_eq!(ground_speed, Some(22.4));
        assert_eq!(fix_status, FixStatus::Valid);
        assert_eq!(time, NaiveTime::from_hms_opt(12, 35, 19));
        assert!((latitude.unwrap() - 48.1173).abs() < 1e-4);
        assert!((longitude.unwrap() - 11.516_667).abs() < 1e-4);
    }

    #[test]
    fn test_extract_rmc_short_sentence() {
        // truncated line, e.g. a read that timed out part way through
        let update = extract_line("$GPRMC,12").unwrap();
        assert_eq!(
            update,
            NavUpdate::Course {
                track: None,
                ground_speed: None,
                fix_status: FixStatus::Unknown,
                time: None,
                latitude: None,
                longitude: None,
            }
        );
    }

    #[test]
    fn test_extract_garmin_fields() {
        assert_eq!(
            extract_line("$PGRMH,A,-4,,,,0,260.4,285.5*22"),
            Some(NavUpdate::DesiredTrack(Some(260.4)))
        );
        assert_eq!(
            extract_line("$PGRMZ,2282,f,3*21"),
            Some(NavUpdate::Altitude(Some(2282.0)))
        );
        // too few fields for position 7
        assert_eq!(
            extract_line("$PGRMH,A,-4"),
            Some(NavUpdate::DesiredTrack(None))
        );
        assert_eq!(extract_line("$PGRMZ,,f,3"), Some(NavUpdate::Altitude(None)));
        assert_eq!(extract_line("$PGRME,15.0,M"), None);
    }

    #[test]
    fn test_field_errors() {
        let sentence = parse("$PGRMZ,high,f,3").unwrap();
        assert_eq!(
            GarminField::Altitude.read(&sentence),
            Err(FieldError::NotNumeric("high".into()))
        );
        let sentence = parse("$PGRMH,A").unwrap();
        assert_eq!(
            GarminField::DesiredTrack.read(&sentence),
            Err(FieldError::Absent)
        );
        assert_eq!(number(Some("")), Err(FieldError::Empty));
        assert_eq!(number(Some("nan")), Err(FieldError::NotNumeric("nan".into())));
        assert_eq!(number(Some("inf")), Err(FieldError::NotNumeric("inf".into())));
        assert_eq!(
            direction(Some("X")),
            Err(FieldError::UnknownDirection("X".into()))
        );
    }

    #[test]
    fn test_one_bad_field_does_not_spoil_the_sentence() {
        let update = extract_line("$GPRMB,A,abc,R").unwrap();
        assert_eq!(
            update,
            NavUpdate::CrossTrack {
                error: None,
                direction: Some(Direction::Right)
            }
        );
    }
}
