/// The translation loop: read a line, fold it into the navigation state, and on every RMC send
/// one autopilot frame.
///
/// Errors stop at the iteration boundary in [`Bridge::run`]. A bad line, a failed read or a failed
/// write is logged and the loop carries on with the next line; the autopilot is better served by
/// a steady (if sometimes stale) feed than by a bridge that gives up. Only the shutdown flag ends
/// the loop.
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use chrono::{NaiveTime, Utc};
use tracing::{debug, error, info, warn};

use crate::{
    config::BridgeConfig,
    extract::{extract, NavUpdate, SentenceKind},
    nav::NavigationState,
    protocol::{gdc31::Gdc31Frame, nmea, AutopilotMsg},
    transport::Transport,
    BridgeResult, Error,
};

/// Longest uninterrupted sleep while waiting to retry, so shutdown stays responsive.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// No transport yet.
    AwaitingPort,
    /// Transport up, no usable fix on the last RMC.
    AwaitingFix,
    /// Frames are going out.
    Streaming,
}

/// What became of one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing read, or not an NMEA sentence (noise, line fragments).
    NotApplicable,
    /// A well formed sentence of a kind the bridge does not use.
    Ignored,
    /// Navigation state updated, nothing to send.
    Updated(SentenceKind),
    /// An RMC arrived. `frame` is `None` when its fix status closed the gate.
    Trigger {
        time: Option<NaiveTime>,
        frame: Option<Vec<u8>>,
    },
}

/// Handle one raw line against `state`. This is the whole protocol translation; it performs no
/// I/O.
pub fn translate(state: &mut NavigationState, raw: &[u8]) -> BridgeResult<Outcome> {
    // Line noise is often not even UTF-8, so look for the `$` before decoding.
    if raw.first() != Some(&b'$') {
        return Ok(Outcome::NotApplicable);
    }
    let line = std::str::from_utf8(raw)?.trim_end();

    let sentence = nmea::parse(line)?;
    let (kind, update) = extract(&sentence);
    if kind.requires_checksum() && sentence.checksum.is_none() {
        return Err(Error::MissingChecksum(kind));
    }
    let Some(update) = update else {
        return Ok(Outcome::Ignored);
    };
    state.apply(&update);

    match update {
        NavUpdate::Course { time, .. } => {
            let frame = if state.fix_status.allows_frame() {
                Some(Gdc31Frame::from_state(state).to_bytes()?)
            } else {
                None
            };
            Ok(Outcome::Trigger { time, frame })
        }
        _ => Ok(Outcome::Updated(kind)),
    }
}

/// Owns the navigation state and the link state for the lifetime of the process.
pub struct Bridge {
    state: NavigationState,
    link: LinkState,
    simulation: bool,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            state: NavigationState::new(),
            link: LinkState::AwaitingPort,
            simulation: config.simulation,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    fn set_link(&mut self, link: LinkState) {
        if link != self.link {
            info!("link {:?} -> {:?}", self.link, link);
            self.link = link;
        }
    }

    /// Open the transport with [`retry_open`]. `None` only if shutdown was requested first.
    pub fn connect<T>(
        &mut self,
        open: impl FnMut() -> BridgeResult<T>,
        interval: Duration,
        shutdown: &AtomicBool,
    ) -> Option<T> {
        self.set_link(LinkState::AwaitingPort);
        let transport = retry_open(open, interval, shutdown)?;
        self.set_link(LinkState::AwaitingFix);
        Some(transport)
    }

    /// One loop iteration: at most one line read and one frame written.
    pub fn step<T: Transport>(&mut self, transport: &mut T) -> BridgeResult<Outcome> {
        let Some(raw) = transport.read_line()? else {
            return Ok(Outcome::NotApplicable);
        };
        let outcome = translate(&mut self.state, &raw)?;

        if let Outcome::Trigger { time, frame } = &outcome {
            info!("--------------------------------");
            if self.simulation {
                info!("Time: {}", Utc::now().format("%H:%M:%S"));
            } else {
                match time {
                    Some(time) => info!("Time: {}", time),
                    None => info!("Time: unknown"),
                }
            }
            debug!("Altitude: {}", self.state.altitude);
            match frame {
                Some(bytes) => {
                    transport.write_bytes(bytes)?;
                    debug!("{} bytes sent to autopilot", bytes.len());
                    self.set_link(LinkState::Streaming);
                }
                None => {
                    info!("waiting for GPS data ({:?} fix)", self.state.fix_status);
                    self.set_link(LinkState::AwaitingFix);
                }
            }
        }
        Ok(outcome)
    }

    /// Run until `shutdown` is set. The transport is only borrowed; dropping it afterwards
    /// releases the port.
    pub fn run<T: Transport>(&mut self, transport: &mut T, shutdown: &AtomicBool) {
        if self.link == LinkState::AwaitingPort {
            self.set_link(LinkState::AwaitingFix);
        }
        info!("waiting for GPS data");
        while !shutdown.load(Ordering::SeqCst) {
            match self.step(transport) {
                Ok(_) => {}
                Err(e) if e.is_sentence_failure() => warn!("NMEA sentence rejected: {}", e),
                Err(e) => error!("unexpected error: {}", e),
            }
        }
        info!("interrupted");
    }
}

/// Call `open` until it succeeds, waiting `interval` between attempts. There is no attempt limit
/// and no backoff. Returns `None` only if `shutdown` is set.
pub fn retry_open<T>(
    mut open: impl FnMut() -> BridgeResult<T>,
    interval: Duration,
    shutdown: &AtomicBool,
) -> Option<T> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return None;
        }
        match open() {
            Ok(transport) => return Some(transport),
            Err(e) => warn!("waiting for serial port: {}", e),
        }
        let deadline = Instant::now() + interval;
        loop {
            let now = Instant::now();
            if now >= deadline || shutdown.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(SHUTDOWN_POLL.min(deadline - now));
        }
    }
}
