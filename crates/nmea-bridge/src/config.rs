/// Operational parameters of the bridge.
use std::time::Duration;

pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(200);
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_SIMULATION_HOLD: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Serial device the receiver and the autopilot are wired to.
    pub device: String,
    pub baud_rate: u32,
    /// Upper bound on a single line read.
    pub read_timeout: Duration,
    /// Log every extracted field and frame.
    pub debug: bool,
    /// Replay canned sentences instead of opening the serial port.
    pub simulation: bool,
    /// Wait between attempts to open the serial port.
    pub retry_interval: Duration,
    /// How long each replayed sentence is held in simulation.
    pub simulation_hold: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            debug: false,
            simulation: false,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            simulation_hold: DEFAULT_SIMULATION_HOLD,
        }
    }
}

impl BridgeConfig {
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = device.to_string();
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_simulation(mut self, simulation: bool) -> Self {
        self.simulation = simulation;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_simulation_hold(mut self, simulation_hold: Duration) -> Self {
        self.simulation_hold = simulation_hold;
        self
    }
}
