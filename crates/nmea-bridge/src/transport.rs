/// Line transports: the serial link to the receiver / autopilot, and the canned replay used when
/// no hardware is attached.
use std::{
    io::{self, BufRead, BufReader, Read, Write},
    thread,
    time::Duration,
};

use serialport::SerialPort;
use tracing::{debug, info};

use crate::{config::BridgeConfig, BridgeResult};

/// What the translation loop needs from a link.
pub trait Transport {
    /// Read one line, terminator included. `None` when nothing arrived before the timeout.
    fn read_line(&mut self) -> BridgeResult<Option<Vec<u8>>>;
    fn write_bytes(&mut self, bytes: &[u8]) -> BridgeResult<()>;
}

/// Line transport over a serial port, or anything else that reads and writes bytes with a
/// read timeout.
pub struct SerialTransport<P = Box<dyn SerialPort>> {
    port: BufReader<P>,
}

impl SerialTransport {
    pub fn open(config: &BridgeConfig) -> BridgeResult<Self> {
        let port = serialport::new(&config.device, config.baud_rate)
            .timeout(config.read_timeout)
            .open()?;
        info!("opened {} @ {} baud", config.device, config.baud_rate);
        Ok(Self::from_port(port))
    }
}

impl<P: Read + Write> SerialTransport<P> {
    pub fn from_port(port: P) -> Self {
        Self {
            port: BufReader::new(port),
        }
    }
}

impl<P: Read + Write> Transport for SerialTransport<P> {
    fn read_line(&mut self) -> BridgeResult<Option<Vec<u8>>> {
        let mut line = Vec::new();
        match self.port.read_until(b'\n', &mut line) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }
        // A line cut off by the timeout can still parse, with its last field truncated.
        if line.last() != Some(&b'\n') {
            if !line.is_empty() {
                debug!("dropping unterminated fragment {}", line.escape_ascii());
            }
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> BridgeResult<()> {
        let port = self.port.get_mut();
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }
}

/// RMB, RMC and PGRMH sentences replayed in simulation.
pub const SIMULATION_SENTENCES: [&str; 3] = [
    "$GPRMB,A,0.66,L,003,004,4917.24,N,12309.57,W,001.3,052.5,000.5,V*20",
    "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A",
    "$PGRMH,A,-4,,,,0,260.4,285.5*22",
];

/// Stands in for the serial port: cycles through [`SIMULATION_SENTENCES`], holding each one for
/// a while, and logs outgoing frames instead of sending them.
pub struct Replay {
    next: usize,
    hold: Duration,
}

impl Replay {
    pub fn new(hold: Duration) -> Self {
        Self { next: 0, hold }
    }
}

impl Transport for Replay {
    fn read_line(&mut self) -> BridgeResult<Option<Vec<u8>>> {
        thread::sleep(self.hold);
        let line = SIMULATION_SENTENCES[self.next];
        self.next = (self.next + 1) % SIMULATION_SENTENCES.len();
        debug!("replaying {}", line);
        Ok(Some(line.as_bytes().to_vec()))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> BridgeResult<()> {
        info!("simulation is running, frame: {}", bytes.escape_ascii());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;

    use super::*;
    use crate::{lazy_init_tracing, protocol::nmea::parse, Error};

    #[test]
    fn test_replay_cycles_in_order() {
        lazy_init_tracing();
        let mut replay = Replay::new(Duration::ZERO);
        for _ in 0..2 {
            for expected in SIMULATION_SENTENCES.iter() {
                let line = replay.read_line().unwrap().unwrap();
                assert_eq!(line, expected.as_bytes());
            }
        }
        assert!(replay.write_bytes(b"\x02C084\r\x03").is_ok());
    }

    #[test]
    fn test_simulation_sentences_are_well_formed() {
        for line in SIMULATION_SENTENCES.iter() {
            let sentence = parse(line);
            assert!(sentence.is_ok(), "{}: {:?}", line, sentence);
        }
    }

    /// Serves its chunks one read at a time, then times out. Records writes.
    struct TimedPort {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
    }

    impl TimedPort {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                written: Vec::new(),
            }
        }
    }

    impl Read for TimedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(mut chunk) = self.chunks.pop_front() else {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
            };
            if chunk.len() > buf.len() {
                self.chunks.push_front(chunk.split_off(buf.len()));
            }
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    impl Write for TimedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_line_returns_complete_lines() {
        lazy_init_tracing();
        let mut transport = SerialTransport::from_port(TimedPort::new(&[
            b"$GPRMB,A,0.66,L*75\r\n$GPRMC,1",
            b"23519,A*07\r\n",
        ]));
        assert_eq!(
            transport.read_line().unwrap(),
            Some(b"$GPRMB,A,0.66,L*75\r\n".to_vec())
        );
        assert_eq!(
            transport.read_line().unwrap(),
            Some(b"$GPRMC,123519,A*07\r\n".to_vec())
        );
        assert_eq!(transport.read_line().unwrap(), None);
    }

    #[test]
    fn test_read_line_drops_fragment_on_timeout() {
        lazy_init_tracing();
        let mut transport = SerialTransport::from_port(TimedPort::new(&[
            b"$GPRMC,123519,A,4807.038,N,01131.000,E,02",
        ]));
        assert_eq!(transport.read_line().unwrap(), None);
        // nothing left over to be glued onto the next read
        assert_eq!(transport.read_line().unwrap(), None);
    }

    #[test]
    fn test_read_line_io_error() {
        struct Unplugged;
        impl Read for Unplugged {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            }
        }
        impl Write for Unplugged {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut transport = SerialTransport::from_port(Unplugged);
        assert!(matches!(transport.read_line(), Err(Error::Io(_))));
    }

    #[test]
    fn test_write_bytes() {
        let mut transport = SerialTransport::from_port(TimedPort::new(&[]));
        transport.write_bytes(b"\x02C084\r\x03").unwrap();
        assert_eq!(transport.port.get_ref().written, b"\x02C084\r\x03");
    }

    #[test]
    fn test_open_missing_device() {
        let config = BridgeConfig::default().with_device("/dev/nmea-bridge-no-such-port");
        let res = SerialTransport::open(&config);
        assert!(matches!(res, Err(Error::PortOpen(_))));
    }
}
