//! Serial link to the lock station.
//!
//! The link is line oriented: outbound commands are terminated with CRLF,
//! and the station replies with newline-delimited text which is displayed
//! verbatim. Writes happen on the caller's thread; reception runs on a
//! single background thread (`spawn_reader`) which hands complete lines
//! to the UI over a crossbeam channel, so the UI is never touched from
//! the reader thread directly.

mod rxbuf;

use crossbeam::channel;
use rxbuf::RxBuf;
use serialport::SerialPort;
use std::io;
use std::io::Write;
use std::thread;
use std::time::Duration;

/// Possible errors when opening the link.
#[derive(Debug)]
pub enum OpenError {
    /// The device could not be opened: missing, busy, or bad permissions.
    /// Fatal at startup; there is no fallback port.
    PortUnavailable(serialport::Error),
}

/// Possible errors when sending a command.
#[derive(Debug)]
pub enum SendError {
    /// Issue with the underlying IO operation. Recovered by the caller:
    /// logged with the offending command, flow continues.
    IO(io::Error),
}

/// Possible errors when receiving a line.
#[derive(Debug)]
pub enum RecvError {
    /// No complete line arrived within the read timeout.
    NotReady,
    /// The device went away.
    Disconnected,
    /// Low level IO error.
    IO(io::Error),
}

/// One handle onto the station's serial device.
///
/// The device tolerates interleaved use of two handles, one writing and
/// one reading, which is how the panel splits work between the UI thread
/// and the reader thread (see `try_clone`).
pub struct Channel {
    port: Box<dyn SerialPort>,
    rxbuf: RxBuf,
}

impl Channel {
    /// Opens the serial device at the given rate. `read_timeout` bounds
    /// every blocking read and sets the reception cadence of the reader
    /// thread.
    pub fn open(
        port_name: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<Channel, OpenError> {
        let port = serialport::new(port_name, baud)
            .timeout(read_timeout)
            .open()
            .map_err(OpenError::PortUnavailable)?;
        Ok(Channel {
            port,
            rxbuf: RxBuf::new(),
        })
    }

    /// Returns a second handle onto the same device, with its own receive
    /// buffer.
    pub fn try_clone(&self) -> Result<Channel, OpenError> {
        let port = self.port.try_clone().map_err(OpenError::PortUnavailable)?;
        Ok(Channel {
            port,
            rxbuf: RxBuf::new(),
        })
    }

    /// Sends a command, appending the CRLF terminator the station expects.
    pub fn write_command(&mut self, command: &str) -> Result<(), SendError> {
        let mut raw = Vec::with_capacity(command.len() + 2);
        raw.extend_from_slice(command.as_bytes());
        raw.extend_from_slice(b"\r\n");
        self.port.write_all(&raw).map_err(SendError::IO)?;
        self.port.flush().map_err(SendError::IO)
    }

    /// Non-blocking check for unread data, either already buffered or
    /// still sitting in the device.
    pub fn has_data(&self) -> bool {
        pending_data(!self.rxbuf.empty(), self.port.bytes_to_read())
    }

    /// Blocks until a terminated line is available, or the read timeout
    /// elapses (`RecvError::NotReady`). Bare terminators are skipped, so
    /// a returned line is never empty.
    pub fn read_line(&mut self) -> Result<String, RecvError> {
        match next_line(&mut self.rxbuf, &mut self.port) {
            Ok(line) => Ok(line),
            Err(RecvError::NotReady) => Err(RecvError::NotReady),
            Err(err) => {
                // Partial data from before the failure is stale by the
                // time the device comes back.
                self.rxbuf.flush();
                Err(err)
            }
        }
    }
}

/// Decision behind `has_data`: bytes already buffered count as unread
/// data, and a device that cannot even report its rx count has nothing
/// readable to offer.
fn pending_data(buffered: bool, device_bytes: Result<u32, serialport::Error>) -> bool {
    buffered || matches!(device_bytes, Ok(n) if n > 0)
}

/// Pulls one line out of the buffer, refilling from `reader` as needed.
/// A line longer than the buffer can never see its terminator, so a full
/// buffer is handed over as one oversized chunk rather than stalling
/// reception.
fn next_line<T: io::Read>(buf: &mut RxBuf, reader: &mut T) -> Result<String, RecvError> {
    loop {
        if let Some(line) = take_line(buf) {
            return Ok(line);
        }
        if buf.full() {
            let chunk = String::from_utf8_lossy(buf.data()).to_string();
            buf.flush();
            return Ok(chunk);
        }
        buf.refill(reader)?;
    }
}

/// Extracts the first terminated line from the buffer, consuming it along
/// with any leading bare terminators. An unterminated tail stays buffered
/// for the next refill.
fn take_line(buf: &mut RxBuf) -> Option<String> {
    let mut start = 0;
    let mut found: Option<(String, usize)> = None;
    {
        let data = buf.data();
        for (offset, &byte) in data.iter().enumerate() {
            if byte == b'\n' || byte == b'\r' {
                if offset > start {
                    found = Some((
                        String::from_utf8_lossy(&data[start..offset]).to_string(),
                        offset + 1,
                    ));
                    break;
                }
                start = offset + 1;
            }
        }
    }
    match found {
        Some((line, consumed)) => {
            buf.consume(consumed);
            Some(line)
        }
        None => {
            buf.consume(start);
            None
        }
    }
}

/// What the reader thread hands to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxEvent {
    /// A line received from the station, trimmed of surrounding
    /// whitespace and never empty.
    Line(String),
    /// A read attempt failed. The link stays up and the reader keeps
    /// trying, so the station reappearing mid-session resumes reception.
    Error(String),
}

/// Holdoff between read attempts after an error, so a dead device does
/// not flood the log.
const ERROR_HOLDOFF: Duration = Duration::from_secs(1);

/// Queue depth towards the UI. Station output is sparse; if the UI falls
/// this far behind, blocking the reader is the right behavior.
const RX_QUEUE_DEPTH: usize = 64;

/// Starts the perpetual background reader for this channel. Runs for the
/// life of the process; the thread only exits once every receiver has
/// been dropped. The read timeout of the channel provides the loop
/// cadence, there is no polling. Failing to start the thread would leave
/// the receive path dead, so it is an error the caller must handle.
pub fn spawn_reader(mut chan: Channel) -> io::Result<channel::Receiver<RxEvent>> {
    let (tx, rx) = channel::bounded::<RxEvent>(RX_QUEUE_DEPTH);
    thread::Builder::new()
        .name("lockstation-rx".to_string())
        .spawn(move || reader_loop(&tx, ERROR_HOLDOFF, move || chan.read_line()))?;
    Ok(rx)
}

/// Body of the reader thread: forwards trimmed non-empty lines, reports
/// failed reads and keeps going after `holdoff`, and stops once the
/// receiving side is gone.
fn reader_loop<F>(tx: &channel::Sender<RxEvent>, holdoff: Duration, mut read: F)
where
    F: FnMut() -> Result<String, RecvError>,
{
    loop {
        match read() {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if tx.send(RxEvent::Line(trimmed.to_string())).is_err() {
                    break;
                }
            }
            Err(RecvError::NotReady) => continue,
            Err(err) => {
                if tx.send(RxEvent::Error(format!("{:?}", err))).is_err() {
                    break;
                }
                thread::sleep(holdoff);
            }
        }
    }
}
