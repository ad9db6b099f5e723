//! Internal receive buffer for the line-oriented serial stream.

use super::RecvError;
use std::io;

/// Size of the internal buffer. Station responses are short lines, so
/// this comfortably holds many of them.
const RXBUF_SIZE: usize = 2048;

/// Accumulates raw bytes read from the serial device, so that a line
/// split across multiple reads can be reassembled.
pub struct RxBuf {
    /// Valid data (possibly none) lives in `buf[start..end]`.
    buf: [u8; RXBUF_SIZE],
    start: usize,
    end: usize,
}

impl RxBuf {
    /// Returns an empty `RxBuf`.
    pub fn new() -> RxBuf {
        RxBuf {
            buf: [0; RXBUF_SIZE],
            start: 0,
            end: 0,
        }
    }

    /// Returns whether or not this buffer is empty.
    pub fn empty(&self) -> bool {
        self.start == self.end
    }

    /// Amount of buffered data, in bytes.
    pub fn size(&self) -> usize {
        self.end - self.start
    }

    /// Returns whether the buffer is completely full. A refill cannot
    /// make progress until data is consumed or flushed, so callers must
    /// drain a full buffer instead of refilling it.
    pub fn full(&self) -> bool {
        self.size() == RXBUF_SIZE
    }

    /// The buffered data.
    pub fn data(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Discards `len` bytes off the front of the buffered data.
    /// `len` must be at most `size()`.
    pub fn consume(&mut self, len: usize) {
        if len > self.size() {
            panic!("consumed past the end of buffered data");
        }
        self.start += len;
    }

    /// Discards the entire buffer content.
    pub fn flush(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// Moves the buffered data to the front of the backing array.
    fn compact(&mut self) {
        if self.start != 0 {
            let len = self.size();
            self.buf.copy_within(self.start..self.end, 0);
            self.start = 0;
            self.end = len;
        }
    }

    /// Refills the buffer from `reader` as much as possible with a single
    /// read. A read timeout maps to `RecvError::NotReady`; a zero-length
    /// read means the device went away.
    pub fn refill<T: io::Read>(&mut self, reader: &mut T) -> Result<(), RecvError> {
        self.compact();
        match reader.read(&mut self.buf[self.end..]) {
            Ok(size) => {
                if size > 0 {
                    self.end += size;
                    Ok(())
                } else {
                    Err(RecvError::Disconnected)
                }
            }
            Err(e) => match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Err(RecvError::NotReady),
                _ => Err(RecvError::IO(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn refill_and_consume() {
        let mut buf = RxBuf::new();
        assert!(buf.empty());
        let mut src = Cursor::new(b"OK\r\n".to_vec());
        buf.refill(&mut src).unwrap();
        assert_eq!(buf.size(), 4);
        assert_eq!(buf.data(), b"OK\r\n");
        buf.consume(3);
        assert_eq!(buf.data(), b"\n");
        buf.consume(1);
        assert!(buf.empty());
    }

    #[test]
    fn refill_compacts_before_reading() {
        let mut buf = RxBuf::new();
        let mut first = Cursor::new(b"partial".to_vec());
        buf.refill(&mut first).unwrap();
        buf.consume(4);
        let mut second = Cursor::new(b" line\n".to_vec());
        buf.refill(&mut second).unwrap();
        assert_eq!(buf.data(), b"ial line\n");
    }

    #[test]
    fn zero_read_is_disconnect() {
        let mut buf = RxBuf::new();
        let mut src = Cursor::new(Vec::new());
        assert!(matches!(buf.refill(&mut src), Err(RecvError::Disconnected)));
    }

    #[test]
    fn timeout_is_not_ready() {
        struct TimesOut;
        impl io::Read for TimesOut {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::TimedOut))
            }
        }
        let mut buf = RxBuf::new();
        assert!(matches!(
            buf.refill(&mut TimesOut),
            Err(RecvError::NotReady)
        ));
    }

    #[test]
    fn fills_to_capacity() {
        let mut buf = RxBuf::new();
        let mut src = Cursor::new(vec![b'A'; 2 * RXBUF_SIZE]);
        buf.refill(&mut src).unwrap();
        assert!(buf.full());
        assert_eq!(buf.size(), RXBUF_SIZE);
        buf.consume(1);
        assert!(!buf.full());
    }

    #[test]
    fn flush_discards_everything() {
        let mut buf = RxBuf::new();
        let mut src = Cursor::new(b"stale".to_vec());
        buf.refill(&mut src).unwrap();
        buf.flush();
        assert!(buf.empty());
    }

    #[test]
    #[should_panic]
    fn overconsume_panics() {
        let mut buf = RxBuf::new();
        buf.consume(1);
    }
}
