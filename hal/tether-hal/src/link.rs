//! Serial channel abstraction
//!
//! Provides the byte-oriented transport trait implemented by
//! platform-specific ports (hardware UART, Bluetooth bridge) and by test
//! doubles. Bit-rate and port setup belong to the implementor; the engine
//! only reads, writes, and flushes.

/// Byte-oriented serial channel
///
/// The engine polls [`available`](SerialLink::available) before reading,
/// so implementations may return `None` from [`read`](SerialLink::read)
/// without it being an error.
pub trait SerialLink {
    /// Error type for channel operations
    type Error;

    /// Write all bytes to the channel
    ///
    /// Blocks until the bytes are accepted by the port or an error occurs.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Number of bytes currently readable without blocking
    fn available(&self) -> usize;

    /// Read a single byte, if one is ready
    fn read(&mut self) -> Option<u8>;

    /// Push any buffered outbound bytes onto the wire
    fn flush(&mut self) -> Result<(), Self::Error>;
}
