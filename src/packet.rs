//! Sequential binary packet builder
//!
//! [`PacketBuilder`] writes structured application messages into a
//! fixed-capacity buffer, little-endian throughout. It is independent of the
//! host layer; the finalized range is handed to the raw send path.

use bytes::Bytes;

/// A sequential writer over a fixed-capacity byte buffer.
///
/// Every `write_*` advances the cursor by the encoded width and returns the
/// builder for chaining. The finalized packet is the range `[0, cursor)`,
/// never the full capacity. `reset()` rewinds the cursor without
/// reallocating, so one builder can be reused across packets.
///
/// # Panics
///
/// Writing past capacity panics. The builder must be sized for the largest
/// anticipated message; overflow is a caller sizing bug, not a runtime fault
/// to recover from.
///
/// ```
/// use enet_tokio::PacketBuilder;
///
/// let mut builder = PacketBuilder::new(64);
/// builder
///     .write_u8(2)
///     .write_u32(0xdead_beef)
///     .write_str("action|log\n");
/// assert_eq!(builder.packet_data().len(), 16);
/// ```
#[derive(Debug)]
pub struct PacketBuilder {
    buf: Box<[u8]>,
    cursor: usize,
}

impl PacketBuilder {
    /// Create a builder with the given fixed capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> &mut Self {
        let end = self.cursor + bytes.len();
        assert!(
            end <= self.buf.len(),
            "packet builder capacity exceeded: {} + {} > {}",
            self.cursor,
            bytes.len(),
            self.buf.len()
        );
        self.buf[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        self
    }

    /// Write an unsigned 8-bit integer
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.put(&[value])
    }

    /// Write an unsigned 16-bit integer, little-endian
    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    /// Write an unsigned 32-bit integer, little-endian
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    /// Write a 32-bit float, little-endian
    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    /// Write a 64-bit float, little-endian
    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    /// Write UTF-8 text, unframed
    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.put(value.as_bytes())
    }

    /// Write a raw byte sequence
    pub fn write_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.put(value)
    }

    /// The finalized packet: the byte range `[0, cursor)`
    pub fn packet_data(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Copy the finalized packet into a [`Bytes`] for sending
    pub fn as_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.packet_data())
    }

    /// Rewind the cursor to zero, keeping the allocation
    pub fn reset(&mut self) -> &mut Self {
        self.cursor = 0;
        self
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Whether nothing has been written since creation or the last reset
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Fixed capacity chosen at construction
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Capacity left before a write panics
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }
}
