/// Every variant means the packet is malformed and must be discarded whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("buffer underrun: needed {needed} bits, {remaining} remaining")]
    Underrun { needed: usize, remaining: usize },
    #[error("enum value {value} out of range (max {max})")]
    TagOutOfRange { value: u32, max: u32 },
    #[error("invalid element count {0}")]
    InvalidCount(i32),
}

/// Cursor-based bit buffer. Values are packed LSB-first, so byte-sized fields
/// written on a byte boundary come out little-endian.
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    write_pos: usize,
    read_pos: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            write_pos: 0,
            read_pos: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
            write_pos: data.len() * 8,
            read_pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn bits_written(&self) -> usize {
        self.write_pos
    }

    pub fn remaining_bits(&self) -> usize {
        self.write_pos - self.read_pos
    }

    pub fn put_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        for i in 0..count {
            let byte = self.write_pos / 8;
            if byte == self.bytes.len() {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                self.bytes[byte] |= 1 << (self.write_pos % 8);
            }
            self.write_pos += 1;
        }
    }

    pub fn get_bits(&mut self, count: u32) -> Result<u32, PacketError> {
        debug_assert!(count <= 32);
        let needed = count as usize;
        if needed > self.remaining_bits() {
            return Err(PacketError::Underrun {
                needed,
                remaining: self.remaining_bits(),
            });
        }

        let mut value = 0u32;
        for i in 0..count {
            let bit = (self.bytes[self.read_pos / 8] >> (self.read_pos % 8)) & 1;
            value |= (bit as u32) << i;
            self.read_pos += 1;
        }
        Ok(value)
    }

    pub fn put_bit(&mut self, value: bool) {
        self.put_bits(value as u32, 1);
    }

    pub fn get_bit(&mut self) -> Result<bool, PacketError> {
        Ok(self.get_bits(1)? == 1)
    }

    pub fn put_int(&mut self, value: i32) {
        self.put_bits(value as u32, 32);
    }

    pub fn get_int(&mut self) -> Result<i32, PacketError> {
        Ok(self.get_bits(32)? as i32)
    }

    pub fn put_float(&mut self, value: f32) {
        self.put_bits(value.to_bits(), 32);
    }

    pub fn get_float(&mut self) -> Result<f32, PacketError> {
        Ok(f32::from_bits(self.get_bits(32)?))
    }

    /// Writes `value` using just enough bits to hold `max - 1`.
    pub fn put_enum(&mut self, value: u32, max: u32) {
        debug_assert!(value < max);
        self.put_bits(value, bits_for(max));
    }

    pub fn get_enum(&mut self, max: u32) -> Result<u32, PacketError> {
        let value = self.get_bits(bits_for(max))?;
        if value >= max {
            return Err(PacketError::TagOutOfRange { value, max });
        }
        Ok(value)
    }

    /// Reads a count prefix and checks it against the bits left, so a corrupt
    /// count cannot trigger a huge allocation.
    pub fn get_count(&mut self, min_bits_per_element: usize) -> Result<usize, PacketError> {
        let count = self.get_int()?;
        if count < 0 {
            return Err(PacketError::InvalidCount(count));
        }
        let needed = count as usize * min_bits_per_element;
        if needed > self.remaining_bits() {
            return Err(PacketError::Underrun {
                needed,
                remaining: self.remaining_bits(),
            });
        }
        Ok(count as usize)
    }
}

#[inline]
fn bits_for(max: u32) -> u32 {
    (u32::BITS - max.saturating_sub(1).leading_zeros()).max(1)
}
