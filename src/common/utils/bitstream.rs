// Bit reader over corrected data codewords
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BitStream {
    data: Vec<u8>,
    // Bit length
    len: usize,
    // Read cursor in bits
    cursor: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), len: 0, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        debug_assert!(self.len & 7 == 0, "Extending a stream with a partial byte: Len {}", self.len);

        self.data.extend_from_slice(bytes);
        self.len += bytes.len() << 3;
    }

    /// Reads the next `size` bits, most significant first. Returns None if the stream doesn't
    /// have enough bits left.
    pub fn take_bits(&mut self, size: usize) -> Option<u32> {
        debug_assert!(size <= 32, "Cannot take more than 32 bits at once: Size {size}");

        if size > self.remaining() {
            return None;
        }

        let mut res = 0u32;
        for _ in 0..size {
            let byte = self.data[self.cursor >> 3];
            let bit = (byte >> (7 - (self.cursor & 7))) & 1;
            res = (res << 1) | bit as u32;
            self.cursor += 1;
        }
        Some(res)
    }
}

impl From<&[u8]> for BitStream {
    fn from(bytes: &[u8]) -> Self {
        let mut bs = Self::new(bytes.len());
        bs.extend(bytes);
        bs
    }
}
