use super::MAX_BLOCK_SIZE;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Block {
    pub data: [u8; MAX_BLOCK_SIZE],
    // Block length
    pub len: usize,
    // Data length
    pub dlen: usize,
}

impl Block {
    pub fn with_encoded(encoded: &[u8], dlen: usize) -> Self {
        debug_assert!(encoded.len() <= MAX_BLOCK_SIZE, "Block too long: Len {}", encoded.len());
        debug_assert!(dlen <= encoded.len(), "Data exceeds block: Dlen {dlen}");

        let len = encoded.len();
        let mut data = [0u8; MAX_BLOCK_SIZE];
        data[..len].copy_from_slice(encoded);
        Self { data, len, dlen }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ec_len(&self) -> usize {
        self.len - self.dlen
    }

    pub fn full(&self) -> &[u8] {
        &self.data[..self.len]
    }

    #[cfg(test)]
    pub fn full_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }
}
