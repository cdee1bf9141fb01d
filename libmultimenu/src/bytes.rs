use intbits::Bits;

/// Little-endian access to a byte-addressed buffer.
pub trait ByteAccess {
    fn read_byte(&self, addr: usize) -> u8;

    fn write_byte(&mut self, addr: usize, value: u8);

    #[inline]
    fn read_hword(&self, addr: usize) -> u16 {
        let lo = self.read_byte(addr);
        let hi = self.read_byte(addr + 1);

        u16::from_le_bytes([lo, hi])
    }

    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    fn write_hword(&mut self, addr: usize, value: u16) {
        self.write_byte(addr, value as u8);
        self.write_byte(addr + 1, value.bits(8..) as _);
    }

    #[inline]
    fn write_bytes(&mut self, addr: usize, values: &[u8]) {
        for (i, &value) in values.iter().enumerate() {
            self.write_byte(addr + i, value);
        }
    }
}

impl ByteAccess for [u8] {
    #[inline]
    fn read_byte(&self, addr: usize) -> u8 {
        self[addr]
    }

    #[inline]
    fn write_byte(&mut self, addr: usize, value: u8) {
        self[addr] = value;
    }

    #[inline]
    fn write_bytes(&mut self, addr: usize, values: &[u8]) {
        self[addr..addr + values.len()].copy_from_slice(values);
    }
}
