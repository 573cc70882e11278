//! CRC-64 с полиномом Jones — контрольная сумма хвоста дампа.
//!
//! Отражённый вариант: начальное значение 0, без финального XOR, таблица
//! строится лениво при первом обращении и дальше не меняется.

use once_cell::sync::Lazy;

/// Отражённый полином Jones (0xad93d23594c935a9).
const POLY_REFLECTED: u64 = 0x95ac_9329_ac4b_c9b5;

static TABLE: Lazy<[u64; 256]> = Lazy::new(|| {
    let mut table = [0u64; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut crc = i as u64;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY_REFLECTED
            } else {
                crc >> 1
            };
        }
        *slot = crc;
    }
    table
});

/// Накапливаемая контрольная сумма.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc64(u64);

impl Crc64 {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.0;
        for &b in data {
            crc = TABLE[((crc ^ b as u64) & 0xff) as usize] ^ (crc >> 8);
        }
        self.0 = crc;
    }

    pub fn sum(&self) -> u64 {
        self.0
    }
}

/// Сумма одним вызовом.
pub fn checksum(data: &[u8]) -> u64 {
    let mut crc = Crc64::new();
    crc.update(data);
    crc.sum()
}
