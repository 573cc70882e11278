//! Курсор по срезу с проверкой границ.
//!
//! Вложенные структуры (ziplist, listpack, intset, zipmap) читаются из уже
//! загруженного буфера. Выход за границы — это ошибка формата данных, а не
//! повод для паники, поэтому каждое чтение возвращает `RdbResult`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{RdbError, RdbResult};

pub struct BufCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Имя структуры для сообщений об ошибках.
    structure: &'static str,
}

impl<'a> BufCursor<'a> {
    pub fn new(buf: &'a [u8], structure: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            structure,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn out_of_range(&self, want: usize) -> RdbError {
        RdbError::Bounds {
            structure: self.structure,
            at: self.pos,
            want,
            have: self.buf.len(),
        }
    }

    pub fn read_u8(&mut self) -> RdbResult<u8> {
        if self.pos >= self.buf.len() {
            return Err(self.out_of_range(1));
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> RdbResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| self.out_of_range(n))?;
        if end > self.buf.len() {
            return Err(self.out_of_range(n));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> RdbResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u16_le(&mut self) -> RdbResult<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32_le(&mut self) -> RdbResult<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> RdbResult<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_u32_be(&mut self) -> RdbResult<u32> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64_be(&mut self) -> RdbResult<u64> {
        Ok(BigEndian::read_u64(self.read_bytes(8)?))
    }
}
