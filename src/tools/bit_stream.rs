//! MSB-first bit streams over byte oriented I/O.
//! The writer pads the final byte with zeros, the reader simply
//! reports the end of the underlying stream, it has no notion of padding.

use bit_vec::BitVec;
use std::io::{Read,Write,Bytes};

/// pending bits are handed to the writer once this many accumulate
const DRAIN_BITS: usize = 4096;

pub struct BitWriter<W: Write> {
    writer: W,
    bits: BitVec,
    count: u64
}

pub struct BitReader<R: Read> {
    bytes: Bytes<R>,
    bits: BitVec,
    ptr: usize,
    count: u64
}

impl <W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bits: BitVec::new(),
            count: 0
        }
    }
    /// append `code` starting from its first bit
    pub fn put_code(&mut self,code: &BitVec) -> Result<(),std::io::Error> {
        for bit in code.iter() {
            self.bits.push(bit);
        }
        self.count += code.len() as u64;
        if self.bits.len() >= DRAIN_BITS {
            self.drain()?;
        }
        Ok(())
    }
    /// total bits accepted so far, not counting padding
    pub fn bit_count(&self) -> u64 {
        self.count
    }
    /// write every whole byte, keep the partial byte pending
    fn drain(&mut self) -> Result<(),std::io::Error> {
        let whole = self.bits.len() / 8;
        let bytes = self.bits.to_bytes();
        self.writer.write_all(&bytes[0..whole])?;
        self.bits = self.bits.iter().skip(whole*8).collect();
        Ok(())
    }
    /// Write out pending bits, zero padding the last byte, and give back the writer.
    pub fn finish(mut self) -> Result<W,std::io::Error> {
        let bytes = self.bits.to_bytes();
        self.writer.write_all(&bytes)?;
        self.bits = BitVec::new();
        Ok(self.writer)
    }
}

impl <R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
            bits: BitVec::new(),
            ptr: 0,
            count: 0
        }
    }
    /// Get the next bit reading from the stream as needed.
    /// Returns `None` once the stream is exhausted.
    pub fn get_bit(&mut self) -> Result<Option<bool>,std::io::Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(Some(bit))
            },
            None => {
                match self.bytes.next() {
                    Some(Ok(by)) => {
                        self.bits = BitVec::from_bytes(&[by]);
                        self.ptr = 0;
                        self.count += 1;
                        self.get_bit()
                    },
                    Some(Err(e)) => Err(e),
                    None => Ok(None)
                }
            }
        }
    }
    /// Abandon the rest of the current byte and see whether any further bytes
    /// remain.  If so, one of them is consumed.
    pub fn more_bytes(&mut self) -> Result<bool,std::io::Error> {
        self.ptr = self.bits.len();
        match self.bytes.next() {
            Some(Ok(_)) => {
                self.count += 1;
                Ok(true)
            },
            Some(Err(e)) => Err(e),
            None => Ok(false)
        }
    }
    /// bytes pulled from the stream so far
    pub fn byte_count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
fn bits_from_str(s: &str) -> BitVec {
    s.chars().map(|c| c=='1').collect()
}

#[test]
fn padding() {
    let mut ans: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut ans);
    writer.put_code(&bits_from_str("101")).expect("write failed");
    assert_eq!(writer.bit_count(),3);
    writer.finish().expect("flush failed");
    assert_eq!(ans,vec![0xa0]);
}

#[test]
fn msb_first_packing() {
    let mut ans: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut ans);
    for code in ["0","0","0","0","10","10","10","111","111","110"] {
        writer.put_code(&bits_from_str(code)).expect("write failed");
    }
    assert_eq!(writer.bit_count(),19);
    writer.finish().expect("flush failed");
    assert_eq!(ans,hex::decode("0ABFC0").unwrap());
}

#[test]
fn nothing_written() {
    let mut ans: Vec<u8> = Vec::new();
    let writer = BitWriter::new(&mut ans);
    writer.finish().expect("flush failed");
    assert!(ans.is_empty());
}

#[test]
fn drains_long_streams() {
    // 3 bits at a time forces many partial bytes across drain boundaries
    let mut ans: Vec<u8> = Vec::new();
    let mut writer = BitWriter::new(&mut ans);
    let code = bits_from_str("110");
    for _i in 0..8000 {
        writer.put_code(&code).expect("write failed");
    }
    writer.finish().expect("flush failed");
    assert_eq!(ans.len(),3000);
    assert!(ans.chunks(3).all(|c| c==[0xdb,0x6d,0xb6]));
}

#[test]
fn reading() {
    let src = hex::decode("a5ff").unwrap();
    let mut reader = BitReader::new(src.as_slice());
    let mut ans = String::new();
    while let Some(bit) = reader.get_bit().expect("read failed") {
        ans.push(if bit { '1' } else { '0' });
    }
    assert_eq!(ans,"1010010111111111");
    assert_eq!(reader.byte_count(),2);
}

#[test]
fn trailing_bytes() {
    let src = hex::decode("8000").unwrap();
    let mut reader = BitReader::new(src.as_slice());
    assert_eq!(reader.get_bit().unwrap(),Some(true));
    assert!(reader.more_bytes().unwrap());
    assert!(!reader.more_bytes().unwrap());
    assert_eq!(reader.get_bit().unwrap(),None);
}
