//! Symbol counts over the byte alphabet.
//!
//! The table is also the file header: 256 little endian u32 counts,
//! symbol 0 first, always written in full even if most counts are zero.
//! The decoder rebuilds the tree from this header alone.

use std::io::{Read,Write,ErrorKind};
use crate::Error;

/// size of the alphabet, every byte value is a symbol
pub const NUM_SYMBOLS: usize = 256;
/// width of one stored count
pub const COUNT_BYTES: usize = 4;
/// size of the frequency header in bytes
pub const HEADER_SIZE: usize = NUM_SYMBOLS * COUNT_BYTES;

#[derive(Clone,Debug,PartialEq,Eq)]
pub struct FrequencyTable {
    counts: [u64;NUM_SYMBOLS]
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            counts: [0;NUM_SYMBOLS]
        }
    }
    pub fn from_slice(dat: &[u8]) -> Self {
        let mut ans = Self::new();
        ans.add(dat);
        ans
    }
    /// Count every byte until `reader` is exhausted.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self,std::io::Error> {
        let mut ans = Self::new();
        let mut buf: [u8;4096] = [0;4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => ans.add(&buf[0..n]),
                Err(e) if e.kind()==ErrorKind::Interrupted => continue,
                Err(e) => return Err(e)
            }
        }
        Ok(ans)
    }
    pub fn add(&mut self,dat: &[u8]) {
        for c in dat {
            self.counts[*c as usize] += 1;
        }
    }
    #[cfg(test)]
    pub fn set(&mut self,symbol: u8,count: u64) {
        self.counts[symbol as usize] = count;
    }
    pub fn get(&self,symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }
    /// sum of all counts, equals the length of the data that was counted
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
    /// number of symbols with a non-zero count
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|c| **c > 0).count()
    }
    /// (symbol,count) for every symbol that occurs, ascending by symbol
    pub fn present(&self) -> impl Iterator<Item = (u8,u64)> + '_ {
        self.counts.iter().enumerate()
            .filter(|(_,c)| **c > 0)
            .map(|(i,c)| (i as u8,*c))
    }
    pub fn write_header<W: Write>(&self,writer: &mut W) -> Result<(),Error> {
        let mut hdr: Vec<u8> = Vec::with_capacity(HEADER_SIZE);
        for c in self.counts {
            let c32 = u32::try_from(c).map_err(|_| Error::FileTooLarge)?;
            hdr.extend_from_slice(&u32::to_le_bytes(c32));
        }
        writer.write_all(&hdr)?;
        Ok(())
    }
    pub fn read_header<R: Read>(reader: &mut R) -> Result<Self,Error> {
        let mut hdr: [u8;HEADER_SIZE] = [0;HEADER_SIZE];
        match reader.read_exact(&mut hdr) {
            Ok(()) => {},
            Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
                log::error!("header is shorter than {} bytes",HEADER_SIZE);
                return Err(Error::TruncatedHeader);
            },
            Err(e) => return Err(Error::Io(e))
        }
        let mut ans = Self::new();
        for (i,chunk) in hdr.chunks_exact(COUNT_BYTES).enumerate() {
            ans.counts[i] = u32::from_le_bytes([chunk[0],chunk[1],chunk[2],chunk[3]]) as u64;
        }
        Ok(ans)
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn counting() {
    let freq = FrequencyTable::from_slice("aaaabbbccd".as_bytes());
    assert_eq!(freq.get(b'a'),4);
    assert_eq!(freq.get(b'b'),3);
    assert_eq!(freq.get(b'c'),2);
    assert_eq!(freq.get(b'd'),1);
    assert_eq!(freq.get(b'e'),0);
    assert_eq!(freq.total(),10);
    assert_eq!(freq.distinct(),4);
    let present: Vec<(u8,u64)> = freq.present().collect();
    assert_eq!(present,vec![(b'a',4),(b'b',3),(b'c',2),(b'd',1)]);
}

#[test]
fn reader_matches_slice() {
    let dat: Vec<u8> = (0..10000).map(|i| (i*7 % 251) as u8).collect();
    let mut src = std::io::Cursor::new(dat.clone());
    let freq = FrequencyTable::from_reader(&mut src).expect("read failed");
    assert_eq!(freq,FrequencyTable::from_slice(&dat));
    assert_eq!(freq.total(),10000);
}

#[test]
fn empty_table() {
    let freq = FrequencyTable::from_slice(&[]);
    assert_eq!(freq.total(),0);
    assert_eq!(freq.distinct(),0);
    let mut hdr: Vec<u8> = Vec::new();
    freq.write_header(&mut hdr).expect("write failed");
    assert_eq!(hdr,vec![0;HEADER_SIZE]);
}

#[test]
fn header_layout() {
    let freq = FrequencyTable::from_slice(&[0x00,0x41,0x41,0xff]);
    let mut hdr: Vec<u8> = Vec::new();
    freq.write_header(&mut hdr).expect("write failed");
    assert_eq!(hdr.len(),HEADER_SIZE);
    assert_eq!(hdr[0..4],hex::decode("01000000").unwrap());
    assert_eq!(hdr[0x41*4..0x42*4],hex::decode("02000000").unwrap());
    assert_eq!(hdr[0xff*4..],hex::decode("01000000").unwrap());
    let restored = FrequencyTable::read_header(&mut std::io::Cursor::new(hdr)).expect("read failed");
    assert_eq!(restored,freq);
}

#[test]
fn header_too_short() {
    let hdr: Vec<u8> = vec![0;HEADER_SIZE-1];
    match FrequencyTable::read_header(&mut std::io::Cursor::new(hdr)) {
        Err(Error::TruncatedHeader) => {},
        other => panic!("expected truncated header, got {:?}",other)
    }
}

#[test]
fn count_too_wide() {
    let mut freq = FrequencyTable::new();
    freq.set(7,u32::MAX as u64 + 1);
    let mut hdr: Vec<u8> = Vec::new();
    assert!(matches!(freq.write_header(&mut hdr),Err(Error::FileTooLarge)));
}
