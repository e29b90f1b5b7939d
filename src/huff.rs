//! Static Huffman Compression
//!
//! The whole input is scanned once to count symbols, then again to emit codes.
//! Compressed layout:
//! * 1024 byte header, 256 little endian u32 counts, symbol 0 first
//! * payload, codes packed MSB first, the last byte padded with zeros
//!
//! The payload does not record its own length.  Expansion stops after emitting
//! as many symbols as the header counts add up to, so padding is never decoded.
//! A header of all zeros describes empty data and has no payload.  If only one
//! symbol occurs, each occurrence is coded as a single 0 bit.

use std::io::{Cursor,Read,Write,Seek,SeekFrom,BufReader,BufWriter,ErrorKind};
use crate::tools::freq_table::FrequencyTable;
use crate::tools::huff_tree::{HuffTree,CodeTable,code_string};
use crate::tools::bit_stream::{BitReader,BitWriter};
use crate::{Error,Options};

/// Pack every byte of `reader` using `table`, returns the number of bits written.
fn encode<R: Read,W: Write>(reader: &mut R,writer: &mut W,table: &CodeTable) -> Result<u64,Error> {
    let mut packer = BitWriter::new(writer);
    let mut buf: [u8;4096] = [0;4096];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind()==ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e))
        };
        for c in &buf[0..n] {
            match table.get(*c) {
                Some(code) => packer.put_code(code)?,
                None => {
                    log::error!("symbol {} was not counted",c);
                    return Err(Error::InputChanged);
                }
            }
        }
    }
    let bits = packer.bit_count();
    packer.finish()?;
    Ok(bits)
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<(u64,u64),Error>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BufWriter::new(compressed_out);

    let mut expanded_length = reader.seek(SeekFrom::End(0))?;
    if opt.in_offset > expanded_length {
        return Err(Error::FileFormatMismatch);
    }
    expanded_length -= opt.in_offset;
    if expanded_length > u64::min(opt.max_file_size,u32::MAX as u64) {
        return Err(Error::FileTooLarge);
    }

    log::debug!("counting {} symbols",expanded_length);
    reader.seek(SeekFrom::Start(opt.in_offset))?;
    let freq = FrequencyTable::from_reader(&mut reader)?;
    if freq.total() != expanded_length {
        return Err(Error::InputChanged);
    }
    writer.seek(SeekFrom::Start(opt.out_offset))?;
    freq.write_header(&mut writer)?;

    match HuffTree::create(&freq) {
        Some(tree) => {
            let table = tree.code_table();
            let expected_bits = table.encoded_bits(&freq);
            log::debug!("{} distinct symbols, longest code is {} bits",freq.distinct(),table.max_len());
            log::debug!("encoding {} bits",expected_bits);
            reader.seek(SeekFrom::Start(opt.in_offset))?;
            let bits = encode(&mut reader,&mut writer,&table)?;
            if bits != expected_bits {
                log::error!("encoded {} bits, but counts call for {}",bits,expected_bits);
                return Err(Error::InputChanged);
            }
        },
        None => log::debug!("no symbols, header only")
    }
    writer.flush()?;
    Ok((expanded_length,writer.stream_position()? - opt.out_offset))
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),Error>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(compressed_in);
    let mut writer = BufWriter::new(expanded_out);

    let mut compressed_size = reader.seek(SeekFrom::End(0))?;
    if opt.in_offset > compressed_size {
        return Err(Error::FileFormatMismatch);
    }
    compressed_size -= opt.in_offset;
    reader.seek(SeekFrom::Start(opt.in_offset))?;
    writer.seek(SeekFrom::Start(opt.out_offset))?;

    let freq = FrequencyTable::read_header(&mut reader)?;
    let expected = freq.total();
    log::debug!("header calls for {} symbols",expected);
    let mut unpacker = BitReader::new(&mut reader);
    if let Some(tree) = HuffTree::create(&freq) {
        let mut decoded: u64 = 0;
        while decoded < expected {
            match tree.decode_symbol(&mut unpacker)? {
                Some(c) => {
                    writer.write_all(&[c])?;
                    decoded += 1;
                },
                None => {
                    log::error!("payload ran out after {} symbols",decoded);
                    return Err(Error::TruncatedPayload { decoded, expected });
                }
            }
        }
    }
    if unpacker.more_bytes()? {
        log::error!("data continues after {} payload bytes",unpacker.byte_count() - 1);
        return Err(Error::TrailingData);
    }
    writer.flush()?;
    Ok((compressed_size,writer.stream_position()? - opt.out_offset))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// List the count and code of every symbol occurring in `expanded_in`,
/// one line per symbol, ascending by symbol.
pub fn code_report<R: Read>(expanded_in: &mut R) -> Result<Vec<String>,Error> {
    let freq = FrequencyTable::from_reader(expanded_in)?;
    let table = match HuffTree::create(&freq) {
        Some(tree) => tree.code_table(),
        None => return Ok(Vec::new())
    };
    Ok(table.iter().map(|(symbol,code)| {
        format!("{:02X} {:>10} {}",symbol,freq.get(symbol),code_string(code))
    }).collect())
}

// *************** TESTS *****************

#[cfg(test)]
use crate::{STD_OPTIONS,ErrorKind as Kind};
#[cfg(test)]
use crate::tools::freq_table::HEADER_SIZE;

#[test]
fn compression_works() {
    let compressed = compress_slice("aaaabbbccd".as_bytes(),&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed.len(),HEADER_SIZE + 3);
    let mut expected_header: Vec<u8> = vec![0;HEADER_SIZE];
    expected_header[b'a' as usize * 4] = 4;
    expected_header[b'b' as usize * 4] = 3;
    expected_header[b'c' as usize * 4] = 2;
    expected_header[b'd' as usize * 4] = 1;
    assert_eq!(compressed[0..HEADER_SIZE],expected_header);
    // a=0 b=10 d=110 c=111
    assert_eq!(compressed[HEADER_SIZE..],hex::decode("0ABFC0").unwrap());
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "aaaabbbccd".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_binary() {
    // every byte value, uneven counts, long enough to span many bit buffer drains
    let test_data: Vec<u8> = (0..100000u64).map(|i| ((i*i + 3*i) % 257 % 256) as u8).collect();
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn empty_input() {
    let compressed = compress_slice(&[],&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,vec![0;HEADER_SIZE]);
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn single_symbol() {
    let test_data: [u8;1000] = [0x41;1000];
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed.len(),HEADER_SIZE + 125);
    assert_eq!(compressed[0x41*4..0x42*4],hex::decode("E8030000").unwrap());
    assert!(compressed[HEADER_SIZE..].iter().all(|b| *b==0));
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,test_data.to_vec());

    // one occurrence still needs a whole byte of payload
    let compressed = compress_slice(&[7],&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed.len(),HEADER_SIZE + 1);
    assert_eq!(expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed"),vec![7]);
}

#[test]
fn deterministic() {
    let test_data = "the quick brown fox jumps over the lazy dog".as_bytes();
    let c1 = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let c2 = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(c1,c2);
}

#[test]
fn header_counts_match_length() {
    let test_data = "mississippi river".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let freq = FrequencyTable::read_header(&mut Cursor::new(&compressed)).expect("bad header");
    assert_eq!(freq.total(),test_data.len() as u64);
}

#[test]
fn skewed_data_shrinks() {
    let mut test_data = vec![b'e';900];
    test_data.extend_from_slice(&[b'x';60]);
    test_data.extend_from_slice("qwertyuiopasdfghjklzxcvbnm0123".as_bytes());
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    assert!(compressed.len() - HEADER_SIZE < test_data.len());
}

#[test]
fn truncated_payload() {
    let test_data = "abcdefghij".repeat(10);
    let compressed = compress_slice(test_data.as_bytes(),&STD_OPTIONS).expect("compression failed");
    let payload_len = compressed.len() - HEADER_SIZE;
    let damaged = &compressed[0..HEADER_SIZE + payload_len/2];
    match expand_slice(damaged,&STD_OPTIONS) {
        Err(e) => {
            assert_eq!(e.kind(),Kind::Format);
            match e {
                Error::TruncatedPayload { decoded, expected } => {
                    assert_eq!(expected,100);
                    assert!(decoded < 100);
                },
                other => panic!("unexpected error {}",other)
            }
        },
        Ok(_) => panic!("truncated payload was accepted")
    }
}

#[test]
fn truncated_header() {
    let compressed = compress_slice("hello".as_bytes(),&STD_OPTIONS).expect("compression failed");
    let result = expand_slice(&compressed[0..100],&STD_OPTIONS);
    assert!(matches!(result,Err(Error::TruncatedHeader)));
}

#[test]
fn trailing_data() {
    let mut compressed = compress_slice("hello".as_bytes(),&STD_OPTIONS).expect("compression failed");
    compressed.push(0);
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::TrailingData)));

    let mut compressed = compress_slice(&[],&STD_OPTIONS).expect("compression failed");
    compressed.push(0xff);
    assert!(matches!(expand_slice(&compressed,&STD_OPTIONS),Err(Error::TrailingData)));
}

#[test]
fn offsets() {
    let test_data = "HEADER012345I am Sam. Sam I am.".as_bytes();
    let mut opt = STD_OPTIONS;
    opt.in_offset = 12;
    opt.out_offset = 4;
    let mut src = Cursor::new(test_data);
    let mut compressed: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let (in_size,out_size) = compress(&mut src,&mut compressed,&opt).expect("compression failed");
    assert_eq!(in_size,19);
    let compressed = compressed.into_inner();
    assert_eq!(out_size as usize,compressed.len() - 4);
    assert_eq!(compressed[0..4],[0u8;4]);

    opt.in_offset = 4;
    opt.out_offset = 0;
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(expanded,test_data[12..].to_vec());
}

#[test]
fn bad_options() {
    let mut opt = STD_OPTIONS;
    opt.in_offset = 11;
    assert!(matches!(compress_slice("0123456789".as_bytes(),&opt),Err(Error::FileFormatMismatch)));
    let mut opt = STD_OPTIONS;
    opt.max_file_size = 5;
    let result = compress_slice("0123456789".as_bytes(),&opt);
    assert!(matches!(result,Err(Error::FileTooLarge)));
}

#[test]
fn report() {
    let mut src = Cursor::new("aaaabbbccd".as_bytes());
    let lines = code_report(&mut src).expect("report failed");
    assert_eq!(lines,vec![
        "61          4 0",
        "62          3 10",
        "63          2 111",
        "64          1 110"
    ]);
    let mut src = Cursor::new(&[] as &[u8]);
    assert!(code_report(&mut src).expect("report failed").is_empty());
}

/// Storage that claims a length but fails every read
#[cfg(test)]
struct FailingSource;

#[cfg(test)]
impl Read for FailingSource {
    fn read(&mut self,_buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(ErrorKind::Other,"device failed"))
    }
}

#[cfg(test)]
impl Seek for FailingSource {
    fn seek(&mut self,_pos: SeekFrom) -> std::io::Result<u64> {
        Ok(10)
    }
}

/// Storage whose contents differ on each pass, and whose reported length
/// is that of `versions[0]` unless `claimed` overrides it
#[cfg(test)]
struct ShiftingSource {
    versions: Vec<Vec<u8>>,
    claimed: Option<u64>,
    pass: usize,
    curs: Cursor<Vec<u8>>
}

#[cfg(test)]
impl ShiftingSource {
    fn new(versions: Vec<Vec<u8>>,claimed: Option<u64>) -> Self {
        Self { versions, claimed, pass: 0, curs: Cursor::new(Vec::new()) }
    }
}

#[cfg(test)]
impl Read for ShiftingSource {
    fn read(&mut self,buf: &mut [u8]) -> std::io::Result<usize> {
        self.curs.read(buf)
    }
}

#[cfg(test)]
impl Seek for ShiftingSource {
    fn seek(&mut self,pos: SeekFrom) -> std::io::Result<u64> {
        match pos {
            SeekFrom::End(_) => Ok(self.claimed.unwrap_or(self.versions[0].len() as u64)),
            SeekFrom::Start(n) => {
                let idx = usize::min(self.pass,self.versions.len()-1);
                self.curs = Cursor::new(self.versions[idx].clone());
                self.pass += 1;
                self.curs.seek(SeekFrom::Start(n))
            },
            other => self.curs.seek(other)
        }
    }
}

#[test]
fn read_failure() {
    let mut compressed: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    match compress(&mut FailingSource,&mut compressed,&STD_OPTIONS) {
        Err(e) => {
            assert_eq!(e.kind(),Kind::Io);
            assert!(matches!(e,Error::Io(_)));
        },
        Ok(_) => panic!("read failure was ignored")
    }
    let mut expanded: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    match expand(&mut FailingSource,&mut expanded,&STD_OPTIONS) {
        Err(e) => assert_eq!(e.kind(),Kind::Io),
        Ok(_) => panic!("read failure was ignored")
    }
}

#[test]
fn length_disagrees_with_contents() {
    let mut compressed: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let mut src = ShiftingSource::new(vec!["aaaabbbccd".as_bytes().to_vec()],Some(100));
    let result = compress(&mut src,&mut compressed,&STD_OPTIONS);
    assert!(matches!(result,Err(Error::InputChanged)));
    assert_eq!(result.err().map(|e| e.kind()),Some(Kind::Io));
}

#[test]
fn contents_change_between_passes() {
    // same length, but the second pass has a symbol the first pass never counted
    let mut compressed: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let mut src = ShiftingSource::new(vec![b"aaaa".to_vec(),b"aaab".to_vec()],None);
    let result = compress(&mut src,&mut compressed,&STD_OPTIONS);
    assert!(matches!(result,Err(Error::InputChanged)));

    // same length and symbols, different counts: a=1 b=00 c=01 calls for 7 bits, not 9
    let mut compressed: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let mut src = ShiftingSource::new(vec![b"aaabc".to_vec(),b"abbbc".to_vec()],None);
    let result = compress(&mut src,&mut compressed,&STD_OPTIONS);
    assert!(matches!(result,Err(Error::InputChanged)));
}

#[test]
fn single_symbol_payload_with_one_bit() {
    let mut compressed = compress_slice(&[7u8;3],&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed.len(),HEADER_SIZE + 1);
    compressed[HEADER_SIZE] = 0x80;
    match expand_slice(&compressed,&STD_OPTIONS) {
        Err(e) => {
            assert_eq!(e.kind(),Kind::Format);
            assert!(matches!(e,Error::InvalidCode));
        },
        Ok(_) => panic!("bad code was accepted")
    }
}
