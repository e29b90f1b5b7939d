//! Static Huffman tree and code table.
//!
//! The tree is never stored, it is rebuilt from a `FrequencyTable` on both
//! sides, so construction has to be fully deterministic.  Every node waiting
//! in the queue carries a rank: a leaf's rank is its symbol value, an internal
//! node's rank is 256 plus the number of merges that came before it.  Nodes
//! leave the queue in (weight,rank) order, and the first node taken in a merge
//! becomes the left son (bit 0).

use bit_vec::BitVec;
use std::cmp::Ordering;
use std::io::Read;
use crate::tools::freq_table::{FrequencyTable,NUM_SYMBOLS};
use crate::tools::min_heap::MinHeap;
use crate::tools::bit_stream::BitReader;
use crate::Error;

#[derive(Debug,Clone,PartialEq,Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        weight: u64
    },
    Internal {
        weight: u64,
        left: Box<Node>,
        right: Box<Node>
    }
}

impl Node {
    #[cfg(test)]
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight
        }
    }
}

/// Node waiting in the priority queue, ordered by (weight,rank).
struct Pending {
    weight: u64,
    rank: usize,
    node: Node
}

impl PartialEq for Pending {
    fn eq(&self,other: &Self) -> bool {
        self.weight == other.weight && self.rank == other.rank
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self,other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self,other: &Self) -> Ordering {
        (self.weight,self.rank).cmp(&(other.weight,other.rank))
    }
}

/// Mapping from symbol to code, symbols that do not occur have no code.
#[derive(Debug,Clone,PartialEq)]
pub struct CodeTable {
    codes: Vec<Option<BitVec>>
}

pub struct HuffTree {
    root: Node
}

impl HuffTree {
    /// Build the tree for the symbols that occur in `freq`.
    /// Returns `None` if no symbols occur.
    pub fn create(freq: &FrequencyTable) -> Option<Self> {
        let leaves: Vec<Pending> = freq.present().map(|(symbol,weight)| Pending {
            weight,
            rank: symbol as usize,
            node: Node::Leaf { symbol, weight }
        }).collect();
        log::debug!("building tree with {} leaves",leaves.len());
        let mut queue = MinHeap::from_vec(leaves);
        let mut merges: usize = 0;
        while queue.len() > 1 {
            let left = queue.extract_min()?;
            let right = queue.extract_min()?;
            let weight = left.weight + right.weight;
            log::trace!("merge ranks {} and {} into {}",left.rank,right.rank,NUM_SYMBOLS + merges);
            queue.insert(Pending {
                weight,
                rank: NUM_SYMBOLS + merges,
                node: Node::Internal {
                    weight,
                    left: Box::new(left.node),
                    right: Box::new(right.node)
                }
            });
            merges += 1;
        }
        queue.extract_min().map(|p| Self { root: p.node })
    }
    #[cfg(test)]
    pub fn root(&self) -> &Node {
        &self.root
    }
    /// Derive the code of every leaf, 0 for left and 1 for right.
    /// A tree that is a single leaf gets the one bit code `0`.
    pub fn code_table(&self) -> CodeTable {
        let mut ans = CodeTable::new();
        if let Node::Leaf { symbol, .. } = &self.root {
            ans.codes[*symbol as usize] = Some(BitVec::from_elem(1,false));
            return ans;
        }
        // explicit stack, depth is only limited by the alphabet
        let mut stack: Vec<(&Node,BitVec)> = vec![(&self.root,BitVec::new())];
        while let Some((node,code)) = stack.pop() {
            match node {
                Node::Leaf { symbol, .. } => {
                    ans.codes[*symbol as usize] = Some(code);
                },
                Node::Internal { left, right, .. } => {
                    let mut right_code = code.clone();
                    right_code.push(true);
                    let mut left_code = code;
                    left_code.push(false);
                    stack.push((right.as_ref(),right_code));
                    stack.push((left.as_ref(),left_code));
                }
            }
        }
        ans
    }
    /// Travel from root to leaf following bits from `reader`.
    /// Returns `None` if the bits run out before a leaf is reached.
    pub fn decode_symbol<R: Read>(&self,reader: &mut BitReader<R>) -> Result<Option<u8>,Error> {
        let mut curs = &self.root;
        if let Node::Leaf { symbol, .. } = curs {
            // single symbol alphabet, every occurrence is a 0 bit
            return match reader.get_bit()? {
                Some(false) => Ok(Some(*symbol)),
                Some(true) => Err(Error::InvalidCode),
                None => Ok(None)
            };
        }
        loop {
            match curs {
                Node::Leaf { symbol, .. } => return Ok(Some(*symbol)),
                Node::Internal { left, right, .. } => {
                    curs = match reader.get_bit()? {
                        Some(false) => left.as_ref(),
                        Some(true) => right.as_ref(),
                        None => return Ok(None)
                    };
                }
            }
        }
    }
}

impl CodeTable {
    fn new() -> Self {
        Self {
            codes: vec![None;NUM_SYMBOLS]
        }
    }
    pub fn get(&self,symbol: u8) -> Option<&BitVec> {
        self.codes[symbol as usize].as_ref()
    }
    /// (symbol,code) for every symbol that has a code, ascending by symbol
    pub fn iter(&self) -> impl Iterator<Item = (u8,&BitVec)> + '_ {
        self.codes.iter().enumerate()
            .filter_map(|(i,code)| code.as_ref().map(|c| (i as u8,c)))
    }
    pub fn max_len(&self) -> usize {
        self.iter().map(|(_,c)| c.len()).max().unwrap_or(0)
    }
    /// bits needed to encode data having frequencies `freq`
    pub fn encoded_bits(&self,freq: &FrequencyTable) -> u64 {
        self.iter().map(|(symbol,code)| freq.get(symbol) * code.len() as u64).sum()
    }
    /// true if no code is a prefix of another
    pub fn is_prefix_free(&self) -> bool {
        for (s1,c1) in self.iter() {
            for (s2,c2) in self.iter() {
                if s1 != s2 && c1.len() <= c2.len() && c1.iter().zip(c2.iter()).all(|(a,b)| a==b) {
                    return false;
                }
            }
        }
        true
    }
}

/// Render a code as a string of 0 and 1
pub fn code_string(code: &BitVec) -> String {
    code.iter().map(|bit| if bit { '1' } else { '0' }).collect()
}

#[test]
fn small_alphabet() {
    let freq = FrequencyTable::from_slice("aaaabbbccd".as_bytes());
    let tree = HuffTree::create(&freq).expect("no tree");
    assert_eq!(tree.root().weight(),10);
    let table = tree.code_table();
    assert_eq!(code_string(table.get(b'a').unwrap()),"0");
    assert_eq!(code_string(table.get(b'b').unwrap()),"10");
    assert_eq!(code_string(table.get(b'd').unwrap()),"110");
    assert_eq!(code_string(table.get(b'c').unwrap()),"111");
    assert!(table.get(b'e').is_none());
    assert!(table.is_prefix_free());
    assert_eq!(table.encoded_bits(&freq),19);
}

#[test]
fn rarer_symbols_get_longer_codes() {
    let freq = FrequencyTable::from_slice("it was the best of times, it was the worst of times".as_bytes());
    let table = HuffTree::create(&freq).expect("no tree").code_table();
    assert!(table.is_prefix_free());
    for (s1,c1) in table.iter() {
        for (s2,c2) in table.iter() {
            if freq.get(s1) < freq.get(s2) {
                assert!(c1.len() >= c2.len());
            }
        }
    }
}

#[test]
fn single_symbol() {
    let freq = FrequencyTable::from_slice(&[0x41;1000]);
    let tree = HuffTree::create(&freq).expect("no tree");
    assert_eq!(tree.root(),&Node::Leaf { symbol: 0x41, weight: 1000 });
    let table = tree.code_table();
    assert_eq!(code_string(table.get(0x41).unwrap()),"0");
    assert_eq!(table.iter().count(),1);
    assert_eq!(table.encoded_bits(&freq),1000);
}

#[test]
fn no_symbols() {
    assert!(HuffTree::create(&FrequencyTable::new()).is_none());
}

#[test]
fn deterministic() {
    // many equal weights, so the outcome rests on the tie-break
    let dat: Vec<u8> = (0..=255).collect();
    let freq = FrequencyTable::from_slice(&dat);
    let t1 = HuffTree::create(&freq).expect("no tree");
    let t2 = HuffTree::create(&freq).expect("no tree");
    assert_eq!(t1.root(),t2.root());
    let table = t1.code_table();
    assert_eq!(table,t2.code_table());
    assert!(table.is_prefix_free());
    // uniform weights over 256 symbols give a complete tree
    assert!(table.iter().all(|(_,c)| c.len()==8));
    assert_eq!(code_string(table.get(0).unwrap()),"00000000");
    assert_eq!(code_string(table.get(255).unwrap()),"11111111");
}

#[test]
fn deep_tree() {
    // Fibonacci weights make every merge take the previous subtree,
    // so code lengths grow by one per symbol.
    let mut freq = FrequencyTable::new();
    let (mut a,mut b) = (1u64,1u64);
    for s in 0..60 {
        freq.set(s,a);
        (a,b) = (b,a+b);
    }
    let table = HuffTree::create(&freq).expect("no tree").code_table();
    assert_eq!(table.max_len(),59);
    assert!(table.is_prefix_free());
}

#[test]
fn decoding_walk() {
    let freq = FrequencyTable::from_slice("aaaabbbccd".as_bytes());
    let tree = HuffTree::create(&freq).expect("no tree");
    let src = hex::decode("0ABFC0").unwrap();
    let mut reader = BitReader::new(src.as_slice());
    let mut ans = Vec::new();
    for _i in 0..10 {
        ans.push(tree.decode_symbol(&mut reader).expect("bad code").expect("out of bits"));
    }
    assert_eq!(ans,"aaaabbbccd".as_bytes());
}

#[test]
fn single_symbol_rejects_one_bits() {
    let freq = FrequencyTable::from_slice("zz".as_bytes());
    let tree = HuffTree::create(&freq).expect("no tree");
    let src: [u8;1] = [0x40];
    let mut reader = BitReader::new(&src[..]);
    assert_eq!(tree.decode_symbol(&mut reader).unwrap(),Some(b'z'));
    assert!(matches!(tree.decode_symbol(&mut reader),Err(Error::InvalidCode)));
}
