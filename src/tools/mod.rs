//! Building blocks for the static Huffman codec in `crate::huff`.

pub mod freq_table;
pub mod min_heap;
pub mod huff_tree;
pub mod bit_stream;
