// Stream Splitting
// Separates a linear ciphertext into the in-container stream and the spill stream

use std::collections::VecDeque;

/// Ciphertext divided between the container's data region and its trailing region.
///
/// `spill` holds the last byte of every block except the final one; the final
/// block's last byte sits at the tail of `main`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherStream {
    pub main: Vec<u8>,
    pub spill: Vec<u8>,
}

/// Split a linear ciphertext of whole `block_length` blocks.
///
/// The first `block_length - 1` bytes of each block go to `main`, the last
/// byte to `spill`. Once every block is walked, the last spill byte is moved
/// back onto the end of `main`, so `spill` is one byte shorter than the
/// block count. This relocation is required: the trailing region is sized
/// for exactly that many bytes.
///
/// # Panics
///
/// Panics if `block_length` is less than 2.
pub fn split(ciphertext: &[u8], block_length: usize) -> CipherStream {
    assert!(block_length >= 2, "block length must be at least 2");

    let mut stream = CipherStream::default();

    for block in ciphertext.chunks(block_length) {
        let (body, last) = block.split_at(block.len() - 1);
        stream.main.extend_from_slice(body);
        stream.spill.push(last[0]);
    }

    if let Some(last) = stream.spill.pop() {
        stream.main.push(last);
    }

    stream
}

/// Rebuild the linear ciphertext from a main stream and its spill bytes.
///
/// After every `block_length - 1` bytes of `main`, one spill byte is inserted.
/// When the spill runs out, the rest of `main` (the relocated final byte) is
/// appended as is.
///
/// # Panics
///
/// Panics if `block_length` is less than 2.
pub fn recombine(main: &[u8], spill: &[u8], block_length: usize) -> Vec<u8> {
    assert!(block_length >= 2, "block length must be at least 2");

    let mut output = Vec::with_capacity(main.len() + spill.len());
    let mut spill: VecDeque<u8> = spill.iter().copied().collect();
    let mut chunks = main.chunks(block_length - 1);

    while let Some(byte) = spill.front().copied() {
        match chunks.next() {
            Some(chunk) => {
                output.extend_from_slice(chunk);
                output.push(byte);
                spill.pop_front();
            }
            None => break,
        }
    }

    for chunk in chunks {
        output.extend_from_slice(chunk);
    }
    output.extend(spill);

    output
}

/// Cut a contiguous byte sequence into its in-container and trailing parts.
///
/// The first `original_len` bytes stay inside the container; the remainder
/// goes to the trailing region.
pub fn separate_regions(combined: &[u8], original_len: usize) -> (Vec<u8>, Vec<u8>) {
    let at = original_len.min(combined.len());
    let (inside, trailing) = combined.split_at(at);
    (inside.to_vec(), trailing.to_vec())
}
