//! Sorted packed cell words shared by the sparse variants
//!
//! Bits 0-4 hold the local x, bits 5-9 the local y and bits 10-19 the
//! elevation offset; the remaining bits are variant specific. Words are
//! sorted by (y, x) and a cell may own several consecutive words.

use std::cmp::Ordering;
use std::ops::Range;

use super::{MAX_ELEVATION_OFFSET, TopologyKind};
use crate::CHUNK_SIZE;
use crate::error::{MapError, Result};

const COORD_MASK: u32 = 0x1F;
const Y_SHIFT: u32 = 5;
const OFFSET_SHIFT: u32 = 10;

/// Local (x, y) addressed by a word
#[inline]
pub(crate) fn word_cell(word: u32) -> (u32, u32) {
    (word & COORD_MASK, (word >> Y_SHIFT) & COORD_MASK)
}

#[inline]
pub(crate) fn word_offset(word: u32) -> u16 {
    ((word >> OFFSET_SHIFT) as u16) & MAX_ELEVATION_OFFSET
}

/// Shared low 20 bits of a word
pub(crate) fn pack_cell(kind: TopologyKind, x: u8, y: u8, offset: u16) -> Result<u32> {
    check_cell(kind, u32::from(x), u32::from(y))?;
    Ok(u32::from(x) | (u32::from(y) << Y_SHIFT) | (u32::from(offset) << OFFSET_SHIFT))
}

fn check_cell(kind: TopologyKind, x: u32, y: u32) -> Result<()> {
    let size = CHUNK_SIZE as u32;
    if x >= size || y >= size {
        return Err(MapError::CellOutOfRange { kind, x, y });
    }
    Ok(())
}

#[inline]
fn sort_key(word: u32) -> (u32, u32) {
    let (x, y) = word_cell(word);
    (y, x)
}

/// Check that every word addresses a footprint cell and that words are sorted
pub(crate) fn validate(kind: TopologyKind, words: &[u32]) -> Result<()> {
    for (index, &word) in words.iter().enumerate() {
        let (x, y) = word_cell(word);
        check_cell(kind, x, y)?;
        if index > 0 && sort_key(words[index - 1]) > sort_key(word) {
            return Err(MapError::UnsortedCells { kind, index });
        }
    }
    Ok(())
}

/// Indices of every word addressing local cell (x, y), in stored order
pub(crate) fn find(words: &[u32], x: u32, y: u32) -> Range<usize> {
    let target = (y, x);
    let (mut low, mut high) = (0, words.len());
    while low < high {
        let mid = low + (high - low) / 2;
        match sort_key(words[mid]).cmp(&target) {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
            Ordering::Equal => {
                let mut start = mid;
                while start > 0 && sort_key(words[start - 1]) == target {
                    start -= 1;
                }
                let mut end = mid + 1;
                while end < words.len() && sort_key(words[end]) == target {
                    end += 1;
                }
                return start..end;
            }
        }
    }
    low..low
}

/// Stable sort of builder entries by the cell they address
pub(crate) fn sort_entries<T>(entries: &mut [T], cell: impl Fn(&T) -> (u8, u8)) {
    entries.sort_by_key(|entry| {
        let (x, y) = cell(entry);
        (y, x)
    });
}
