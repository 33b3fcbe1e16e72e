//! Graphics element partitions
//!
//! A graphics partition holds the visual elements placed on the cells of one
//! map region. On the wire it is a bounding-box header, two dedup tables
//! (group descriptors and colors), and a list of cell rectangles whose cells
//! carry element records that index into the tables.
//!
//! Elements are kept sorted by their [`order_key`], which stacks them by cell
//! row, then cell column, then altitude order. Altitude order is a dense rank
//! among every element sharing a cell across all partitions of a [`GfxMap`].

mod color;
mod element;
mod map;
mod partition;
mod registry;

#[cfg(test)]
mod tests;

pub use color::{ColorType, ElementColor, decode_channel, encode_channel};
pub use element::{Element, GroupDescriptor};
pub use map::{ElementRef, GfxMap, MAX_CELL_STACK};
pub use partition::{CellRect, GfxPartition, PartitionBounds};
pub use registry::{ElementData, ElementRegistry};

/// Half the pixel width of a cell diamond (cells are 86×43)
pub const CELL_HALF_WIDTH: f32 = 43.0;

/// Half the pixel height of a cell diamond
pub const CELL_HALF_HEIGHT: f32 = 21.5;

/// Screen pixels per elevation unit
pub const ELEVATION_UNIT_PX: f32 = 10.0;

/// Bias applied to cell coordinates before packing them into an order key
pub const ORDER_KEY_COORD_BIAS: i32 = 8192;

const ORDER_KEY_COORD_MASK: u64 = 0x3FFF;
const ORDER_KEY_ALTITUDE_MASK: u64 = 0x1FFF;

/// Sort key stacking elements by cell row, cell column, then altitude order.
///
/// Only meaningful for ordering: distinct elements may share a key.
#[inline]
pub const fn order_key(cell_x: i32, cell_y: i32, altitude_order: u16) -> u64 {
    let y = (cell_y.wrapping_add(ORDER_KEY_COORD_BIAS) as u64) & ORDER_KEY_COORD_MASK;
    let x = (cell_x.wrapping_add(ORDER_KEY_COORD_BIAS) as u64) & ORDER_KEY_COORD_MASK;
    let altitude = altitude_order as u64 & ORDER_KEY_ALTITUDE_MASK;
    (y << 34) | (x << 19) | (altitude << 6)
}

/// Bits used for an index into a table of `len` entries
#[inline]
pub(crate) fn index_bits(len: usize) -> u32 {
    crate::bitstream::min_bits_unsigned(len.max(1) as u32 - 1)
}
