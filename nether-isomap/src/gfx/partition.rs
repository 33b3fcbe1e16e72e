//! Graphics partition decoding and encoding
//!
//! # Layout
//!
//! ```text
//! header   min_x i32, min_y i32, min_z i16, max_x i32, max_y i32, max_z i16
//! groups   u16 count × { group_key i32, layer_index i8, group_id i32 }
//! colors   u16 count × { teint bit, alpha bit, gradient bit, channel i8 × n }
//! origin   map_x i32, map_y i32
//! rects    u16 count × { min_x u8, max_x u8, min_y u8, max_y u8 }
//! cells    per rect cell, row-major: count u8, then elements
//! element  element_id i32, cell_z i16, height u8, altitude_order u8,
//!          occluder bit, group index bits, color index bits
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use super::color::ElementColor;
use super::element::{Element, GroupDescriptor};
use super::index_bits;
use super::registry::ElementRegistry;
use crate::CHUNK_SIZE;
use crate::bitstream::{self, BitReader, BitWriter};
use crate::config::CodecConfig;
use crate::error::{MapError, Result};
use crate::tables::DedupTable;

/// Cell and pixel extent of a partition's elements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartitionBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub min_z: i16,
    pub max_x: i32,
    pub max_y: i32,
    pub max_z: i16,
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PartitionBounds {
    fn read(reader: &mut BitReader) -> Result<Self> {
        Ok(Self {
            min_x: reader.read_i32()?,
            min_y: reader.read_i32()?,
            min_z: reader.read_i16()?,
            max_x: reader.read_i32()?,
            max_y: reader.read_i32()?,
            max_z: reader.read_i16()?,
            ..Self::default()
        })
    }

    fn write(&self, writer: &mut BitWriter) {
        writer.write_i32(self.min_x);
        writer.write_i32(self.min_y);
        writer.write_i16(self.min_z);
        writer.write_i32(self.max_x);
        writer.write_i32(self.max_y);
        writer.write_i16(self.max_z);
    }
}

/// Inclusive cell rectangle, offsets relative to the partition origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min_x: u8,
    pub max_x: u8,
    pub min_y: u8,
    pub max_y: u8,
}

impl CellRect {
    fn read(reader: &mut BitReader) -> Result<Self> {
        Ok(Self {
            min_x: reader.read_u8()?,
            max_x: reader.read_u8()?,
            min_y: reader.read_u8()?,
            max_y: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BitWriter) {
        writer.write_u8(self.min_x);
        writer.write_u8(self.max_x);
        writer.write_u8(self.min_y);
        writer.write_u8(self.max_y);
    }

    /// Cells covered, row-major
    pub fn cells(self) -> impl Iterator<Item = (u8, u8)> {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }
}

/// Graphics elements of one map region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GfxPartition {
    pub x: i32,
    pub y: i32,
    pub(crate) elements: Vec<Element>,
    pub(crate) bounds: PartitionBounds,
}

impl GfxPartition {
    /// Create an empty partition
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            elements: Vec::new(),
            bounds: PartitionBounds::default(),
        }
    }

    /// Create a partition from elements, placing and sorting them.
    ///
    /// Altitude orders are taken as given.
    pub fn from_elements(
        x: i32,
        y: i32,
        elements: Vec<Element>,
        registry: &ElementRegistry,
    ) -> Self {
        let mut partition = Self::new(x, y);
        partition.elements = elements;
        for element in &mut partition.elements {
            element.refresh_order_key();
            element.place(&registry.get_or_placeholder(element.element_id));
        }
        partition.sort_elements();
        partition.recompute_bounds(registry);
        partition
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn bounds(&self) -> &PartitionBounds {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Center cell of the partition's region
    pub fn center(&self) -> (i32, i32) {
        let half = CHUNK_SIZE / 2;
        (self.x * CHUNK_SIZE + half, self.y * CHUNK_SIZE + half)
    }

    /// Stable sort by order key
    pub fn sort_elements(&mut self) {
        self.elements.sort_by_key(Element::order_key);
    }

    /// Recompute cell and pixel bounds from the current elements
    pub fn recompute_bounds(&mut self, registry: &ElementRegistry) {
        let Some(first) = self.elements.first() else {
            self.bounds = PartitionBounds::default();
            return;
        };

        let mut bounds = PartitionBounds {
            min_x: first.cell_x,
            min_y: first.cell_y,
            min_z: first.cell_z,
            max_x: first.cell_x,
            max_y: first.cell_y,
            max_z: first.cell_z,
            left: f32::MAX,
            top: f32::MAX,
            right: f32::MIN,
            bottom: f32::MIN,
        };
        for element in &self.elements {
            let data = registry.get_or_placeholder(element.element_id);
            bounds.min_x = bounds.min_x.min(element.cell_x);
            bounds.min_y = bounds.min_y.min(element.cell_y);
            bounds.min_z = bounds.min_z.min(element.cell_z);
            bounds.max_x = bounds.max_x.max(element.cell_x);
            bounds.max_y = bounds.max_y.max(element.cell_y);
            bounds.max_z = bounds.max_z.max(element.cell_z);
            bounds.left = bounds.left.min(element.left);
            bounds.top = bounds.top.min(element.top);
            bounds.right = bounds.right.max(element.left + f32::from(data.img_width));
            bounds.bottom = bounds.bottom.max(element.top + f32::from(data.img_height));
        }
        self.bounds = bounds;
    }

    /// Decode a partition from raw (possibly zlib-wrapped) bytes
    pub fn from_bytes(
        x: i32,
        y: i32,
        bytes: &[u8],
        registry: &ElementRegistry,
        config: &CodecConfig,
    ) -> Result<Self> {
        let inflated;
        let data = if config.compress {
            inflated = bitstream::decompress(bytes)?;
            inflated.as_slice()
        } else {
            bytes
        };
        let mut reader = BitReader::with_order(data, config.byte_order);
        Self::decode(x, y, &mut reader, registry)
    }

    /// Encode a partition to bytes
    pub fn to_bytes(&self, config: &CodecConfig) -> Result<Vec<u8>> {
        let mut writer = BitWriter::with_order(config.byte_order);
        if config.compress {
            writer.compress();
        }
        self.encode(&mut writer, config.coalesce_rectangles)?;
        writer.finish()
    }

    /// Decode a partition whose region coordinates are supplied by the caller
    pub fn decode(
        x: i32,
        y: i32,
        reader: &mut BitReader,
        registry: &ElementRegistry,
    ) -> Result<Self> {
        let header = PartitionBounds::read(reader)?;

        let group_count = reader.read_u16()?;
        let mut groups = Vec::with_capacity(group_count as usize);
        for _ in 0..group_count {
            groups.push(GroupDescriptor {
                group_key: reader.read_i32()?,
                layer_index: reader.read_i8()?,
                group_id: reader.read_i32()?,
            });
        }

        let color_count = reader.read_u16()?;
        let mut colors = Vec::with_capacity(color_count as usize);
        for _ in 0..color_count {
            colors.push(ElementColor::read(reader)?);
        }

        let map_x = reader.read_i32()?;
        let map_y = reader.read_i32()?;
        let group_bits = index_bits(groups.len());
        let color_bits = index_bits(colors.len());

        let rect_count = reader.read_u16()?;
        let mut elements = Vec::new();
        for _ in 0..rect_count {
            let rect = CellRect::read(reader)?;
            for (dx, dy) in rect.cells() {
                let cell_x = cell_coord(map_x, dx)?;
                let cell_y = cell_coord(map_y, dy)?;
                let count = reader.read_u8()?;
                for _ in 0..count {
                    let element_id = reader.read_i32()?;
                    let cell_z = reader.read_i16()?;
                    let height = reader.read_u8()?;
                    let altitude_order = reader.read_u8()?;
                    let occluder = reader.read_bool()?;
                    let group_index = reader.read_bits(group_bits)? as usize;
                    let color_index = reader.read_bits(color_bits)? as usize;

                    let mut element = Element::new(element_id, cell_x, cell_y, cell_z)
                        .with_height(height)
                        .with_altitude_order(u16::from(altitude_order))
                        .with_occluder(occluder)
                        .with_group(groups.get(group_index).copied().unwrap_or_default())
                        .with_color(
                            colors
                                .get(color_index)
                                .cloned()
                                .unwrap_or_else(ElementColor::opaque_white),
                        );
                    element.place(&registry.get_or_placeholder(element_id));
                    elements.push(element);
                }
            }
        }

        let mut partition = Self {
            x,
            y,
            elements,
            bounds: header,
        };
        partition.sort_elements();
        partition.recompute_bounds(registry);

        tracing::debug!(
            x,
            y,
            groups = groups.len(),
            colors = colors.len(),
            rects = rect_count,
            elements = partition.elements.len(),
            "decoded gfx partition"
        );
        Ok(partition)
    }

    /// Encode the partition. Tables are rebuilt in first-seen element order.
    pub fn encode(&self, writer: &mut BitWriter, coalesce_rectangles: bool) -> Result<()> {
        self.bounds.write(writer);

        let mut groups = DedupTable::new();
        let mut colors = DedupTable::new();
        for element in &self.elements {
            groups.insert(element.group, element.group);
            colors.insert(element.color.key(), &element.color);
        }

        writer.write_u16(table_len("group table", groups.len())?);
        for group in groups.entries() {
            writer.write_i32(group.group_key);
            writer.write_i8(group.layer_index);
            writer.write_i32(group.group_id);
        }
        writer.write_u16(table_len("color table", colors.len())?);
        for color in colors.entries() {
            color.write(writer);
        }

        // Row-major buckets, each keeping collection order
        let mut cells: BTreeMap<(i32, i32), SmallVec<[&Element; 4]>> = BTreeMap::new();
        for element in &self.elements {
            cells
                .entry((element.cell_y, element.cell_x))
                .or_default()
                .push(element);
        }
        let map_x = self.elements.iter().map(|e| e.cell_x).min().unwrap_or(0);
        let map_y = self.elements.iter().map(|e| e.cell_y).min().unwrap_or(0);
        writer.write_i32(map_x);
        writer.write_i32(map_y);

        let rects = cover_cells(cells.keys().copied(), map_x, map_y, coalesce_rectangles)?;
        writer.write_u16(table_len("rectangle count", rects.len())?);

        let group_bits = index_bits(groups.len());
        let color_bits = index_bits(colors.len());
        for rect in &rects {
            rect.write(writer);
            for (dx, dy) in rect.cells() {
                let key = (map_y + i32::from(dy), map_x + i32::from(dx));
                let stack = cells.get(&key).map(|s| s.as_slice()).unwrap_or_default();
                let count = u8::try_from(stack.len())
                    .map_err(|_| MapError::out_of_range("elements per cell", stack.len() as i64))?;
                writer.write_u8(count);

                for element in stack {
                    let altitude = u8::try_from(element.altitude_order).map_err(|_| {
                        MapError::out_of_range("altitude order", element.altitude_order)
                    })?;
                    let group_index = groups
                        .index_of(&element.group)
                        .ok_or(MapError::UnresolvedIndex("group"))?;
                    let color_index = colors
                        .index_of(&element.color.key())
                        .ok_or(MapError::UnresolvedIndex("color"))?;

                    writer.write_i32(element.element_id);
                    writer.write_i16(element.cell_z);
                    writer.write_u8(element.height);
                    writer.write_u8(altitude);
                    writer.write_bool(element.occluder);
                    writer.write_bits(group_index as u32, group_bits)?;
                    writer.write_bits(color_index as u32, color_bits)?;
                }
            }
        }
        Ok(())
    }
}

fn table_len(field: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| MapError::out_of_range(field, len as i64))
}

/// Absolute cell coordinate of a rectangle offset; fails instead of overflowing
fn cell_coord(origin: i32, offset: u8) -> Result<i32> {
    origin.checked_add(i32::from(offset)).ok_or_else(|| {
        MapError::out_of_range("cell coordinate", i64::from(origin) + i64::from(offset))
    })
}

fn cell_offset(value: i32, origin: i32) -> Result<u8> {
    let offset = i64::from(value) - i64::from(origin);
    u8::try_from(offset).map_err(|_| MapError::out_of_range("cell offset", offset))
}

/// Rectangles covering exactly the occupied cells, in row-major order.
///
/// `cells` yields `(y, x)` keys in ascending order.
fn cover_cells(
    cells: impl Iterator<Item = (i32, i32)>,
    map_x: i32,
    map_y: i32,
    coalesce: bool,
) -> Result<Vec<CellRect>> {
    let mut rects: Vec<CellRect> = Vec::new();
    let mut previous: Option<(i32, i32)> = None;
    for (y, x) in cells {
        let dx = cell_offset(x, map_x)?;
        let dy = cell_offset(y, map_y)?;
        match rects.last_mut() {
            Some(run) if coalesce && previous == Some((y, x.wrapping_sub(1))) => run.max_x = dx,
            _ => rects.push(CellRect {
                min_x: dx,
                max_x: dx,
                min_y: dy,
                max_y: dy,
            }),
        }
        previous = Some((y, x));
    }
    Ok(rects)
}
