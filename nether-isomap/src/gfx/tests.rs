//! Tests for graphics partitions and cross-partition editing

use std::sync::Arc;

use super::*;
use crate::bitstream::{BitReader, BitWriter, Endian};
use crate::config::CodecConfig;
use crate::error::MapError;

fn registry() -> ElementRegistry {
    ElementRegistry::from_entries([
        ElementData {
            id: 100,
            origin_x: 10,
            origin_y: 20,
            img_width: 30,
            img_height: 40,
            ..ElementData::default()
        },
        ElementData {
            id: 200,
            img_width: 86,
            img_height: 43,
            ..ElementData::default()
        },
    ])
}

fn tint(r: i8, g: i8, b: i8) -> ElementColor {
    ElementColor::new(
        ColorType::TEINT,
        vec![decode_channel(r), decode_channel(g), decode_channel(b)],
    )
    .unwrap()
}

fn group(key: i32, layer: i8, id: i32) -> GroupDescriptor {
    GroupDescriptor {
        group_key: key,
        layer_index: layer,
        group_id: id,
    }
}

/// Header, one group, one teint color, origin (3, 4) and a single 1×1 rectangle
fn single_cell_bytes(group_index: u32, color_index: u32) -> Vec<u8> {
    let mut writer = BitWriter::new();
    for _ in 0..2 {
        writer.write_i32(0);
        writer.write_i32(0);
        writer.write_i16(0);
    }
    writer.write_u16(1);
    writer.write_i32(7);
    writer.write_i8(2);
    writer.write_i32(9);
    writer.write_u16(1);
    writer.write_bool(true);
    writer.write_bool(false);
    writer.write_bool(false);
    writer.write_bytes(&[10, 20, 30]);
    writer.write_i32(3);
    writer.write_i32(4);
    writer.write_u16(1);
    writer.write_bytes(&[0, 0, 0, 0]);
    writer.write_u8(1);
    writer.write_i32(100);
    writer.write_i16(2);
    writer.write_u8(5);
    writer.write_u8(0);
    writer.write_bool(true);
    writer.write_bits(group_index, 1).unwrap();
    writer.write_bits(color_index, 1).unwrap();
    writer.finish().unwrap()
}

fn sample_partition(registry: &ElementRegistry) -> GfxPartition {
    let elements = vec![
        Element::new(100, 3, 4, 2)
            .with_height(5)
            .with_occluder(true)
            .with_group(group(7, 2, 9))
            .with_color(tint(10, 20, 30)),
        Element::new(200, 3, 4, 6)
            .with_altitude_order(1)
            .with_group(group(1, -1, 1)),
        Element::new(200, 5, 4, 0)
            .with_group(group(7, 2, 9))
            .with_color(tint(10, 20, 30)),
        Element::new(100, 4, 6, -3)
            .with_group(group(3, 0, 3))
            .with_color(
                ElementColor::new(
                    ColorType::TEINT | ColorType::ALPHA | ColorType::GRADIENT,
                    (0..8).map(|i| decode_channel(i * 15 - 60)).collect(),
                )
                .unwrap(),
            ),
        Element::new(100, 6, 6, 1).with_color(
            ElementColor::new(ColorType::ALPHA, vec![decode_channel(-128)]).unwrap(),
        ),
    ];
    GfxPartition::from_elements(0, 0, elements, registry)
}

fn roundtrip(partition: &GfxPartition, registry: &ElementRegistry, config: &CodecConfig) -> GfxPartition {
    let bytes = partition.to_bytes(config).unwrap();
    GfxPartition::from_bytes(partition.x, partition.y, &bytes, registry, config).unwrap()
}

// =============================================================================
// Order key
// =============================================================================

#[test]
fn test_order_key_formula() {
    let expected = (((4 + 8192) & 0x3FFF) as u64) << 34
        | (((3 + 8192) & 0x3FFF) as u64) << 19
        | (5u64 & 0x1FFF) << 6;
    assert_eq!(order_key(3, 4, 5), expected);
    assert_eq!(order_key(-8192, -8192, 0), 0);
}

#[test]
fn test_order_key_sorts_row_column_altitude() {
    assert!(order_key(9, 0, 9) < order_key(0, 1, 0));
    assert!(order_key(0, 1, 9) < order_key(1, 1, 0));
    assert!(order_key(1, 1, 0) < order_key(1, 1, 1));
    assert!(order_key(-5, 2, 0) < order_key(-4, 2, 0));
    assert!(order_key(0, -1, 0) < order_key(0, 0, 0));
}

// =============================================================================
// Colors
// =============================================================================

#[test]
fn test_channel_counts() {
    assert_eq!(ColorType::empty().channel_count(), 0);
    assert_eq!(ColorType::ALPHA.channel_count(), 1);
    assert_eq!((ColorType::ALPHA | ColorType::GRADIENT).channel_count(), 2);
    assert_eq!(ColorType::TEINT.channel_count(), 3);
    assert_eq!((ColorType::TEINT | ColorType::ALPHA).channel_count(), 4);
    assert_eq!((ColorType::TEINT | ColorType::GRADIENT).channel_count(), 6);
    assert_eq!(ColorType::all().channel_count(), 8);
}

#[test]
fn test_channel_encoding_is_centered_and_unclamped() {
    assert_eq!(encode_channel(0.5), 0);
    assert_eq!(encode_channel(1.0), 127);
    assert_eq!(encode_channel(0.0), -128);
    assert!((decode_channel(0) - 0.5).abs() < f32::EPSILON);
    assert!((decode_channel(127) - (127.0 / 255.0 + 0.5)).abs() < 1e-6);
    // 1.5 maps to 255, which wraps to -1
    assert_eq!(encode_channel(1.5), -1);
    for byte in i8::MIN..=i8::MAX {
        assert_eq!(encode_channel(decode_channel(byte)), byte);
    }
}

#[test]
fn test_channel_encoding_saturates_unit_range() {
    assert_eq!(encode_channel(1.0), i8::MAX);
    assert_eq!(encode_channel(0.0), i8::MIN);
    assert_eq!(encode_channel(0.25), -64);
    assert_eq!(encode_channel(0.75), 64);
    // Just past the range still wraps
    assert_eq!(encode_channel(1.002), -128);
    assert_eq!(encode_channel(-0.5), 1);
}

#[test]
fn test_opaque_white_partition_roundtrip() {
    let registry = registry();
    let partition = GfxPartition::from_elements(
        0,
        0,
        vec![Element::new(100, 1, 1, 0).with_color(ElementColor::opaque_white())],
        &registry,
    );
    let decoded = roundtrip(&partition, &registry, &CodecConfig::default());
    let color = &decoded.elements()[0].color;
    assert_eq!(color.kind(), ColorType::TEINT | ColorType::ALPHA);
    assert_eq!(color.channels().len(), 4);
    for &channel in color.channels() {
        assert!((channel - 1.0).abs() <= 1.0 / 255.0, "channel {channel}");
    }
    assert_eq!(color.key(), ElementColor::opaque_white().key());
}

#[test]
fn test_color_channel_count_checked() {
    assert!(ElementColor::new(ColorType::TEINT, vec![0.5; 4]).is_err());
    assert!(ElementColor::new(ColorType::TEINT, vec![0.5; 3]).is_ok());
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_decode_single_cell() {
    let registry = registry();
    let bytes = single_cell_bytes(0, 0);
    let partition = GfxPartition::decode(0, 0, &mut BitReader::new(&bytes), &registry).unwrap();

    assert_eq!(partition.len(), 1);
    let element = &partition.elements()[0];
    assert_eq!((element.cell_x, element.cell_y, element.cell_z), (3, 4, 2));
    assert_eq!(element.height, 5);
    assert!(element.occluder);
    assert_eq!(element.group, group(7, 2, 9));
    assert_eq!(element.color, tint(10, 20, 30));
    assert_eq!(element.order_key(), order_key(3, 4, 0));

    assert_eq!(element.left, -53.0);
    assert_eq!(element.top, 110.5);

    let bounds = partition.bounds();
    assert_eq!((bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y), (3, 3, 4, 4));
    assert_eq!((bounds.min_z, bounds.max_z), (2, 2));
    assert_eq!(bounds.right, -23.0);
    assert_eq!(bounds.bottom, 150.5);
}

#[test]
fn test_dangling_indices_degrade_to_defaults() {
    let registry = registry();
    let bytes = single_cell_bytes(1, 1);
    let partition = GfxPartition::decode(0, 0, &mut BitReader::new(&bytes), &registry).unwrap();

    let element = &partition.elements()[0];
    assert_eq!(element.group, GroupDescriptor::default());
    assert_eq!(element.group.layer_index, 0);
    assert_eq!(element.color, ElementColor::opaque_white());

    // The fallback color re-encodes as white, not as black
    let reencoded = roundtrip(&partition, &registry, &CodecConfig::default());
    let color = &reencoded.elements()[0].color;
    assert_eq!(color.key(), ElementColor::opaque_white().key());
    assert!(color.channels().iter().all(|&c| c > 0.99));
}

#[test]
fn test_truncated_partition_fails() {
    let registry = registry();
    let bytes = single_cell_bytes(0, 0);
    for len in [0, 10, bytes.len() - 1] {
        let result = GfxPartition::decode(0, 0, &mut BitReader::new(&bytes[..len]), &registry);
        assert!(matches!(result, Err(MapError::OutOfData { .. })), "len {}", len);
    }
}

#[test]
fn test_unknown_element_data_gets_placeholder() {
    let registry = ElementRegistry::new();
    let bytes = single_cell_bytes(0, 0);
    let partition = GfxPartition::decode(0, 0, &mut BitReader::new(&bytes), &registry).unwrap();

    assert_eq!(partition.len(), 1);
    assert_eq!(registry.get(100), Some(Arc::new(ElementData::placeholder(100))));
}

#[test]
fn test_decode_sorts_stably_by_order_key() {
    let registry = registry();
    // Two elements on (1, 0), then one on (0, 0) in a later rectangle
    let mut writer = BitWriter::new();
    for _ in 0..2 {
        writer.write_i32(0);
        writer.write_i32(0);
        writer.write_i16(0);
    }
    writer.write_u16(0);
    writer.write_u16(0);
    writer.write_i32(0);
    writer.write_i32(0);
    writer.write_u16(2);
    writer.write_bytes(&[1, 1, 0, 0]);
    writer.write_u8(2);
    for id in [100, 200] {
        writer.write_i32(id);
        writer.write_i16(0);
        writer.write_u8(0);
        writer.write_u8(0);
        writer.write_bits(0, 3).unwrap();
    }
    writer.write_bytes(&[0, 0, 0, 0]);
    writer.write_u8(1);
    writer.write_i32(200);
    writer.write_i16(0);
    writer.write_u8(0);
    writer.write_u8(3);
    writer.write_bits(0, 3).unwrap();
    let bytes = writer.finish().unwrap();

    let partition = GfxPartition::decode(0, 0, &mut BitReader::new(&bytes), &registry).unwrap();
    let cells: Vec<_> = partition
        .elements()
        .iter()
        .map(|e| (e.cell_x, e.element_id))
        .collect();
    assert_eq!(cells, vec![(0, 200), (1, 100), (1, 200)]);
    // Missing tables fall back to defaults
    assert_eq!(partition.elements()[0].color, ElementColor::opaque_white());
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_roundtrip_preserves_content() {
    let registry = registry();
    let partition = sample_partition(&registry);
    let decoded = roundtrip(&partition, &registry, &CodecConfig::default());
    assert_eq!(decoded, partition);
}

#[test]
fn test_roundtrip_big_endian_compressed_coalesced() {
    let registry = registry();
    let partition = sample_partition(&registry);
    let config = CodecConfig {
        byte_order: Endian::Big,
        compress: true,
        coalesce_rectangles: true,
    };
    assert_eq!(roundtrip(&partition, &registry, &config), partition);
}

#[test]
fn test_tables_rebuilt_in_first_seen_order() {
    let registry = registry();
    let partition = sample_partition(&registry);
    let bytes = partition.to_bytes(&CodecConfig::default()).unwrap();

    let mut reader = BitReader::new(&bytes);
    reader.seek(20).unwrap();
    let group_count = reader.read_u16().unwrap();
    let mut groups = Vec::new();
    for _ in 0..group_count {
        groups.push(group(
            reader.read_i32().unwrap(),
            reader.read_i8().unwrap(),
            reader.read_i32().unwrap(),
        ));
    }
    // Elements sorted: (3,4) alt 0, (3,4) alt 1, (5,4), (4,6), (6,6)
    assert_eq!(
        groups,
        vec![group(7, 2, 9), group(1, -1, 1), group(3, 0, 3), GroupDescriptor::default()]
    );
    assert_eq!(reader.read_u16().unwrap(), 4);
}

#[test]
fn test_coalescing_merges_row_runs() {
    let registry = registry();
    let elements = (0..6).map(|x| Element::new(200, x, 2, 0)).collect();
    let partition = GfxPartition::from_elements(0, 0, elements, &registry);

    let unit = partition.to_bytes(&CodecConfig::default()).unwrap();
    let merged = partition
        .to_bytes(&CodecConfig {
            coalesce_rectangles: true,
            ..CodecConfig::default()
        })
        .unwrap();
    // Five fewer 4-byte rectangles
    assert_eq!(unit.len() - merged.len(), 20);
    assert_eq!(roundtrip(&partition, &registry, &CodecConfig::default()), partition);
}

#[test]
fn test_encode_rejects_oversized_fields() {
    let registry = registry();
    let partition = GfxPartition::from_elements(
        0,
        0,
        vec![Element::new(100, 0, 0, 0).with_altitude_order(300)],
        &registry,
    );
    assert!(matches!(
        partition.to_bytes(&CodecConfig::default()),
        Err(MapError::ValueOutOfRange {
            field: "altitude order",
            value: 300
        })
    ));

    let partition = GfxPartition::from_elements(
        0,
        0,
        vec![Element::new(100, 0, 0, 0), Element::new(100, 400, 0, 0)],
        &registry,
    );
    assert!(matches!(
        partition.to_bytes(&CodecConfig::default()),
        Err(MapError::ValueOutOfRange {
            field: "cell offset",
            ..
        })
    ));
}

#[test]
fn test_empty_partition_roundtrip() {
    let registry = registry();
    let partition = GfxPartition::new(2, -3);
    let decoded = roundtrip(&partition, &registry, &CodecConfig::default());
    assert!(decoded.is_empty());
    assert_eq!(decoded, partition);
}

// =============================================================================
// Cross-partition editing
// =============================================================================

fn map_with(partitions: Vec<GfxPartition>) -> GfxMap {
    let mut map = GfxMap::new(Arc::new(registry()));
    for partition in partitions {
        map.insert_partition(partition);
    }
    map
}

fn altitudes_at(map: &GfxMap, x: i32, y: i32) -> Vec<(i16, u16)> {
    map.stack_at(x, y)
        .into_iter()
        .filter_map(|at| map.element(at))
        .map(|e| (e.cell_z, e.altitude_order))
        .collect()
}

#[test]
fn test_add_above_existing_appends() {
    let registry = registry();
    let mut map = map_with(vec![GfxPartition::from_elements(
        0,
        0,
        vec![Element::new(100, 5, 5, 5)],
        &registry,
    )]);

    let at = map.add_element(Element::new(200, 5, 5, 10)).unwrap();
    let added = map.element(at).unwrap();
    assert_eq!(added.element_id, 200);
    assert_eq!(added.altitude_order, 1);
    assert_eq!(added.order_key(), order_key(5, 5, 1));
    assert_eq!(altitudes_at(&map, 5, 5), vec![(5, 0), (10, 1)]);
}

#[test]
fn test_add_below_existing_takes_its_slot() {
    let registry = registry();
    let mut map = map_with(vec![GfxPartition::from_elements(
        0,
        0,
        vec![Element::new(100, 5, 5, 5)],
        &registry,
    )]);

    let at = map.add_element(Element::new(200, 5, 5, 1)).unwrap();
    assert_eq!(map.element(at).unwrap().altitude_order, 0);
    assert_eq!(altitudes_at(&map, 5, 5), vec![(1, 0), (5, 1)]);

    let partition = map.partition(0, 0).unwrap();
    assert_eq!(partition.elements()[0].element_id, 200);
    assert_eq!(partition.elements()[1].order_key(), order_key(5, 5, 1));
}

#[test]
fn test_add_reranks_across_partitions() {
    let registry = registry();
    let mut map = map_with(vec![
        GfxPartition::from_elements(0, 0, vec![Element::new(100, 17, 5, 0)], &registry),
        GfxPartition::from_elements(
            1,
            0,
            vec![Element::new(100, 17, 5, 20).with_altitude_order(1)],
            &registry,
        ),
    ]);

    let at = map.add_element(Element::new(200, 17, 5, 10)).unwrap();
    assert_eq!(at.partition, (0, 0));
    assert_eq!(map.element(at).unwrap().altitude_order, 1);
    assert_eq!(altitudes_at(&map, 17, 5), vec![(0, 0), (10, 1), (20, 2)]);
    assert_eq!(
        map.partition(1, 0).unwrap().elements()[0].order_key(),
        order_key(17, 5, 2)
    );
    assert!(map.altitude_orders_dense());
}

#[test]
fn test_add_to_empty_map_creates_partition() {
    let mut map = map_with(Vec::new());
    let at = map.add_element(Element::new(100, -1, 20, 0)).unwrap();
    assert_eq!(at, ElementRef { partition: (-1, 1), index: 0 });
    assert_eq!(map.element(at).unwrap().altitude_order, 0);

    let bounds = map.partition(-1, 1).unwrap().bounds();
    assert_eq!((bounds.min_x, bounds.min_y), (-1, 20));
}

#[test]
fn test_nearest_partition_owns_new_element() {
    let mut map = map_with(vec![GfxPartition::new(0, 0), GfxPartition::new(2, 0)]);
    // Centers (9, 9) and (45, 9)
    assert_eq!(map.add_element(Element::new(100, 30, 9, 0)).unwrap().partition, (2, 0));
    assert_eq!(map.add_element(Element::new(100, 26, 9, 0)).unwrap().partition, (0, 0));
    // Tie at x = 27 goes to the first partition
    assert_eq!(map.add_element(Element::new(100, 27, 9, 0)).unwrap().partition, (0, 0));
}

#[test]
fn test_remove_redensifies() {
    let mut map = map_with(Vec::new());
    for z in [0, 5, 10, 15] {
        map.add_element(Element::new(100, 2, 2, z)).unwrap();
    }
    assert_eq!(altitudes_at(&map, 2, 2), vec![(0, 0), (5, 1), (10, 2), (15, 3)]);

    let second = map.stack_at(2, 2)[1];
    let removed = map.remove_element(second).unwrap();
    assert_eq!(removed.cell_z, 5);
    assert_eq!(altitudes_at(&map, 2, 2), vec![(0, 0), (10, 1), (15, 2)]);
    assert!(map.altitude_orders_dense());

    let keys: Vec<u64> = map.partition(0, 0).unwrap().elements().iter().map(Element::order_key).collect();
    assert_eq!(keys, vec![order_key(2, 2, 0), order_key(2, 2, 1), order_key(2, 2, 2)]);
}

#[test]
fn test_remove_invalid_ref_is_none() {
    let mut map = map_with(vec![GfxPartition::new(0, 0)]);
    assert!(map.remove_element(ElementRef { partition: (0, 0), index: 0 }).is_none());
    assert!(map.remove_element(ElementRef { partition: (5, 5), index: 0 }).is_none());
}

#[test]
fn test_add_rejects_full_cell() {
    let mut map = map_with(Vec::new());
    for _ in 0..MAX_CELL_STACK {
        map.add_element(Element::new(100, 4, 4, 0)).unwrap();
    }
    assert!(map.altitude_orders_dense());
    assert!(matches!(
        map.add_element(Element::new(100, 4, 4, 0)),
        Err(MapError::ValueOutOfRange { field: "elements per cell", .. })
    ));
    assert_eq!(map.stack_at(4, 4).len(), MAX_CELL_STACK);
    // Other cells are unaffected
    assert!(map.add_element(Element::new(100, 5, 4, 0)).is_ok());
}

#[test]
fn test_add_rejects_saturated_altitude() {
    let registry = registry();
    let mut map = map_with(vec![GfxPartition::from_elements(
        0,
        0,
        vec![Element::new(100, 2, 2, 0).with_altitude_order(u16::MAX)],
        &registry,
    )]);
    assert!(map.add_element(Element::new(100, 2, 2, 1)).is_err());
    assert!(map.add_element(Element::new(100, 2, 2, -1)).is_err());
    assert_eq!(map.stack_at(2, 2).len(), 1);
}

#[test]
fn test_add_updates_bounds() {
    let mut map = map_with(Vec::new());
    map.add_element(Element::new(200, 1, 1, 0)).unwrap();
    map.add_element(Element::new(200, 3, 2, 4)).unwrap();

    let bounds = *map.partition(0, 0).unwrap().bounds();
    assert_eq!((bounds.min_x, bounds.max_x), (1, 3));
    assert_eq!((bounds.min_y, bounds.max_y), (1, 2));
    assert_eq!((bounds.min_z, bounds.max_z), (0, 4));
    // (3, 2, z 4): left 43, top 107.5 - 40; (1, 1): left 0, top 43
    assert_eq!(bounds.left, 0.0);
    assert_eq!(bounds.top, 43.0);
    assert_eq!(bounds.right, 43.0 + 86.0);
    assert_eq!(bounds.bottom, 67.5 + 43.0);
}
