//! Placed graphics elements

use serde::{Deserialize, Serialize};

use super::color::ElementColor;
use super::registry::ElementData;
use super::{CELL_HALF_HEIGHT, CELL_HALF_WIDTH, ELEVATION_UNIT_PX, order_key};

/// Render group an element belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub group_key: i32,
    pub layer_index: i8,
    pub group_id: i32,
}

/// A visual element placed on a map cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Id of the shared [`ElementData`] asset record
    pub element_id: i32,
    pub cell_x: i32,
    pub cell_y: i32,
    pub cell_z: i16,
    /// Elevation contribution of the element
    pub height: u8,
    /// Dense stacking rank among elements on the same cell
    pub altitude_order: u16,
    pub occluder: bool,
    pub group: GroupDescriptor,
    pub color: ElementColor,
    /// Screen-space position, derived from the cell and the asset origin
    pub left: f32,
    pub top: f32,
    order_key: u64,
}

impl Element {
    /// Create an element on a cell with default attributes
    pub fn new(element_id: i32, cell_x: i32, cell_y: i32, cell_z: i16) -> Self {
        Self {
            element_id,
            cell_x,
            cell_y,
            cell_z,
            height: 0,
            altitude_order: 0,
            occluder: false,
            group: GroupDescriptor::default(),
            color: ElementColor::none(),
            left: 0.0,
            top: 0.0,
            order_key: order_key(cell_x, cell_y, 0),
        }
    }

    pub fn with_height(mut self, height: u8) -> Self {
        self.height = height;
        self
    }

    pub fn with_altitude_order(mut self, altitude_order: u16) -> Self {
        self.altitude_order = altitude_order;
        self.refresh_order_key();
        self
    }

    pub fn with_occluder(mut self, occluder: bool) -> Self {
        self.occluder = occluder;
        self
    }

    pub fn with_group(mut self, group: GroupDescriptor) -> Self {
        self.group = group;
        self
    }

    pub fn with_color(mut self, color: ElementColor) -> Self {
        self.color = color;
        self
    }

    /// Stacking key; refreshed whenever cell or altitude order change
    pub fn order_key(&self) -> u64 {
        self.order_key
    }

    pub fn refresh_order_key(&mut self) {
        self.order_key = order_key(self.cell_x, self.cell_y, self.altitude_order);
    }

    /// Derive the screen position from the cell and the asset's origin
    pub fn place(&mut self, data: &ElementData) {
        let (x, y) = (self.cell_x as f32, self.cell_y as f32);
        self.left = (x - y) * CELL_HALF_WIDTH - f32::from(data.origin_x);
        self.top = (x + y) * CELL_HALF_HEIGHT
            - f32::from(self.cell_z) * ELEVATION_UNIT_PX
            - f32::from(data.origin_y);
    }
}
