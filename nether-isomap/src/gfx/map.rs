//! Cross-partition element editing
//!
//! Altitude order is a per-cell rank that spans partition boundaries, so
//! adding or removing an element re-ranks every element on its cell in every
//! partition, not just the one that owns it.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::element::Element;
use super::partition::GfxPartition;
use super::registry::ElementRegistry;
use crate::CHUNK_SIZE;
use crate::error::{MapError, Result};

/// Most elements one cell can hold; altitude order is a single byte on the wire
pub const MAX_CELL_STACK: usize = 256;

/// Location of an element: owning partition and index within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementRef {
    pub partition: (i32, i32),
    pub index: usize,
}

/// All graphics partitions of one map
#[derive(Debug)]
pub struct GfxMap {
    registry: Arc<ElementRegistry>,
    partitions: BTreeMap<(i32, i32), GfxPartition>,
}

impl GfxMap {
    pub fn new(registry: Arc<ElementRegistry>) -> Self {
        Self {
            registry,
            partitions: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    /// Add a decoded partition, replacing any partition at the same coordinates
    pub fn insert_partition(&mut self, partition: GfxPartition) -> Option<GfxPartition> {
        self.partitions.insert((partition.x, partition.y), partition)
    }

    pub fn partition(&self, x: i32, y: i32) -> Option<&GfxPartition> {
        self.partitions.get(&(x, y))
    }

    /// Partitions in (x, y) order
    pub fn partitions(&self) -> impl Iterator<Item = &GfxPartition> {
        self.partitions.values()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn element(&self, at: ElementRef) -> Option<&Element> {
        self.partitions.get(&at.partition)?.elements.get(at.index)
    }

    fn element_mut(&mut self, at: ElementRef) -> Option<&mut Element> {
        self.partitions
            .get_mut(&at.partition)?
            .elements
            .get_mut(at.index)
    }

    /// Every element on a cell, across all partitions, by altitude order
    pub fn stack_at(&self, cell_x: i32, cell_y: i32) -> Vec<ElementRef> {
        let mut stack: Vec<(u16, ElementRef)> = Vec::new();
        for (&key, partition) in &self.partitions {
            for (index, element) in partition.elements.iter().enumerate() {
                if element.cell_x == cell_x && element.cell_y == cell_y {
                    stack.push((element.altitude_order, ElementRef { partition: key, index }));
                }
            }
        }
        stack.sort_by_key(|&(altitude, _)| altitude);
        stack.into_iter().map(|(_, at)| at).collect()
    }

    /// Partition whose center is nearest (Manhattan) to a cell; first wins ties
    fn nearest_partition(&self, cell_x: i32, cell_y: i32) -> Option<(i32, i32)> {
        self.partitions
            .iter()
            .min_by_key(|(_, partition)| {
                let (cx, cy) = partition.center();
                (i64::from(cx) - i64::from(cell_x)).abs() + (i64::from(cy) - i64::from(cell_y)).abs()
            })
            .map(|(&key, _)| key)
    }

    /// Insert an element, stacking it below the first element on its cell that
    /// sits higher, or on top if none does.
    ///
    /// Fails without touching the map when the cell already holds
    /// [`MAX_CELL_STACK`] elements or an altitude order cannot grow.
    pub fn add_element(&mut self, mut element: Element) -> Result<ElementRef> {
        let owner = self.nearest_partition(element.cell_x, element.cell_y).unwrap_or((
            element.cell_x.div_euclid(CHUNK_SIZE),
            element.cell_y.div_euclid(CHUNK_SIZE),
        ));

        let stack = self.stack_at(element.cell_x, element.cell_y);
        let top = stack
            .iter()
            .filter_map(|&at| self.element(at))
            .map(|e| e.altitude_order)
            .max();
        if stack.len() >= MAX_CELL_STACK || top == Some(u16::MAX) {
            return Err(MapError::out_of_range(
                "elements per cell",
                stack.len() as i64 + 1,
            ));
        }

        let higher = stack.iter().position(|&at| {
            self.element(at)
                .is_some_and(|existing| existing.cell_z > element.cell_z)
        });

        let mut touched = BTreeSet::from([owner]);
        element.altitude_order = match higher {
            Some(pos) => {
                let slot = self.element(stack[pos]).map_or(0, |e| e.altitude_order);
                for &at in &stack[pos..] {
                    if let Some(existing) = self.element_mut(at) {
                        existing.altitude_order += 1;
                        existing.refresh_order_key();
                        touched.insert(at.partition);
                    }
                }
                slot
            }
            None => top.map_or(0, |altitude| altitude + 1),
        };
        element.refresh_order_key();
        element.place(&self.registry.get_or_placeholder(element.element_id));

        let (cell_x, cell_y, altitude) = (element.cell_x, element.cell_y, element.altitude_order);
        self.partitions
            .entry(owner)
            .or_insert_with(|| GfxPartition::new(owner.0, owner.1))
            .elements
            .push(element);

        for key in &touched {
            if let Some(partition) = self.partitions.get_mut(key) {
                partition.sort_elements();
                partition.recompute_bounds(&self.registry);
            }
        }

        let index = self.partitions[&owner]
            .elements
            .iter()
            .position(|e| e.cell_x == cell_x && e.cell_y == cell_y && e.altitude_order == altitude)
            .unwrap_or_default();
        tracing::debug!(?owner, cell_x, cell_y, altitude, "added element");
        Ok(ElementRef {
            partition: owner,
            index,
        })
    }

    /// Remove an element and close the gap in its cell's altitude orders
    pub fn remove_element(&mut self, at: ElementRef) -> Option<Element> {
        let partition = self.partitions.get_mut(&at.partition)?;
        if at.index >= partition.elements.len() {
            return None;
        }
        let removed = partition.elements.remove(at.index);

        for (rank, at) in self
            .stack_at(removed.cell_x, removed.cell_y)
            .into_iter()
            .enumerate()
        {
            if let Some(element) = self.element_mut(at) {
                element.altitude_order = rank as u16;
                element.refresh_order_key();
            }
        }

        for partition in self.partitions.values_mut() {
            partition.sort_elements();
        }
        if let Some(owner) = self.partitions.get_mut(&at.partition) {
            owner.recompute_bounds(&self.registry);
        }
        Some(removed)
    }

    /// Check that altitude orders form 0..N-1 on every occupied cell
    pub fn altitude_orders_dense(&self) -> bool {
        let mut cells: BTreeMap<(i32, i32), Vec<u16>> = BTreeMap::new();
        for partition in self.partitions.values() {
            for element in &partition.elements {
                cells
                    .entry((element.cell_x, element.cell_y))
                    .or_default()
                    .push(element.altitude_order);
            }
        }
        cells.into_values().all(|mut orders| {
            orders.sort_unstable();
            orders.iter().enumerate().all(|(i, &o)| usize::from(o) == i)
        })
    }
}
