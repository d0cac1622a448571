//! Window Calculator
//!
//! Computes which rows of a long, fixed-row-height list are visible for a
//! scroll offset, so only those rows need rendering.

use serde::Serialize;

use crate::config::WindowConfig;
use crate::error::{Result, ToolkitError};

/// Indices of the rows to render, plus where to position the first one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibleRange {
    /// First row to render
    pub start_index: usize,
    /// Last row to render, inclusive. Below `start_index` when scrolled past
    /// the end of the list.
    pub end_index: usize,
    /// Vertical offset of `start_index`, in pixels
    pub offset_y: f64,
}

impl VisibleRange {
    /// Number of rows in the range.
    pub fn len(&self) -> usize {
        (self.end_index + 1).saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A visible range together with the rows it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleItems<'a, T> {
    /// None for an empty list
    pub range: Option<VisibleRange>,
    pub items: &'a [T],
}

// == Window Calculator ==
/// Stateless calculator for a uniform-height list viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCalculator {
    item_height: f64,
    container_height: f64,
    overscan: usize,
    visible_count: usize,
}

impl WindowCalculator {
    /// Creates a calculator for the given geometry.
    ///
    /// Fails if `item_height` is not a positive finite number or
    /// `container_height` is negative or not finite.
    pub fn new(item_height: f64, container_height: f64, overscan: usize) -> Result<Self> {
        if !item_height.is_finite() || item_height <= 0.0 {
            return Err(ToolkitError::InvalidConfig(format!(
                "item_height must be a positive number, got {}",
                item_height
            )));
        }
        if !container_height.is_finite() || container_height < 0.0 {
            return Err(ToolkitError::InvalidConfig(format!(
                "container_height must be a non-negative number, got {}",
                container_height
            )));
        }

        Ok(Self {
            item_height,
            container_height,
            overscan,
            visible_count: (container_height / item_height).ceil() as usize,
        })
    }

    /// Creates a calculator from configuration.
    pub fn from_config(config: &WindowConfig) -> Result<Self> {
        Self::new(config.item_height, config.container_height, config.overscan)
    }

    pub fn item_height(&self) -> f64 {
        self.item_height
    }

    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Rows that fit in the viewport: `ceil(container_height / item_height)`.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    // == Visible Range ==
    /// Computes the rows to render at `scroll_top` for a list of
    /// `item_count` rows. Returns None for an empty list.
    pub fn visible_range(&self, scroll_top: f64, item_count: usize) -> Option<VisibleRange> {
        let last_index = item_count.checked_sub(1)?;

        let first_visible = (scroll_top / self.item_height).floor().max(0.0) as usize;
        let start_index = first_visible.saturating_sub(self.overscan);
        let end_index = start_index
            .saturating_add(self.visible_count)
            .saturating_add(self.overscan.saturating_mul(2))
            .min(last_index);

        Some(VisibleRange {
            start_index,
            end_index,
            offset_y: start_index as f64 * self.item_height,
        })
    }

    /// Computes the visible range over `items` and slices out its rows.
    pub fn visible_items<'a, T>(&self, items: &'a [T], scroll_top: f64) -> VisibleItems<'a, T> {
        let range = self.visible_range(scroll_top, items.len());

        let rows = match range {
            Some(r) if !r.is_empty() => &items[r.start_index..=r.end_index],
            _ => &items[..0],
        };

        VisibleItems { range, items: rows }
    }

    /// Height of the whole list, in pixels.
    pub fn total_height(&self, item_count: usize) -> f64 {
        item_count as f64 * self.item_height
    }

    /// Scroll offset that puts row `index` at the top of the viewport.
    pub fn scroll_to_index(&self, index: usize) -> f64 {
        index as f64 * self.item_height
    }
}
