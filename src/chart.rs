//! Lightmap chart allocation
//!
//! Packs per-object lightmap regions into fixed-size atlas pages
//! ("charts"). Existing charts are tried in creation order and a new chart
//! is appended on overflow, so allocation is deterministic for a given
//! object sequence. Oversized objects are downscaled, never rejected.
//!
//! Author: Moroya Sakamoto

use crate::scene::{Scene, SceneObject};
use crate::settings::ChartingSettings;
use crate::types::TexRect;
use glam::{UVec2, Vec2, Vec4};
use log::warn;

// ---------------------------------------------------------------------------
// AreaAllocator
// ---------------------------------------------------------------------------

/// Shelf-based 2D rectangle allocator over one fixed-size page.
///
/// Rectangles are placed left to right on the current shelf; when a
/// rectangle does not fit, a new shelf is opened below. Regions never
/// overlap and the very first allocation lands at the origin.
#[derive(Debug, Clone)]
pub struct AreaAllocator {
    width: u32,
    height: u32,
    cursor_x: u32,
    shelf_y: u32,
    shelf_height: u32,
}

impl AreaAllocator {
    /// Create an allocator for a `width` x `height` page.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cursor_x: 0,
            shelf_y: 0,
            shelf_height: 0,
        }
    }

    /// Allocate a `width` x `height` rectangle, returning its position.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 || width > self.width {
            return None;
        }

        // Open a new shelf when the current one is too short.
        if self.cursor_x + width > self.width {
            self.shelf_y += self.shelf_height;
            self.cursor_x = 0;
            self.shelf_height = 0;
        }

        if self.shelf_y + height > self.height {
            return None;
        }

        let position = (self.cursor_x, self.shelf_y);
        self.cursor_x += width;
        self.shelf_height = self.shelf_height.max(height);
        Some(position)
    }
}

// ---------------------------------------------------------------------------
// Regions and charts
// ---------------------------------------------------------------------------

/// Region allocated to one object on a lightmap chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartRegion {
    /// Global lightmap chart index.
    pub chart_index: u32,
    /// Unpadded position within the chart, texels.
    pub position: UVec2,
    /// Unpadded size, texels.
    pub size: UVec2,
    /// Edge length of the owning chart, texels.
    pub chart_size: u32,
}

impl ChartRegion {
    /// Normalized UV transform `(sx, sy, ox, oy)` mapping the object's
    /// local `[0, 1]` lightmap UVs into the atlas.
    pub fn uv_scale_offset(&self) -> Vec4 {
        let inv = 1.0 / self.chart_size as f32;
        let scale = self.size.as_vec2() * inv;
        let offset = self.position.as_vec2() * inv;
        Vec4::new(scale.x, scale.y, offset.x, offset.y)
    }

    /// Region rectangle including `padding` texels on every side.
    pub fn padded_rect(&self, padding: u32) -> TexRect {
        TexRect::new(
            self.position.x - padding,
            self.position.y - padding,
            self.size.x + 2 * padding,
            self.size.y + 2 * padding,
        )
    }

    /// Texel rectangle of the unpadded region.
    pub fn rect(&self) -> TexRect {
        TexRect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }
}

/// Binding of one scene object to its allocated region.
#[derive(Debug, Clone)]
pub struct ChartElement {
    /// Index of the object in the scene.
    pub object: usize,
    /// Allocated region.
    pub region: ChartRegion,
}

/// One fixed-size atlas page with its allocator state.
#[derive(Debug, Clone)]
pub struct Chart {
    /// Global lightmap chart index.
    pub index: u32,
    /// Edge length in texels.
    pub size: u32,
    /// Region allocator.
    pub allocator: AreaAllocator,
    /// Elements packed into this chart, in allocation order.
    pub elements: Vec<ChartElement>,
}

impl Chart {
    /// Create an empty chart.
    pub fn new(index: u32, size: u32) -> Self {
        Self {
            index,
            size,
            allocator: AreaAllocator::new(size, size),
            elements: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Desired lightmap size for an object from its world scale and the global
/// texel density, downscaled to the maximum region size if necessary.
///
/// Downscaling lowers effective texel density for the object; it is a
/// degraded-quality condition and surfaces as a warning, never an error.
pub fn calculate_lightmap_size(object: &SceneObject, settings: &ChartingSettings) -> UVec2 {
    let object_scale = object.scale.x.max(object.scale.y).max(object.scale.z);
    let rescale = (object_scale * settings.texel_density / object.lightmap_density_hint)
        .max(settings.min_object_scale);

    let desired = object.lightmap_size_hint.as_vec2() * rescale;
    let desired = desired.ceil().max(Vec2::ONE);

    let cap = settings
        .max_region_size
        .min(settings.chart_size - 2 * settings.padding) as f32;
    let largest = desired.x.max(desired.y);
    if largest <= cap {
        return UVec2::new(desired.x as u32, desired.y as u32);
    }

    let factor = cap / largest;
    let adjusted = (desired * factor).floor().max(Vec2::ONE);
    warn!(
        "Lightmap for '{}' downscaled from {}x{} to {}x{} to fit the maximum region size",
        object.name, desired.x as u32, desired.y as u32, adjusted.x as u32, adjusted.y as u32
    );
    UVec2::new(adjusted.x as u32, adjusted.y as u32)
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Allocate a region in the chart set, appending a new chart on overflow.
///
/// Existing charts are tried strictly in creation order; the first whose
/// packer accepts the padded rectangle wins. Returns the index into
/// `charts` together with the region.
pub fn allocate_chart_region(
    charts: &mut Vec<Chart>,
    size: UVec2,
    settings: &ChartingSettings,
    base_chart_index: u32,
) -> (usize, ChartRegion) {
    let padding = settings.padding;
    let padded = size + UVec2::splat(2 * padding);

    for (slot, chart) in charts.iter_mut().enumerate() {
        if let Some((x, y)) = chart.allocator.allocate(padded.x, padded.y) {
            let region = ChartRegion {
                chart_index: chart.index,
                position: UVec2::new(x + padding, y + padding),
                size,
                chart_size: chart.size,
            };
            return (slot, region);
        }
    }

    // A fresh chart always has room: sizes are capped at
    // chart_size - 2 * padding by calculate_lightmap_size.
    let index = base_chart_index + charts.len() as u32;
    let mut chart = Chart::new(index, settings.chart_size);
    let (x, y) = chart
        .allocator
        .allocate(padded.x, padded.y)
        .expect("fresh chart must accept a downscaled region");
    let region = ChartRegion {
        chart_index: index,
        position: UVec2::new(x + padding, y + padding),
        size,
        chart_size: chart.size,
    };
    charts.push(chart);
    (charts.len() - 1, region)
}

/// Generate charts for the given objects, packing each into the first chart
/// with room. `base_chart_index` offsets the chart indices so chunks can
/// allocate globally unique lightmap indices.
pub fn generate_charts(
    scene: &Scene,
    objects: &[usize],
    settings: &ChartingSettings,
    base_chart_index: u32,
) -> Vec<Chart> {
    let mut charts = Vec::new();
    for &object_index in objects {
        let object = &scene.objects[object_index];
        let size = calculate_lightmap_size(object, settings);
        let (slot, region) = allocate_chart_region(&mut charts, size, settings, base_chart_index);
        charts[slot].elements.push(ChartElement {
            object: object_index,
            region,
        });
    }
    charts
}

/// Write lightmap index and UV transform back onto the charted objects.
pub fn apply_charts(charts: &[Chart], scene: &mut Scene) {
    for chart in charts {
        for element in &chart.elements {
            let object = &mut scene.objects[element.object];
            object.lightmap_index = Some(element.region.chart_index);
            object.lightmap_scale_offset = element.region.uv_scale_offset();
        }
    }
}
