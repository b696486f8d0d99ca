//! Baking artifact cache
//!
//! Intermediate bake results move between phases through an explicit
//! store/load/release contract. Every store hands ownership to the cache,
//! every load returns a shared handle, and release is the single point
//! where an artifact may be evicted.
//!
//! A load of a key that was never stored, or was already released, returns
//! `None`. The pipeline treats that as a caller bug: nothing in the bake
//! ever asks for an artifact it did not produce.
//!
//! Author: Moroya Sakamoto

use crate::geometry::GeometryBuffer;
use crate::trace::BakedDirect;
use crate::types::ChunkCoord;
use crate::vicinity::ChunkVicinity;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Storage backend for intermediate and final bake artifacts.
///
/// Implementations may keep everything in memory, spill to disk, or drop
/// released artifacts immediately. They must return exactly what was
/// stored for any key that is stored and not yet released.
pub trait BakedLightCache: Send + Sync {
    /// Remember which lightmaps a chunk owns.
    fn store_lightmaps_for_chunk(&self, chunk: ChunkCoord, lightmaps: Vec<u32>);
    /// Lightmaps owned by the chunk.
    fn load_lightmaps_for_chunk(&self, chunk: ChunkCoord) -> Option<Arc<Vec<u32>>>;

    /// Store a chunk vicinity snapshot.
    fn store_chunk_vicinity(&self, chunk: ChunkCoord, vicinity: ChunkVicinity);
    /// Load a chunk vicinity snapshot.
    fn load_chunk_vicinity(&self, chunk: ChunkCoord) -> Option<Arc<ChunkVicinity>>;
    /// Release a chunk vicinity snapshot.
    fn release_chunk_vicinity(&self, chunk: ChunkCoord);

    /// Store the geometry buffer of a lightmap.
    fn store_geometry_buffer(&self, lightmap: u32, buffer: GeometryBuffer);
    /// Load the geometry buffer of a lightmap.
    fn load_geometry_buffer(&self, lightmap: u32) -> Option<Arc<GeometryBuffer>>;
    /// Release the geometry buffer of a lightmap.
    fn release_geometry_buffer(&self, lightmap: u32);

    /// Store baked direct light of a lightmap.
    fn store_direct_light(&self, lightmap: u32, direct: BakedDirect);
    /// Load baked direct light of a lightmap.
    fn load_direct_light(&self, lightmap: u32) -> Option<Arc<BakedDirect>>;
    /// Release baked direct light of a lightmap.
    fn release_direct_light(&self, lightmap: u32);
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Cache that holds every artifact in memory and evicts on release.
#[derive(Default)]
pub struct MemoryLightCache {
    chunk_lightmaps: RwLock<HashMap<ChunkCoord, Arc<Vec<u32>>>>,
    vicinities: RwLock<HashMap<ChunkCoord, Arc<ChunkVicinity>>>,
    geometry_buffers: RwLock<HashMap<u32, Arc<GeometryBuffer>>>,
    direct_light: RwLock<HashMap<u32, Arc<BakedDirect>>>,
}

impl MemoryLightCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BakedLightCache for MemoryLightCache {
    fn store_lightmaps_for_chunk(&self, chunk: ChunkCoord, lightmaps: Vec<u32>) {
        self.chunk_lightmaps
            .write()
            .unwrap()
            .insert(chunk, Arc::new(lightmaps));
    }

    fn load_lightmaps_for_chunk(&self, chunk: ChunkCoord) -> Option<Arc<Vec<u32>>> {
        self.chunk_lightmaps.read().unwrap().get(&chunk).cloned()
    }

    fn store_chunk_vicinity(&self, chunk: ChunkCoord, vicinity: ChunkVicinity) {
        self.vicinities
            .write()
            .unwrap()
            .insert(chunk, Arc::new(vicinity));
    }

    fn load_chunk_vicinity(&self, chunk: ChunkCoord) -> Option<Arc<ChunkVicinity>> {
        self.vicinities.read().unwrap().get(&chunk).cloned()
    }

    fn release_chunk_vicinity(&self, chunk: ChunkCoord) {
        self.vicinities.write().unwrap().remove(&chunk);
    }

    fn store_geometry_buffer(&self, lightmap: u32, buffer: GeometryBuffer) {
        self.geometry_buffers
            .write()
            .unwrap()
            .insert(lightmap, Arc::new(buffer));
    }

    fn load_geometry_buffer(&self, lightmap: u32) -> Option<Arc<GeometryBuffer>> {
        self.geometry_buffers.read().unwrap().get(&lightmap).cloned()
    }

    fn release_geometry_buffer(&self, lightmap: u32) {
        self.geometry_buffers.write().unwrap().remove(&lightmap);
    }

    fn store_direct_light(&self, lightmap: u32, direct: BakedDirect) {
        self.direct_light
            .write()
            .unwrap()
            .insert(lightmap, Arc::new(direct));
    }

    fn load_direct_light(&self, lightmap: u32) -> Option<Arc<BakedDirect>> {
        self.direct_light.read().unwrap().get(&lightmap).cloned()
    }

    fn release_direct_light(&self, lightmap: u32) {
        self.direct_light.write().unwrap().remove(&lightmap);
    }
}
