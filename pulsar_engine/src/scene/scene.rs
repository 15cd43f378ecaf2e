/// Scene - owns game objects and the shared geometry arena

use std::sync::Arc;
use glam::Vec3;
use slotmap::SlotMap;

use crate::engine_err;
use crate::error::{Error, Result};
use crate::graphics::{GeometryBuffer, GraphicsDevice, Vertex};
use crate::scene::game_object::{GameObject, GameObjectId};
use crate::scene::transform::Transform;

const SOURCE: &str = "pulsar::Scene";

slotmap::new_key_type! {
    /// Handle into a scene's geometry arena
    pub struct GeometryKey;
}

/// Arena entry: the shared GPU buffer plus its reference count
struct GeometryEntry {
    buffer: Arc<dyn GeometryBuffer>,
    /// Number of game objects referencing this geometry
    ref_count: u32,
}

/// Scene - a flat list of game objects sharing geometry through an arena
///
/// Geometry sharing: many objects may reference one uploaded geometry via
/// its `GeometryKey`. Each spawn retains the entry and each removal
/// releases it; an entry whose count reaches zero through a release is
/// destroyed (the GPU buffer drops with its last `Arc`). A freshly
/// uploaded geometry that was never spawned survives until `clear()`.
pub struct Scene {
    objects: Vec<GameObject>,
    geometries: SlotMap<GeometryKey, GeometryEntry>,
    /// Monotonic id allocator; ids are never reused
    next_object_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            geometries: SlotMap::with_key(),
            next_object_id: 0,
        }
    }

    /// Upload vertex data to the GPU and register it in the arena
    ///
    /// # Arguments
    ///
    /// * `device` - Device creating the GPU buffer
    /// * `vertices` - Interleaved vertex data (at least 3 vertices)
    pub fn upload_geometry(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertices: &[Vertex],
    ) -> Result<GeometryKey> {
        if vertices.len() < 3 {
            return Err(engine_err!(
                SOURCE,
                Error::InvalidResource,
                "geometry needs at least 3 vertices, got {}",
                vertices.len()
            ));
        }

        let buffer = device.create_geometry(
            bytemuck::cast_slice(vertices),
            vertices.len() as u32,
        )?;

        Ok(self.geometries.insert(GeometryEntry {
            buffer,
            ref_count: 0,
        }))
    }

    /// Spawn a game object referencing the given geometry
    ///
    /// Retains the geometry entry and assigns a fresh, never-reused id.
    ///
    /// # Arguments
    ///
    /// * `geometry` - Key returned by upload_geometry
    /// * `color` - Object color (linear RGB)
    /// * `transform` - Initial transform
    pub fn spawn(
        &mut self,
        geometry: GeometryKey,
        color: Vec3,
        transform: Transform,
    ) -> Result<GameObjectId> {
        let entry = self.geometries.get_mut(geometry).ok_or_else(|| {
            engine_err!(
                SOURCE,
                Error::InvalidResource,
                "spawn references unknown geometry {:?}",
                geometry
            )
        })?;
        entry.ref_count += 1;

        let id = GameObjectId(self.next_object_id);
        self.next_object_id += 1;

        self.objects
            .push(GameObject::new(id, geometry, color, transform));
        Ok(id)
    }

    /// Remove a game object, releasing its geometry reference
    ///
    /// Returns false when no object with that id exists. Removal preserves
    /// the spawn order of the remaining objects.
    pub fn remove(&mut self, id: GameObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id() == id) else {
            return false;
        };
        let object = self.objects.remove(index);
        self.release_geometry(object.geometry);
        true
    }

    /// Remove all objects and all geometry
    pub fn clear(&mut self) {
        self.objects.clear();
        self.geometries.clear();
    }

    /// All objects, in spawn order
    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    /// All objects, mutable, in spawn order
    pub fn objects_mut(&mut self) -> &mut [GameObject] {
        &mut self.objects
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of live geometry entries
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// The shared GPU buffer for a geometry key
    pub fn geometry(&self, key: GeometryKey) -> Option<&Arc<dyn GeometryBuffer>> {
        self.geometries.get(key).map(|entry| &entry.buffer)
    }

    /// Current reference count of a geometry entry
    pub fn geometry_ref_count(&self, key: GeometryKey) -> Option<u32> {
        self.geometries.get(key).map(|entry| entry.ref_count)
    }

    /// Release one reference; destroys the entry at zero
    fn release_geometry(&mut self, key: GeometryKey) {
        if let Some(entry) = self.geometries.get_mut(key) {
            entry.ref_count = entry.ref_count.saturating_sub(1);
            if entry.ref_count == 0 {
                self.geometries.remove(key);
            }
        }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
