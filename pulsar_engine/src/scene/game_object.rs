/// Game object - a drawable scene entity

use glam::Vec3;
use crate::scene::scene::GeometryKey;
use crate::scene::transform::Transform;

/// Stable object identifier
///
/// Ids are allocated by the owning Scene, increase monotonically, and are
/// never reused within a scene's lifetime, so an id held after the object
/// is removed can never alias a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameObjectId(pub(crate) u32);

impl GameObjectId {
    /// The raw id value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GameObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A drawable entity: geometry reference + color + transform
///
/// Game objects are movable but not clonable (cloning would silently
/// duplicate the geometry reference count), and are constructed only
/// through `Scene::spawn`.
pub struct GameObject {
    id: GameObjectId,
    /// Key into the scene's geometry arena
    pub geometry: GeometryKey,
    pub color: Vec3,
    pub transform: Transform,
}

impl GameObject {
    pub(crate) fn new(
        id: GameObjectId,
        geometry: GeometryKey,
        color: Vec3,
        transform: Transform,
    ) -> Self {
        Self {
            id,
            geometry,
            color,
            transform,
        }
    }

    /// The object's scene-unique id
    pub fn id(&self) -> GameObjectId {
        self.id
    }
}
