//! Chamber geometry: frames and transforms between them.
//!
//! Three frames are involved:
//! - the layer-local frame, a 2D plane where hits are measured,
//! - the chamber-local frame, whose z axis is the depth (propagation)
//!   direction through the stacked layers,
//! - the global detector frame.
//!
//! The segment builder only consumes the [`ChamberGeometry`] trait; the
//! bundled [`PlanarChamber`] covers the common case of parallel layers that
//! share the chamber orientation.

use crate::hit::LayerId;
use nalgebra::{Isometry3, Point2, Point3, Translation3, UnitQuaternion, Vector3};

/// Transform services a chamber exposes to segment finding.
pub trait ChamberGeometry: Send + Sync {
    /// Number of layers; valid layer ids are `1..=num_layers()`.
    fn num_layers(&self) -> LayerId;

    /// Global position of a layer's origin.
    fn layer_position(&self, layer: LayerId) -> Option<Point3<f64>>;

    /// Maps a point in a layer's local plane to the global frame.
    fn layer_to_global(&self, layer: LayerId, local: &Point2<f64>) -> Option<Point3<f64>>;

    /// Maps a global point into the chamber-local frame.
    fn to_local(&self, global: &Point3<f64>) -> Point3<f64>;

    /// Maps a chamber-local point into the global frame.
    fn to_global(&self, local: &Point3<f64>) -> Point3<f64>;

    /// Rotates a chamber-local direction into the global frame.
    fn vector_to_global(&self, local: &Vector3<f64>) -> Vector3<f64>;

    /// Returns true if `layer` exists in this chamber.
    #[inline]
    fn has_layer(&self, layer: LayerId) -> bool {
        layer >= 1 && layer <= self.num_layers()
    }
}

/// A rigid chamber whose layers are parallel planes stacked along local z.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarChamber {
    pose: Isometry3<f64>,
    layer_z: Vec<f64>,
}

impl PlanarChamber {
    /// Creates a chamber from its chamber-to-global pose and the local depth
    /// of each layer, listed from layer 1 upwards.
    #[must_use]
    pub fn new(pose: Isometry3<f64>, layer_z: Vec<f64>) -> Self {
        Self { pose, layer_z }
    }

    /// Chamber centred at `origin` with its axes aligned to the global axes
    /// and `num_layers` layers spaced by `pitch`, symmetric around local z = 0.
    #[must_use]
    pub fn aligned(origin: Point3<f64>, pitch: f64, num_layers: u8) -> Self {
        let half = f64::from(num_layers.saturating_sub(1)) / 2.0;
        let layer_z = (0..num_layers)
            .map(|i| (f64::from(i) - half) * pitch)
            .collect();
        let pose = Isometry3::from_parts(
            Translation3::from(origin.coords),
            UnitQuaternion::identity(),
        );
        Self::new(pose, layer_z)
    }

    /// Chamber pose built from a global origin and roll/pitch/yaw angles.
    #[must_use]
    pub fn from_euler(
        origin: Point3<f64>,
        roll: f64,
        pitch: f64,
        yaw: f64,
        layer_z: Vec<f64>,
    ) -> Self {
        let rotation = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        let pose = Isometry3::from_parts(Translation3::from(origin.coords), rotation);
        Self::new(pose, layer_z)
    }

    /// Chamber-to-global pose.
    #[must_use]
    pub fn pose(&self) -> &Isometry3<f64> {
        &self.pose
    }

    /// Local depth of every layer, starting at layer 1.
    #[must_use]
    pub fn layer_depths(&self) -> &[f64] {
        &self.layer_z
    }

    fn layer_depth(&self, layer: LayerId) -> Option<f64> {
        let idx = usize::from(layer).checked_sub(1)?;
        self.layer_z.get(idx).copied()
    }
}

impl ChamberGeometry for PlanarChamber {
    #[allow(clippy::cast_possible_truncation)]
    fn num_layers(&self) -> LayerId {
        self.layer_z.len().min(usize::from(LayerId::MAX)) as LayerId
    }

    fn layer_position(&self, layer: LayerId) -> Option<Point3<f64>> {
        let z = self.layer_depth(layer)?;
        Some(self.pose.transform_point(&Point3::new(0.0, 0.0, z)))
    }

    fn layer_to_global(&self, layer: LayerId, local: &Point2<f64>) -> Option<Point3<f64>> {
        let z = self.layer_depth(layer)?;
        Some(self.pose.transform_point(&Point3::new(local.x, local.y, z)))
    }

    fn to_local(&self, global: &Point3<f64>) -> Point3<f64> {
        self.pose.inverse_transform_point(global)
    }

    fn to_global(&self, local: &Point3<f64>) -> Point3<f64> {
        self.pose.transform_point(local)
    }

    fn vector_to_global(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.pose.transform_vector(local)
    }
}

impl<G: ChamberGeometry> ChamberGeometry for &G {
    fn num_layers(&self) -> LayerId {
        (**self).num_layers()
    }

    fn layer_position(&self, layer: LayerId) -> Option<Point3<f64>> {
        (**self).layer_position(layer)
    }

    fn layer_to_global(&self, layer: LayerId, local: &Point2<f64>) -> Option<Point3<f64>> {
        (**self).layer_to_global(layer, local)
    }

    fn to_local(&self, global: &Point3<f64>) -> Point3<f64> {
        (**self).to_local(global)
    }

    fn to_global(&self, local: &Point3<f64>) -> Point3<f64> {
        (**self).to_global(local)
    }

    fn vector_to_global(&self, local: &Vector3<f64>) -> Vector3<f64> {
        (**self).vector_to_global(local)
    }
}
