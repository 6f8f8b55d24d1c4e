// Copyright @yucwang 2026

use crate::core::layer::RayMask;
use crate::math::constants::{Float, Vector3f};

/// Nearest-hit ray queries against scene geometry.
///
/// `direction` is a unit vector in world space. Implementations return the
/// distance to the closest surface within `[0, max_distance]` on a layer
/// contained in `mask`, or `None`. Calls are independent of each other and
/// may run concurrently.
pub trait RayIntersector: Sync {
    fn cast(&self, origin: &Vector3f, direction: &Vector3f, max_distance: Float, mask: RayMask) -> Option<Float>;
}

/// Receives every ray a render casts. Used for debug visualisation.
pub trait RayObserver: Sync {
    fn on_ray(&self, origin: &Vector3f, direction: &Vector3f, distance: Option<Float>, intensity: Float);
}

/// Writes each cast ray to the log at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRayObserver;

impl RayObserver for LogRayObserver {
    fn on_ray(&self, origin: &Vector3f, direction: &Vector3f, distance: Option<Float>, intensity: Float) {
        match distance {
            Some(d) => log::trace!("ray ({:.3}, {:.3}, {:.3}) -> ({:.3}, {:.3}, {:.3}) hit at {:.4}, intensity {:.4}",
                                   origin.x, origin.y, origin.z, direction.x, direction.y, direction.z, d, intensity),
            None => log::trace!("ray ({:.3}, {:.3}, {:.3}) -> ({:.3}, {:.3}, {:.3}) missed",
                                origin.x, origin.y, origin.z, direction.x, direction.y, direction.z),
        }
    }
}
