use nalgebra::{Point2, Vector3};
use serde::Serialize;

use crate::qstate::QubitState;

/// Cartesian Bloch vector paired with its orthographic screen position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Projection {
    pub vector: Vector3<f64>,
    pub screen: Point2<f64>,
}

/// Maps Bloch angles (degrees) onto a sphere of a given visual radius drawn
/// around a canvas centre. Screen `y` grows downward, so `|0>` sits above the
/// centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlochProjector {
    radius: f64,
    center: Point2<f64>,
}

impl BlochProjector {
    pub fn new(radius: f64, center_x: f64, center_y: f64) -> Self {
        Self {
            radius,
            center: Point2::new(center_x, center_y),
        }
    }

    /// Unit sphere at the origin, used for the numeric `(x, y, z)` readout.
    pub fn unit() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn center(&self) -> Point2<f64> {
        self.center
    }

    pub fn cartesian(&self, theta: f64, phi: f64) -> Vector3<f64> {
        cartesian(theta, phi, self.radius)
    }

    pub fn screen(&self, vector: &Vector3<f64>) -> Point2<f64> {
        Point2::new(self.center.x + vector.x, self.center.y - vector.z)
    }

    pub fn project(&self, theta: f64, phi: f64) -> Projection {
        let vector = self.cartesian(theta, phi);
        Projection {
            vector,
            screen: self.screen(&vector),
        }
    }

    pub fn project_state(&self, state: &QubitState) -> Projection {
        self.project(state.theta(), state.phi())
    }
}

/// `(r sinθ cosφ, r sinθ sinφ, r cosθ)` with both angles in degrees.
pub fn cartesian(theta: f64, phi: f64, radius: f64) -> Vector3<f64> {
    let (theta, phi) = (theta.to_radians(), phi.to_radians());
    Vector3::new(
        radius * theta.sin() * phi.cos(),
        radius * theta.sin() * phi.sin(),
        radius * theta.cos(),
    )
}

pub fn project(theta: f64, phi: f64, radius: f64, center: Point2<f64>) -> Point2<f64> {
    BlochProjector::new(radius, center.x, center.y)
        .project(theta, phi)
        .screen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use crate::gates::Gate;

    #[test]
    fn test_poles() {
        let projector = BlochProjector::new(150.0, 200.0, 200.0);

        let north = projector.project(0.0, 0.0);
        assert_approx_eq!(0.0, north.vector.x);
        assert_approx_eq!(150.0, north.vector.z);
        assert_approx_eq!(200.0, north.screen.x);
        assert_approx_eq!(50.0, north.screen.y);

        let south = projector.project(180.0, 0.0);
        assert_approx_eq!(-150.0, south.vector.z);
        assert_approx_eq!(350.0, south.screen.y);
    }

    #[test]
    fn test_equator() {
        let projector = BlochProjector::new(100.0, 0.0, 0.0);

        let plus = projector.project(90.0, 0.0);
        assert_approx_eq!(100.0, plus.vector.x);
        assert_approx_eq!(0.0, plus.vector.y);
        assert_approx_eq!(100.0, plus.screen.x);
        assert_approx_eq!(0.0, plus.screen.y);

        // Depth is dropped by the orthographic projection.
        let plus_i = projector.project(90.0, 90.0);
        assert_approx_eq!(100.0, plus_i.vector.y);
        assert_approx_eq!(0.0, plus_i.screen.x);
        assert_approx_eq!(0.0, plus_i.screen.y);
    }

    #[test]
    fn test_unit_vector_length() {
        let projector = BlochProjector::unit();
        for (theta, phi) in [(0.0, 0.0), (33.0, 71.0), (90.0, 180.0), (155.0, 359.0)] {
            assert_approx_eq!(1.0, projector.cartesian(theta, phi).norm());
        }
    }

    #[test]
    fn test_deterministic() {
        let center = Point2::new(320.0, 240.0);
        let first = project(47.5, 123.25, 150.0, center);
        for _ in 0..10 {
            assert_eq!(first, project(47.5, 123.25, 150.0, center));
        }
    }

    #[test]
    fn test_project_state() {
        let mut state = QubitState::zero_state();
        state.apply(Gate::H);

        let projection = BlochProjector::unit().project_state(&state);
        assert_approx_eq!(1.0, projection.vector.x, 1e-9);
        assert_approx_eq!(0.0, projection.vector.z, 1e-9);
    }
}
