// src/angles.rs - Pure 2D angle math shared by the angle engine and the scorer
use nalgebra::Vector2;

use crate::error::GeometryError;
use crate::keypoint::Keypoint;

/// Angle in degrees at vertex `b` between rays b->a and b->c.
pub fn angle_between(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> Result<f64, GeometryError> {
    angle_between_points(a.position(), b.position(), c.position())
}

pub fn angle_between_points(
    a: Vector2<f64>,
    b: Vector2<f64>,
    c: Vector2<f64>,
) -> Result<f64, GeometryError> {
    let ba = a - b;
    let bc = c - b;

    let mag1 = ba.norm();
    let mag2 = bc.norm();
    if mag1 == 0.0 || mag2 == 0.0 {
        return Err(GeometryError::DegenerateGeometry { x: b.x, y: b.y });
    }

    // Clamp before acos; rounding can push the cosine slightly past +-1
    let cos_angle = (ba.dot(&bc) / (mag1 * mag2)).clamp(-1.0, 1.0);
    Ok(cos_angle.acos().to_degrees())
}

/// Signed angle in degrees of the segment q->p relative to image "up".
///
/// Image y grows downward, so "up" is (0, -1). Positive when `p` lies to the
/// right of `q` (larger x), negative to the left. A zero-length segment is
/// reported as 0 since atan2(0, 0) is defined.
pub fn angle_from_vertical(p: &Keypoint, q: &Keypoint) -> f64 {
    let v = p.position() - q.position();
    v.x.atan2(-v.y).to_degrees()
}

pub fn round1(deg: f64) -> f64 {
    (deg * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new("p", x, y, 1.0)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_between(&kp(1.0, 0.0), &kp(0.0, 0.0), &kp(0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_is_straight() {
        let angle = angle_between(&kp(-3.0, 0.0), &kp(0.0, 0.0), &kp(5.0, 0.0)).unwrap();
        assert_abs_diff_eq!(angle, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_symmetric_in_outer_points() {
        let a = kp(3.0, 7.0);
        let b = kp(1.0, 1.0);
        let c = kp(-4.0, 2.5);
        let ab = angle_between(&a, &b, &c).unwrap();
        let ba = angle_between(&c, &b, &a).unwrap();
        assert_abs_diff_eq!(ab, ba, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_ray_fails() {
        let b = kp(2.0, 2.0);
        assert!(matches!(
            angle_between(&b, &b, &kp(0.0, 0.0)),
            Err(GeometryError::DegenerateGeometry { .. })
        ));
        assert!(angle_between(&kp(0.0, 0.0), &b, &b).is_err());
    }

    #[test]
    fn test_nearly_collinear_does_not_nan() {
        let angle = angle_between(&kp(1e-9, 1e9), &kp(0.0, 0.0), &kp(-1e-9, -1e9)).unwrap();
        assert!(angle.is_finite());
    }

    #[test]
    fn test_from_vertical_sign() {
        let hip = kp(100.0, 200.0);
        assert_abs_diff_eq!(angle_from_vertical(&kp(100.0, 100.0), &hip), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(angle_from_vertical(&kp(200.0, 100.0), &hip), 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(angle_from_vertical(&kp(0.0, 100.0), &hip), -45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(12.345), 12.3);
        assert_eq!(round1(179.96), 180.0);
    }
}
