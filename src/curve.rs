//! Centripetal Catmull-Rom spline used to bend branches.
//!
//! The curve passes through every control point. Open ends are extrapolated
//! by reflecting the neighbouring point, and knot spacing uses the square root
//! of the chord length (centripetal parameterization), which avoids cusps and
//! self-intersections on short, sharply bent branches.

use bevy::math::Vec3;

const MIN_KNOT_SPACING: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
}

impl CatmullRomCurve {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Evaluates the curve at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let len = self.points.len();
        match len {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }

        let p = (len - 1) as f32 * t.clamp(0.0, 1.0);
        let mut index = p.floor() as usize;
        let mut weight = p - index as f32;
        if index >= len - 1 {
            index = len - 2;
            weight = 1.0;
        }

        let p1 = self.points[index];
        let p2 = self.points[index + 1];
        let p0 = if index > 0 {
            self.points[index - 1]
        } else {
            p1 * 2.0 - p2
        };
        let p3 = if index + 2 < len {
            self.points[index + 2]
        } else {
            p2 * 2.0 - p1
        };

        Self::centripetal(p0, p1, p2, p3, weight)
    }

    /// Samples `divisions + 1` points at uniform parameter spacing.
    pub fn sample(&self, divisions: u32) -> Vec<Vec3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|d| self.point_at(d as f32 / divisions as f32))
            .collect()
    }

    fn centripetal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);

        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        // Tangents at p1 and p2, rescaled to the [0, 1] interval of this span
        let m1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let m2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        let c0 = p1;
        let c1 = m1;
        let c2 = p1 * -3.0 + p2 * 3.0 - m1 * 2.0 - m2;
        let c3 = p1 * 2.0 - p2 * 2.0 + m1 + m2;

        let t2 = t * t;
        let t3 = t2 * t;
        c0 + c1 * t + c2 * t2 + c3 * t3
    }
}
