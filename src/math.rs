//! Vector math for the sector world
//!
//! Map vertices live on the XZ plane as `Vec2` (x, z); thing positions are
//! `Vec3` with Y as height.

use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Drop the height component.
    pub fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self).scale(t)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector on the map plane (x, z)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product. Positive when `other` is
    /// counter-clockwise from `self`.
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).len()
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.len();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.x / l, self.y / l)
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    /// Unit vector for a facing angle (radians, 0 = +X, counter-clockwise toward +Z).
    pub fn from_angle(angle: f32) -> Vec2 {
        Vec2::new(angle.cos(), angle.sin())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        self.scale(s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Angle of the vector from `from` to `to`, in radians.
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if angle.is_nan() {
        return 0.0;
    }
    while angle <= -PI {
        angle += TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    angle
}

/// Distance from a point to a line segment.
///
/// Projects the point onto the segment and clamps the parameter to [0, 1],
/// so points beyond either end measure to the nearer endpoint.
pub fn point_to_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    let len_sq = d.dot(d);

    if len_sq < 1e-6 {
        // Segment is essentially a point
        return p.distance(a);
    }

    let t = ((p - a).dot(d) / len_sq).clamp(0.0, 1.0);
    let closest = a + d * t;
    p.distance(closest)
}

/// Which side of the directed segment a→b the point lies on.
/// Positive = left, negative = right, zero = on the line.
pub fn side_of_line(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (b - a).cross(p - a)
}

/// Intersection parameter of segment p→q against segment a→b.
///
/// Returns `t` in [0, 1] along p→q when the two segments cross, `None` when
/// they are parallel or miss.
pub fn segment_intersection(p: Vec2, q: Vec2, a: Vec2, b: Vec2) -> Option<f32> {
    let r = q - p;
    let s = b - a;
    let denom = r.cross(s);
    if denom.abs() < 1e-9 {
        return None;
    }
    let ap = a - p;
    let t = ap.cross(s) / denom;
    let u = ap.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Even-odd point in polygon test over a closed vertex ring.
pub fn point_in_polygon(p: Vec2, ring: &[Vec2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let vi = ring[i];
        let vj = ring[j];
        if (vi.y > p.y) != (vj.y > p.y) {
            let x = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed area of a vertex ring. Positive for counter-clockwise rings.
pub fn polygon_signed_area(ring: &[Vec2]) -> f32 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a.cross(b);
    }
    sum * 0.5
}

/// Check if a point is inside a 2D triangle (edges count as inside).
pub fn point_in_triangle_2d(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    fn sign(p: Vec2, a: Vec2, b: Vec2) -> f32 {
        (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
    }

    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);

    let has_neg = (d1 < 0.0) || (d2 < 0.0) || (d3 < 0.0);
    let has_pos = (d1 > 0.0) || (d2 > 0.0) || (d3 > 0.0);

    // Point is inside if all signs are same (all positive or all negative)
    !(has_neg && has_pos)
}
