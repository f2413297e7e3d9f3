use glam::DVec2;

/// A circle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

impl Circle {
    /// Creates a circle centred on `center`.
    pub fn new(center: DVec2, radius: f64) -> Self {
        Circle { center, radius }
    }
}

/// An axis-aligned box described by its centre and half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: DVec2,
    pub half: DVec2,
}

impl Aabb {
    /// Box of the given full width and height centred on `center`.
    pub fn new(center: DVec2, width: f64, height: f64) -> Self {
        Aabb {
            center,
            half: DVec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Square box of side `size` centred on `center`.
    pub fn square(center: DVec2, size: f64) -> Self {
        Self::new(center, size, size)
    }

    /// Corner with the smallest coordinates.
    pub fn min(&self) -> DVec2 {
        self.center - self.half
    }

    /// Corner with the largest coordinates.
    pub fn max(&self) -> DVec2 {
        self.center + self.half
    }

    /// Half-open containment: `[min, max)` on both axes.
    pub fn contains_point(&self, p: DVec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
    }

    /// True if the whole circle lies inside the box.
    pub fn contains_circle(&self, circle: Circle) -> bool {
        let (min, max) = (self.min(), self.max());
        let c = circle.center;
        let r = circle.radius;
        c.x - r >= min.x && c.x + r <= max.x && c.y - r >= min.y && c.y + r <= max.y
    }
}

/// Circle-vs-box overlap: the distance from the circle centre to the
/// nearest point of the box is at most the radius.
pub fn overlaps(circle: Circle, bbox: Aabb) -> bool {
    let nearest = circle.center.clamp(bbox.min(), bbox.max());
    circle.center.distance_squared(nearest) <= circle.radius * circle.radius
}

/// Circle-vs-circle contact, used for key pickup and monster contact.
pub fn circles_touch(a: Circle, b: Circle) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) <= reach * reach
}

/// Unit push-out direction for a circle overlapping a box.
///
/// When the centre lies within the box's span on one axis the circle is
/// touching an edge and the push is purely along the other axis. Outside both
/// spans it is touching a corner and the push points away from that corner.
/// With the centre inside the box the shallower axis wins.
///
/// Returns `None` when there is no overlap, and also when the computed push is
/// the zero vector while still overlapping (centre exactly on the box centre).
/// Callers treat the latter as resolved and accept the residual overlap.
pub fn penetration_vector(circle: Circle, bbox: Aabb) -> Option<DVec2> {
    if !overlaps(circle, bbox) {
        return None;
    }

    let d = circle.center - bbox.center;
    let within_x = d.x.abs() <= bbox.half.x;
    let within_y = d.y.abs() <= bbox.half.y;

    let push = match (within_x, within_y) {
        (true, false) => DVec2::new(0.0, sign(d.y)),
        (false, true) => DVec2::new(sign(d.x), 0.0),
        (true, true) => {
            let depth_x = bbox.half.x - d.x.abs();
            let depth_y = bbox.half.y - d.y.abs();
            if depth_x < depth_y {
                DVec2::new(sign(d.x), 0.0)
            } else {
                DVec2::new(0.0, sign(d.y))
            }
        }
        (false, false) => {
            let corner = bbox.center + DVec2::new(sign(d.x), sign(d.y)) * bbox.half;
            let away = circle.center - corner;
            let len = away.length();
            if len > 0.0 { away / len } else { DVec2::ZERO }
        }
    };

    if push == DVec2::ZERO {
        tracing::trace!(?circle, ?bbox, "zero-vector bounce while overlapping");
        None
    } else {
        Some(push)
    }
}

/// `signum` that maps zero to zero.
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
