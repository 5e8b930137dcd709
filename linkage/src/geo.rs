//! Geometry kernel: distances, polar forms and the circle/line intersections
//! used to resolve joint positions.
//!
//! All functions are pure and allocation-free.

/// Coordinate of a planar point.
pub type Coord = [f64; 2];

/// A point-like memory layout to achieve zero copy.
pub trait Point: Sized + Copy {
    /// Create a point.
    fn point(x: f64, y: f64) -> Self;
    /// X value.
    fn x(&self) -> f64;
    /// Y value.
    fn y(&self) -> f64;

    /// Square of the distance between two points.
    ///
    /// Cheaper than [`Point::dist()`], enough for comparisons.
    fn sqr_dist(&self, rhs: &Self) -> f64 {
        let dx = rhs.x() - self.x();
        let dy = rhs.y() - self.y();
        dx * dx + dy * dy
    }

    /// Euclidean distance between two points.
    fn dist(&self, rhs: &Self) -> f64 {
        (rhs.x() - self.x()).hypot(rhs.y() - self.y())
    }

    /// Angle of the direction from this point to `rhs`.
    fn angle_to(&self, rhs: &Self) -> f64 {
        (rhs.y() - self.y()).atan2(rhs.x() - self.x())
    }

    /// Polar offset: the point at distance `d0` and angle `a0` from here.
    fn pla(&self, d0: f64, a0: f64) -> Self {
        Self::point(self.x() + d0 * a0.cos(), self.y() + d0 * a0.sin())
    }

    /// Polar offset in the local frame whose x-axis points to `rhs`.
    fn plap(&self, d0: f64, a0: f64, rhs: &Self) -> Self {
        self.pla(d0, self.angle_to(rhs) + a0)
    }

    /// Convert to a coordinate array.
    fn to_coord(&self) -> Coord {
        [self.x(), self.y()]
    }
}

impl Point for [f64; 2] {
    #[inline(always)]
    fn point(x: f64, y: f64) -> Self {
        [x, y]
    }
    #[inline(always)]
    fn x(&self) -> f64 {
        self[0]
    }
    #[inline(always)]
    fn y(&self) -> f64 {
        self[1]
    }
}

impl Point for (f64, f64) {
    #[inline(always)]
    fn point(x: f64, y: f64) -> Self {
        (x, y)
    }
    #[inline(always)]
    fn x(&self) -> f64 {
        self.0
    }
    #[inline(always)]
    fn y(&self) -> f64 {
        self.1
    }
}

/// A circle with a center and a radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// Center
    pub c: Coord,
    /// Radius
    pub r: f64,
}

impl Circle {
    /// Create a new circle.
    pub const fn new(c: Coord, r: f64) -> Self {
        Self { c, r }
    }
}

/// Intersection of two circles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CircleIntersect {
    /// Too far apart, or one strictly inside the other
    None,
    /// Tangent circles
    One(Coord),
    /// Secant circles
    Two(Coord, Coord),
    /// Identical circles, infinite solutions
    Coincident(Circle),
}

impl CircleIntersect {
    /// Number of solutions, `3` stands for infinity.
    pub const fn count(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
            Self::Coincident(_) => 3,
        }
    }
}

/// Intersection of a circle and a line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineIntersect {
    /// The line misses the circle
    None,
    /// Tangent line
    One(Coord),
    /// Secant line
    Two(Coord, Coord),
}

impl LineIntersect {
    /// Number of solutions.
    pub const fn count(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
        }
    }
}

/// Intersections of two circles.
///
/// Distances under `tol` are considered equal. The two points of the secant
/// case are always returned in the same order: the first one lies on the
/// right of the `c1 -> c2` axis.
pub fn circle_intersect(c1: &Circle, c2: &Circle, tol: f64) -> CircleIntersect {
    let Circle { c: [x1, y1], r: r1 } = *c1;
    let Circle { c: [x2, y2], r: r2 } = *c2;
    let dx = x2 - x1;
    let dy = y2 - y1;
    let d = dx.hypot(dy);
    if d > r1 + r2 + tol || d < (r1 - r2).abs() - tol {
        return CircleIntersect::None;
    }
    if d <= tol {
        return CircleIntersect::Coincident(*c1);
    }
    // Projection of the intersections on the center axis
    let a = (r1 * r1 - r2 * r2 + d * d) / (2. * d);
    let proj = [x1 + a * dx / d, y1 + a * dy / d];
    let h2 = r1 * r1 - a * a;
    let tangent = (d - (r1 + r2)).abs() <= tol || (d - (r1 - r2).abs()).abs() <= tol;
    if tangent || h2 <= 0. {
        return CircleIntersect::One(proj);
    }
    let h = h2.sqrt() / d;
    CircleIntersect::Two(
        [proj[0] + h * dy, proj[1] - h * dx],
        [proj[0] - h * dy, proj[1] + h * dx],
    )
}

/// Intersections of a circle and the infinite line through `p1` and `p2`.
///
/// A zero-length axis (`p1 == p2`) defines no line and gives no solution.
/// The line is tangent if its distance to the center is within `tol` of the
/// radius.
pub fn circle_line_intersect(
    circle: &Circle,
    p1: &Coord,
    p2: &Coord,
    tol: f64,
) -> LineIntersect {
    let [cx, cy] = circle.c;
    // Move the axis to the circle center
    let [x1, y1] = [p1[0] - cx, p1[1] - cy];
    let [x2, y2] = [p2[0] - cx, p2[1] - cy];
    let dx = x2 - x1;
    let dy = y2 - y1;
    let dr2 = dx * dx + dy * dy;
    if dr2 <= 0. {
        return LineIntersect::None;
    }
    let cross = x1 * y2 - x2 * y1;
    // Distance from the center to the line
    let d = cross.abs() / dr2.sqrt();
    if d > circle.r + tol {
        return LineIntersect::None;
    }
    let rc = cross / dr2;
    if (d - circle.r).abs() <= tol {
        return LineIntersect::One([rc * dy + cx, -rc * dx + cy]);
    }
    let disc = circle.r * circle.r * dr2 - cross * cross;
    let rs = disc.sqrt() / dr2;
    let sgn = if dy >= 0. { 1. } else { -1. };
    LineIntersect::Two(
        [rc * dy - sgn * dx * rs + cx, -rc * dx - dy.abs() * rs + cy],
        [rc * dy + sgn * dx * rs + cx, -rc * dx + dy.abs() * rs + cy],
    )
}

/// Pick the candidate closer to `reference`, the second one on ties.
pub fn nearest(reference: &Coord, a: Coord, b: Coord) -> Coord {
    if *reference == a || *reference == b {
        *reference
    } else if reference.sqr_dist(&a) < reference.sqr_dist(&b) {
        a
    } else {
        b
    }
}

/// Axis-aligned bounding box.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Lowest y value
    pub y_min: f64,
    /// Highest x value
    pub x_max: f64,
    /// Highest y value
    pub y_max: f64,
    /// Lowest x value
    pub x_min: f64,
}

impl BoundingBox {
    /// Values in the order `[y_min, x_max, y_max, x_min]`.
    pub const fn to_array(&self) -> [f64; 4] {
        [self.y_min, self.x_max, self.y_max, self.x_min]
    }

    /// Create from the order `[y_min, x_max, y_max, x_min]`.
    pub const fn from_array([y_min, x_max, y_max, x_min]: [f64; 4]) -> Self {
        Self { y_min, x_max, y_max, x_min }
    }

    /// The smallest box covering both boxes.
    pub fn union(&self, rhs: &Self) -> Self {
        Self {
            y_min: self.y_min.min(rhs.y_min),
            x_max: self.x_max.max(rhs.x_max),
            y_max: self.y_max.max(rhs.y_max),
            x_min: self.x_min.min(rhs.x_min),
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Bounding box of a locus, `None` for an empty locus.
pub fn bounding_box<'a, I>(locus: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a Coord>,
{
    let mut iter = locus.into_iter();
    let &[x, y] = iter.next()?;
    let init = BoundingBox { y_min: y, x_max: x, y_max: y, x_min: x };
    Some(iter.fold(init, |bb, &[x, y]| BoundingBox {
        y_min: bb.y_min.min(y),
        x_max: bb.x_max.max(x),
        y_max: bb.y_max.max(y),
        x_min: bb.x_min.min(x),
    }))
}

/// Bounding box covering a group of loci, `None` if every locus is empty.
pub fn movement_bounding_box<L>(loci: &[L]) -> Option<BoundingBox>
where
    L: AsRef<[Coord]>,
{
    loci.iter()
        .filter_map(|locus| bounding_box(locus.as_ref()))
        .reduce(|a, b| a.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn circle(x: f64, y: f64, r: f64) -> Circle {
        Circle::new([x, y], r)
    }

    #[test]
    fn circles_cardinality() {
        // Too far
        assert_eq!(circle_intersect(&circle(0., 0., 1.), &circle(3., 0., 1.), 0.).count(), 0);
        // One inside the other
        assert_eq!(circle_intersect(&circle(0., 0., 5.), &circle(1., 0., 1.), 0.).count(), 0);
        // External tangent
        let r = circle_intersect(&circle(0., 0., 1.), &circle(2., 0., 1.), 1e-9);
        assert_eq!(r, CircleIntersect::One([1., 0.]));
        // Internal tangent
        let r = circle_intersect(&circle(0., 0., 2.), &circle(1., 0., 1.), 1e-9);
        assert_eq!(r, CircleIntersect::One([2., 0.]));
        // Secant
        assert_eq!(circle_intersect(&circle(0., 0., 1.), &circle(1., 0., 1.), 0.).count(), 2);
        // Same circle
        let c = circle(1., 1., 2.);
        assert_eq!(circle_intersect(&c, &c, 0.), CircleIntersect::Coincident(c));
        // Concentric, different radii
        assert_eq!(circle_intersect(&circle(0., 0., 1.), &circle(0., 0., 2.), 0.).count(), 0);
    }

    #[test]
    fn near_tangent_is_finite() {
        let c1 = circle(0., 0., 0.1);
        let c2 = circle(0.3, 0., 0.2 + 1e-17);
        match circle_intersect(&c1, &c2, 0.) {
            CircleIntersect::One(p) | CircleIntersect::Two(p, _) => {
                assert!(p.iter().all(|x| x.is_finite()));
            }
            r => panic!("unexpected {r:?}"),
        }
    }

    #[test]
    fn secant_order() {
        let r = circle_intersect(&circle(0., 0., 1.), &circle(1., 0., 1.), 0.);
        let CircleIntersect::Two(p1, p2) = r else {
            panic!("expected two points, got {r:?}");
        };
        let h = 3f64.sqrt() / 2.;
        assert_abs_diff_eq!(p1[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p1[1], -h, epsilon = 1e-12);
        assert_abs_diff_eq!(p2[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p2[1], h, epsilon = 1e-12);
    }

    #[test]
    fn line_cardinality() {
        let c = circle(0., 0., 1.);
        let r = circle_line_intersect(&c, &[0., 0.], &[1., 0.], 1e-12);
        assert_eq!(r, LineIntersect::Two([-1., 0.], [1., 0.]));
        let r = circle_line_intersect(&c, &[0., 1.], &[1., 1.], 1e-12);
        assert_eq!(r.count(), 1);
        let LineIntersect::One(p) = r else { unreachable!() };
        assert_abs_diff_eq!(p[0], 0., epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 1., epsilon = 1e-12);
        assert_eq!(circle_line_intersect(&c, &[0., 2.], &[1., 2.], 1e-12).count(), 0);
        // Degenerated axis
        assert_eq!(circle_line_intersect(&c, &[0., 0.], &[0., 0.], 1e-12).count(), 0);
    }

    #[test]
    fn line_near_tangent() {
        let c = circle(0., 0., 1.);
        // Off by less than the tolerance on both sides
        for y in [1. - 1e-9, 1. + 1e-9] {
            let r = circle_line_intersect(&c, &[-3., y], &[2., y], 1e-6);
            let LineIntersect::One(p) = r else {
                panic!("expected a tangent point, got {r:?}");
            };
            assert_abs_diff_eq!(p[0], 0., epsilon = 1e-12);
            assert_abs_diff_eq!(p[1], y, epsilon = 1e-12);
        }
        let y = 1. - 1e-3;
        assert_eq!(circle_line_intersect(&c, &[0., y], &[1., y], 1e-6).count(), 2);
        let y = 1. + 1e-3;
        assert_eq!(circle_line_intersect(&c, &[0., y], &[1., y], 1e-6).count(), 0);
    }

    #[test]
    fn line_off_center() {
        let c = circle(2., 1.2, 1.5);
        let r = circle_line_intersect(&c, &[0., 0.], &[1., 0.5], 1e-12);
        let LineIntersect::Two(p1, p2) = r else {
            panic!("expected two points, got {r:?}");
        };
        for p in [p1, p2] {
            assert_abs_diff_eq!(p.dist(&c.c), 1.5, epsilon = 1e-9);
            assert_abs_diff_eq!(p[1], p[0] * 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn nearest_point() {
        let reference = [0., 1.];
        assert_eq!(nearest(&reference, [0., 2.], [0., -2.]), [0., 2.]);
        assert_eq!(nearest(&reference, [0., -2.], [0., 2.]), [0., 2.]);
        assert_eq!(nearest(&reference, [0., 1.], [5., 5.]), reference);
    }

    #[test]
    fn polar() {
        let p = [1., 1.].pla(2., std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(p[0], 1., epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 3., epsilon = 1e-12);
        // Local frame pointing to -x
        let p = [0., 0.].plap(1., std::f64::consts::FRAC_PI_2, &[-1., 0.]);
        assert_abs_diff_eq!(p[0], 0., epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], -1., epsilon = 1e-12);
        assert_abs_diff_eq!((0., 0.).dist(&(3., 4.)), 5.);
        assert_abs_diff_eq!([0., 0.].sqr_dist(&[3., 4.]), 25.);
    }

    #[test]
    fn boxes() {
        assert_eq!(bounding_box(&[] as &[Coord]), None);
        let bb = bounding_box(&[[0., 1.], [2., -1.], [1., 3.]]).unwrap();
        assert_eq!(bb.to_array(), [-1., 2., 3., 0.]);
        assert_eq!(bb.width(), 2.);
        assert_eq!(bb.height(), 4.);
        let loci = [vec![[0., 0.]], vec![], vec![[-1., 5.]]];
        let bb = movement_bounding_box(&loci).unwrap();
        assert_eq!(bb, BoundingBox::from_array([0., 0., 5., -1.]));
    }
}
