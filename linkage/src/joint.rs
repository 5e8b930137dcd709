//! Joints of planar linkages.
//!
//! A joint is a planar point whose position is either fixed ([`Static`]),
//! driven ([`Crank`]) or derived from its parents through a geometric
//! constraint ([`Fixed`], [`Revolute`], [`Linear`]).
//!
//! [`Static`]: JointKind::Static
//! [`Crank`]: JointKind::Crank
//! [`Fixed`]: JointKind::Fixed
//! [`Revolute`]: JointKind::Revolute
//! [`Linear`]: JointKind::Linear
use crate::{geo::*, Error, Result};

/// Reference to a parent of a joint.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ref {
    /// Index of another joint in the same linkage
    Joint(usize),
    /// Fixed point on the frame
    Point(Coord),
}

impl From<usize> for Ref {
    fn from(i: usize) -> Self {
        Self::Joint(i)
    }
}

impl From<Coord> for Ref {
    fn from(p: Coord) -> Self {
        Self::Point(p)
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Joint(i) => write!(f, "joint #{i}"),
            Self::Point([x, y]) => write!(f, "point ({x}, {y})"),
        }
    }
}

impl Ref {
    /// Index of the referred joint, if any.
    pub const fn joint(&self) -> Option<usize> {
        match self {
            Self::Joint(i) => Some(*i),
            Self::Point(_) => None,
        }
    }

    /// Current coordinate of the reference.
    pub fn coord(&self, joints: &[Joint]) -> Option<Coord> {
        match self {
            Self::Joint(i) => joints.get(*i)?.coord,
            Self::Point(p) => Some(*p),
        }
    }
}

/// Kinds of joints with their own constraints.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum JointKind {
    /// Frame point, never moves
    Static,
    /// Circular motor rotating around `center`
    Crank {
        /// Center of rotation
        center: Ref,
        /// Distance to the center
        r: f64,
        /// Rotation per step (rad)
        angle: f64,
    },
    /// Rigid triangle with two parents
    Fixed {
        /// Origin of the local frame
        p0: Ref,
        /// Direction of the local x-axis
        p1: Ref,
        /// Distance to `p0`
        r: f64,
        /// Angle `(p1, p0, self)` (rad)
        angle: f64,
    },
    /// Pin joint between two links
    Revolute {
        /// First parent
        p0: Ref,
        /// Second parent
        p1: Ref,
        /// Distance to `p0`
        r0: f64,
        /// Distance to `p1`
        r1: f64,
    },
    /// Pin joint sliding along an axis (prismatic)
    Linear {
        /// Parent of the link
        center: Ref,
        /// Two points of the slider axis
        axis: [Ref; 2],
        /// Distance to `center`
        r: f64,
    },
}

/// Non-fatal degenerate configurations met during resolution.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The two circles touch at one point
    TangentCircles,
    /// The two circles are identical, the position is arbitrary
    CoincidentCircles,
    /// The slider axis touches the circle at one point
    TangentLine,
}

/// A degenerate configuration recorded on a joint.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Index of the joint
    pub index: usize,
    /// What happened
    pub kind: DiagnosticKind,
}

/// Result of a joint resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Solution {
    pub(crate) coord: Coord,
    pub(crate) diag: Option<DiagnosticKind>,
}

impl Solution {
    const fn new(coord: Coord) -> Self {
        Self { coord, diag: None }
    }

    const fn degenerate(coord: Coord, diag: DiagnosticKind) -> Self {
        Self { coord, diag: Some(diag) }
    }
}

/// A joint of the linkage.
///
/// The coordinate is only a hint before the first resolution: it chooses
/// the branch of the ambiguous joints.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// Human-readable name, filled with `J{index}` by the linkage if empty
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Current position, `None` if undefined
    #[cfg_attr(feature = "serde", serde(default))]
    pub coord: Option<Coord>,
    /// Kind and constraints
    pub kind: JointKind,
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}({})", self.kind_name(), self.name)
    }
}

impl Joint {
    /// Create an unnamed joint without position.
    pub const fn new(kind: JointKind) -> Self {
        Self { name: String::new(), coord: None, kind }
    }

    /// Create a static joint.
    pub const fn new_static(coord: Coord) -> Self {
        Self { name: String::new(), coord: Some(coord), kind: JointKind::Static }
    }

    /// Create a crank joint.
    pub fn crank(center: impl Into<Ref>, r: f64, angle: f64) -> Self {
        Self::new(JointKind::Crank { center: center.into(), r, angle })
    }

    /// Create a fixed joint.
    pub fn fixed(p0: impl Into<Ref>, p1: impl Into<Ref>, r: f64, angle: f64) -> Self {
        Self::new(JointKind::Fixed { p0: p0.into(), p1: p1.into(), r, angle })
    }

    /// Create a revolute joint.
    pub fn revolute(p0: impl Into<Ref>, p1: impl Into<Ref>, r0: f64, r1: f64) -> Self {
        Self::new(JointKind::Revolute { p0: p0.into(), p1: p1.into(), r0, r1 })
    }

    /// Create a linear (slider) joint.
    pub fn linear(
        center: impl Into<Ref>,
        axis0: impl Into<Ref>,
        axis1: impl Into<Ref>,
        r: f64,
    ) -> Self {
        let axis = [axis0.into(), axis1.into()];
        Self::new(JointKind::Linear { center: center.into(), axis, r })
    }

    /// Set the name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self }
    }

    /// Set the initial position.
    pub fn with_coord(self, coord: Coord) -> Self {
        Self { coord: Some(coord), ..self }
    }

    /// Name of the joint kind.
    pub const fn kind_name(&self) -> &'static str {
        match self.kind {
            JointKind::Static => "Static",
            JointKind::Crank { .. } => "Crank",
            JointKind::Fixed { .. } => "Fixed",
            JointKind::Revolute { .. } => "Revolute",
            JointKind::Linear { .. } => "Linear",
        }
    }

    /// Return true if the joint is static.
    pub const fn is_static(&self) -> bool {
        matches!(self.kind, JointKind::Static)
    }

    /// Return true if the joint is a crank.
    pub const fn is_crank(&self) -> bool {
        matches!(self.kind, JointKind::Crank { .. })
    }

    /// All references of the joint.
    pub fn parents(&self) -> Vec<Ref> {
        match &self.kind {
            JointKind::Static => Vec::new(),
            JointKind::Crank { center, .. } => vec![*center],
            JointKind::Fixed { p0, p1, .. } | JointKind::Revolute { p0, p1, .. } => {
                vec![*p0, *p1]
            }
            JointKind::Linear { center, axis: [a0, a1], .. } => vec![*center, *a0, *a1],
        }
    }

    /// Number of the numeric constraints.
    pub const fn constraint_num(&self) -> usize {
        match self.kind {
            JointKind::Static => 0,
            JointKind::Crank { .. } | JointKind::Linear { .. } => 1,
            JointKind::Fixed { .. } | JointKind::Revolute { .. } => 2,
        }
    }

    /// Numeric constraints (distances and angles).
    ///
    /// The crank rotation is not a constraint.
    pub fn constraints(&self) -> Vec<f64> {
        match self.kind {
            JointKind::Static => Vec::new(),
            JointKind::Crank { r, .. } | JointKind::Linear { r, .. } => vec![r],
            JointKind::Fixed { r, angle, .. } => vec![r, angle],
            JointKind::Revolute { r0, r1, .. } => vec![r0, r1],
        }
    }

    /// Set the numeric constraints, the length must match
    /// [`Joint::constraint_num()`].
    pub fn set_constraints(&mut self, v: &[f64]) -> Result<()> {
        let expected = self.constraint_num();
        match (&mut self.kind, v) {
            (JointKind::Static, []) => (),
            (JointKind::Crank { r, .. } | JointKind::Linear { r, .. }, [v0]) => *r = *v0,
            (JointKind::Fixed { r, angle, .. }, [v0, v1]) => [*r, *angle] = [*v0, *v1],
            (JointKind::Revolute { r0, r1, .. }, [v0, v1]) => [*r0, *r1] = [*v0, *v1],
            _ => return Err(Error::ConstraintCount { expected, got: v.len() }),
        }
        Ok(())
    }

    fn undefined(&self, r: &Ref) -> Error {
        Error::Hypostatic(format!("{r} has no coordinates, {self} cannot be solved"))
    }

    /// Compute the new position from the parents in `joints`.
    ///
    /// Return `None` for the joints that never move.
    pub(crate) fn solve(
        &self,
        index: usize,
        joints: &[Joint],
        dt: f64,
        tol: f64,
    ) -> Result<Option<Solution>> {
        let get = |r: &Ref| r.coord(joints).ok_or_else(|| self.undefined(r));
        let unbuildable = || Error::Unbuildable { index, name: self.name.clone() };
        let s = match &self.kind {
            JointKind::Static => return Ok(None),
            JointKind::Crank { center, r, angle } => {
                let c = get(center)?;
                let a = self.coord.map(|p| c.angle_to(&p)).unwrap_or(0.);
                Solution::new(c.pla(*r, a + angle * dt))
            }
            JointKind::Fixed { p0, p1, r, angle } => {
                let c0 = get(p0)?;
                let c1 = get(p1)?;
                Solution::new(c0.plap(*r, *angle, &c1))
            }
            JointKind::Revolute { p0, p1, r0, r1 } => {
                let c0 = get(p0)?;
                let c1 = get(p1)?;
                match circle_intersect(&Circle::new(c0, *r0), &Circle::new(c1, *r1), tol) {
                    CircleIntersect::None => return Err(unbuildable()),
                    CircleIntersect::One(p) => {
                        Solution::degenerate(p, DiagnosticKind::TangentCircles)
                    }
                    CircleIntersect::Two(a, b) => match self.coord {
                        Some(prev) => Solution::new(nearest(&prev, a, b)),
                        None => Solution::new(a),
                    },
                    CircleIntersect::Coincident(_) => {
                        // Project the previous position on the circle
                        let a = self.coord.map(|p| c0.angle_to(&p)).unwrap_or(0.);
                        Solution::degenerate(c0.pla(*r0, a), DiagnosticKind::CoincidentCircles)
                    }
                }
            }
            JointKind::Linear { center, axis: [a0, a1], r } => {
                let c = get(center)?;
                let l0 = get(a0)?;
                let l1 = get(a1)?;
                if l0 == l1 {
                    return Err(Error::Hypostatic(format!(
                        "the slider axis of {self} has no direction"
                    )));
                }
                match circle_line_intersect(&Circle::new(c, *r), &l0, &l1, tol) {
                    LineIntersect::None => return Err(unbuildable()),
                    LineIntersect::One(p) => Solution::degenerate(p, DiagnosticKind::TangentLine),
                    LineIntersect::Two(a, b) => match self.coord {
                        Some(prev) => Solution::new(nearest(&prev, a, b)),
                        None => Solution::new(a),
                    },
                }
            }
        };
        Ok(Some(s))
    }
}
