//! Linkage container: the joint arena, the solve order and the parameter
//! surface used by the optimizers.
use crate::{joint::*, Coord, Error, Result};
use std::f64::consts::TAU;

/// Coordinates of all joints after one step, in joint order.
pub type Snapshot = Vec<Coord>;

/// Pose state of a linkage.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// The coordinates are unvalidated hints
    #[default]
    Unsolved,
    /// The last step resolved every joint
    Solved,
}

/// A planar linkage mechanism.
///
/// The joints are stored in declaration order, which is also the order of
/// every snapshot, constraint vector and coordinate list. References between
/// joints are indices into this arena.
///
/// ```
/// use planar_linkage::*;
///
/// let joints = vec![
///     Joint::crank([0., 0.], 1., 0.31).with_name("B").with_coord([0., 1.]),
///     Joint::revolute(0, [3., 0.], 3., 1.).with_name("C").with_coord([3., 2.]),
/// ];
/// let mut linkage = Linkage::new("Four-bar", joints).unwrap();
/// let period = linkage.rotation_period().unwrap();
/// let loci = linkage.step(period, 1.).collect::<Result<Vec<_>>>().unwrap();
/// assert_eq!(loci.len(), period as usize);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "LinkageDesc", into = "LinkageDesc")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Linkage {
    name: String,
    joints: Vec<Joint>,
    order: Vec<usize>,
    tol: f64,
    diag: Vec<Diagnostic>,
    state: State,
}

impl Linkage {
    /// Default tolerance of the tangent detection.
    pub const TOL: f64 = 1e-9;

    /// Create a linkage, the solve order is discovered from the references.
    ///
    /// Unnamed joints are named `J{index}`.
    pub fn new(name: impl Into<String>, joints: Vec<Joint>) -> Result<Self> {
        Self::build(name.into(), joints, None)
    }

    /// Create a linkage with an explicit solve order.
    ///
    /// The order must be a permutation of the joint indices where every joint
    /// comes after its parents.
    pub fn with_order(
        name: impl Into<String>,
        joints: Vec<Joint>,
        order: Vec<usize>,
    ) -> Result<Self> {
        Self::build(name.into(), joints, Some(order))
    }

    fn build(name: String, mut joints: Vec<Joint>, order: Option<Vec<usize>>) -> Result<Self> {
        for (i, j) in joints.iter_mut().enumerate() {
            if j.name.is_empty() {
                j.name = format!("J{i}");
            }
        }
        for j in &joints {
            let mut refs = j.parents().into_iter().filter_map(|r| r.joint());
            if let Some(target) = refs.find(|t| *t >= joints.len()) {
                return Err(Error::MissingRef { joint: j.name.clone(), target });
            }
        }
        let order = match order {
            Some(order) => {
                check_order(&joints, &order)?;
                order
            }
            None => solve_order(&joints)?,
        };
        tracing::debug!(linkage = %name, ?order, "solve order");
        Ok(Self {
            name,
            joints,
            order,
            tol: Self::TOL,
            diag: Vec::new(),
            state: State::Unsolved,
        })
    }

    /// Set the tolerance of the tangent detection.
    pub fn with_tol(self, tol: f64) -> Self {
        Self { tol, ..self }
    }

    /// Name of the linkage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Joints in declaration order.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Number of joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Return true if there is no joint.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Index of the joint with the given name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Solve order, parents first.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Pose state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Degenerate configurations met since the last [`Linkage::set_coords()`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diag
    }

    /// Take the diagnostics out of the buffer.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diag)
    }

    /// Total number of numeric constraints.
    pub fn constraint_num(&self) -> usize {
        self.joints.iter().map(Joint::constraint_num).sum()
    }

    /// Constraints of all joints in a flat list, static joints are skipped.
    pub fn constraints(&self) -> Vec<f64> {
        self.joints.iter().flat_map(Joint::constraints).collect()
    }

    /// Constraints grouped by joint, static joints give empty groups.
    pub fn constraints_grouped(&self) -> Vec<Vec<f64>> {
        self.joints.iter().map(Joint::constraints).collect()
    }

    /// Set the constraints from a flat list.
    ///
    /// Nothing is changed if the length does not match.
    pub fn set_constraints(&mut self, v: &[f64]) -> Result<()> {
        let expected = self.constraint_num();
        if v.len() != expected {
            return Err(Error::ConstraintCount { expected, got: v.len() });
        }
        let mut v = v;
        for j in &mut self.joints {
            let (head, tail) = v.split_at(j.constraint_num());
            j.set_constraints(head)?;
            v = tail;
        }
        self.state = State::Unsolved;
        Ok(())
    }

    /// Set the constraints from groups, one group per joint.
    ///
    /// Nothing is changed if any length does not match.
    pub fn set_constraints_grouped(&mut self, groups: &[Vec<f64>]) -> Result<()> {
        if groups.len() != self.joints.len() {
            let expected = self.joints.len();
            return Err(Error::ConstraintCount { expected, got: groups.len() });
        }
        for (j, g) in self.joints.iter().zip(groups) {
            if g.len() != j.constraint_num() {
                let expected = j.constraint_num();
                return Err(Error::ConstraintCount { expected, got: g.len() });
            }
        }
        for (j, g) in self.joints.iter_mut().zip(groups) {
            j.set_constraints(g)?;
        }
        self.state = State::Unsolved;
        Ok(())
    }

    /// Coordinates of all joints.
    pub fn coords(&self) -> Vec<Option<Coord>> {
        self.joints.iter().map(|j| j.coord).collect()
    }

    /// Restore the coordinates of all joints.
    ///
    /// This also clears the diagnostics buffer.
    pub fn set_coords(&mut self, coords: &[Option<Coord>]) -> Result<()> {
        if coords.len() != self.joints.len() {
            let expected = self.joints.len();
            return Err(Error::CoordCount { expected, got: coords.len() });
        }
        self.joints
            .iter_mut()
            .zip(coords)
            .for_each(|(j, c)| j.coord = *c);
        self.diag.clear();
        self.state = State::Unsolved;
        Ok(())
    }

    /// Set the constraints (flat) and the coordinates together.
    ///
    /// Both lengths are checked before anything is changed.
    pub fn set_completely(&mut self, dims: &[f64], coords: &[Option<Coord>]) -> Result<()> {
        if coords.len() != self.joints.len() {
            let expected = self.joints.len();
            return Err(Error::CoordCount { expected, got: coords.len() });
        }
        self.set_constraints(dims)?;
        self.set_coords(coords)
    }

    /// Number of steps (`dt = 1`) that brings every crank back to its
    /// starting angle.
    ///
    /// Cranks without rotation are ignored, the period is 1 if there is no
    /// rotating crank. A period that does not fit in `u64` is an
    /// [`Error::PeriodOverflow`].
    pub fn rotation_period(&self) -> Result<u64> {
        let mut period = 1;
        for j in &self.joints {
            let JointKind::Crank { angle, .. } = j.kind else { continue };
            if angle == 0. {
                continue;
            }
            let overflow = || Error::PeriodOverflow { joint: j.name.clone(), angle };
            let p = (TAU / angle.abs()).round();
            if p.is_nan() || p >= u64::MAX as f64 {
                return Err(overflow());
            }
            period = lcm(period, (p as u64).max(1)).ok_or_else(overflow)?;
        }
        Ok(period)
    }

    /// Segments between the joints and their parents, for drawing.
    ///
    /// Undefined coordinates are skipped. The axis of a slider is not a
    /// link.
    pub fn links(&self) -> Vec<[Coord; 2]> {
        let mut links = Vec::new();
        for j in &self.joints {
            let Some(c) = j.coord else { continue };
            let parents = match &j.kind {
                JointKind::Linear { center, .. } => vec![*center],
                _ => j.parents(),
            };
            links.extend(
                parents
                    .iter()
                    .filter_map(|p| p.coord(&self.joints))
                    .map(|p| [p, c]),
            );
        }
        links
    }

    /// Resolve every joint once in solve order and take a snapshot.
    pub(crate) fn solve_once(&mut self, dt: f64) -> Result<Snapshot> {
        self.state = State::Unsolved;
        for k in 0..self.order.len() {
            let i = self.order[k];
            let Some(s) = self.joints[i].solve(i, &self.joints, dt, self.tol)? else {
                continue;
            };
            if let Some(kind) = s.diag {
                self.report(i, kind);
            }
            self.joints[i].coord = Some(s.coord);
        }
        let snapshot = self.snapshot()?;
        self.state = State::Solved;
        Ok(snapshot)
    }

    fn snapshot(&self) -> Result<Snapshot> {
        self.joints
            .iter()
            .map(|j| {
                j.coord
                    .ok_or_else(|| Error::Hypostatic(format!("{j} has no coordinates")))
            })
            .collect()
    }

    fn report(&mut self, index: usize, kind: DiagnosticKind) {
        let joint = &self.joints[index].name;
        match kind {
            DiagnosticKind::CoincidentCircles => {
                tracing::warn!(%joint, "coincident circles, keeping the previous direction");
            }
            DiagnosticKind::TangentCircles | DiagnosticKind::TangentLine => {
                tracing::debug!(%joint, ?kind, "tangent configuration");
            }
        }
        self.diag.push(Diagnostic { index, kind });
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}

fn solve_order(joints: &[Joint]) -> Result<Vec<usize>> {
    let mut solved = vec![false; joints.len()];
    let mut order = Vec::with_capacity(joints.len());
    loop {
        let len = order.len();
        for (i, j) in joints.iter().enumerate() {
            if !solved[i] && j.parents().iter().filter_map(Ref::joint).all(|p| solved[p]) {
                solved[i] = true;
                order.push(i);
            }
        }
        if order.len() == len {
            break;
        }
    }
    if order.len() == joints.len() {
        return Ok(order);
    }
    let unreached = joints
        .iter()
        .zip(&solved)
        .filter(|(_, s)| !**s)
        .map(|(j, _)| j.name.as_str())
        .collect::<Vec<_>>();
    Err(Error::Hypostatic(format!(
        "unable to reach joints {}",
        unreached.join(", ")
    )))
}

fn check_order(joints: &[Joint], order: &[usize]) -> Result<()> {
    if order.len() != joints.len() {
        return Err(Error::InvalidOrder(format!(
            "expected {} joints, got {}",
            joints.len(),
            order.len()
        )));
    }
    let mut rank = vec![None; joints.len()];
    for (k, &i) in order.iter().enumerate() {
        match rank.get_mut(i) {
            None => return Err(Error::InvalidOrder(format!("no joint #{i}"))),
            Some(Some(_)) => return Err(Error::InvalidOrder(format!("joint #{i} is repeated"))),
            Some(r) => *r = Some(k),
        }
    }
    for (k, &i) in order.iter().enumerate() {
        let j = &joints[i];
        for p in j.parents().iter().filter_map(Ref::joint) {
            if !rank[p].is_some_and(|r| r < k) {
                let parent = &joints[p].name;
                return Err(Error::InvalidOrder(format!(
                    "{parent} must be solved before {}",
                    j.name
                )));
            }
        }
    }
    Ok(())
}

/// Serialized form of a linkage.
#[cfg(feature = "serde")]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
struct LinkageDesc {
    #[serde(default)]
    name: String,
    joints: Vec<Joint>,
    #[serde(default)]
    order: Option<Vec<usize>>,
    #[serde(default = "default_tol")]
    tol: f64,
}

#[cfg(feature = "serde")]
const fn default_tol() -> f64 {
    Linkage::TOL
}

#[cfg(feature = "serde")]
impl TryFrom<LinkageDesc> for Linkage {
    type Error = Error;

    fn try_from(desc: LinkageDesc) -> Result<Self> {
        let LinkageDesc { name, joints, order, tol } = desc;
        Ok(Self::build(name, joints, order)?.with_tol(tol))
    }
}

#[cfg(feature = "serde")]
impl From<Linkage> for LinkageDesc {
    fn from(linkage: Linkage) -> Self {
        let Linkage { name, joints, order, tol, .. } = linkage;
        Self { name, joints, order: Some(order), tol }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Joint> {
        vec![
            Joint::revolute(1, 2, 1., 1.),
            Joint::crank(2, 1., 0.1).with_coord([1., 0.]),
            Joint::new_static([0., 0.]),
        ]
    }

    #[test]
    fn names() {
        let l = Linkage::new("", chain()).unwrap();
        let names = l.joints().iter().map(|j| j.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["J0", "J1", "J2"]);
        assert_eq!(l.position("J1"), Some(1));
    }

    #[test]
    fn discovered_order() {
        let l = Linkage::new("", chain()).unwrap();
        assert_eq!(l.order(), [2, 1, 0]);
        assert!(check_order(l.joints(), l.order()).is_ok());
    }

    #[test]
    fn explicit_order() {
        assert!(Linkage::with_order("", chain(), vec![2, 1, 0]).is_ok());
        for order in [vec![0, 1, 2], vec![2, 1], vec![2, 2, 0], vec![2, 1, 5]] {
            let err = Linkage::with_order("", chain(), order).unwrap_err();
            assert!(matches!(err, Error::InvalidOrder(_)), "{err}");
        }
    }

    #[test]
    fn structural_errors() {
        let err = Linkage::new("", vec![Joint::crank(3, 1., 0.1)]).unwrap_err();
        assert_eq!(err, Error::MissingRef { joint: "J0".to_string(), target: 3 });
        // Cycle
        let joints = vec![
            Joint::revolute(1, [0., 0.], 1., 1.),
            Joint::revolute(0, [1., 0.], 1., 1.),
        ];
        let err = Linkage::new("", joints).unwrap_err();
        assert!(err.is_hypostatic());
        assert!(err.to_string().contains("J0, J1"));
    }

    #[test]
    fn period() {
        let l = Linkage::new("", vec![Joint::crank([0., 0.], 1., TAU / 12.)]).unwrap();
        assert_eq!(l.rotation_period(), Ok(12));
        let joints = vec![
            Joint::crank([0., 0.], 1., TAU / 12.),
            Joint::crank([0., 0.], 1., -TAU / 8.),
            Joint::crank([0., 0.], 1., 0.),
        ];
        assert_eq!(Linkage::new("", joints).unwrap().rotation_period(), Ok(24));
        let l = Linkage::new("", vec![Joint::new_static([0., 0.])]).unwrap();
        assert_eq!(l.rotation_period(), Ok(1));
    }

    #[test]
    fn period_overflow() {
        // Three coprime periods close to 2^32
        let joints = [4_294_967_291., 4_294_967_279., 4_294_967_231.]
            .map(|n| Joint::crank([0., 0.], 1., TAU / n))
            .to_vec();
        let err = Linkage::new("", joints).unwrap().rotation_period().unwrap_err();
        assert!(matches!(err, Error::PeriodOverflow { ref joint, .. } if joint == "J2"));
        // A single increment too small for the integer range
        let joints = vec![
            Joint::crank([0., 0.], 1., 1e-300).with_name("slow"),
            Joint::crank([0., 0.], 1., 0.31),
        ];
        let err = Linkage::new("", joints).unwrap().rotation_period().unwrap_err();
        assert_eq!(err, Error::PeriodOverflow { joint: "slow".to_string(), angle: 1e-300 });
        let joints = vec![Joint::crank([0., 0.], 1., f64::NAN)];
        assert!(Linkage::new("", joints).unwrap().rotation_period().is_err());
    }

    #[test]
    fn grouped_constraints() {
        let mut l = Linkage::new("", chain()).unwrap();
        assert_eq!(l.constraints_grouped(), [vec![1., 1.], vec![1.], vec![]]);
        let err = l
            .set_constraints_grouped(&[vec![2., 2.], vec![2., 2.], vec![]])
            .unwrap_err();
        assert_eq!(err, Error::ConstraintCount { expected: 1, got: 2 });
        assert_eq!(l.constraints(), [1., 1., 1.]);
        l.set_constraints_grouped(&[vec![2., 3.], vec![4.], vec![]]).unwrap();
        assert_eq!(l.constraints(), [2., 3., 4.]);
    }

    #[test]
    fn set_completely_checks_first() {
        let mut l = Linkage::new("", chain()).unwrap();
        let err = l.set_completely(&[2., 2., 2.], &[None]).unwrap_err();
        assert_eq!(err, Error::CoordCount { expected: 3, got: 1 });
        assert_eq!(l.constraints(), [1., 1., 1.]);
        let err = l.set_completely(&[2.], &[None; 3]).unwrap_err();
        assert_eq!(err, Error::ConstraintCount { expected: 3, got: 1 });
        assert_eq!(l.coords()[2], Some([0., 0.]));
    }

    #[test]
    fn links() {
        let l = Linkage::new("", chain()).unwrap();
        assert_eq!(l.links(), [[[0., 0.], [1., 0.]]]);
    }
}
