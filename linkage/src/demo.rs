//! Ready-made mechanisms.
use crate::{BoundingBox, Coord, Joint, Linkage, Result, Snapshot};
use std::f64::consts::{FRAC_PI_4, PI, TAU};

/// Names accepted by [`by_name()`].
pub const NAMES: [&str; 3] = ["four-bar", "stroke-engine", "strider"];

/// Target box of the four-bar coupler in the quadrant problem.
pub const QUADRANT: BoundingBox = BoundingBox::from_array([0., 5., 2., 3.]);

/// Constructor of a demo by name.
///
/// ```
/// use planar_linkage::demo;
///
/// for name in demo::NAMES {
///     assert!(demo::by_name(name).unwrap()().is_ok());
/// }
/// assert!(demo::by_name("crane").is_none());
/// ```
pub fn by_name(name: &str) -> Option<fn() -> Result<Linkage>> {
    match name {
        "four-bar" => Some(four_bar),
        "stroke-engine" => Some(stroke_engine),
        "strider" => Some(strider),
        _ => None,
    }
}

/// A crank-rocker four-bar linkage.
///
/// The crank `B` turns around the origin, the pin `C` joins it to the frame
/// point `(3, 0)`.
pub fn four_bar() -> Result<Linkage> {
    let joints = vec![
        Joint::crank([0., 0.], 1., 0.31)
            .with_name("B")
            .with_coord([0., 1.]),
        Joint::revolute(0, [3., 0.], 3., 1.)
            .with_name("C")
            .with_coord([3., 2.]),
    ];
    Linkage::new("Four-bar", joints)
}

/// An inverted stroke engine: a crank pushing a slider on the x-axis.
pub fn stroke_engine() -> Result<Linkage> {
    let joints = vec![
        Joint::crank([0., 0.], 1., 0.1)
            .with_name("Crank")
            .with_coord([0., 0.]),
        Joint::linear(0, [0., 0.], [1., 0.], 1.5)
            .with_name("Slider")
            .with_coord([2., 0.]),
    ];
    Linkage::new("Stroke engine", joints)
}

/// Short form of the Strider dimensions:
/// triangle, aperture, femur, rocker (long), rocker (short), phi, tibia, f.
pub const STRIDER_DIMS: [f64; 8] = [2., FRAC_PI_4, 1.8, 2.6, 1.4, PI + 0.2, 2.5, 1.8];

/// Limits of the Strider short dimensions.
pub const STRIDER_BOUNDS: [[f64; 8]; 2] = [
    [0.; 8],
    [8., TAU, 7.2, 10.4, 5.6, TAU, 10., 7.6],
];

/// Initial pose of the Strider.
pub const STRIDER_INIT: [Coord; 11] = [
    [0., 0.],
    [0., 1.],
    [1.41, 1.41],
    [-1.41, 1.41],
    [0., -1.],
    [-2.25, 0.],
    [2.25, 0.],
    [-1.4, -1.2],
    [1.4, -1.2],
    [-2.7, -2.7],
    [2.7, -2.7],
];

/// Index of the left foot of the Strider.
pub const STRIDER_FOOT: usize = 9;

/// Expand the short (symmetric) Strider dimensions into the flat
/// constraints of [`strider()`].
pub fn strider_dims(p: &[f64; 8]) -> Vec<f64> {
    vec![
        p[0], -p[1], p[0], p[1], // B, B_p
        1., // Crank C
        p[2], p[3], p[2], p[3], // D, E
        p[4], -p[5], p[4], p[5], // F, G
        p[6], p[7], p[6], p[7], // H, I
    ]
}

/// The Strider walking linkage: two symmetric legs driven by one crank.
pub fn strider() -> Result<Linkage> {
    let p = STRIDER_DIMS;
    let joints = [
        Joint::new_static([0., 0.]).with_name("A"),
        Joint::new_static([0., 1.]).with_name("Y"),
        Joint::fixed(0, 1, p[0], -p[1]).with_name("B"),
        Joint::fixed(0, 1, p[0], p[1]).with_name("B_p"),
        Joint::crank(0, 1., -TAU / 10.).with_name("C"),
        Joint::revolute(3, 4, p[2], p[3]).with_name("D"),
        Joint::revolute(2, 4, p[2], p[3]).with_name("E"),
        Joint::fixed(4, 6, p[4], -p[5]).with_name("F"),
        Joint::fixed(4, 5, p[4], p[5]).with_name("G"),
        Joint::revolute(5, 7, p[6], p[7]).with_name("H"),
        Joint::revolute(6, 8, p[6], p[7]).with_name("I"),
    ];
    let joints = joints
        .into_iter()
        .zip(STRIDER_INIT)
        .map(|(j, c)| j.with_coord(c))
        .collect();
    Linkage::new("Strider", joints)
}

/// Horizontal stroke of the Strider foot.
pub fn stride_length(_linkage: &Linkage, snapshots: &[Snapshot]) -> f64 {
    crate::bounding_box(snapshots.iter().filter_map(|s| s.get(STRIDER_FOOT)))
        .map_or(0., |b| b.width())
}
