//! Planar linkage is a simulator and a dimensional synthesis tool for planar
//! linkage mechanisms.
//!
//! A [`Linkage`] is an arena of [`Joint`]s. Each joint is static, driven by a
//! crank, or placed by a geometric constraint on its parents (rigid
//! triangle, pin, slider). Stepping the linkage turns the cranks and solves
//! the other joints in dependency order.
//!
//! ```
//! use planar_linkage::*;
//!
//! let mut linkage = demo::four_bar().unwrap();
//! let period = linkage.rotation_period().unwrap();
//! let mut snapshots = Vec::new();
//! linkage.simulate(period, 1., &mut snapshots).unwrap();
//! let coupler = &loci(&snapshots)[1];
//! assert!(bounding_box(coupler).is_some());
//! ```
#![cfg_attr(doc_cfg, feature(doc_cfg))]
pub use crate::error::*;
pub use crate::geo::*;
pub use crate::joint::*;
pub use crate::linkage::*;
pub use crate::step::*;
#[cfg(feature = "swarm")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "swarm")))]
pub use metaheuristics_nature as mh;

macro_rules! impl_builders {
    ($($(#[$meta:meta])* fn $name:ident($ty:ty))+) => {$(
        $(#[$meta])*
        pub fn $name(self, $name: $ty) -> Self {
            Self { $name, ..self }
        }
    )+};
}

#[cfg(feature = "csv")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "csv")))]
pub mod csv;
pub mod demo;
mod error;
mod geo;
mod joint;
mod linkage;
pub mod opt;
mod step;
