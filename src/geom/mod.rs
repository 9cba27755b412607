//! Geometry descriptors and evaluation.
//!
//! The closed set of curve and surface forms the modeling side produces,
//! plus the rigid placement transform used throughout the topology layer.
//! Encoders and classifiers match on these enums exhaustively; there is no
//! runtime type probing.

mod bspline;
mod curve;
pub(crate) mod poly2d;
mod surface;
mod trsf;

pub use bspline::{BSplineCurve, BSplineCurve2d, BSplineSurface};
pub use curve::{Curve, Curve2d};
pub use surface::Surface;
pub use trsf::Trsf;
