// Co-audience network and the polarization matrix derived from it.

pub mod audience;
pub mod polarization;

pub use audience::AudienceSets;
pub use polarization::{PolarizationReport, SquareMatrix};
