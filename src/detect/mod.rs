mod backend;
mod backends;
mod registry;
pub(crate) mod result;

pub use backend::DetectorBackend;
pub use backends::{HogBackend, HogConfig, StubBackend, SweepParams};
pub use registry::BackendRegistry;
pub use result::{BBox, DetectionResult};
