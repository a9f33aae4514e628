mod hog;
mod stub;

pub use hog::{HogBackend, HogConfig, SweepParams};
pub use stub::StubBackend;
