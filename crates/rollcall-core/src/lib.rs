//! rollcall-core: Face encodings, known-face registry and attendance rules.
//!
//! The bundled face engine is a deterministic placeholder; see [`engine`].

pub mod attendance;
pub mod engine;
pub mod registry;
pub mod types;

pub use attendance::{AttendanceStatus, ConfidenceEntry, Partition};
pub use engine::{EngineError, FaceEngine, PlaceholderEngine};
pub use registry::{FaceSource, KnownFaceRegistry, Rebuild};
pub use types::{Encoding, FaceLocation, KnownFace, Recognition};
