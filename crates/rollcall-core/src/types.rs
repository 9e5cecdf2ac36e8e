use serde::{Deserialize, Serialize};

/// Face encoding vector (128-dimensional for the placeholder engine).
///
/// Serialized as a bare JSON array so it can be stored in a TEXT column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored encoding. Empty input is treated as "no encoding".
    pub fn from_json(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw).map(Some)
    }
}

/// A registered face the engine can report as recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownFace {
    pub student_id: i64,
    pub name: String,
    pub encoding: Encoding,
}

/// Pixel box of a detected face, in `face_recognition` (top, right, bottom, left) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLocation {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// One detected face and who it was matched to, if anyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    /// Matched student id; `None` for an unknown face.
    pub id: Option<i64>,
    pub name: String,
    /// Match confidence as a percentage (0-100).
    pub confidence: f32,
    pub location: FaceLocation,
}

impl Recognition {
    pub fn is_known(&self) -> bool {
        self.id.is_some()
    }
}
