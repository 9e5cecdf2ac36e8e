//! Face engine capability and the placeholder implementation.
//!
//! `PlaceholderEngine` is a development stand-in. Its encodings are derived
//! from the image *path*, not the pixels, and its recognition output is a
//! fixed pattern that ignores the uploaded image entirely. It exists so the
//! rest of the system can run end to end; a real embedding pipeline plugs in
//! by implementing [`FaceEngine`].

use crate::types::{Encoding, FaceLocation, KnownFace, Recognition};
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

const ENCODING_DIM: usize = 128;
const KNOWN_CONFIDENCE: f32 = 85.0;
const UNKNOWN_CONFIDENCE: f32 = 45.0;
const UNKNOWN_NAME: &str = "Unknown";
const KNOWN_LOCATION: FaceLocation = FaceLocation { top: 100, right: 200, bottom: 300, left: 50 };
const UNKNOWN_LOCATION: FaceLocation = FaceLocation { top: 150, right: 250, bottom: 350, left: 100 };

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no face detected in image")]
    NoFaceDetected,
    #[error("invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Strategy for turning registration photos into encodings and class photos
/// into recognitions.
pub trait FaceEngine: Send + Sync {
    /// Compute the encoding for a stored registration image.
    fn compute_encoding(&self, image_path: &Path) -> Result<Encoding, EngineError>;

    /// Detect and identify faces in an uploaded image.
    fn recognize(&self, image: &[u8], known: &[KnownFace]) -> Vec<Recognition>;
}

/// Deterministic mock engine. See the module docs: it has no discriminative power.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderEngine;

impl FaceEngine for PlaceholderEngine {
    fn compute_encoding(&self, image_path: &Path) -> Result<Encoding, EngineError> {
        if !image_path.exists() {
            return Err(EngineError::NoFaceDetected);
        }
        Ok(path_digest_encoding(&image_path.to_string_lossy()))
    }

    fn recognize(&self, _image: &[u8], known: &[KnownFace]) -> Vec<Recognition> {
        let mut results = Vec::new();

        if let Some(face) = known.first() {
            results.push(Recognition {
                id: Some(face.student_id),
                name: face.name.clone(),
                confidence: KNOWN_CONFIDENCE,
                location: KNOWN_LOCATION,
            });
        }

        if results.is_empty() || (known.len() > 1 && results.len() < 2) {
            results.push(Recognition {
                id: None,
                name: UNKNOWN_NAME.to_string(),
                confidence: UNKNOWN_CONFIDENCE,
                location: UNKNOWN_LOCATION,
            });
        }

        tracing::debug!(known = known.len(), faces = results.len(), "placeholder recognition");
        results
    }
}

/// Map the SHA-256 of `path` onto `ENCODING_DIM` values in [-1, 1].
///
/// Value `i` reads the overlapping hex pair at `i` and `i + 1` (wrapping).
pub fn path_digest_encoding(path: &str) -> Encoding {
    let hex = format!("{:x}", Sha256::digest(path.as_bytes()));
    let digits: Vec<u32> = hex.chars().filter_map(|c| c.to_digit(16)).collect();
    let n = digits.len();

    let values = (0..ENCODING_DIM)
        .map(|i| {
            let byte = digits[i % n] * 16 + digits[(i + 1) % n];
            (byte as f32 / 255.0 - 0.5) * 2.0
        })
        .collect();

    Encoding::new(values)
}

/// Decode a base64 image, accepting an optional `data:image/...;base64,` prefix.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, EngineError> {
    let data = data.trim();
    let payload = match data.strip_prefix("data:image") {
        Some(rest) => rest.split_once(',').map(|(_, b64)| b64).unwrap_or(""),
        None => data,
    };
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(id: i64, name: &str) -> KnownFace {
        KnownFace {
            student_id: id,
            name: name.into(),
            encoding: path_digest_encoding(name),
        }
    }

    #[test]
    fn test_digest_encoding_shape_and_range() {
        let enc = path_digest_encoding("student_images/alice_a.jpg");
        assert_eq!(enc.len(), ENCODING_DIM);
        assert!(enc.values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_digest_encoding_known_values() {
        // sha256("") = e3b0c442...7852b855
        let enc = path_digest_encoding("");
        let expect = |byte: u32| (byte as f32 / 255.0 - 0.5) * 2.0;
        assert!((enc.values[0] - expect(0xe3)).abs() < 1e-6);
        assert!((enc.values[1] - expect(0x3b)).abs() < 1e-6);
        // Last digit wraps around to the first.
        assert!((enc.values[63] - expect(0x5e)).abs() < 1e-6);
        assert_eq!(enc.values[64], enc.values[0]);
    }

    #[test]
    fn test_digest_encoding_depends_only_on_path() {
        let a = path_digest_encoding("images/a.png");
        let b = path_digest_encoding("images/a.png");
        let c = path_digest_encoding("images/b.png");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_compute_encoding_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlaceholderEngine
            .compute_encoding(&dir.path().join("missing.jpg"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoFaceDetected));
    }

    #[test]
    fn test_compute_encoding_ignores_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.jpg");
        std::fs::write(&path, b"first").unwrap();
        let first = PlaceholderEngine.compute_encoding(&path).unwrap();
        std::fs::write(&path, b"second, different bytes").unwrap();
        let second = PlaceholderEngine.compute_encoding(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, path_digest_encoding(&path.to_string_lossy()));
    }

    #[test]
    fn test_recognize_no_known_faces() {
        let results = PlaceholderEngine.recognize(b"anything", &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, None);
        assert_eq!(results[0].name, "Unknown");
        assert_eq!(results[0].confidence, UNKNOWN_CONFIDENCE);
        assert_eq!(results[0].location, UNKNOWN_LOCATION);
    }

    #[test]
    fn test_recognize_single_known_face() {
        let results = PlaceholderEngine.recognize(b"", &[known(7, "Alice")]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, Some(7));
        assert_eq!(results[0].name, "Alice");
        assert_eq!(results[0].confidence, KNOWN_CONFIDENCE);
        assert_eq!(results[0].location, KNOWN_LOCATION);
    }

    #[test]
    fn test_recognize_many_known_faces() {
        let gallery = [known(3, "Bob"), known(1, "Alice"), known(2, "Carol")];
        let results = PlaceholderEngine.recognize(&[0xff, 0xd8], &gallery);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, Some(3));
        assert_eq!(results[1].id, None);
    }

    #[test]
    fn test_decode_base64_plain() {
        assert_eq!(decode_base64_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_base64_data_url() {
        let bytes = decode_base64_image("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert!(matches!(
            decode_base64_image("!!not base64!!"),
            Err(EngineError::InvalidBase64(_))
        ));
    }
}
