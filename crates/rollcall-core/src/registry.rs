//! In-memory index of known faces.
//!
//! The registry is derived state: it mirrors (id, name, encoding) of the
//! students table and can be rebuilt from storage at any time.

use crate::engine::FaceEngine;
use crate::types::{Encoding, KnownFace};
use std::collections::HashMap;
use std::path::PathBuf;

/// What the registry needs to know about one stored student.
#[derive(Debug, Clone)]
pub struct FaceSource {
    pub student_id: i64,
    pub name: String,
    pub image_path: Option<PathBuf>,
    pub encoding: Option<Encoding>,
}

/// Outcome of [`KnownFaceRegistry::rebuild`].
#[derive(Debug, Default)]
pub struct Rebuild {
    pub registry: KnownFaceRegistry,
    /// Encodings computed from images because storage had none; callers persist these.
    pub backfilled: Vec<(i64, Encoding)>,
    /// Students with neither a stored encoding nor a usable image.
    pub skipped: Vec<i64>,
}

#[derive(Debug, Default, Clone)]
pub struct KnownFaceRegistry {
    faces: Vec<KnownFace>,
    /// student id -> position in `faces`
    index: HashMap<i64, usize>,
}

impl KnownFaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a face, replacing any existing entry for the same student.
    pub fn add(&mut self, face: KnownFace) {
        match self.index.get(&face.student_id) {
            Some(&pos) => self.faces[pos] = face,
            None => {
                self.index.insert(face.student_id, self.faces.len());
                self.faces.push(face);
            }
        }
    }

    pub fn clear(&mut self) {
        self.faces.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Faces in registration order.
    pub fn faces(&self) -> &[KnownFace] {
        &self.faces
    }

    /// Build a fresh registry from stored students.
    ///
    /// Stored encodings win; otherwise the encoding is computed from the image
    /// path and reported as a backfill.
    pub fn rebuild<I>(sources: I, engine: &dyn FaceEngine) -> Rebuild
    where
        I: IntoIterator<Item = FaceSource>,
    {
        let mut out = Rebuild::default();

        for src in sources {
            let encoding = match (src.encoding, src.image_path.as_deref()) {
                (Some(enc), _) => enc,
                (None, Some(path)) => match engine.compute_encoding(path) {
                    Ok(enc) => {
                        out.backfilled.push((src.student_id, enc.clone()));
                        enc
                    }
                    Err(err) => {
                        tracing::warn!(
                            student_id = src.student_id,
                            path = %path.display(),
                            error = %err,
                            "no encoding available for student image"
                        );
                        out.skipped.push(src.student_id);
                        continue;
                    }
                },
                (None, None) => {
                    out.skipped.push(src.student_id);
                    continue;
                }
            };

            out.registry.add(KnownFace {
                student_id: src.student_id,
                name: src.name,
                encoding,
            });
        }

        tracing::info!(
            known = out.registry.len(),
            backfilled = out.backfilled.len(),
            skipped = out.skipped.len(),
            "known-face registry rebuilt"
        );
        out
    }
}
