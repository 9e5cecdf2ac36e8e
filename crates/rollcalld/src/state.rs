use std::sync::Arc;

use anyhow::Context;
use rollcall_core::{FaceEngine, KnownFace, KnownFaceRegistry, Recognition};
use rollcall_store::{Database, StoreError};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::{Config, StoragePaths};

/// Shared state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub paths: StoragePaths,
    pub db: Database,
    pub engine: Arc<dyn FaceEngine>,
    registry: RwLock<KnownFaceRegistry>,
}

/// Result of a registry reload.
#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub known_faces: usize,
    pub backfilled: usize,
    pub skipped: Vec<i64>,
}

impl AppState {
    /// Create directories, open and seed the database, and load known faces.
    ///
    /// Any failure here is fatal for the daemon.
    pub async fn initialize(config: Config, engine: Arc<dyn FaceEngine>) -> anyhow::Result<Arc<Self>> {
        let paths = config.storage_paths();
        tokio::fs::create_dir_all(&paths.image_dir)
            .await
            .with_context(|| format!("creating image directory {}", paths.image_dir.display()))?;
        tracing::info!(
            data_dir = %paths.data_dir.display(),
            db = %paths.db_path.display(),
            images = %paths.image_dir.display(),
            "storage ready"
        );

        let db = Database::open(&paths.db_path)
            .await
            .with_context(|| format!("opening database {}", paths.db_path.display()))?;
        db.ensure_schema().await.context("creating schema")?;
        if db
            .seed_teacher(&config.seed_username, &config.seed_password)
            .await
            .context("seeding teacher")?
        {
            tracing::info!(username = %config.seed_username, "seeded demo teacher");
        }

        let state = Arc::new(Self {
            config,
            paths,
            db,
            engine,
            registry: RwLock::new(KnownFaceRegistry::new()),
        });
        state.reload_registry().await.context("loading known faces")?;
        Ok(state)
    }

    /// Rebuild the registry from storage and persist any backfilled encodings.
    ///
    /// The write lock is held for the whole rebuild, so readers see either the
    /// old registry or the new one, never a mix.
    pub async fn reload_registry(&self) -> Result<ReloadSummary, StoreError> {
        let mut registry = self.registry.write().await;

        let students = self.db.load_students().await?;
        let rebuild = KnownFaceRegistry::rebuild(
            students.into_iter().map(Into::into),
            self.engine.as_ref(),
        );

        let backfilled = rebuild.backfilled.len();
        for (id, encoding) in rebuild.backfilled {
            self.db.update_encoding(id, encoding).await?;
        }

        *registry = rebuild.registry;
        Ok(ReloadSummary {
            known_faces: registry.len(),
            backfilled,
            skipped: rebuild.skipped,
        })
    }

    pub async fn register_face(&self, face: KnownFace) {
        self.registry.write().await.add(face);
    }

    /// Snapshot of the registered faces.
    pub async fn known_faces(&self) -> Vec<KnownFace> {
        self.registry.read().await.faces().to_vec()
    }

    pub async fn recognize(&self, image: &[u8]) -> Vec<Recognition> {
        let registry = self.registry.read().await;
        self.engine.recognize(image, registry.faces())
    }
}
