use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rollcall_core::attendance::{DEFAULT_FACE_PRESENT_THRESHOLD, DEFAULT_PRESENT_THRESHOLD};
use serde::Deserialize;
use thiserror::Error;

const DB_FILE: &str = "attendance.db";
const IMAGE_DIR: &str = "student_images";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid host {0:?} in config file")]
    InvalidHost(String),
}

/// Optional TOML layer; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    image_dir: Option<PathBuf>,
    seed_username: Option<String>,
    seed_password: Option<String>,
    present_threshold: Option<f64>,
    face_present_threshold: Option<f32>,
    max_upload_bytes: Option<usize>,
    expose_error_detail: Option<bool>,
}

/// Daemon configuration: defaults, then `ROLLCALL_CONFIG` file, then `ROLLCALL_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (default: 0.0.0.0:5000).
    pub addr: SocketAddr,
    /// Preferred data directory; falls back to a temp dir if not writable.
    pub data_dir: PathBuf,
    /// SQLite file; defaults to `<data_dir>/attendance.db`.
    pub db_path: Option<PathBuf>,
    /// Upload directory; defaults to `<data_dir>/student_images`.
    pub image_dir: Option<PathBuf>,
    /// Demo credential seeded at startup.
    pub seed_username: String,
    pub seed_password: String,
    /// Fractional confidence for batch marking.
    pub present_threshold: f64,
    /// Percentage confidence for face-based marking.
    pub face_present_threshold: f32,
    pub max_upload_bytes: usize,
    /// Include error detail in 500 responses.
    pub expose_error_detail: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5000),
            data_dir: default_data_dir(),
            db_path: None,
            image_dir: None,
            seed_username: "teacher1".to_string(),
            seed_password: "1234".to_string(),
            present_threshold: DEFAULT_PRESENT_THRESHOLD,
            face_present_threshold: DEFAULT_FACE_PRESENT_THRESHOLD,
            max_upload_bytes: 10 * 1024 * 1024,
            expose_error_detail: true,
        }
    }
}

/// Where the database and uploads actually live once the data dir is resolved.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub image_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Ok(path) = std::env::var("ROLLCALL_CONFIG") {
            cfg.apply_file(Path::new(&path))?;
        }
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::info!(path = %path.display(), "config file loaded");
        self.merge(file)
    }

    fn merge(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(host) = file.host {
            let ip = host.parse().map_err(|_| ConfigError::InvalidHost(host))?;
            self.addr.set_ip(ip);
        }
        if let Some(port) = file.port {
            self.addr.set_port(port);
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if file.db_path.is_some() {
            self.db_path = file.db_path;
        }
        if file.image_dir.is_some() {
            self.image_dir = file.image_dir;
        }
        if let Some(u) = file.seed_username {
            self.seed_username = u;
        }
        if let Some(p) = file.seed_password {
            self.seed_password = p;
        }
        if let Some(t) = file.present_threshold {
            self.present_threshold = t;
        }
        if let Some(t) = file.face_present_threshold {
            self.face_present_threshold = t;
        }
        if let Some(n) = file.max_upload_bytes {
            self.max_upload_bytes = n;
        }
        if let Some(b) = file.expose_error_detail {
            self.expose_error_detail = b;
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        self.addr.set_ip(env_parse("ROLLCALL_HOST", self.addr.ip()));
        self.addr.set_port(env_parse("ROLLCALL_PORT", self.addr.port()));
        if let Ok(dir) = std::env::var("ROLLCALL_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("ROLLCALL_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("ROLLCALL_IMAGE_DIR") {
            self.image_dir = Some(PathBuf::from(dir));
        }
        if let Ok(u) = std::env::var("ROLLCALL_SEED_USERNAME") {
            self.seed_username = u;
        }
        if let Ok(p) = std::env::var("ROLLCALL_SEED_PASSWORD") {
            self.seed_password = p;
        }
        self.present_threshold = env_parse("ROLLCALL_PRESENT_THRESHOLD", self.present_threshold);
        self.face_present_threshold =
            env_parse("ROLLCALL_FACE_PRESENT_THRESHOLD", self.face_present_threshold);
        self.max_upload_bytes = env_parse("ROLLCALL_MAX_UPLOAD_BYTES", self.max_upload_bytes);
        if let Ok(v) = std::env::var("ROLLCALL_EXPOSE_ERROR_DETAIL") {
            self.expose_error_detail = v != "0" && !v.eq_ignore_ascii_case("false");
        }
    }

    /// Resolve the data dir and derive the database and upload locations.
    pub fn storage_paths(&self) -> StoragePaths {
        let data_dir = resolve_data_dir(&self.data_dir);
        StoragePaths {
            db_path: self.db_path.clone().unwrap_or_else(|| data_dir.join(DB_FILE)),
            image_dir: self.image_dir.clone().unwrap_or_else(|| data_dir.join(IMAGE_DIR)),
            data_dir,
        }
    }
}

/// `$XDG_DATA_HOME/rollcall`, else `~/.local/share/rollcall`.
pub fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall")
}

/// Use `preferred` if it can be created and written to, else a temp-dir fallback.
pub fn resolve_data_dir(preferred: &Path) -> PathBuf {
    if dir_is_writable(preferred) {
        return preferred.to_owned();
    }
    let fallback = std::env::temp_dir().join("rollcall");
    tracing::warn!(
        preferred = %preferred.display(),
        fallback = %fallback.display(),
        "data directory not writable; using fallback"
    );
    fallback
}

fn dir_is_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".rollcall-write-probe");
    let ok = std::fs::write(&probe, b"").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}

fn env_parse<T>(key: &str, current: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, "invalid value; keeping default");
            current
        }),
        Err(_) => current,
    }
}
