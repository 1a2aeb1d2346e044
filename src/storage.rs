use crate::errors::AppError;
use crate::models::AppData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};

/// Reads the dataset. A missing file is an empty dataset; an unreadable or
/// malformed one is an error so it never gets overwritten.
pub async fn load_data(path: &Path) -> Result<AppData, AppError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!(path = %path.display(), "failed to parse data file: {err}");
            AppError::from(err)
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AppData::default()),
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            Err(err.into())
        }
    }
}

/// Writes to a sibling temp file and renames it over `path`, so a failed
/// write never leaves a truncated document behind.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    fs::write(&staging, payload).await?;
    fs::rename(&staging, path).await?;
    debug!(path = %path.display(), "data persisted");
    Ok(())
}

/// Shared handle to the dataset and the file that backs it.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    data: Arc<Mutex<AppData>>,
}

impl Store {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn open(path: PathBuf) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = load_data(&path).await?;
        Ok(Self::new(path, data))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> T {
        let data = self.data.lock().await;
        f(&data)
    }

    /// Applies `f` to a draft copy, persists the draft and only then makes it
    /// visible. Any error leaves the current dataset untouched.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut AppData) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut data = self.data.lock().await;
        let mut draft = data.clone();
        let output = f(&mut draft)?;

        persist_data(&self.path, &draft).await?;
        *data = draft;
        Ok(output)
    }
}
