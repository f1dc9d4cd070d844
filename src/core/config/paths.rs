use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub storage_dir: PathBuf,
    pub embeddings_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let data_dir = discover_data_dir(&project_root);
        let storage_dir = data_dir.join("storage");
        let embeddings_dir = storage_dir.join("embeddings");
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &storage_dir, &embeddings_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            data_dir,
            storage_dir,
            embeddings_dir,
            log_dir,
        }
    }

    /// Paths rooted at an explicit data directory, bypassing discovery.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let storage_dir = data_dir.join("storage");
        let embeddings_dir = storage_dir.join("embeddings");
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &storage_dir, &embeddings_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root: data_dir.clone(),
            data_dir,
            storage_dir,
            embeddings_dir,
            log_dir,
        }
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("COURSECOMPANION_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.toml").exists() || manifest_dir.join("data").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("COURSECOMPANION_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.join("data");
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("CourseCompanion");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("CourseCompanion");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("coursecompanion")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
