use std::env;
use std::fs;

use serde::Deserialize;

use super::paths::AppPaths;

/// Application settings, loaded from an optional `config.toml` and then
/// overridden by environment variables (the variable names the deployment
/// scripts already use).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,

    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_embedding_model: String,
    pub openai_base_url: String,

    pub use_azure_openai: bool,
    pub azure_openai_api_key: Option<String>,
    pub azure_openai_endpoint: Option<String>,
    pub azure_openai_deployment_name: Option<String>,
    pub azure_openai_embedding_deployment_name: Option<String>,
    pub azure_openai_api_version: String,

    pub embedding_dimensions: usize,
    pub rag_top_k: usize,
    pub provider_timeout_secs: u64,
    pub vector_index_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "CourseCompanion".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8501".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:8501".to_string(),
            ],
            openai_api_key: None,
            openai_model: "gpt-4".to_string(),
            openai_embedding_model: "text-embedding-3-small".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            use_azure_openai: false,
            azure_openai_api_key: None,
            azure_openai_endpoint: None,
            azure_openai_deployment_name: None,
            azure_openai_embedding_deployment_name: None,
            azure_openai_api_version: "2024-02-01".to_string(),
            embedding_dimensions: 1536,
            rag_top_k: 5,
            provider_timeout_secs: 30,
            vector_index_name: "course_knowledge_base".to_string(),
        }
    }
}

impl Settings {
    /// Load settings for the given paths: `config.toml` first (if present),
    /// environment variables second.
    pub fn load(paths: &AppPaths) -> Self {
        let mut settings = load_config_file(paths).unwrap_or_default();
        settings.apply_env_overrides();
        settings
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("HOST") {
            self.host = host;
        }
        if let Some(port) = env_parse::<u16>("PORT") {
            self.port = port;
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.openai_api_key = Some(key);
            }
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            self.openai_model = model;
        }
        if let Ok(model) = env::var("OPENAI_EMBEDDING_MODEL") {
            self.openai_embedding_model = model;
        }
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            self.openai_base_url = url;
        }
        if let Ok(flag) = env::var("USE_AZURE_OPENAI") {
            self.use_azure_openai = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(key) = env::var("AZURE_OPENAI_API_KEY") {
            if !key.is_empty() {
                self.azure_openai_api_key = Some(key);
            }
        }
        if let Ok(endpoint) = env::var("AZURE_OPENAI_ENDPOINT") {
            if !endpoint.is_empty() {
                self.azure_openai_endpoint = Some(endpoint);
            }
        }
        if let Ok(deployment) = env::var("AZURE_OPENAI_DEPLOYMENT_NAME") {
            if !deployment.is_empty() {
                self.azure_openai_deployment_name = Some(deployment);
            }
        }
        if let Ok(deployment) = env::var("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME") {
            if !deployment.is_empty() {
                self.azure_openai_embedding_deployment_name = Some(deployment);
            }
        }
        if let Ok(version) = env::var("AZURE_OPENAI_API_VERSION") {
            self.azure_openai_api_version = version;
        }
        if let Some(dims) = env_parse::<usize>("EMBEDDING_DIMENSIONS") {
            self.embedding_dimensions = dims;
        }
        if let Some(top_k) = env_parse::<usize>("RAG_TOP_K") {
            self.rag_top_k = top_k;
        }
        if let Some(secs) = env_parse::<u64>("PROVIDER_TIMEOUT_SECS") {
            self.provider_timeout_secs = secs;
        }
        if let Ok(name) = env::var("VECTOR_INDEX_NAME") {
            if !name.is_empty() {
                self.vector_index_name = name;
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

fn load_config_file(paths: &AppPaths) -> Option<Settings> {
    let path = if let Ok(custom) = env::var("COURSECOMPANION_CONFIG_PATH") {
        std::path::PathBuf::from(custom)
    } else {
        let user_config = paths.data_dir.join("config.toml");
        if user_config.exists() {
            user_config
        } else {
            paths.project_root.join("config.toml")
        }
    };

    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str::<Settings>(&contents) {
            Ok(settings) => Some(settings),
            Err(err) => {
                tracing::warn!("Failed to parse {}: {}; using defaults", path.display(), err);
                None
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read {}: {}; using defaults", path.display(), err);
            None
        }
    }
}
