use std::{env, str::FromStr, time::Duration};

use secrecy::SecretString;

use crate::services::pipeline_settings::PipelineSettings;

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub upload_dir: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origin: String,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_batch_size: usize,
    pub generation_temperature: f32,
    pub generation_timeout_secs: u64,
    pub target_quiz_count: usize,
    pub cluster_count: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub pacing_enabled: bool,
    pub pacing_base_ms: u64,
    pub pacing_step_ms: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env_string("MONGO_CONN_STRING", "mongodb://localhost:27017"),
            mongo_db_name: env_string("MONGO_DB_NAME", "quizforge-local"),
            upload_dir: env_string("UPLOAD_DIR", "uploads"),
            web_server_host: env_string("WEB_SERVER_HOST", "localhost"),
            web_server_port: env_or("WEB_SERVER_PORT", 8000),
            cors_allowed_origin: env_string("CORS_ALLOWED_ORIGIN", "http://localhost:3000"),
            openai_api_key: SecretString::from(env_string("OPENAI_API_KEY", "")),
            openai_api_base: env_string("OPENAI_API_BASE", "https://api.openai.com/v1"),
            chat_model: env_string("CHAT_MODEL", "gpt-4o-mini"),
            embedding_model: env_string("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_batch_size: env_or("EMBEDDING_BATCH_SIZE", 64),
            generation_temperature: env_or("GENERATION_TEMPERATURE", 0.2),
            generation_timeout_secs: env_or("GENERATION_TIMEOUT_SECS", 60),
            target_quiz_count: env_or("TARGET_QUIZ_COUNT", 10),
            cluster_count: env_or("CLUSTER_COUNT", 8),
            chunk_size: env_or("CHUNK_SIZE", 1000),
            chunk_overlap: env_or("CHUNK_OVERLAP", 200),
            pacing_enabled: env_or("PACING_ENABLED", true),
            pacing_base_ms: env_or("PACING_BASE_MS", 4000),
            pacing_step_ms: env_or("PACING_STEP_MS", 500),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if the generation API key is missing
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        if self.openai_api_key.expose_secret().trim().is_empty() {
            panic!(
                "FATAL: OPENAI_API_KEY is not set! Set OPENAI_API_KEY to a key for the configured OPENAI_API_BASE."
            );
        }

        if self.chunk_overlap >= self.chunk_size {
            panic!(
                "FATAL: CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({}).",
                self.chunk_overlap, self.chunk_size
            );
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            target_quiz_count: self.target_quiz_count,
            cluster_count: self.cluster_count,
            temperature: self.generation_temperature,
            pacing_enabled: self.pacing_enabled,
            pacing_base: Duration::from_millis(self.pacing_base_ms),
            pacing_step: Duration::from_millis(self.pacing_step_ms),
            ..PipelineSettings::default()
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizforge-test".to_string(),
            upload_dir: "uploads".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            openai_api_key: SecretString::from("test-key".to_string()),
            openai_api_base: "http://localhost:11434/v1".to_string(),
            chat_model: "test-chat".to_string(),
            embedding_model: "test-embed".to_string(),
            embedding_batch_size: 16,
            generation_temperature: 0.2,
            generation_timeout_secs: 5,
            target_quiz_count: 10,
            cluster_count: 8,
            chunk_size: 1000,
            chunk_overlap: 200,
            pacing_enabled: false,
            pacing_base_ms: 0,
            pacing_step_ms: 0,
        }
    }
}
