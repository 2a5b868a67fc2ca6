use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vision: VisionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Left empty to read the key from `api_key_env`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Per-request HTTP timeout for the chat completion call.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_language")]
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Refuse to start when the model directory cannot be loaded.
    #[serde(default)]
    pub required: bool,
    /// Uploads wider or taller than this are rejected before full decode.
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            max_body_bytes: default_max_body_bytes(),
            default_language: default_language(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            top_k: default_top_k(),
            required: false,
            max_image_dimension: default_max_image_dimension(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_api_key_env() -> String {
    "TOGETHER_API_KEY".to_string()
}

fn default_model() -> String {
    "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_language() -> String {
    "en".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_dir() -> String {
    "./model".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_max_image_dimension() -> u32 {
    4096
}
