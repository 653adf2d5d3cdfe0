use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{bail, Result};

/// Application configuration, read from the process environment over `.env`.
#[derive(Debug, Clone)]
pub struct Config {
    /// "gemini" (default), "openai" or "ollama".
    pub llm_backend: String,
    pub model: String,

    // Providers
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub ollama_base_url: String,
    pub flow_timeout_s: u64,

    pub data_dir: String,

    // Web
    pub web_bind: String,
    pub web_port: u16,
    pub max_upload_bytes: usize,
    /// PDFs yielding fewer extracted characters than this are treated as scanned.
    pub ocr_min_text_chars: usize,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

pub fn parse_dotenv_str(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim();
            let v = v
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(v);
            map.insert(k.trim().to_string(), v.to_string());
        }
    }
    map
}

fn parse_dotenv(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_dotenv_str(&contents),
        Err(_) => HashMap::new(),
    }
}

fn get(key: &str, vars: &HashMap<String, String>) -> Option<String> {
    vars.get(key).filter(|v| !v.is_empty()).cloned()
}

fn get_str(key: &str, vars: &HashMap<String, String>, default: &str) -> String {
    get(key, vars).unwrap_or_else(|| default.to_string())
}

fn get_u64(key: &str, vars: &HashMap<String, String>, default: u64) -> u64 {
    get(key, vars).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn get_u16(key: &str, vars: &HashMap<String, String>, default: u16) -> u16 {
    get(key, vars).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn get_usize(key: &str, vars: &HashMap<String, String>, default: usize) -> usize {
    get(key, vars).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn resolve_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    path.to_string()
}

pub fn default_model(backend: &str) -> &'static str {
    match backend {
        "openai" => "gpt-4o-mini",
        "ollama" => "llama3.1",
        _ => "gemini-2.5-flash",
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut vars = parse_dotenv(Path::new(".env"));
        vars.extend(std::env::vars());
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let llm_backend = get_str("LLM_BACKEND", vars, "gemini").to_lowercase();
        if !matches!(llm_backend.as_str(), "gemini" | "openai" | "ollama") {
            bail!("unknown LLM_BACKEND {llm_backend:?} (expected gemini, openai or ollama)");
        }
        let model = get_str("MODEL", vars, default_model(&llm_backend));

        let gemini_api_key = get("GEMINI_API_KEY", vars)
            .or_else(|| get("GOOGLE_API_KEY", vars))
            .unwrap_or_default();

        Ok(Config {
            llm_backend,
            model,
            gemini_api_key,
            gemini_base_url: get_str("GEMINI_BASE_URL", vars, DEFAULT_GEMINI_BASE_URL),
            openai_api_key: get_str("OPENAI_API_KEY", vars, ""),
            openai_base_url: get_str("OPENAI_BASE_URL", vars, DEFAULT_OPENAI_BASE_URL),
            ollama_base_url: get_str("OLLAMA_BASE_URL", vars, DEFAULT_OLLAMA_BASE_URL),
            flow_timeout_s: get_u64("FLOW_TIMEOUT_S", vars, 120),
            data_dir: resolve_tilde(&get_str("DATA_DIR", vars, "store")),
            web_bind: get_str("WEB_BIND", vars, "127.0.0.1"),
            web_port: get_u16("WEB_PORT", vars, 3131),
            max_upload_bytes: get_usize("MAX_UPLOAD_BYTES", vars, 20 * 1024 * 1024),
            ocr_min_text_chars: get_usize("OCR_MIN_TEXT_CHARS", vars, 100),
        })
    }

    pub fn flow_timeout(&self) -> Duration {
        Duration::from_secs(self.flow_timeout_s)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.web_bind, self.web_port)
    }
}
