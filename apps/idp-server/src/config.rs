//! Configuration management for the IDP server

use std::env;
use std::str::FromStr;

use crate::ocr::RecognizerKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub provider: RecognizerKind,
    pub language: String,
    pub pdf_scale: f32,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub extract_per_minute: u32,
    pub health_per_minute: u32,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment variables")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: RecognizerKind::Tesseract,
            language: "eng".to_string(),
            pdf_scale: 2.0,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://ai-document-extractor-delta.vercel.app".to_string(),
            ],
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            extract_per_minute: 100,
            health_per_minute: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            ocr: OcrConfig::default(),
            llm: LlmConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("LLM_API_KEY")
            .or_else(|| var("GROQ_API_KEY"))
            .ok_or(ConfigError::Missing("LLM_API_KEY (or GROQ_API_KEY)"))?;

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or("SERVER_PORT", var("SERVER_PORT"), defaults.server.port)?,
            },
            ocr: OcrConfig {
                provider: parse_or("OCR_PROVIDER", var("OCR_PROVIDER"), defaults.ocr.provider)?,
                language: var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                pdf_scale: parse_checked(
                    "OCR_PDF_SCALE",
                    var("OCR_PDF_SCALE"),
                    defaults.ocr.pdf_scale,
                    |scale| scale.is_finite() && *scale > 0.0,
                )?,
                ollama_url: var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: var("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
            },
            llm: LlmConfig {
                api_key,
                base_url: var("LLM_BASE_URL").unwrap_or(defaults.llm.base_url),
                model: var("LLM_MODEL").unwrap_or(defaults.llm.model),
                timeout_secs: parse_or(
                    "LLM_TIMEOUT_SECS",
                    var("LLM_TIMEOUT_SECS"),
                    defaults.llm.timeout_secs,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .map(|raw| {
                        raw.split(',')
                            .map(|origin| origin.trim().trim_end_matches('/').to_string())
                            .filter(|origin| !origin.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.cors.allowed_origins),
            },
            rate_limit: RateLimitConfig {
                extract_per_minute: parse_checked(
                    "RATE_LIMIT_EXTRACT_PER_MINUTE",
                    var("RATE_LIMIT_EXTRACT_PER_MINUTE"),
                    defaults.rate_limit.extract_per_minute,
                    |limit| *limit > 0,
                )?,
                health_per_minute: parse_checked(
                    "RATE_LIMIT_HEALTH_PER_MINUTE",
                    var("RATE_LIMIT_HEALTH_PER_MINUTE"),
                    defaults.rate_limit.health_per_minute,
                    |limit| *limit > 0,
                )?,
            },
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Like `parse_or`, also rejecting parsed values that fail `valid`
fn parse_checked<T, F>(
    key: &'static str,
    raw: Option<String>,
    default: T,
    valid: F,
) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&T) -> bool,
{
    let value = parse_or(key, raw.clone(), default)?;
    if valid(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
        })
    }
}
