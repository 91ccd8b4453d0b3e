use std::env;

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl CorsConfig {
    /// Reads `CORS_ALLOWED_ORIGINS` as a comma separated list.
    pub fn from_env() -> Self {
        match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => Self {
                allowed_origins: raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            Err(_) => Self::default(),
        }
    }
}
