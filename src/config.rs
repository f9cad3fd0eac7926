use std::env;

/// Runtime settings, read from the environment after `dotenv()` has run.
/// Every value has a default except the API key, which stays optional so the
/// server can still come up for frontend and database testing without one.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub chat_model: String,
    /// When set, completions go to this OpenAI-compatible endpoint instead of
    /// the official API.
    pub compat_api_url: Option<String>,
    pub pdf_path: String,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub rate_limit_per_min: u32,
    pub rate_limit_burst: u32,
}

impl Settings {
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        let chat_model = env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let compat_api_url = env::var("COMPAT_API_URL").ok().filter(|u| !u.is_empty());

        let pdf_path =
            env::var("PDF_FILE_PATH").unwrap_or_else(|_| "MonthlyAttendanceReport.pdf".to_string());

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "attendance.db".to_string());

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let rate_limit_per_min = env::var("RATE_LIMIT_PER_MIN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let rate_limit_burst = env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Self {
            api_key,
            chat_model,
            compat_api_url,
            pdf_path,
            database_path,
            host,
            port,
            rate_limit_per_min,
            rate_limit_burst,
        }
    }
}
