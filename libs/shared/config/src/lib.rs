use std::env;
use tracing::warn;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_FALLBACK_PAGE_SIZE: u32 = 50;
pub const DEFAULT_ADMIN_API_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub booking_api_url: String,
    pub booking_api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub fallback_page_size: u32,
    pub admin_api_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            booking_api_url: env::var("BOOKING_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("BOOKING_API_URL not set, using empty value");
                    String::new()
                }),
            booking_api_token: env::var("BOOKING_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            request_timeout_secs: parse_or_default(
                "BOOKING_API_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            fallback_page_size: parse_or_default(
                "PROFESSIONAL_FALLBACK_PAGE_SIZE",
                DEFAULT_FALLBACK_PAGE_SIZE,
            ),
            admin_api_port: parse_or_default("ADMIN_API_PORT", DEFAULT_ADMIN_API_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointed at an explicit backend, everything else defaulted.
    pub fn for_backend(booking_api_url: impl Into<String>) -> Self {
        Self {
            booking_api_url: booking_api_url.into(),
            booking_api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fallback_page_size: DEFAULT_FALLBACK_PAGE_SIZE,
            admin_api_port: DEFAULT_ADMIN_API_PORT,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.booking_api_url.is_empty()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
