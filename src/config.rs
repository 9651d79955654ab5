use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub frontend_url: String,
    pub public_api_url: String,
    pub payos: PayOsConfig,
    pub payment_link_ttl_secs: i64,
    pub shop_package_price: i64,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct PayOsConfig {
    pub client_id: String,
    pub api_key: String,
    pub checksum_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", 720);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let public_api_url =
            env::var("PUBLIC_API_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            public_api_url: public_api_url.trim_end_matches('/').to_string(),
            payos: PayOsConfig::from_env()?,
            payment_link_ttl_secs: parse_or("PAYMENT_LINK_TTL_SECS", 24 * 60 * 60),
            shop_package_price: parse_or("SHOP_PACKAGE_PRICE", 1_000_000),
            smtp: SmtpConfig::from_env(),
        })
    }
}

impl PayOsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let client_id = env::var("PAYOS_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("PAYOS_CLIENT_ID is not set"))?;
        let api_key =
            env::var("PAYOS_API_KEY").map_err(|_| anyhow::anyhow!("PAYOS_API_KEY is not set"))?;
        let checksum_key = env::var("PAYOS_CHECKSUM_KEY")
            .map_err(|_| anyhow::anyhow!("PAYOS_CHECKSUM_KEY is not set"))?;
        let base_url = env::var("PAYOS_BASE_URL")
            .unwrap_or_else(|_| "https://api-merchant.payos.vn".to_string());
        Ok(Self {
            client_id,
            api_key,
            checksum_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl SmtpConfig {
    /// Returns `None` when `SMTP_HOST` is unset; mail is then only logged.
    pub fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            host,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(25),
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@lensmart.local".to_string()),
        })
    }
}

fn parse_or(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
