use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/voucher | Working directory (databases, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | GATEWAY_SURCHARGE_PERCENT | 4.5 | Gateway payment surcharge |
/// | ROLE_DISCOUNT_PERCENT | 2.0 | Discount percent per partner tier level |
/// | NOTIFY_BUFFER_SIZE | 256 | Notification queue depth |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown window |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/voucher HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for databases and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Gateway payment surcharge, percent of the post-discount amount
    pub gateway_surcharge_percent: f64,
    /// Role discount percent per partner tier level
    pub role_discount_percent: f64,
    /// Notification channel buffer size
    pub notify_buffer_size: usize,
    /// Graceful shutdown window (milliseconds)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// the documented defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/voucher".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            gateway_surcharge_percent: std::env::var("GATEWAY_SURCHARGE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4.5),
            role_discount_percent: std::env::var("ROLE_DISCOUNT_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2.0),
            notify_buffer_size: std::env::var("NOTIFY_BUFFER_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
