//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "0.0.0.0";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_MEDIA_PATH: &str = "./media";
    pub const DEV_DB_HOST: &str = "localhost";
    pub const DEV_DB_PORT: u16 = 5432;
    pub const DEV_DB_USER: &str = "postgres";
    pub const DEV_DB_PASSWORD: &str = "postgres";
    pub const DEV_DB_NAME: &str = "animestreaming";
    pub const DEV_DB_SSLMODE: &str = "disable";
    pub const DEV_DB_MAX_CONNECTIONS: u32 = 100;
    pub const DEV_DB_MIN_CONNECTIONS: u32 = 10;
    pub const DEV_JWT_SECRET: &str = "dev-jwt-secret-do-not-use-in-production";
    pub const DEV_CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000";
    pub const MAX_VIDEO_UPLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MiB per video file
    pub const MAX_FORM_FIELD_SIZE: usize = 32 * 1024 * 1024; // 32 MiB for non-video parts
    pub const TRANSCODE_CONCURRENCY: usize = 1;
    pub const FFMPEG_PATH: &str = "ffmpeg";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
    pub sslmode: String,
    /// Full connection string; takes precedence over the individual fields.
    pub url_override: Option<SecretString>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseSettings {
    /// Build the connection URL handed to SeaORM.
    pub fn connection_url(&self) -> String {
        if let Some(ref url) = self.url_override {
            return url.expose_secret().to_string();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.name,
            self.sslmode
        )
    }
}

/// Upload and transcoding limits.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    /// Root of the on-disk media tree.
    pub root: PathBuf,
    /// Hard cap on a single video file part.
    pub max_video_size: usize,
    /// Cap on any other multipart part (form fields, images).
    pub max_field_size: usize,
    /// Number of transcoding jobs allowed to run at once.
    pub transcode_concurrency: usize,
    /// External encoder binary.
    pub ffmpeg_path: PathBuf,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: SecretString,
    pub cors_allowed_origins: Vec<String>,
    /// Directory for static frontend assets.
    pub static_dir: Option<PathBuf>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(
    name: &str,
    default: T,
    message: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(message)),
        Err(_) => Ok(default),
    }
}

/// Split a comma separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ENV`: development/production (default: development)
    /// - `HOST` / `PORT`: bind address (default: 0.0.0.0:8080)
    /// - `MEDIA_PATH`: media storage root (default: ./media)
    /// - `DATABASE_URL`: full PostgreSQL URL, overrides the `DB_*` variables
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSLMODE`
    /// - `DB_MAX_CONNECTIONS` (100), `DB_MIN_CONNECTIONS` (10)
    /// - `JWT_SECRET`: token signing secret (required in production)
    /// - `CORS_ALLOWED_ORIGINS`: comma separated origin list
    /// - `MAX_VIDEO_UPLOAD_SIZE`, `MAX_FORM_FIELD_SIZE`: upload caps in bytes
    /// - `TRANSCODE_CONCURRENCY`: parallel transcoding jobs (default: 1)
    /// - `FFMPEG_PATH`: encoder binary (default: ffmpeg on PATH)
    /// - `STATIC_DIR`: optional frontend build directory
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("ENV") {
            Ok(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue(
                "ENV must be 'development' or 'production'",
            ))?,
            Err(_) => Environment::Development,
        };

        let host = var_or("HOST", defaults::DEV_HOST);
        let port = parse_var("PORT", defaults::DEV_PORT, "PORT must be a valid port number")?;

        let database = DatabaseSettings {
            host: var_or("DB_HOST", defaults::DEV_DB_HOST),
            port: parse_var(
                "DB_PORT",
                defaults::DEV_DB_PORT,
                "DB_PORT must be a valid port number",
            )?,
            user: var_or("DB_USER", defaults::DEV_DB_USER),
            password: SecretString::from(var_or("DB_PASSWORD", defaults::DEV_DB_PASSWORD)),
            name: var_or("DB_NAME", defaults::DEV_DB_NAME),
            sslmode: var_or("DB_SSLMODE", defaults::DEV_DB_SSLMODE),
            url_override: env::var("DATABASE_URL").ok().map(SecretString::from),
            max_connections: parse_var(
                "DB_MAX_CONNECTIONS",
                defaults::DEV_DB_MAX_CONNECTIONS,
                "DB_MAX_CONNECTIONS must be a valid number",
            )?,
            min_connections: parse_var(
                "DB_MIN_CONNECTIONS",
                defaults::DEV_DB_MIN_CONNECTIONS,
                "DB_MIN_CONNECTIONS must be a valid number",
            )?,
        };

        let transcode_concurrency = parse_var(
            "TRANSCODE_CONCURRENCY",
            defaults::TRANSCODE_CONCURRENCY,
            "TRANSCODE_CONCURRENCY must be a valid number",
        )?;
        if transcode_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "TRANSCODE_CONCURRENCY must be at least 1",
            ));
        }

        let media = MediaSettings {
            root: PathBuf::from(var_or("MEDIA_PATH", defaults::DEV_MEDIA_PATH)),
            max_video_size: parse_var(
                "MAX_VIDEO_UPLOAD_SIZE",
                defaults::MAX_VIDEO_UPLOAD_SIZE,
                "MAX_VIDEO_UPLOAD_SIZE must be a valid number",
            )?,
            max_field_size: parse_var(
                "MAX_FORM_FIELD_SIZE",
                defaults::MAX_FORM_FIELD_SIZE,
                "MAX_FORM_FIELD_SIZE must be a valid number",
            )?,
            transcode_concurrency,
            ffmpeg_path: PathBuf::from(var_or("FFMPEG_PATH", defaults::FFMPEG_PATH)),
        };

        let jwt_secret = SecretString::from(var_or("JWT_SECRET", defaults::DEV_JWT_SECRET));

        let cors_allowed_origins = parse_origins(&var_or(
            "CORS_ALLOWED_ORIGINS",
            defaults::DEV_CORS_ALLOWED_ORIGINS,
        ));

        let static_dir = env::var("STATIC_DIR").ok().map(PathBuf::from);

        let config = Config {
            environment,
            host,
            port,
            database,
            media,
            jwt_secret,
            cors_allowed_origins,
            static_dir,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database.url_override.is_none()
            && self.database.password.expose_secret() == defaults::DEV_DB_PASSWORD
        {
            errors.push(
                "DB_PASSWORD is using the development default. Set a production password or DATABASE_URL."
                    .to_string(),
            );
        }

        if self.jwt_secret.expose_secret() == defaults::DEV_JWT_SECRET {
            errors.push("JWT_SECRET is using the development default. Set a strong secret.".to_string());
        }

        if self.cors_allowed_origins.iter().any(|o| o == "*") {
            errors.push("CORS_ALLOWED_ORIGINS must list explicit origins in production.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
