use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub stripe: StripeConfig,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Mark the session cookie `Secure` (HTTPS-only deployments).
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Maximum age of a webhook signature timestamp before it is rejected.
    pub webhook_tolerance_secs: i64,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // Payment processor overrides
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            self.stripe.secret_key = v;
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_SECRET") {
            self.stripe.webhook_secret = v;
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_TOLERANCE_SECS") {
            self.stripe.webhook_tolerance_secs = v.parse().unwrap_or(self.stripe.webhook_tolerance_secs);
        }
        if let Ok(v) = env::var("STRIPE_API_BASE") {
            self.stripe.api_base = v;
        }

        // Image store overrides
        if let Ok(v) = env::var("CLOUDINARY_CLOUD_NAME") {
            self.cloudinary.cloud_name = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_UPLOAD_PRESET") {
            self.cloudinary.upload_preset = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_API_BASE") {
            self.cloudinary.api_base = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            security: SecurityConfig {
                // Overridden by JWT_SECRET in any real deployment
                jwt_secret: "homelet-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                secure_cookies: false,
            },
            stripe: StripeConfig {
                secret_key: String::new(),
                webhook_secret: String::new(),
                webhook_tolerance_secs: 300,
                api_base: "https://api.stripe.com".to_string(),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: String::new(),
                upload_preset: String::new(),
                api_base: "https://api.cloudinary.com".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connect_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                secure_cookies: true,
            },
            stripe: StripeConfig {
                secret_key: String::new(),
                webhook_secret: String::new(),
                webhook_tolerance_secs: 300,
                api_base: "https://api.stripe.com".to_string(),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: String::new(),
                upload_preset: String::new(),
                api_base: "https://api.cloudinary.com".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connect_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                secure_cookies: true,
            },
            stripe: StripeConfig {
                secret_key: String::new(),
                webhook_secret: String::new(),
                webhook_tolerance_secs: 300,
                api_base: "https://api.stripe.com".to_string(),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: String::new(),
                upload_preset: String::new(),
                api_base: "https://api.cloudinary.com".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert!(!config.security.secure_cookies);
        assert_eq!(config.stripe.webhook_tolerance_secs, 300);
    }

    #[test]
    fn production_requires_secrets_from_env() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.secure_cookies);
        assert_eq!(config.security.jwt_expiry_hours, 24);
    }
}
