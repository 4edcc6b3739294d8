use std::env;
use std::str::FromStr;

use crate::services::auth_service::AuthSettings;
use crate::services::notifier::EmailSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub min_password_length: usize,
    pub notification_queue_capacity: usize,
    pub auth: AuthSettings,
    pub email: EmailSettings,
}

fn text(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

fn at_least<T: PartialOrd + std::fmt::Display>(
    key: &'static str,
    value: T,
    min: T,
) -> Result<T, ConfigError> {
    if value < min {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be at least {}", min),
        });
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = text("JWT_SECRET", "change-me");
        if secret == "change-me" {
            log::warn!("⚠️  JWT_SECRET not set, using the development default");
        }

        let allowed_origins = text("ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Config {
            host: text("HOST", "0.0.0.0"),
            port: number("PORT", 8080)?,
            log_level: text("LOG_LEVEL", "info"),
            database_url: text("DATABASE_URL", "mongodb://localhost:27017/introhub"),
            allowed_origins,
            min_password_length: at_least(
                "MIN_PASSWORD_LENGTH",
                number("MIN_PASSWORD_LENGTH", 6)?,
                1,
            )?,
            notification_queue_capacity: at_least(
                "NOTIFICATION_QUEUE_CAPACITY",
                number("NOTIFICATION_QUEUE_CAPACITY", 256)?,
                1,
            )?,
            auth: AuthSettings {
                secret,
                expiry_hours: at_least("JWT_EXPIRY_HOURS", number("JWT_EXPIRY_HOURS", 24)?, 1)?,
                issuer: text("JWT_ISSUER", "intro-hub"),
                audience: text("JWT_AUDIENCE", "intro-hub-api"),
                bcrypt_cost: at_least("BCRYPT_COST", number("BCRYPT_COST", 10)?, 4)?,
            },
            email: EmailSettings {
                api_url: text("EMAIL_API_URL", "https://api.resend.com/emails"),
                api_key: env::var("EMAIL_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                from: text("EMAIL_FROM", "noreply@introhub.com"),
                from_name: text("EMAIL_FROM_NAME", "Intro-Hub"),
                app_base_url: text("APP_BASE_URL", "http://localhost:3000"),
            },
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test touches its own variable so they can run in parallel.

    #[test]
    fn test_number_falls_back_to_default() {
        env::remove_var("INTRO_HUB_TEST_UNSET");
        assert_eq!(number("INTRO_HUB_TEST_UNSET", 42u16).unwrap(), 42);
    }

    #[test]
    fn test_number_rejects_garbage() {
        env::set_var("INTRO_HUB_TEST_PORT", "eighty");
        let err = number::<u16>("INTRO_HUB_TEST_PORT", 8080).unwrap_err();
        assert!(err.to_string().starts_with("invalid value for INTRO_HUB_TEST_PORT"));
    }

    #[test]
    fn test_at_least() {
        assert_eq!(at_least("X", 5usize, 1).unwrap(), 5);
        assert!(at_least("X", 0usize, 1).is_err());
    }
}
