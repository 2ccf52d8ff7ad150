use driveconnect_common::{DatabaseConfig, JwtConfig, ServerConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub policy: BookingPolicy,
}

/// Business constants for the booking engines. Named and injected rather
/// than inlined, so the state machine can be exercised with varied values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// Platform share of each booking amount.
    pub commission_rate: f64,
    /// Minimum advertised hourly rate, in XPF.
    pub min_hourly_rate: i64,
    /// Cancelling at least this many hours ahead refunds 100%.
    pub full_refund_hours: f64,
    /// Cancelling at least this many hours ahead refunds 50%.
    pub half_refund_hours: f64,
    /// A refund at or above this percentage puts the slot back on sale.
    pub slot_release_refund_pct: u32,
    /// Length of the visibility penalty window, in days.
    pub penalty_days: i64,
    /// Points subtracted from the ranking score while the penalty is active.
    pub penalty_points: i32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            commission_rate: 0.02,
            min_hourly_rate: 1000,
            full_refund_hours: 48.0,
            half_refund_hours: 24.0,
            slot_release_refund_pct: 50,
            penalty_days: 7,
            penalty_points: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let policy_defaults = BookingPolicy::default();

        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
            },
            database: DatabaseConfig {
                host: std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: std::env::var("DATABASE_PORT")
                    .unwrap_or_else(|_| "5432".to_string())
                    .parse()
                    .unwrap_or(5432),
                username: std::env::var("DATABASE_USERNAME")
                    .unwrap_or_else(|_| "driveconnect_user".to_string()),
                password: std::env::var("DATABASE_PASSWORD")
                    .unwrap_or_else(|_| "driveconnect_password".to_string()),
                database: std::env::var("DATABASE_NAME")
                    .unwrap_or_else(|_| "driveconnect".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            jwt: JwtConfig {
                secret: std::env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
                expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "168".to_string())
                    .parse()
                    .unwrap_or(168),
                issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "driveconnect".to_string()),
            },
            policy: BookingPolicy {
                commission_rate: std::env::var("COMMISSION_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy_defaults.commission_rate),
                min_hourly_rate: std::env::var("MIN_HOURLY_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy_defaults.min_hourly_rate),
                penalty_days: std::env::var("PENALTY_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy_defaults.penalty_days),
                penalty_points: std::env::var("PENALTY_POINTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy_defaults.penalty_points),
                ..policy_defaults
            },
        }
    }
}
