//! # Redemption Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEALTICKET_QR_EXPIRY_MINUTES=10                                    │
//! │     MEALTICKET_STORE_TIMEOUT_SECS=30                                   │
//! │                                                                         │
//! │  2. TOML Config File (optional)                                        │
//! │     ./mealticket.toml                                                  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # mealticket.toml
//! qr_expiry_minutes = 15
//! coupon_value_cents = 4500
//! default_monthly_allocation = 26
//! store_timeout_secs = 100
//! database_path = "./mealticket.db"
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use mealticket_core::{
    Money, DEFAULT_COUPON_VALUE_CENTS, DEFAULT_MONTHLY_ALLOCATION, DEFAULT_QR_EXPIRY_MINUTES,
};

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 100;

/// Longest QR code lifetime accepted: one day.
pub const MAX_QR_EXPIRY_MINUTES: i64 = 24 * 60;

/// Knobs consumed by the redemption services.
///
/// Coupon-per-transaction bounds are not configurable; see
/// [`mealticket_core::MIN_COUPONS_PER_TRANSACTION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionConfig {
    /// Lifetime of an issued QR code, in minutes.
    pub qr_expiry_minutes: i64,

    /// Face value of one coupon, in cents.
    pub coupon_value_cents: i64,

    /// Coupons granted per month to new employees.
    pub default_monthly_allocation: i64,

    /// Deadline applied to every store call, in seconds.
    pub store_timeout_secs: u64,

    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        RedemptionConfig {
            qr_expiry_minutes: DEFAULT_QR_EXPIRY_MINUTES,
            coupon_value_cents: DEFAULT_COUPON_VALUE_CENTS,
            default_monthly_allocation: DEFAULT_MONTHLY_ALLOCATION,
            store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            database_path: PathBuf::from("./mealticket.db"),
        }
    }
}

impl RedemptionConfig {
    /// Loads defaults, then `mealticket.toml` if present, then `MEALTICKET_*`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("mealticket")
    }

    /// Same as [`RedemptionConfig::load`] with an explicit file stem.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = RedemptionConfig::default();

        let settings = Config::builder()
            .set_default("qr_expiry_minutes", defaults.qr_expiry_minutes)?
            .set_default("coupon_value_cents", defaults.coupon_value_cents)?
            .set_default("default_monthly_allocation", defaults.default_monthly_allocation)?
            .set_default("store_timeout_secs", defaults.store_timeout_secs)?
            .set_default(
                "database_path",
                defaults.database_path.to_string_lossy().into_owned(),
            )?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("MEALTICKET").try_parsing(true))
            .build()?;

        let config: RedemptionConfig = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            qr_expiry_minutes = config.qr_expiry_minutes,
            coupon_value_cents = config.coupon_value_cents,
            store_timeout_secs = config.store_timeout_secs,
            "Redemption configuration loaded"
        );

        Ok(config)
    }

    /// Rejects values no deployment should run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qr_expiry_minutes <= 0 {
            return Err(ConfigError::Message(
                "qr_expiry_minutes must be positive".to_string(),
            ));
        }
        if self.qr_expiry_minutes > MAX_QR_EXPIRY_MINUTES {
            return Err(ConfigError::Message(format!(
                "qr_expiry_minutes cannot exceed {MAX_QR_EXPIRY_MINUTES}"
            )));
        }
        if self.coupon_value_cents < 0 {
            return Err(ConfigError::Message(
                "coupon_value_cents cannot be negative".to_string(),
            ));
        }
        if self.default_monthly_allocation < 0 {
            return Err(ConfigError::Message(
                "default_monthly_allocation cannot be negative".to_string(),
            ));
        }
        if self.store_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "store_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Builder-style override of the store deadline.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_qr_expiry_minutes(mut self, minutes: i64) -> Self {
        self.qr_expiry_minutes = minutes;
        self
    }

    #[inline]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// QR code lifetime, or `None` when the configured minutes do not fit
    /// in a [`chrono::Duration`].
    #[inline]
    pub fn qr_expiry(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_minutes(self.qr_expiry_minutes)
    }

    #[inline]
    pub fn coupon_value(&self) -> Money {
        Money::from_cents(self.coupon_value_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedemptionConfig::default();
        assert_eq!(config.qr_expiry_minutes, 15);
        assert_eq!(config.coupon_value().to_string(), "45.00");
        assert_eq!(config.default_monthly_allocation, 26);
        assert_eq!(config.store_timeout(), Duration::from_secs(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = RedemptionConfig::load_from("definitely-not-a-config-file").unwrap();
        assert_eq!(config.qr_expiry_minutes, RedemptionConfig::default().qr_expiry_minutes);
        assert_eq!(config.coupon_value_cents, 4_500);
    }

    #[test]
    fn test_validate_rejects_zero_expiry() {
        let config = RedemptionConfig::default().with_qr_expiry_minutes(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_expiry() {
        let day = RedemptionConfig::default().with_qr_expiry_minutes(MAX_QR_EXPIRY_MINUTES);
        assert!(day.validate().is_ok());
        assert_eq!(day.qr_expiry(), Some(chrono::Duration::hours(24)));

        let huge = RedemptionConfig::default().with_qr_expiry_minutes(i64::MAX / 2);
        assert!(huge.validate().is_err());
        assert_eq!(huge.qr_expiry(), None);
    }
}
