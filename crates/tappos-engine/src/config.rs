//! # Engine Configuration
//!
//! Configuration for the settlement engine's execution modes.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAPPOS_SETTLEMENT_MODE=sequential                                  │
//! │     TAPPOS_STOCK_POLICY=strict                                         │
//! │     TAPPOS_TOTAL_CHECK=reconcile                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tappos/engine.toml (Linux)                               │
//! │     ~/Library/Application Support/com.tappos.backend/engine.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     atomic / trusting / as_given                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [settlement]
//! mode = "atomic"        # atomic | sequential
//! stock_policy = "trusting"  # trusting | strict
//! total_check = "as_given"   # as_given | reconcile
//! ```
//!
//! ## Why These Are Configuration, Not Fixes
//! The original kiosk trusts the client's quantities and total. Whether
//! that is a bug or a deliberate simplification is ambiguous, so both
//! behaviors are explicit modes with the original's as the default,
//! rather than a silent "correction".

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

// =============================================================================
// Settlement Mode
// =============================================================================

/// How the multi-record settlement protocol executes.
///
/// ## Mode Behavior
/// ```text
/// ATOMIC (default)
/// ────────────────
/// • One SQLite transaction wraps transaction insert, line items,
///   stock decrements and the wallet debit
/// • Any failure aborts and leaves zero trace
///
/// SEQUENTIAL (degraded)
/// ─────────────────────
/// • Each step executes independently against the pool
/// • A mid-sequence failure can orphan a transaction row with no
///   matching debit - logged with step and ids, surfaced as a
///   generic failure, never reported as success
/// • Models a store without multi-record atomicity; kept behind the
///   same interface so tests exercise both paths
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// All-or-nothing settlement inside one store transaction.
    #[default]
    Atomic,
    /// Best-effort sequential execution with a documented
    /// consistency gap.
    Sequential,
}

// =============================================================================
// Stock Policy
// =============================================================================

/// Whether per-line stock sufficiency is checked before decrementing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Quantity is trusted from the request; stock may go negative.
    /// Matches the original kiosk behavior.
    #[default]
    Trusting,
    /// Conditional decrement; a shortfall fails the checkout.
    Strict,
}

// =============================================================================
// Total Check
// =============================================================================

/// Whether the caller-supplied total is reconciled against line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalCheck {
    /// Compare the supplied total against the balance as given.
    #[default]
    AsGiven,
    /// Reject checkouts whose total disagrees with the line sum.
    Reconcile,
}

// =============================================================================
// Engine Config
// =============================================================================

/// Settlement engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub settlement_mode: SettlementMode,
    pub stock_policy: StockPolicy,
    pub total_check: TotalCheck,
}

/// On-disk layout of `engine.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    settlement: SettlementSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettlementSection {
    mode: SettlementMode,
    stock_policy: StockPolicy,
    total_check: TotalCheck,
}

impl EngineConfig {
    /// Loads configuration: defaults, then the TOML file if present,
    /// then environment overrides.
    pub fn load() -> Self {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Bad engine.toml, using defaults");
                EngineConfig::default()
            }),
            _ => EngineConfig::default(),
        };

        config.apply_env_overrides();
        info!(?config, "Engine configuration loaded");
        config
    }

    /// Platform config file location.
    fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tappos", "tappos")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    /// Parses a TOML config file.
    fn from_file(path: &PathBuf) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|e| e.to_string())?;
        debug!(path = %path.display(), "Loaded engine.toml");

        Ok(EngineConfig {
            settlement_mode: file.settlement.mode,
            stock_policy: file.settlement.stock_policy,
            total_check: file.settlement.total_check,
        })
    }

    /// Applies `TAPPOS_*` environment overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("TAPPOS_SETTLEMENT_MODE") {
            match mode.to_lowercase().as_str() {
                "atomic" => self.settlement_mode = SettlementMode::Atomic,
                "sequential" => self.settlement_mode = SettlementMode::Sequential,
                other => warn!(value = other, "Unknown TAPPOS_SETTLEMENT_MODE, ignoring"),
            }
        }
        if let Ok(policy) = std::env::var("TAPPOS_STOCK_POLICY") {
            match policy.to_lowercase().as_str() {
                "trusting" => self.stock_policy = StockPolicy::Trusting,
                "strict" => self.stock_policy = StockPolicy::Strict,
                other => warn!(value = other, "Unknown TAPPOS_STOCK_POLICY, ignoring"),
            }
        }
        if let Ok(check) = std::env::var("TAPPOS_TOTAL_CHECK") {
            match check.to_lowercase().as_str() {
                "as_given" => self.total_check = TotalCheck::AsGiven,
                "reconcile" => self.total_check = TotalCheck::Reconcile,
                other => warn!(value = other, "Unknown TAPPOS_TOTAL_CHECK, ignoring"),
            }
        }
    }

    /// Builder-style override, mostly for tests.
    pub fn settlement_mode(mut self, mode: SettlementMode) -> Self {
        self.settlement_mode = mode;
        self
    }

    /// Builder-style override, mostly for tests.
    pub fn stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    /// Builder-style override, mostly for tests.
    pub fn total_check(mut self, check: TotalCheck) -> Self {
        self.total_check = check;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_behavior() {
        let config = EngineConfig::default();
        assert_eq!(config.settlement_mode, SettlementMode::Atomic);
        assert_eq!(config.stock_policy, StockPolicy::Trusting);
        assert_eq!(config.total_check, TotalCheck::AsGiven);
    }

    #[test]
    fn test_toml_round_trip() {
        let raw = r#"
            [settlement]
            mode = "sequential"
            stock_policy = "strict"
            total_check = "reconcile"
        "#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(file.settlement.mode, SettlementMode::Sequential);
        assert_eq!(file.settlement.stock_policy, StockPolicy::Strict);
        assert_eq!(file.settlement.total_check, TotalCheck::Reconcile);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            [settlement]
            mode = "sequential"
        "#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(file.settlement.mode, SettlementMode::Sequential);
        assert_eq!(file.settlement.stock_policy, StockPolicy::Trusting);
    }

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::default()
            .settlement_mode(SettlementMode::Sequential)
            .stock_policy(StockPolicy::Strict);
        assert_eq!(config.settlement_mode, SettlementMode::Sequential);
        assert_eq!(config.stock_policy, StockPolicy::Strict);
        assert_eq!(config.total_check, TotalCheck::AsGiven);
    }
}
