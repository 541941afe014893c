#![allow(dead_code)]

use serde::{Deserialize, Serialize};

// ============================================================
// Frame-level types (§3 Frame, §3 Probe payload)
// ============================================================

/// Magic tag written to word 0 of a mailbox frame.
pub const MAGIC_WAKEUP: u32 = 0x197B_0325;
pub const MAGIC_COMMAND: u32 = 0x197B_0322;

/// A slot index addressed by the bridge (0..4).
pub type Slot = u8;

pub const MAX_SLOTS: usize = 5;

// ============================================================
// IDENTIFY result (§3 IDENTIFY result)
// ============================================================

#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResult {
    pub model: String,
    pub serial: String,
    pub firmware: String,
    /// Size in megabytes, `None` when the sector count fails the sanity check.
    pub size_mb: Option<u64>,
    /// Byte 0x1F0 of the decoded response: the disk-presence bitmask.
    pub presence_bitmask: u8,
}

// ============================================================
// Raw SMART pages (§3 SMART attribute entry) — packed 12-byte records as
// they arrive on the wire, before the health engine joins and assesses them.
// ============================================================

pub const MAX_SMART_ATTRIBUTES: usize = 30;

#[derive(Debug, Clone, Copy)]
pub struct RawSmartAttribute {
    pub id: u8,
    pub flags: u16,
    pub current: u8,
    pub worst: u8,
    pub raw: [u8; 6],
    pub reserved: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct RawSmartThreshold {
    pub id: u8,
    pub threshold: u8,
}

#[derive(Debug, Clone)]
pub struct SmartValuesPage {
    pub revision: u16,
    pub attributes: Vec<RawSmartAttribute>,
}

#[derive(Debug, Clone)]
pub struct SmartThresholdsPage {
    pub revision: u16,
    pub thresholds: Vec<RawSmartThreshold>,
}

impl SmartThresholdsPage {
    /// An all-zero thresholds page, substituted when the thresholds probe
    /// fails so the health engine can still run with default rules only.
    pub fn empty() -> Self {
        SmartThresholdsPage {
            revision: 0,
            thresholds: Vec::new(),
        }
    }

    pub fn threshold_for(&self, id: u8) -> u8 {
        self.thresholds
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.threshold)
            .unwrap_or(0)
    }
}

// ============================================================
// SMART attribute model (§3 SMART attribute entry, Parsed attribute)
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeStatus {
    Passed,
    Failed,
    Unknown,
}

/// A single SMART attribute joined with its threshold and health verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedAttribute {
    pub id: u8,
    pub name: &'static str,
    pub current: u8,
    pub worst: u8,
    pub threshold: u8,
    pub raw: u64,
    pub critical: bool,
    pub status: AttributeStatus,
}

// ============================================================
// Disk record & array snapshot (§3 Disk record, Array snapshot)
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskStatus {
    Passed,
    Failed,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskRecord {
    pub slot: Slot,
    pub present: bool,
    pub model: String,
    pub serial: String,
    pub firmware: String,
    pub size_mb: Option<u64>,
    pub overall_status: DiskStatus,
    pub attributes: Vec<ParsedAttribute>,
}

impl DiskRecord {
    /// An empty record for a slot that has not yet been probed (or is absent).
    pub fn empty(slot: Slot) -> Self {
        DiskRecord {
            slot,
            present: false,
            model: String::new(),
            serial: String::new(),
            firmware: String::new(),
            size_mb: None,
            overall_status: DiskStatus::Error,
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArraySnapshot {
    pub disks: Vec<DiskRecord>,
    /// Byte 0x1F0 latched from the first response that carried it.
    pub bitmask: u8,
    /// Popcount of the low 8 bits of `bitmask`.
    pub present_disks: u32,
    /// Operator-declared expected disk count, if any (1..=5).
    pub expected_disks: Option<u32>,
    pub degraded: bool,
    pub oversized: bool,
    /// Overall verdict across the whole sweep (§4.7 Final array verdict).
    pub array_status: DiskStatus,
}

// ============================================================
// Threshold configuration (§3 Threshold configuration, §6)
// ============================================================

/// Per-attribute raw-value cutoff, keyed by SMART attribute id.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AttributeThreshold {
    #[serde(default)]
    pub raw_critical: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemperatureConfig {
    pub critical: Option<u8>,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        TemperatureConfig { critical: None }
    }
}

/// Matches `original_source/src/config.c`'s on-disk schema:
/// `use_manufacturer_thresholds`, `temperature.critical`,
/// `attributes.<hex-id>.raw_critical`. Loaded by an external config loader
/// (out of scope); this crate only defines and consumes the schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub use_manufacturer_thresholds: bool,
    pub temperature: TemperatureConfig,
    pub attributes: std::collections::HashMap<String, AttributeThreshold>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            use_manufacturer_thresholds: true,
            temperature: TemperatureConfig::default(),
            attributes: std::collections::HashMap::new(),
        }
    }
}

impl ThresholdConfig {
    /// Looks up a per-attribute raw-value cutoff by SMART id.
    ///
    /// Config keys are hex strings like `"0x05"` or `"0XC5"` per §6.
    pub fn raw_cutoff(&self, id: u8) -> Option<u64> {
        for (key, threshold) in &self.attributes {
            if let Some(parsed) = parse_hex_id(key) {
                if parsed == id {
                    return threshold.raw_critical;
                }
            }
        }
        None
    }

    pub fn temperature_cutoff(&self) -> u8 {
        self.temperature.critical.unwrap_or(60)
    }
}

fn parse_hex_id(key: &str) -> Option<u8> {
    let trimmed = key.trim();
    let hex_digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u8::from_str_radix(hex_digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_custom_cutoffs() {
        let config = ThresholdConfig::default();
        assert!(config.use_manufacturer_thresholds);
        assert_eq!(config.temperature_cutoff(), 60);
        assert_eq!(config.raw_cutoff(0x05), None);
    }

    #[test]
    fn hex_id_parsing_accepts_common_forms() {
        assert_eq!(parse_hex_id("0x05"), Some(0x05));
        assert_eq!(parse_hex_id("0XC5"), Some(0xC5));
        assert_eq!(parse_hex_id("c6"), Some(0xC6));
        assert_eq!(parse_hex_id("zz"), None);
    }
}
