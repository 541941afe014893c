//! SMART attribute parsing and the per-attribute/per-disk health engine.
//!
//! The evaluation order in `assess_attribute` is authoritative over
//! `original_source/src/smart_parser.c`'s older three-tier PASSED/WARNING/
//! CRITICAL scheme — see DESIGN.md.

use crate::models::{
    AttributeStatus, DiskStatus, ParsedAttribute, RawSmartAttribute, SmartThresholdsPage, SmartValuesPage,
    ThresholdConfig,
};

const UNKNOWN_ATTRIBUTE_NAME: &str = "Unknown_Attribute";
const POWER_ON_HOURS_ID: u8 = 0x09;

const TEMPERATURE_IDS: [u8; 3] = [0xC2, 0xBE, 0xE7];
const CRITICAL_RAW_GT_ZERO_IDS: [u8; 5] = [0x05, 0xC5, 0xC6, 0xBB, 0xB8];
const SPIN_RETRY_ID: u8 = 0x0A;
const REALLOCATION_EVENT_ID: u8 = 0xC4;

/// (id, human name, critical flag), grounded on
/// `original_source/src/smart_attributes.c`.
const ATTRIBUTE_TABLE: &[(u8, &str, bool)] = &[
    (0x01, "Read_Error_Rate", false),
    (0x02, "Throughput_Performance", false),
    (0x03, "Spin_Up_Time", false),
    (0x04, "Start_Stop_Count", false),
    (0x05, "Reallocated_Sector_Ct", true),
    (0x07, "Seek_Error_Rate", false),
    (0x08, "Seek_Time_Performance", false),
    (0x09, "Power_On_Hours", false),
    (0x0A, "Spin_Retry_Count", true),
    (0x0B, "Recalibration_Retries", false),
    (0x0C, "Power_Cycle_Count", false),
    (0x0D, "Soft_Read_Error_Rate", false),
    (0xAA, "Available_Reserved_Space", false),
    (0xAB, "SSD_Program_Fail_Count", true),
    (0xAC, "SSD_Erase_Fail_Count", true),
    (0xAD, "SSD_Wear_Leveling_Count", false),
    (0xAE, "Unexpected_Power_Loss", false),
    (0xB7, "SATA_Downshift_Count", false),
    (0xB8, "End_to_End_Error", true),
    (0xBB, "Reported_Uncorrect", true),
    (0xBC, "Command_Timeout", false),
    (0xBD, "High_Fly_Writes", true),
    (0xBE, "Airflow_Temperature", false),
    (0xBF, "G-Sense_Error_Rate", false),
    (0xC0, "Power-Off_Retract_Count", false),
    (0xC1, "Load_Cycle_Count", false),
    (0xC2, "Temperature_Celsius", false),
    (0xC3, "Hardware_ECC_Recovered", false),
    (0xC4, "Reallocation_Event_Count", true),
    (0xC5, "Current_Pending_Sector", true),
    (0xC6, "Offline_Uncorrectable", true),
    (0xC7, "UltraDMA_CRC_Error_Count", false),
    (0xC8, "Write_Error_Rate", false),
    (0xC9, "Soft_Read_Error_Rate", false),
    (0xCA, "Data_Address_Mark_Error", false),
    (0xCB, "Run_Out_Cancel", false),
    (0xCC, "Soft_ECC_Correction", false),
    (0xCD, "Thermal_Asperity_Rate", false),
    (0xCE, "Flying_Height", false),
    (0xCF, "Spin_High_Current", false),
    (0xD0, "Spin_Buzz", false),
    (0xD1, "Offline_Seek_Performance", false),
    (0xDC, "Disk_Shift", false),
    (0xDD, "G-Sense_Error_Rate_2", false),
    (0xDE, "Loaded_Hours", false),
    (0xDF, "Load_Retry_Count", false),
    (0xE0, "Load_Friction", false),
    (0xE1, "Load_Cycle_Count_2", false),
    (0xE2, "Load_In_Time", false),
    (0xE3, "Torque_Amplification", false),
    (0xE4, "Power-Off_Retract_Cycle", false),
    (0xE6, "GMR_Head_Amplitude", false),
    (0xE7, "Temperature_Celsius_2", false),
    (0xE8, "Endurance_Remaining", false),
    (0xE9, "Power_On_Hours_2", false),
    (0xEA, "Average_Erase_Count", false),
    (0xEB, "Good_Block_Count", false),
    (0xF0, "Head_Flying_Hours", false),
    (0xF1, "Total_LBAs_Written", false),
    (0xF2, "Total_LBAs_Read", false),
    (0xFA, "Read_Error_Retry_Rate", false),
    (0xFE, "Free_Fall_Protection", false),
];

fn lookup_attribute(id: u8) -> (&'static str, bool) {
    ATTRIBUTE_TABLE
        .iter()
        .find(|(attr_id, _, _)| *attr_id == id)
        .map(|(_, name, critical)| (*name, *critical))
        .unwrap_or((UNKNOWN_ATTRIBUTE_NAME, false))
}

fn raw_value_u64(raw: &[u8; 6]) -> u64 {
    let mut value: u64 = 0;
    for (i, byte) in raw.iter().enumerate() {
        value |= (*byte as u64) << (i * 8);
    }
    value
}

/// Applies §4.6's seven-rule ordered list to one attribute. First matching
/// rule wins.
fn assess_with_threshold(
    id: u8,
    current: u8,
    threshold: u8,
    raw: u64,
    critical: bool,
    config: &ThresholdConfig,
) -> AttributeStatus {
    // 1. per-id raw cutoff from the threshold configuration.
    if let Some(cutoff) = config.raw_cutoff(id) {
        return if raw > cutoff {
            AttributeStatus::Failed
        } else {
            AttributeStatus::Passed
        };
    }

    // 2. temperature ids: configured or default 60 degC cutoff.
    if TEMPERATURE_IDS.contains(&id) {
        let celsius = (raw & 0xFF) as u8;
        let cutoff = config.temperature_cutoff();
        return if celsius >= cutoff {
            AttributeStatus::Failed
        } else {
            AttributeStatus::Passed
        };
    }

    // 3. critical attributes where any nonzero raw value is fatal.
    if critical && CRITICAL_RAW_GT_ZERO_IDS.contains(&id) && raw > 0 {
        return AttributeStatus::Failed;
    }

    // 4. spin retry count.
    if id == SPIN_RETRY_ID && raw > 0 {
        return AttributeStatus::Failed;
    }

    // 5. reallocation event count.
    if id == REALLOCATION_EVENT_ID && raw > 0 {
        return AttributeStatus::Failed;
    }

    // 6. manufacturer threshold comparison, if enabled.
    if config.use_manufacturer_thresholds && threshold > 0 && current <= threshold {
        return AttributeStatus::Failed;
    }

    // 7. otherwise passed.
    AttributeStatus::Passed
}

fn decode_raw(id: u8, raw: &[u8; 6]) -> u64 {
    let value = raw_value_u64(raw);
    if id == POWER_ON_HOURS_ID {
        value & 0xFFFF_FFFF
    } else {
        value
    }
}

fn to_parsed(entry: &RawSmartAttribute, threshold: u8, config: &ThresholdConfig) -> ParsedAttribute {
    let (name, critical) = lookup_attribute(entry.id);
    let raw = decode_raw(entry.id, &entry.raw);
    let status = assess_with_threshold(entry.id, entry.current, threshold, raw, critical, config);

    ParsedAttribute {
        id: entry.id,
        name,
        current: entry.current,
        worst: entry.worst,
        threshold,
        raw,
        critical,
        status,
    }
}

/// Joins a values page with its thresholds page and applies the health
/// rules to every populated attribute slot.
pub fn parse_and_assess(
    values: &SmartValuesPage,
    thresholds: &SmartThresholdsPage,
    config: &ThresholdConfig,
) -> Vec<ParsedAttribute> {
    values
        .attributes
        .iter()
        .map(|entry| {
            let threshold = thresholds.threshold_for(entry.id);
            to_parsed(entry, threshold, config)
        })
        .collect()
}

/// Per-disk verdict: failed if any attribute failed, otherwise passed.
pub fn overall_status(attributes: &[ParsedAttribute]) -> DiskStatus {
    if attributes.iter().any(|a| a.status == AttributeStatus::Failed) {
        DiskStatus::Failed
    } else {
        DiskStatus::Passed
    }
}
