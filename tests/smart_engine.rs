use std::collections::HashMap;

use jmraid_status::models::{
    AttributeStatus, DiskStatus, RawSmartAttribute, RawSmartThreshold, SmartThresholdsPage, SmartValuesPage,
    ThresholdConfig,
};
use jmraid_status::smart;

fn attribute(id: u8, current: u8, raw: [u8; 6]) -> RawSmartAttribute {
    RawSmartAttribute {
        id,
        flags: 0,
        current,
        worst: current,
        raw,
        reserved: 0,
    }
}

#[test]
fn reallocated_sectors_above_zero_fails_the_disk() {
    // Scenario 4: SMART values page has id 0x05 with raw u48 == 17.
    let values = SmartValuesPage {
        revision: 1,
        attributes: vec![attribute(0x05, 100, [17, 0, 0, 0, 0, 0])],
    };
    let thresholds = SmartThresholdsPage::empty();
    let config = ThresholdConfig::default();

    let parsed = smart::parse_and_assess(&values, &thresholds, &config);
    assert_eq!(parsed[0].status, AttributeStatus::Failed);
    assert_eq!(smart::overall_status(&parsed), DiskStatus::Failed);
}

#[test]
fn temperature_cutoff_scenarios() {
    // Scenario 5: id 0xC2, raw low byte = 60, default configuration -> failed.
    let values_at_60 = SmartValuesPage {
        revision: 1,
        attributes: vec![attribute(0xC2, 100, [60, 0, 0, 0, 0, 0])],
    };
    let thresholds = SmartThresholdsPage::empty();
    let default_config = ThresholdConfig::default();
    let parsed = smart::parse_and_assess(&values_at_60, &thresholds, &default_config);
    assert_eq!(parsed[0].status, AttributeStatus::Failed);

    // With configuration temperature.critical = 65: raw 60 passes, raw 64
    // passes, and the cutoff of 65 is what actually fails.
    let mut custom_config = ThresholdConfig::default();
    custom_config.temperature.critical = Some(65);

    let parsed_60 = smart::parse_and_assess(&values_at_60, &thresholds, &custom_config);
    assert_eq!(parsed_60[0].status, AttributeStatus::Passed);

    let values_at_64 = SmartValuesPage {
        revision: 1,
        attributes: vec![attribute(0xC2, 100, [64, 0, 0, 0, 0, 0])],
    };
    let parsed_64 = smart::parse_and_assess(&values_at_64, &thresholds, &custom_config);
    assert_eq!(parsed_64[0].status, AttributeStatus::Passed);

    let values_at_65 = SmartValuesPage {
        revision: 1,
        attributes: vec![attribute(0xC2, 100, [65, 0, 0, 0, 0, 0])],
    };
    let parsed_65 = smart::parse_and_assess(&values_at_65, &thresholds, &custom_config);
    assert_eq!(parsed_65[0].status, AttributeStatus::Failed);
}

#[test]
fn healthy_attributes_with_no_threshold_breach_pass() {
    let values = SmartValuesPage {
        revision: 1,
        attributes: vec![
            attribute(0x01, 100, [0, 0, 0, 0, 0, 0]),
            attribute(0x09, 200, [0x10, 0x27, 0, 0, 0, 0]),
        ],
    };
    let thresholds = SmartThresholdsPage {
        revision: 1,
        thresholds: vec![
            RawSmartThreshold { id: 0x01, threshold: 6 },
            RawSmartThreshold { id: 0x09, threshold: 0 },
        ],
    };
    let config = ThresholdConfig::default();
    let parsed = smart::parse_and_assess(&values, &thresholds, &config);
    assert!(parsed.iter().all(|a| a.status == AttributeStatus::Passed));
    assert_eq!(smart::overall_status(&parsed), DiskStatus::Passed);
}

#[test]
fn per_id_configured_raw_cutoff_takes_priority_over_default_rules() {
    let mut attributes_map = HashMap::new();
    attributes_map.insert(
        "0x05".to_string(),
        jmraid_status::models::AttributeThreshold {
            raw_critical: Some(100),
        },
    );
    let config = ThresholdConfig {
        use_manufacturer_thresholds: true,
        temperature: Default::default(),
        attributes: attributes_map,
    };

    let values = SmartValuesPage {
        revision: 1,
        attributes: vec![attribute(0x05, 100, [17, 0, 0, 0, 0, 0])],
    };
    let thresholds = SmartThresholdsPage::empty();
    let parsed = smart::parse_and_assess(&values, &thresholds, &config);
    // Raw 17 is below the configured cutoff of 100, so this passes even
    // though 0x05 is a critical attribute that would otherwise fail on any
    // nonzero raw value.
    assert_eq!(parsed[0].status, AttributeStatus::Passed);
}

#[test]
fn array_verdict_monotonicity_any_failed_disk_fails_the_array() {
    let passing = vec![attribute(0x01, 100, [0, 0, 0, 0, 0, 0])];
    let failing = vec![attribute(0x05, 100, [1, 0, 0, 0, 0, 0])];

    let thresholds = SmartThresholdsPage::empty();
    let config = ThresholdConfig::default();

    let passing_parsed = smart::parse_and_assess(
        &SmartValuesPage {
            revision: 1,
            attributes: passing,
        },
        &thresholds,
        &config,
    );
    let failing_parsed = smart::parse_and_assess(
        &SmartValuesPage {
            revision: 1,
            attributes: failing,
        },
        &thresholds,
        &config,
    );

    assert_eq!(smart::overall_status(&passing_parsed), DiskStatus::Passed);
    assert_eq!(smart::overall_status(&failing_parsed), DiskStatus::Failed);
}
