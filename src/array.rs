//! Array coordinator: sweeps all five bridge slots, latches the disk
//! presence bitmask, and derives a degraded/oversized/failed verdict.

use tracing::{info, warn};

use crate::command::{self, IdentifyOutcome};
use crate::error::Result;
use crate::mailbox::Session;
use crate::models::{ArraySnapshot, DiskRecord, DiskStatus, ThresholdConfig, MAX_SLOTS};
use crate::smart;

/// Runs IDENTIFY -> SMART values -> SMART thresholds -> assess for every
/// slot 0..4 and folds the results into an `ArraySnapshot`.
pub struct ArrayCoordinator<'a> {
    session: &'a mut Session,
    config: ThresholdConfig,
}

impl<'a> ArrayCoordinator<'a> {
    pub fn new(session: &'a mut Session, config: ThresholdConfig) -> Self {
        ArrayCoordinator { session, config }
    }

    /// Probes a single slot without running the full sweep (the `--disk N`
    /// mode added in SPEC_FULL.md §3).
    pub fn probe_one(&mut self, slot: u8) -> Result<DiskRecord> {
        let mut latched_bitmask = None;
        Ok(self.sweep_slot(slot, &mut latched_bitmask))
    }

    /// Sweeps slots 0..4 in order per §4.7, returning the full array
    /// snapshot. `expected_disks`, when set, drives the degraded/oversized
    /// comparison.
    pub fn sweep(&mut self, expected_disks: Option<u32>) -> ArraySnapshot {
        let mut disks = Vec::with_capacity(MAX_SLOTS);
        let mut latched_bitmask: Option<u8> = None;

        for slot in 0..MAX_SLOTS as u8 {
            let record = self.sweep_slot(slot, &mut latched_bitmask);
            disks.push(record);
        }

        let bitmask = latched_bitmask.unwrap_or(0);
        let any_failed = disks.iter().any(|d| d.overall_status == DiskStatus::Failed);
        let (present_disks, degraded, oversized, array_status) = derive_verdict(bitmask, expected_disks, any_failed);

        if degraded {
            warn!(?expected_disks, present_disks, bitmask, "degraded array detected");
        } else if oversized {
            warn!(?expected_disks, present_disks, bitmask, "array has more disks than expected");
        }

        ArraySnapshot {
            disks,
            bitmask,
            present_disks,
            expected_disks,
            degraded,
            oversized,
            array_status,
        }
    }

    fn sweep_slot(&mut self, slot: u8, latched_bitmask: &mut Option<u8>) -> DiskRecord {
        let identify_result = command::identify(self.session, slot);

        let (bitmask_byte, outcome) = match identify_result {
            Ok(pair) => pair,
            Err(e) => {
                warn!(slot, error = %e, "identify failed for slot");
                return DiskRecord::empty(slot);
            }
        };

        if latched_bitmask.is_none() {
            *latched_bitmask = Some(bitmask_byte);
        }

        let identify = match outcome {
            IdentifyOutcome::Empty => {
                info!(slot, "slot empty");
                return DiskRecord::empty(slot);
            }
            IdentifyOutcome::Present(result) => result,
        };

        let mut record = DiskRecord {
            slot,
            present: true,
            model: identify.model,
            serial: identify.serial,
            firmware: identify.firmware,
            size_mb: identify.size_mb,
            overall_status: DiskStatus::Error,
            attributes: Vec::new(),
        };

        let values = match command::smart_read_values(self.session, slot) {
            Ok(v) => v,
            Err(e) => {
                warn!(slot, error = %e, "SMART read values failed");
                return record;
            }
        };

        let thresholds = match command::smart_read_thresholds(self.session, slot) {
            Ok(t) => t,
            Err(e) => {
                warn!(slot, error = %e, "SMART read thresholds failed, using all-zero defaults");
                crate::models::SmartThresholdsPage::empty()
            }
        };

        let attributes = smart::parse_and_assess(&values, &thresholds, &self.config);
        record.overall_status = smart::overall_status(&attributes);
        record.attributes = attributes;
        record
    }
}

/// Pure derivation of present-disk count, degraded/oversized flags, and the
/// final array verdict from a latched bitmask, per §4.7. Split out of
/// `sweep` so it is testable without a live mailbox session.
fn derive_verdict(bitmask: u8, expected_disks: Option<u32>, any_disk_failed: bool) -> (u32, bool, bool, DiskStatus) {
    let present_disks = (bitmask as u32).count_ones();

    let mut degraded = false;
    let mut oversized = false;
    if let Some(expected) = expected_disks {
        if present_disks < expected {
            degraded = true;
        } else if present_disks > expected {
            oversized = true;
        }
    }

    let array_status = if any_disk_failed || degraded {
        DiskStatus::Failed
    } else {
        DiskStatus::Passed
    };

    (present_disks, degraded, oversized, array_status)
}
