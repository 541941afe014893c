//! Controller identification interface.
//!
//! Real USB/PCI enumeration is an external collaborator (out of scope, per
//! spec §1); this module only defines the narrow trait the binary calls and
//! a default implementation that always defers, matching `--force`.

/// What the binary knows (or doesn't) about the bridge controller before
/// opening the mailbox.
#[derive(Debug, Clone)]
pub struct ControllerInfo {
    pub found: bool,
    pub description: String,
}

pub trait ControllerIdentity {
    fn identify(&self, device_path: &str) -> ControllerInfo;
}

/// Always reports "unknown controller, proceed anyway" — the behavior the
/// original tool falls back to under `--force`, and the only behavior this
/// crate implements since real enumeration lives outside its scope.
pub struct NullControllerDetector;

impl ControllerIdentity for NullControllerDetector {
    fn identify(&self, device_path: &str) -> ControllerInfo {
        ControllerInfo {
            found: false,
            description: format!("unknown controller at {device_path}; proceeding without verification"),
        }
    }
}
