//! Record-level formatting hooks
//!
//! A small ordered set of whole-record rules that override fields based on
//! combinations of other fields. They run after all individual field
//! normalization so they see final categorized values. The main effect is
//! correctly labelling hardware families whose OS string is unreliable.

use crate::app::models::NormalizedRecord;
use crate::constants::{TARAKO_OS_LABEL, fields};

/// Device-name prefixes identifying Tarako-class hardware
const TARAKO_DEVICE_PREFIXES: &[&str] = &["Intex", "Spice", "Ace", "Zen"];

/// Tarako builds do not carry a standard version identifier; devices
/// recognized by name get the fixed Tarako OS label.
fn apply_tarako_label(record: &mut NormalizedRecord) {
    let is_tarako = record
        .get_str(fields::PRODUCT_MODEL)
        .map(|model| {
            TARAKO_DEVICE_PREFIXES
                .iter()
                .any(|prefix| model.starts_with(prefix))
        })
        .unwrap_or(false);

    if is_tarako {
        record.insert(fields::OS, TARAKO_OS_LABEL);
    }
}

/// GoFox devices report a nonstandard OS string; they all run 1.4.
fn apply_gofox_label(record: &mut NormalizedRecord) {
    let is_gofox = record
        .get_str(fields::PRODUCT_MODEL)
        .map(|model| model.starts_with("GoFox"))
        .unwrap_or(false);

    if is_gofox {
        record.insert(fields::OS, "1.4");
    }
}

/// Apply all record-level hooks, in order
pub fn apply_record_hooks(record: &mut NormalizedRecord) {
    apply_tarako_label(record);
    apply_gofox_label(record);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tarako_device_forces_os_label() {
        let mut record = NormalizedRecord::new();
        record.insert(fields::PRODUCT_MODEL, "Spice MIFX1");
        record.insert(fields::OS, "Other");

        apply_record_hooks(&mut record);
        assert_eq!(record.get_str(fields::OS), Some("1.3T"));
    }

    #[test]
    fn test_gofox_device_forces_os_label() {
        let mut record = NormalizedRecord::new();
        record.insert(fields::PRODUCT_MODEL, "GoFox F15");
        record.insert(fields::OS, "Other");

        apply_record_hooks(&mut record);
        assert_eq!(record.get_str(fields::OS), Some("1.4"));
    }

    #[test]
    fn test_other_devices_untouched() {
        let mut record = NormalizedRecord::new();
        record.insert(fields::PRODUCT_MODEL, "Flame");
        record.insert(fields::OS, "2.0");

        apply_record_hooks(&mut record);
        assert_eq!(record.get_str(fields::OS), Some("2.0"));
    }

    #[test]
    fn test_missing_model_untouched() {
        let mut record = NormalizedRecord::new();
        record.insert(fields::OS, "1.3");

        apply_record_hooks(&mut record);
        assert_eq!(record.get_str(fields::OS), Some("1.3"));
    }
}
