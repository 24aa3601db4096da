//! Operator (carrier) resolution and normalization
//!
//! The operator can be reported in up to four places: SIM/ICC mobile codes,
//! the SIM service-provider name, network mobile codes, and the network
//! operator name. Numeric codes are more trustworthy than free-text names,
//! and SIM information reflects the subscriber's carrier where network
//! information only reflects the visited network, so resolution tries
//! SIM codes, then SIM name, then network codes, then network name.

use super::rules::{OPERATOR_SUBS, apply_first};
use crate::app::services::reference_data::ReferenceData;
use crate::constants::{OTHER, UNKNOWN};

/// One source of operator information: a mobile code pair and/or a raw
/// operator name (the SIM `spn` or the network `operator` field)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSource {
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub name: Option<String>,
}

impl OperatorSource {
    pub fn from_codes(mcc: impl Into<String>, mnc: impl Into<String>) -> Self {
        Self {
            mcc: Some(mcc.into()),
            mnc: Some(mnc.into()),
            name: None,
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            mcc: None,
            mnc: None,
            name: Some(name.into()),
        }
    }

    /// Resolve the operator from this source's mobile codes
    fn resolve_codes(&self, tables: &ReferenceData) -> Option<String> {
        let mcc = self.mcc.as_deref()?;
        let mnc = self.mnc.as_deref()?;
        tables.lookup_mobile_network(mcc, mnc).map(String::from)
    }

    /// Read the raw operator name, treating whitespace-only as absent
    fn resolve_name(&self) -> Option<String> {
        let name = self.name.as_deref()?.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

/// Apply the operator substitution rules without the whitelist check
pub fn canonicalize_operator(raw: &str) -> String {
    apply_first(raw, &OPERATOR_SUBS)
}

/// Resolve a raw operator name from the SIM and network sources.
///
/// First success wins: SIM codes, SIM name, network codes, network name.
/// Returns `None` when no source carries operator information.
pub fn resolve_operator(
    icc: Option<&OperatorSource>,
    network: Option<&OperatorSource>,
    tables: &ReferenceData,
) -> Option<String> {
    if let Some(icc) = icc {
        if let Some(operator) = icc.resolve_codes(tables) {
            return Some(operator);
        }
        // Codes did not resolve; fall back to the SIM name string.
        if let Some(operator) = icc.resolve_name() {
            return Some(operator);
        }
    }

    if let Some(network) = network {
        if let Some(operator) = network.resolve_codes(tables) {
            return Some(operator);
        }
        if let Some(operator) = network.resolve_name() {
            return Some(operator);
        }
    }

    None
}

/// Normalize the operator for a record.
///
/// Resolves a raw name from the available sources, canonicalizes it, and
/// checks it against the operator whitelist: no information is "Unknown",
/// an unrecognized operator is "Other".
pub fn normalize_operator(
    icc: Option<&OperatorSource>,
    network: Option<&OperatorSource>,
    tables: &ReferenceData,
) -> String {
    let operator = match resolve_operator(icc, network, tables) {
        Some(operator) if !operator.is_empty() => operator,
        _ => return UNKNOWN.to_string(),
    };

    let operator = canonicalize_operator(&operator);

    if tables.is_whitelisted_operator(&operator) {
        operator
    } else {
        OTHER.to_string()
    }
}

/// Summarize the operator for the dashboard from already-resolved fields.
///
/// Input is the four resolved columns in preference order: SIM network
/// (from codes), SIM name, network network (from codes), network name.
/// The first non-empty value wins; absent everywhere is "Unknown"; not in
/// the whitelist is "Other".
pub fn summarize_operator(
    icc_network: &str,
    icc_name: &str,
    network_network: &str,
    network_name: &str,
    tables: &ReferenceData,
) -> String {
    let operator = [icc_network, icc_name, network_network, network_name]
        .into_iter()
        .find(|v| !v.is_empty());

    let operator = match operator {
        Some(operator) => operator,
        None => return UNKNOWN.to_string(),
    };

    if tables.is_whitelisted_operator(operator) {
        operator.to_string()
    } else {
        OTHER.to_string()
    }
}
