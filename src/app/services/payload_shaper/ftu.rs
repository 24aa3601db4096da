//! FTU (first-time-use) payload shaping
//!
//! An FTU payload records one activation event. Shaping flattens it,
//! validates the ping date, normalizes the category fields, and enriches
//! the SIM/network groups by resolving their mobile codes, producing the
//! full detail record counted by the FTU datasets.

use super::{PayloadShaper, ShapedRecord, flat_str, flatten::flatten_payload};
use crate::app::models::{RejectReason, SubmissionEnvelope};
use crate::app::services::normalizer::{
    apply_record_hooks, canonicalize_operator, lookup_language, normalize_country,
    normalize_device, normalize_os, standardize_channel,
};
use crate::constants::{ISO_DATE_FORMAT, REASON_FTU, fields};
use serde_json::Value;

impl PayloadShaper {
    /// Shape one FTU submission into a normalized record.
    ///
    /// Hard rejects: malformed payload, failed consistency check, residual
    /// nesting, missing/invalid/out-of-range ping time, missing OS version.
    /// Everything else downgrades to a sentinel value and the record is
    /// kept.
    pub fn shape_ftu(
        &self,
        envelope: &SubmissionEnvelope,
    ) -> std::result::Result<ShapedRecord, RejectReason> {
        let payload = envelope.payload_value()?;
        let mut payload = match payload {
            Value::Object(map) => map,
            _ => return Err(RejectReason::MalformedPayload),
        };

        if !Self::consistent_info(&payload, REASON_FTU) {
            return Err(RejectReason::Inconsistent);
        }
        Self::extract_geo_country(&mut payload);

        let mut flat = flatten_payload(payload)?;
        let mut diagnostics = Vec::new();

        // Dates. The ping date is range-checked; the activation date is
        // converted as-is.
        let ping_date = self.ping_date(flat.get("pingTime"))?;
        flat.remove("pingTime");
        let activation_date = flat
            .remove("activationTime")
            .map(|value| Self::ms_timestamp_to_date(&value, "activation time"))
            .transpose()?;

        if let Some(diagnostic) = Self::merge_update_channels(&mut flat) {
            diagnostics.push(diagnostic);
        }

        // Field normalizers.
        let os = normalize_os(flat_str(&flat, fields::OS).as_deref(), self.valid_os())?;
        let device = normalize_device(
            flat_str(&flat, fields::PRODUCT_MODEL).as_deref(),
            self.tables(),
        );
        let country = normalize_country(flat_str(&flat, fields::COUNTRY).as_deref(), self.tables());
        let language = flat_str(&flat, fields::LOCALE)
            .and_then(|locale| lookup_language(&locale, self.tables()).map(String::from));
        let standardized_channel =
            flat_str(&flat, fields::UPDATE_CHANNEL).map(|channel| standardize_channel(&channel));

        // Resolve the mobile codes each group carries, keeping the raw
        // codes alongside the resolved names.
        let mut enriched = Vec::new();
        for prefix in ["icc", "network"] {
            let mcc = flat_str(&flat, &format!("{}.mcc", prefix));
            if let Some(mcc) = &mcc {
                if let Some(country) = self.tables().lookup_mobile_country(mcc) {
                    enriched.push((format!("{}.country", prefix), country.to_string()));
                }
                if let Some(mnc) = flat_str(&flat, &format!("{}.mnc", prefix)) {
                    if let Some(network) = self.tables().lookup_mobile_network(mcc, &mnc) {
                        enriched.push((
                            format!("{}.network", prefix),
                            canonicalize_operator(network),
                        ));
                    }
                }
            }
        }
        if let Some(spn) = flat_str(&flat, fields::ICC_SPN) {
            enriched.push((fields::ICC_NAME.to_string(), canonicalize_operator(&spn)));
        }
        if let Some(operator) = flat_str(&flat, fields::NETWORK_OPERATOR) {
            enriched.push((
                fields::NETWORK_NAME.to_string(),
                canonicalize_operator(&operator),
            ));
        }

        // Assemble the record: raw leftovers first, then the computed
        // fields on top of them.
        let mut record = Self::record_from_flat(flat);
        record.insert(
            fields::PING_DATE,
            ping_date.format(ISO_DATE_FORMAT).to_string(),
        );
        if let Some(date) = activation_date {
            record.insert(
                fields::ACTIVATION_DATE,
                date.format(ISO_DATE_FORMAT).to_string(),
            );
        }
        if let Some(sdate) = Self::submission_date_iso(envelope.submission_date()) {
            record.insert(fields::SUBMISSION_DATE, sdate);
        }
        record.insert(fields::OS, os);
        record.insert(fields::PRODUCT_MODEL, device);
        record.insert(fields::COUNTRY, country);
        if let Some(language) = language {
            record.insert(fields::LANGUAGE, language);
        }
        if let Some(channel) = standardized_channel {
            record.insert(fields::UPDATE_CHANNEL_STANDARDIZED, channel);
        }
        for (key, value) in enriched {
            record.insert(key, value);
        }

        apply_record_hooks(&mut record);

        Ok(ShapedRecord {
            record,
            diagnostics,
        })
    }
}
