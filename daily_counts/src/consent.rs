use log::debug;

use crate::config::*;
use crate::identity::canonical_string;

const YES_FORMS: [&str; 4] = ["yes", "y", "1", "true"];
const NO_FORMS: [&str; 4] = ["no", "n", "0", "false"];

/// Maps a raw consent value to a status.
///
/// This function is total: anything that is not clearly a yes or a no ends up as `Unknown`,
/// which is still counted downstream.
pub fn normalize_consent(raw: &RawValue) -> ConsentStatus {
    match raw {
        RawValue::Bool(true) => ConsentStatus::Yes,
        RawValue::Bool(false) => ConsentStatus::No,
        RawValue::Number(f) => consent_from_number(*f),
        RawValue::Text(s) => consent_from_text(s),
        RawValue::Empty | RawValue::Date(_) | RawValue::DateTime(_) => ConsentStatus::Unknown,
    }
}

/// Same as `normalize_consent`, but looks at the value label first when there is one.
///
/// The raw code is still tried if the label itself is not recognized: some surveys label
/// their consent codes with free text ("Agreed to participate").
pub fn normalize_consent_labelled(raw: &RawValue, labels: Option<&LabelMap>) -> ConsentStatus {
    let from_label = labels
        .and_then(|m| m.get(&canonical_string(raw)))
        .map(|label| consent_from_text(label));
    match from_label {
        Some(ConsentStatus::Unknown) | None => normalize_consent(raw),
        Some(status) => status,
    }
}

/// The canonical raw form of a status. Normalizing it again gives back the same status.
pub fn canonical_consent(status: ConsentStatus) -> RawValue {
    match status {
        ConsentStatus::Yes => RawValue::Text("Yes".to_string()),
        ConsentStatus::No => RawValue::Text("No".to_string()),
        ConsentStatus::Unknown => RawValue::Empty,
    }
}

fn consent_from_number(f: f64) -> ConsentStatus {
    if f == 1.0 {
        ConsentStatus::Yes
    } else if f == 0.0 {
        ConsentStatus::No
    } else {
        ConsentStatus::Unknown
    }
}

fn consent_from_text(s: &str) -> ConsentStatus {
    let lowered = s.trim().to_lowercase();
    if YES_FORMS.contains(&lowered.as_str()) {
        return ConsentStatus::Yes;
    }
    if NO_FORMS.contains(&lowered.as_str()) {
        return ConsentStatus::No;
    }
    // Numbers exported as text by some tools ("1.0", " 0 ").
    match lowered.parse::<f64>() {
        Ok(f) => consent_from_number(f),
        Err(_) => {
            debug!("consent_from_text: unrecognized consent value {:?}", s);
            ConsentStatus::Unknown
        }
    }
}
