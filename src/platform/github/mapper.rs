use serde_json::Value;

use crate::platform::types::AlertFields;

/// Alert identifier: `number`, falling back to `id`.
pub fn alert_id(alert: &Value) -> Option<u64> {
    alert["number"].as_u64().or_else(|| alert["id"].as_u64())
}

/// The vulnerability entry an alert refers to. Newer payloads carry a
/// `security_vulnerabilities` array, older ones a single object.
fn vulnerability(alert: &Value) -> &Value {
    match &alert["security_vulnerabilities"] {
        Value::Array(items) if !items.is_empty() => &items[0],
        _ => &alert["security_vulnerability"],
    }
}

/// First value that is a non-empty string.
fn first_text(candidates: &[&Value]) -> String {
    candidates
        .iter()
        .filter_map(|value| value.as_str())
        .find(|text| !text.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Map a raw Dependabot alert onto our normalized alert fields.
pub fn map_alert(alert: &Value) -> AlertFields {
    let vulnerability = vulnerability(alert);
    let dependency = &alert["dependency"];
    let advisory = &alert["security_advisory"];

    AlertFields {
        alert_id: alert_id(alert),
        state: first_text(&[&alert["state"]]),
        severity: first_text(&[&advisory["severity"]]).to_lowercase(),
        package: first_text(&[
            &dependency["package"]["name"],
            &vulnerability["package"]["name"],
        ]),
        ecosystem: first_text(&[
            &dependency["package"]["ecosystem"],
            &vulnerability["package"]["ecosystem"],
        ])
        .to_lowercase(),
        manifest_path: first_text(&[&dependency["manifest_path"]]),
        summary: first_text(&[&advisory["summary"]]),
        ghsa_id: first_text(&[&advisory["ghsa_id"]]),
        cve_id: first_text(&[&advisory["cve_id"]]),
        first_patched_version: first_text(&[
            &vulnerability["first_patched_version"]["identifier"],
        ]),
        html_url: first_text(&[&alert["html_url"]]),
    }
}
