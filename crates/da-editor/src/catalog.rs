//! Stamp catalog records as delivered by the host.

use serde::Deserialize;

/// One stamp definition. The SVG field exists under a plain and a
/// namespaced name depending on how the package was installed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StampRecord {
    #[serde(rename = "MasterLabel", default)]
    pub label: String,
    #[serde(rename = "Stamp_SVG_String__c", default)]
    pub svg: Option<String>,
    #[serde(rename = "c25draw__Stamp_SVG_String__c", default)]
    pub namespaced_svg: Option<String>,
}

impl StampRecord {
    /// The usable SVG source: the plain field, else the namespaced one.
    pub fn svg(&self) -> Option<&str> {
        [&self.svg, &self.namespaced_svg]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
    }
}

/// Parse a JSON array of stamp records.
pub fn parse_stamp_records(json: &str) -> Result<Vec<StampRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn svg_field_falls_back_to_namespaced_name() {
        let records = parse_stamp_records(
            r#"[
                {"MasterLabel": "Burst", "Stamp_SVG_String__c": "<svg>plain</svg>"},
                {"MasterLabel": "Seal", "c25draw__Stamp_SVG_String__c": "<svg>ns</svg>"},
                {"MasterLabel": "Both", "Stamp_SVG_String__c": "", "c25draw__Stamp_SVG_String__c": "<svg>ns</svg>"},
                {"MasterLabel": "Empty"}
            ]"#,
        )
        .unwrap();
        let svgs: Vec<Option<&str>> = records.iter().map(|r| r.svg()).collect();
        assert_eq!(
            svgs,
            vec![
                Some("<svg>plain</svg>"),
                Some("<svg>ns</svg>"),
                Some("<svg>ns</svg>"),
                None
            ]
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let records =
            parse_stamp_records(r#"[{"MasterLabel": "X", "Id": "m01", "DeveloperName": "X"}]"#)
                .unwrap();
        assert_eq!(records[0].label, "X");
    }
}
