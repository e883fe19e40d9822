// src/termsheet/download.rs
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

const FALLBACK_STEM: &str = "termsheet";

/// The unmodified extraction result, ready to be offered as a file.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub filename: String,
    pub json: String,
}

impl DownloadArtifact {
    pub fn new(upload_name: &str, result: &Value) -> Result<Self, serde_json::Error> {
        Ok(Self {
            filename: download_filename(upload_name),
            json: to_pretty_json(result)?,
        })
    }

    /// `data:` URL usable as the `href` of a download link.
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.json.as_bytes());
        format!("data:application/json;base64,{}", encoded)
    }
}

/// `<upload base name>_extracted.json`. Browsers may send a full client
/// path, so only the last component is kept.
pub fn download_filename(upload_name: &str) -> String {
    let last = upload_name.rsplit(['/', '\\']).next().unwrap_or(upload_name);
    let stem = Path::new(last)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{}_extracted.json", stem)
}

/// Four-space indented JSON, keys in the order they were received.
fn to_pretty_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filename_is_derived_from_upload_base_name() {
        assert_eq!(download_filename("Autocall Note.pdf"), "Autocall Note_extracted.json");
        assert_eq!(download_filename("C:\\Users\\me\\ts.v2.PDF"), "ts.v2_extracted.json");
        assert_eq!(download_filename("/home/me/sheet.pdf"), "sheet_extracted.json");
        assert_eq!(download_filename(""), "termsheet_extracted.json");
    }

    #[test]
    fn artifact_round_trips_and_keeps_key_order() {
        let result = json!({
            "productGeneral": {"productName": "Autocall Note", "currency": "CHF"},
            "underlyings": [{"name": "SMI", "strikeLevel": 11000.5}],
            "dates": null,
            "aardvark": true
        });
        let artifact = DownloadArtifact::new("note.pdf", &result).unwrap();

        assert!(artifact.json.starts_with("{\n    \"productGeneral\": {\n        \"productName\""));
        let keys: Vec<&str> = result.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["productGeneral", "underlyings", "dates", "aardvark"]);

        let parsed: Value = serde_json::from_str(&artifact.json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn data_url_decodes_back_to_the_json() {
        let artifact = DownloadArtifact::new("a.pdf", &json!({"isin": "CH0000000001"})).unwrap();
        let url = artifact.data_url();
        let encoded = url.strip_prefix("data:application/json;base64,").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), artifact.json);
    }
}
