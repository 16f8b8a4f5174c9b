//! `G_MVP_SIZE`: the intake must name at least two MVP features.

use camino::Utf8Path;
use serde_json::json;

use pipeforge_dod::Intake;

use crate::types::{GateId, GateResult};

pub const MIN_MVP_FEATURES: usize = 2;

#[must_use]
pub fn check_mvp_size(intake_path: &Utf8Path) -> GateResult {
    let text = match std::fs::read_to_string(intake_path) {
        Ok(text) => text,
        Err(_) => {
            return GateResult::new(
                GateId::MvpSize,
                false,
                format!("Intake not found at {intake_path}"),
            );
        }
    };

    let intake = match Intake::parse(&text) {
        Ok(intake) => intake,
        Err(e) => {
            return GateResult::new(GateId::MvpSize, false, format!("Intake is not valid JSON: {e}"));
        }
    };

    let count = intake.mvp_features().len();
    let passed = count >= MIN_MVP_FEATURES;
    let message = if passed {
        format!("{count} MVP features defined")
    } else {
        format!("Only {count} MVP feature(s) defined; at least {MIN_MVP_FEATURES} required")
    };

    GateResult::new(GateId::MvpSize, passed, message).with_details(json!({ "count": count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn intake(content: Option<&str>) -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("intake.json")).unwrap();
        if let Some(content) = content {
            std::fs::write(&path, content).unwrap();
        }
        (temp, path)
    }

    #[test]
    fn test_two_features_pass() {
        let (_t, path) = intake(Some(r#"{"mvp_features": ["list", "add"]}"#));
        assert!(check_mvp_size(&path).passed());
    }

    #[test]
    fn test_one_feature_fails() {
        let (_t, path) = intake(Some(r#"{"mvp_features": ["list"]}"#));
        let gate = check_mvp_size(&path);
        assert!(!gate.passed());
        assert_eq!(gate.details.unwrap()["count"], 1);
    }

    #[test]
    fn test_missing_or_invalid_intake_fails() {
        let (_t, path) = intake(None);
        assert!(!check_mvp_size(&path).passed());

        let (_t2, path) = intake(Some("not json"));
        assert!(check_mvp_size(&path).message.contains("not valid JSON"));
    }
}
