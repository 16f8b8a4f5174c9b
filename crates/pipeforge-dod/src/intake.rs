use serde::Deserialize;
use serde_json::Value;

/// The parts of `10_intake/intake.json` the Verifier reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Intake {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub mvp_features: Option<Vec<Value>>,
    #[serde(default)]
    pub features: Option<Vec<Value>>,
}

impl Intake {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// MVP feature list, falling back to `features` when `mvp_features` is absent.
    #[must_use]
    pub fn mvp_features(&self) -> &[Value] {
        self.mvp_features
            .as_deref()
            .or(self.features.as_deref())
            .unwrap_or(&[])
    }
}
