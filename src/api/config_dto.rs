use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdmissionConfigDto {
    pub require_explicit_availability: bool,
    pub statistics_file: Option<String>,
}
