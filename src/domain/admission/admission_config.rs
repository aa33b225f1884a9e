use std::path::PathBuf;

use crate::api::config_dto::AdmissionConfigDto;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

/// Policy knobs of the admission controller. The term is not part of it,
/// it travels with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// When `true`, an instructor without a declared availability window for the
    /// session's day is a conflict. When `false`, no declaration means no constraint.
    pub require_explicit_availability: bool,

    /// Where to write per-decision CSV statistics. `None` disables them.
    pub statistics_file: Option<PathBuf>,
}

impl From<AdmissionConfigDto> for AdmissionConfig {
    fn from(dto: AdmissionConfigDto) -> Self {
        AdmissionConfig { require_explicit_availability: dto.require_explicit_availability, statistics_file: dto.statistics_file.map(PathBuf::from) }
    }
}

impl AdmissionConfig {
    pub fn load(file_path: &str) -> Result<Self> {
        let dto: AdmissionConfigDto = parse_json_file(file_path)?;
        log::info!("Admission config loaded from '{}': {:?}", file_path, dto);
        Ok(dto.into())
    }
}
