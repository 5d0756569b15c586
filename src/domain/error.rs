//! Domain error types.

/// Top-level error type for volgate.
#[derive(Debug, thiserror::Error)]
pub enum VolgateError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no usable price data for {symbol}")]
    NoData { symbol: String },

    #[error("no common dates between {vol_symbol} and {asset_symbol}")]
    NoOverlap {
        vol_symbol: String,
        asset_symbol: String,
    },

    #[error("insufficient aligned data: have {rows} rows, need {minimum}")]
    InsufficientData { rows: usize, minimum: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VolgateError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        VolgateError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&VolgateError> for std::process::ExitCode {
    fn from(err: &VolgateError) -> Self {
        let code: u8 = match err {
            VolgateError::Io(_) => 1,
            VolgateError::ConfigParse { .. }
            | VolgateError::ConfigMissing { .. }
            | VolgateError::ConfigInvalid { .. } => 2,
            VolgateError::Database { .. }
            | VolgateError::DatabaseQuery { .. }
            | VolgateError::DataSource { .. } => 3,
            VolgateError::NoData { .. }
            | VolgateError::NoOverlap { .. }
            | VolgateError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
