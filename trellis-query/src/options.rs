use crate::literal::ServerTimeZone;
use crate::selection::PrefetchSemantics;
use serde::{Deserialize, Serialize};

/// Longest include/exclude/sort/mapBy path accepted by default.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 1000;

/// Compiler configuration, shared by all requests of one compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub max_path_length: usize,
    pub time_zone: ServerTimeZone,
    /// Fill attribute-less nodes with all entity attributes before excludes run.
    pub default_attributes: bool,
    pub prefetch: PrefetchSemantics,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            time_zone: ServerTimeZone::default(),
            default_attributes: true,
            prefetch: PrefetchSemantics::default(),
        }
    }
}

impl CompileOptions {
    pub fn with_max_path_length(mut self, max_path_length: usize) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn with_time_zone(mut self, time_zone: ServerTimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_default_attributes(mut self, enabled: bool) -> Self {
        self.default_attributes = enabled;
        self
    }

    pub fn with_prefetch(mut self, prefetch: PrefetchSemantics) -> Self {
        self.prefetch = prefetch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options: CompileOptions =
            serde_json::from_str(r#"{"time_zone": "-08:00", "prefetch": "joint"}"#).unwrap();
        assert_eq!(options.max_path_length, DEFAULT_MAX_PATH_LENGTH);
        assert!(options.default_attributes);
        assert_eq!(options.prefetch, PrefetchSemantics::Joint);
        assert_eq!(options.time_zone.to_string(), "-08:00");
    }

    #[test]
    fn bad_time_zone_is_rejected() {
        assert!(serde_json::from_str::<CompileOptions>(r#"{"time_zone": "Mars/Olympus"}"#).is_err());
    }
}
