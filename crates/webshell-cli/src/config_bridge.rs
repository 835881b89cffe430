//! Bridge from settings sections to runtime configuration types.

use webshell_config::LogSection;
use webshell_telemetry::{LogConfig, LogFormat};

/// Convert the `[log]` section to a [`LogConfig`].
///
/// Unknown formats fall back to compact output.
#[must_use]
pub fn to_log_config(section: &LogSection) -> LogConfig {
    let format = section.format.parse().unwrap_or(LogFormat::Compact);

    let mut log_config = LogConfig::new(&section.level).with_format(format);
    for directive in &section.directives {
        log_config = log_config.with_directive(directive);
    }
    log_config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_section() {
        let config = to_log_config(&LogSection::default());
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.directives.is_empty());
    }

    #[test]
    fn test_format_and_directives() {
        let section = LogSection {
            level: "warn".into(),
            format: "JSON".into(),
            directives: vec!["webshell_plugins=trace".into()],
        };
        let config = to_log_config(&section);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, vec!["webshell_plugins=trace"]);
    }

    #[test]
    fn test_unknown_format_falls_back() {
        let section = LogSection {
            format: "fancy".into(),
            ..LogSection::default()
        };
        assert_eq!(to_log_config(&section).format, LogFormat::Compact);
    }
}
