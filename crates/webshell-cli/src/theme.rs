//! Terminal styling for command output.

use colored::Colorize;
use webshell_plugins::PluginState;

pub(crate) struct Theme;

impl Theme {
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    pub(crate) fn separator() -> String {
        "━".repeat(60).dimmed().to_string()
    }

    /// Colour a lifecycle state label. Pads before colouring so table
    /// columns stay aligned.
    pub(crate) fn state(state: PluginState, width: usize) -> String {
        let label = format!("{:<width$}", state.as_str());
        match state {
            PluginState::Activated => label.green().to_string(),
            PluginState::Deactivated => label.yellow().to_string(),
            PluginState::Loaded => label.dimmed().to_string(),
        }
    }

    /// Colour an enabled flag.
    pub(crate) fn flag(enabled: Option<bool>, width: usize) -> String {
        match enabled {
            Some(true) => format!("{:<width$}", "yes").green().to_string(),
            Some(false) => format!("{:<width$}", "no").red().to_string(),
            None => format!("{:<width$}", "default").dimmed().to_string(),
        }
    }
}
