use colored::{ColoredString, Colorize};
use std::fmt;
use std::sync::{OnceLock, RwLock};

use crate::config::Theme;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OutputPreferences {
    pub theme: Theme,
    /// Disables colours and box-drawing characters.
    pub plain: bool,
}

static PREFERENCES: OnceLock<RwLock<OutputPreferences>> = OnceLock::new();

pub fn set_preferences(prefs: OutputPreferences) {
    let lock = PREFERENCES.get_or_init(|| RwLock::new(OutputPreferences::default()));
    if let Ok(mut guard) = lock.write() {
        *guard = prefs;
    }
}

pub fn current_preferences() -> OutputPreferences {
    PREFERENCES
        .get_or_init(|| RwLock::new(OutputPreferences::default()))
        .read()
        .map(|guard| *guard)
        .unwrap_or_default()
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info | MessageKind::Section => "",
        MessageKind::Success => "[ok] ",
        MessageKind::Warning => "[!] ",
        MessageKind::Error => "[x] ",
        MessageKind::Hint => "hint: ",
    }
}

fn apply_style(kind: MessageKind, message: impl fmt::Display, prefs: &OutputPreferences) -> String {
    let text = match kind {
        MessageKind::Section => format!("=== {} ===", message.to_string().trim()),
        _ => format!("{}{}", label(kind), message),
    };

    if prefs.plain {
        return text;
    }

    let dark = prefs.theme == Theme::Dark;
    match kind {
        MessageKind::Success if dark => text.bright_green().to_string(),
        MessageKind::Success => text.green().to_string(),
        MessageKind::Warning if dark => text.bright_yellow().to_string(),
        MessageKind::Warning => text.yellow().to_string(),
        MessageKind::Error if dark => text.bright_red().to_string(),
        MessageKind::Error => text.red().to_string(),
        MessageKind::Hint => text.dimmed().to_string(),
        MessageKind::Section => text.bold().to_string(),
        MessageKind::Info => text,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let prefs = current_preferences();
    let formatted = apply_style(kind, message, &prefs);
    match kind {
        MessageKind::Error | MessageKind::Warning => eprintln!("{}", formatted),
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Colours a money cell green for gains and red for losses.
pub fn money(text: String, positive: bool) -> String {
    let prefs = current_preferences();
    if prefs.plain {
        return text;
    }
    let styled: ColoredString = match (positive, prefs.theme) {
        (true, Theme::Dark) => text.bright_green(),
        (true, Theme::Light) => text.green(),
        (false, Theme::Dark) => text.bright_red(),
        (false, Theme::Light) => text.red(),
    };
    styled.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_mode_skips_colour() {
        let prefs = OutputPreferences {
            theme: Theme::Dark,
            plain: true,
        };
        assert_eq!(apply_style(MessageKind::Warning, "careful", &prefs), "[!] careful");
        assert_eq!(apply_style(MessageKind::Section, " Summary ", &prefs), "=== Summary ===");
    }
}
