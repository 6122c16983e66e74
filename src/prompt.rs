//! Interactive directory selection
//!
//! Used when the game folder cannot be found and when the user has to pick
//! a folder by hand. The terminal prompt reads a path from stdin; the dialog
//! prompt opens a native folder picker.

use std::io::{BufRead, Write};
use std::path::PathBuf;

pub trait DirectoryPrompt {
    /// Ask for a directory. `None` means the user cancelled.
    fn pick_directory(&self, title: &str) -> Option<PathBuf>;
}

/// Reads a path from stdin. An empty line cancels.
pub struct TerminalPrompt;

impl DirectoryPrompt for TerminalPrompt {
    fn pick_directory(&self, title: &str) -> Option<PathBuf> {
        print!("{}: ", title);
        std::io::stdout().flush().ok()?;

        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input).ok()?;
        parse_answer(&input)
    }
}

/// Native folder picker
pub struct DialogPrompt;

impl DirectoryPrompt for DialogPrompt {
    fn pick_directory(&self, title: &str) -> Option<PathBuf> {
        rfd::FileDialog::new().set_title(title).pick_folder()
    }
}

fn parse_answer(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim().trim_matches('"');
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}
