use bracket_terminal::prelude::VirtualKeyCode;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use tracing::warn;

/// Keypresses replayed from a text file, one character per key.
pub struct ScriptedInput {
    keys: Vec<VirtualKeyCode>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            lines.push(line?);
        }
        Ok(Self::from_lines(lines.iter().map(String::as_str)))
    }

    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut keys = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            for c in trimmed.chars() {
                match char_to_virtualkeycode(c) {
                    Some(key) => keys.push(key),
                    None => warn!(key = %c, "unknown key in script"),
                }
            }
        }
        Self { keys, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

impl Iterator for ScriptedInput {
    type Item = VirtualKeyCode;

    fn next(&mut self) -> Option<VirtualKeyCode> {
        let key = self.keys.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(key)
    }
}

fn char_to_virtualkeycode(c: char) -> Option<VirtualKeyCode> {
    match c.to_ascii_lowercase() {
        'w' => Some(VirtualKeyCode::W),
        'a' => Some(VirtualKeyCode::A),
        's' => Some(VirtualKeyCode::S),
        'd' => Some(VirtualKeyCode::D),
        'q' => Some(VirtualKeyCode::Q),
        'e' => Some(VirtualKeyCode::E),
        'z' => Some(VirtualKeyCode::Z),
        'c' => Some(VirtualKeyCode::C),
        'g' => Some(VirtualKeyCode::G),
        'i' => Some(VirtualKeyCode::I),
        'u' => Some(VirtualKeyCode::U),
        'm' => Some(VirtualKeyCode::M),
        'x' => Some(VirtualKeyCode::X),
        '.' | '_' => Some(VirtualKeyCode::Space), // wait; spaces are trimmed from line ends
        '~' | '\x1B' => Some(VirtualKeyCode::Escape),
        '1' => Some(VirtualKeyCode::Key1),
        '2' => Some(VirtualKeyCode::Key2),
        '3' => Some(VirtualKeyCode::Key3),
        '4' => Some(VirtualKeyCode::Key4),
        '5' => Some(VirtualKeyCode::Key5),
        '6' => Some(VirtualKeyCode::Key6),
        '7' => Some(VirtualKeyCode::Key7),
        '8' => Some(VirtualKeyCode::Key8),
        '9' => Some(VirtualKeyCode::Key9),
        _ => None,
    }
}
