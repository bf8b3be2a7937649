use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press did to the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Submitted(String),
    Edited,
    Interrupt,
    Ignored,
}

/// Single-line command buffer. Enter submits, Esc clears.
#[derive(Debug, Default, Clone)]
pub struct InputLine {
    buffer: String,
    submissions: u64,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> InputOutcome {
        if key.kind != KeyEventKind::Press {
            return InputOutcome::Ignored;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') if ctrl => InputOutcome::Interrupt,
            KeyCode::Backspace => {
                if self.buffer.pop().is_some() {
                    InputOutcome::Edited
                } else {
                    InputOutcome::Ignored
                }
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => {
                if self.buffer.is_empty() {
                    return InputOutcome::Ignored;
                }
                self.buffer.clear();
                InputOutcome::Edited
            }
            KeyCode::Char(ch) => {
                if ctrl || key.modifiers.contains(KeyModifiers::ALT) {
                    return InputOutcome::Ignored;
                }
                self.buffer.push(ch);
                InputOutcome::Edited
            }
            _ => InputOutcome::Ignored,
        }
    }

    /// Append pasted text. Line breaks are kept as literal `\n` so pasted
    /// code survives the single-line buffer.
    pub fn paste(&mut self, data: &str) -> bool {
        if data.is_empty() {
            return false;
        }
        let flattened = data.replace("\r\n", "\n").replace('\n', "\\n");
        self.buffer.push_str(&flattened);
        true
    }

    fn submit(&mut self) -> InputOutcome {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        if text.is_empty() {
            return InputOutcome::Ignored;
        }
        self.submissions += 1;
        InputOutcome::Submitted(text)
    }
}
