//! The six-cell verification code buffer and its focus rules.

use std::fmt;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

const LAST_CELL: usize = CODE_LENGTH - 1;

/// Returns whether `code` is exactly six ASCII digits.
pub fn validate_otp_format(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Where focus goes after `inserted` digits were written starting at cell `start`.
///
/// Clamped to the last cell.
pub fn next_focus(start: usize, inserted: usize) -> usize {
    start.saturating_add(inserted).min(LAST_CELL)
}

/// Code entry buffer: six independently editable cells plus the focused cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpCode {
    cells: [Option<char>; CODE_LENGTH],
    focus: usize,
}

impl OtpCode {
    /// An empty buffer focused on the first cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the focused cell.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Current cell contents.
    pub fn cells(&self) -> &[Option<char>; CODE_LENGTH] {
        &self.cells
    }

    /// Whether every cell holds a digit.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The filled cells concatenated. Shorter than six characters while incomplete.
    pub fn joined(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    /// Apply a text change event on cell `index` and return the new focus.
    ///
    /// Non-digits are dropped. An empty result clears the cell. A single digit
    /// fills the cell and advances focus. Several digits (a paste) are spread
    /// over the following cells; focus lands on the first empty cell after
    /// them, or the last cell.
    pub fn input(&mut self, index: usize, text: &str) -> usize {
        let index = index.min(LAST_CELL);
        let digits: Vec<char> = text.chars().filter(char::is_ascii_digit).collect();

        match digits.as_slice() {
            [] => {
                self.cells[index] = None;
                self.focus = index;
            }
            [digit] => {
                self.cells[index] = Some(*digit);
                self.focus = if index < LAST_CELL { index + 1 } else { index };
            }
            many => {
                let mut written = 0;
                for (digit, cell) in many.iter().zip(index..CODE_LENGTH) {
                    self.cells[cell] = Some(*digit);
                    written += 1;
                }

                let after = next_focus(index, written);
                self.focus = (after..CODE_LENGTH)
                    .find(|&cell| self.cells[cell].is_none())
                    .unwrap_or(LAST_CELL);
            }
        }

        tracing::trace!(index, focus = self.focus, "Code input applied");
        self.focus
    }

    /// Apply a backspace key press on cell `index` and return the new focus.
    ///
    /// On a filled cell the digit is removed. On an empty cell focus moves to
    /// the previous cell, leaving its digit in place.
    pub fn backspace(&mut self, index: usize) -> usize {
        let index = index.min(LAST_CELL);
        if self.cells[index].is_some() {
            self.cells[index] = None;
            self.focus = index;
        } else if index > 0 {
            self.focus = index - 1;
        }
        self.focus
    }

    /// Empty all cells and focus the first one.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in self.cells {
            write!(f, "{}", cell.unwrap_or('_'))?;
        }
        Ok(())
    }
}
