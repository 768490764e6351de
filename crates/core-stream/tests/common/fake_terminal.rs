//! Minimal VT100 emulator for headless patch verification.
//!
//! Applies patch strings to a character grid: printable text, `\r`/`\n`,
//! DEC and CSI cursor save/restore, absolute home, relative movement, and
//! the erase operations the surface emits. SGR sequences are consumed and
//! ignored; assertions compare visible text, not styling. Wide glyphs
//! occupy a single cell here for the same reason.

#![allow(dead_code)]

#[derive(Debug)]
pub struct FakeTerminal {
    width: usize,
    height: usize,
    screen: Vec<Vec<char>>,
    col: usize,
    row: usize,
    saved: Option<(usize, usize)>,
}

impl FakeTerminal {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            screen: vec![vec![' '; width]; height],
            col: 0,
            row: 0,
            saved: None,
        }
    }

    /// Apply a patch string.
    pub fn feed(&mut self, patch: &str) {
        let mut chars = patch.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\x1b' => match chars.peek().copied() {
                    Some('[') => {
                        chars.next();
                        let mut params = String::new();
                        let mut final_byte = None;
                        for c in chars.by_ref() {
                            if ('\u{40}'..='\u{7e}').contains(&c) {
                                final_byte = Some(c);
                                break;
                            }
                            params.push(c);
                        }
                        if let Some(final_byte) = final_byte {
                            self.csi(&params, final_byte);
                        }
                    }
                    Some('7') => {
                        chars.next();
                        self.saved = Some((self.col, self.row));
                    }
                    Some('8') => {
                        chars.next();
                        if let Some((col, row)) = self.saved {
                            self.col = col;
                            self.row = row;
                        }
                    }
                    _ => {
                        chars.next();
                    }
                },
                '\n' => {
                    // Cooked-mode output: ONLCR turns line feed into CR+LF.
                    self.col = 0;
                    self.line_feed();
                }
                '\r' => self.col = 0,
                _ => self.put(c),
            }
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.col, self.row)
    }

    /// Screen contents as text, rows right-trimmed, trailing blank rows
    /// dropped.
    pub fn screen_text(&self) -> String {
        let rows: Vec<String> = self
            .screen
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect();
        rows.join("\n").trim_end().to_string()
    }

    fn csi(&mut self, params: &str, final_byte: char) {
        let n = params.parse::<usize>().unwrap_or(1).max(1);
        match final_byte {
            'H' | 'f' => {
                let mut parts = params.split(';');
                let row: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
                let col: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
                self.row = row.saturating_sub(1).min(self.height - 1);
                self.col = col.saturating_sub(1).min(self.width - 1);
            }
            'A' => self.row = self.row.saturating_sub(n),
            'B' => self.row = (self.row + n).min(self.height - 1),
            'C' => self.col = (self.col + n).min(self.width - 1),
            'D' => self.col = self.col.saturating_sub(n),
            'E' => {
                self.col = 0;
                self.row = (self.row + n).min(self.height - 1);
            }
            's' => self.saved = Some((self.col, self.row)),
            'u' => {
                if let Some((col, row)) = self.saved {
                    self.col = col;
                    self.row = row;
                }
            }
            'J' => match params {
                "" | "0" => {
                    for col in self.col..self.width {
                        self.screen[self.row][col] = ' ';
                    }
                    for row in (self.row + 1)..self.height {
                        self.screen[row].fill(' ');
                    }
                }
                "2" | "3" => {
                    for row in &mut self.screen {
                        row.fill(' ');
                    }
                }
                _ => {}
            },
            'K' => match params {
                "" | "0" => {
                    for col in self.col..self.width {
                        self.screen[self.row][col] = ' ';
                    }
                }
                "2" => self.screen[self.row].fill(' '),
                _ => {}
            },
            // SGR and anything else: no effect on visible text.
            _ => {}
        }
    }

    fn put(&mut self, c: char) {
        if self.col >= self.width {
            self.col = 0;
            self.line_feed();
        }
        self.screen[self.row][self.col] = c;
        self.col += 1;
    }

    fn line_feed(&mut self) {
        if self.row + 1 >= self.height {
            self.screen.remove(0);
            self.screen.push(vec![' '; self.width]);
            if let Some((_, saved_row)) = &mut self.saved {
                *saved_row = saved_row.saturating_sub(1);
            }
        } else {
            self.row += 1;
        }
    }
}
