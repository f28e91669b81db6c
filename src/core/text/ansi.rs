//! Escape sequence scanning and SGR style state.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Csi,
    Osc,
    Ss3,
    /// APC / DCS strings.
    Str,
}

/// A complete escape sequence found in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escape<'a> {
    pub text: &'a str,
    pub kind: EscapeKind,
}

impl<'a> Escape<'a> {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Parameter string of a style code (`ESC [ params m`).
    pub fn sgr_params(&self) -> Option<&'a str> {
        if self.kind != EscapeKind::Csi {
            return None;
        }
        let params = self.text.strip_prefix("\x1b[")?.strip_suffix('m')?;
        params
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b';')
            .then_some(params)
    }
}

/// Returns the escape sequence starting at byte `pos`, if a complete one starts there.
pub fn scan_escape(input: &str, pos: usize) -> Option<Escape<'_>> {
    let bytes = input.as_bytes();
    if pos + 1 >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }

    let (end, kind) = match bytes[pos + 1] {
        b'[' => (csi_end(bytes, pos + 2)?, EscapeKind::Csi),
        b']' => (string_end(bytes, pos + 2)?, EscapeKind::Osc),
        b'_' | b'P' => (string_end(bytes, pos + 2)?, EscapeKind::Str),
        b'O' if pos + 2 < bytes.len() => (pos + 3, EscapeKind::Ss3),
        _ => return None,
    };
    Some(Escape {
        text: &input[pos..end],
        kind,
    })
}

fn csi_end(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|b| (0x40..=0x7e).contains(b))
        .map(|idx| from + idx + 1)
}

fn string_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

/// A run of a styled string: either one escape sequence or plain text between escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Escape(Escape<'a>),
    Text(&'a str),
}

/// Splits `input` into alternating escape and plain-text runs.
pub fn segments(input: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(escape) = scan_escape(input, idx) {
            if text_start < idx {
                out.push(Segment::Text(&input[text_start..idx]));
            }
            idx += escape.len();
            text_start = idx;
            out.push(Segment::Escape(escape));
            continue;
        }
        idx += input[idx..].chars().next().map_or(1, char::len_utf8);
    }
    if text_start < input.len() {
        out.push(Segment::Text(&input[text_start..]));
    }
    out
}

/// Removes every escape sequence, leaving the plain text.
pub fn strip_styles(input: &str) -> String {
    if !input.contains('\x1b') {
        return input.to_string();
    }
    segments(input)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text(text) => Some(text),
            Segment::Escape(_) => None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Bold,
    Dim,
    Italic,
    Underline,
    Blink,
    Inverse,
    Hidden,
    Strikethrough,
    Overline,
}

impl Attr {
    pub fn on_code(self) -> u16 {
        match self {
            Attr::Bold => 1,
            Attr::Dim => 2,
            Attr::Italic => 3,
            Attr::Underline => 4,
            Attr::Blink => 5,
            Attr::Inverse => 7,
            Attr::Hidden => 8,
            Attr::Strikethrough => 9,
            Attr::Overline => 53,
        }
    }

    /// Bold and dim share `22`.
    pub fn off_code(self) -> u16 {
        match self {
            Attr::Bold | Attr::Dim => 22,
            Attr::Italic => 23,
            Attr::Underline => 24,
            Attr::Blink => 25,
            Attr::Inverse => 27,
            Attr::Hidden => 28,
            Attr::Strikethrough => 29,
            Attr::Overline => 55,
        }
    }

    fn from_on_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => Attr::Bold,
            2 => Attr::Dim,
            3 => Attr::Italic,
            4 => Attr::Underline,
            5 | 6 => Attr::Blink,
            7 => Attr::Inverse,
            8 => Attr::Hidden,
            9 => Attr::Strikethrough,
            53 => Attr::Overline,
            _ => return None,
        })
    }

    const ALL: [Attr; 9] = [
        Attr::Bold,
        Attr::Dim,
        Attr::Italic,
        Attr::Underline,
        Attr::Blink,
        Attr::Inverse,
        Attr::Hidden,
        Attr::Strikethrough,
        Attr::Overline,
    ];
}

/// Foreground color, background color and boolean attributes in effect at a point of a
/// styled string. Colors are kept as their SGR parameter text (`31`, `38;5;208`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SgrState {
    pub fg: Option<String>,
    pub bg: Option<String>,
    attrs: BTreeSet<Attr>,
}

impl SgrState {
    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }

    pub fn has(&self, attr: Attr) -> bool {
        self.attrs.contains(&attr)
    }

    /// Folds one SGR parameter string into the state.
    pub fn apply(&mut self, params: &str) {
        if params.is_empty() {
            *self = Self::default();
            return;
        }
        let codes: Vec<u16> = params
            .split(';')
            .map(|part| part.parse().unwrap_or(0))
            .collect();

        let mut idx = 0;
        while idx < codes.len() {
            let code = codes[idx];
            match code {
                0 => *self = Self::default(),
                22 => {
                    self.attrs.remove(&Attr::Bold);
                    self.attrs.remove(&Attr::Dim);
                }
                23 | 24 | 25 | 27 | 28 | 29 | 55 => {
                    if let Some(attr) = Attr::ALL.into_iter().find(|a| a.off_code() == code) {
                        self.attrs.remove(&attr);
                    }
                }
                30..=37 | 90..=97 => self.fg = Some(code.to_string()),
                40..=47 | 100..=107 => self.bg = Some(code.to_string()),
                39 => self.fg = None,
                49 => self.bg = None,
                38 | 48 => {
                    let extended = match codes.get(idx + 1) {
                        Some(5) if idx + 2 < codes.len() => {
                            let color = format!("{code};5;{}", codes[idx + 2]);
                            idx += 2;
                            Some(color)
                        }
                        Some(2) if idx + 4 < codes.len() => {
                            let color = format!(
                                "{code};2;{};{};{}",
                                codes[idx + 2],
                                codes[idx + 3],
                                codes[idx + 4]
                            );
                            idx += 4;
                            Some(color)
                        }
                        _ => None,
                    };
                    if let Some(color) = extended {
                        if code == 38 {
                            self.fg = Some(color);
                        } else {
                            self.bg = Some(color);
                        }
                    }
                }
                _ => {
                    if let Some(attr) = Attr::from_on_code(code) {
                        self.attrs.insert(attr);
                    }
                }
            }
            idx += 1;
        }
    }

    /// Shortest code sequence moving a terminal from `from` to `to`. Closing uses the
    /// per-attribute off codes rather than a full reset, so an enclosing background
    /// survives.
    pub fn transition(from: &SgrState, to: &SgrState) -> String {
        let mut codes: Vec<String> = Vec::new();
        let mut closed = BTreeSet::new();

        for attr in from.attrs.difference(&to.attrs) {
            if closed.insert(attr.off_code()) {
                codes.push(attr.off_code().to_string());
            }
        }
        for attr in &to.attrs {
            let reopened = closed.contains(&attr.off_code());
            if !from.attrs.contains(attr) || reopened {
                codes.push(attr.on_code().to_string());
            }
        }
        if from.fg != to.fg {
            codes.push(to.fg.clone().unwrap_or_else(|| "39".to_string()));
        }
        if from.bg != to.bg {
            codes.push(to.bg.clone().unwrap_or_else(|| "49".to_string()));
        }

        if codes.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", codes.join(";"))
        }
    }

    /// Codes that open this state from a plain terminal.
    pub fn open_codes(&self) -> String {
        Self::transition(&Self::default(), self)
    }

    /// Codes that close everything this state has open.
    pub fn close_codes(&self) -> String {
        Self::transition(self, &Self::default())
    }
}
