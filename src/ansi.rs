use std::fmt;

/// Anything that can be written as an SGR parameter.
pub trait Style: Copy {
    fn code(self) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colors {
    Gray = 30,
    Red = 31,
    Green = 32,
    Yellow = 33,
    Blue = 34,
    Magenta = 35,
    Cyan = 36,
    White = 37,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundColors {
    FireflyDarkBlue = 40,
    Orange = 41,
    MarbleBlue = 42,
    GreyishTurquoise = 43,
    Gray = 44,
    Indigo = 45,
    LightGray = 47,
    White = 48,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Styles {
    Normal = 0,
    Bold = 1,
    Underline = 4,
}

impl Style for Colors {
    fn code(self) -> u8 {
        self as u8
    }
}

impl Style for BackgroundColors {
    fn code(self) -> u8 {
        self as u8
    }
}

impl Style for Styles {
    fn code(self) -> u8 {
        self as u8
    }
}

/// Builds text for Discord's `ansi` code blocks.
#[derive(Debug, Clone)]
pub struct AnsiBuilder {
    text: String,
    codes: Vec<u8>,
}

impl AnsiBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            text: if text.is_empty() {
                "No text provided".to_string()
            } else {
                text
            },
            codes: Vec::new(),
        }
    }

    pub fn style(mut self, style: impl Style) -> Self {
        self.codes.push(style.code());
        self
    }

    pub fn build(&self, block: bool) -> String {
        let codes = self
            .codes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(";");
        let text = format!("\u{1b}[{}m{}\u{1b}[0m", codes, self.text);
        if block {
            format!("```ansi\n{}```", text)
        } else {
            text
        }
    }
}

impl fmt::Display for AnsiBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build(true))
    }
}

/// Shorthand for a single styled code block.
pub fn ansi(text: impl Into<String>, color: Colors) -> String {
    AnsiBuilder::new(text).style(color).to_string()
}

/// Same as [`ansi`] with bold text.
pub fn ansi_bold(text: impl Into<String>, color: Colors) -> String {
    AnsiBuilder::new(text)
        .style(color)
        .style(Styles::Bold)
        .to_string()
}
