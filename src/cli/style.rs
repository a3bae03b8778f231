//! Terminal styling for command output
//!
//! Colors are skipped automatically when the stream is not a terminal or
//! `NO_COLOR` is set (detection by `owo-colors`).

use indicatif::ProgressStyle;
pub use owo_colors::Stream;
use owo_colors::{OwoColorize, Style};
use std::fmt::{self, Display};
use std::sync::OnceLock;

/// Text rendered with a style when the target stream supports color
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    style: Style,
    stream: Stream,
}

impl<T> Styled<T> {
    /// Decide color support against stderr
    #[must_use]
    pub const fn for_stderr(mut self) -> Self {
        self.stream = Stream::Stderr;
        self
    }

    /// Decide color support against stdout
    #[must_use]
    pub const fn for_stdout(mut self) -> Self {
        self.stream = Stream::Stdout;
        self
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.value
                .if_supports_color(self.stream, |v| v.style(self.style))
        )
    }
}

const fn styled<T>(value: T, style: Style, stream: Stream) -> Styled<T> {
    Styled {
        value,
        style,
        stream,
    }
}

/// Semantic styles for report output
pub trait Stylize: Display {
    /// Cyan: engineer ids, counts, confirmation ids
    fn accent(&self) -> Styled<&Self> {
        styled(self, Style::new().cyan(), Stream::Stdout)
    }

    /// Red on stderr: rejection reasons
    fn error(&self) -> Styled<&Self> {
        styled(self, Style::new().red(), Stream::Stderr)
    }

    /// Yellow on stderr: offline notices and retake hints
    fn warn(&self) -> Styled<&Self> {
        styled(self, Style::new().yellow(), Stream::Stderr)
    }

    /// Dim: submission ids, timestamps, secondary notes
    fn muted(&self) -> Styled<&Self> {
        styled(self, Style::new().dimmed(), Stream::Stdout)
    }

    /// Bold: phase headers
    fn emphasis(&self) -> Styled<&Self> {
        styled(self, Style::new().bold(), Stream::Stdout)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green checkmark for a confirmed or saved report
pub const fn check() -> Styled<&'static str> {
    styled("✓", Style::new().green(), Stream::Stdout)
}

/// Red cross for a rejected report (stderr)
pub const fn cross() -> Styled<&'static str> {
    styled("✗", Style::new().red(), Stream::Stderr)
}

/// Dim bullet for queue entries
pub const fn bullet() -> Styled<&'static str> {
    styled("○", Style::new().dimmed(), Stream::Stdout)
}

/// Render `text` as an OSC 8 link to `url`, or `text (url)` when the
/// terminal cannot show links
pub fn hyperlink(stream: Stream, text: &str, url: &str) -> String {
    let target = match stream {
        Stream::Stdout => supports_hyperlinks::Stream::Stdout,
        Stream::Stderr => supports_hyperlinks::Stream::Stderr,
    };
    if supports_hyperlinks::on(target) {
        terminal_link::Link::new(text, url).to_string()
    } else {
        format!("{text} ({url})")
    }
}

/// Spinner shown while a remote submission is in flight
pub fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("hardcoded spinner template is valid")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}
