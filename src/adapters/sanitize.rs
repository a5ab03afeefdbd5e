//! Log redaction for credentials and contact details.
//!
//! Everything the subscriber formats passes through [`SanitizingMakeWriter`]
//! line by line. Redacted:
//! - Password assignments (`password=...`, `confirm: ...`)
//! - Argon2 PHC hashes as stored in the accounts table
//! - Email addresses (commonly used as usernames)
//! - Long hex strings (digests, tokens)
//!
//! Call sites should still avoid formatting credentials; this is the last
//! line before the sink.
//!
//! Input is capped at `PULMO_SANITIZE_MAX_BYTES` (default 16 KiB) per call.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

const MAX_BYTES_ENV: &str = "PULMO_SANITIZE_MAX_BYTES";
const DEFAULT_MAX_BYTES: usize = 16 * 1024;

static RULES: OnceLock<Rules> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    any: RegexSet,
    ordered: Vec<Rule>,
}

// Order matters: PHC hashes contain `$`-separated base64 that the password
// rule would otherwise swallow only partially.
const PATTERNS: &[(&str, &str)] = &[
    (r"\$argon2(?:id|i|d)\$[A-Za-z0-9+/=,$]+", "[REDACTED-HASH]"),
    (
        r"(?i)\b(?:password|passwd|pwd|confirm(?:_password)?)\b\s*[:=]\s*\S+",
        "[REDACTED-PASSWORD]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-HEX]"),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let any = RegexSet::new(PATTERNS.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let ordered = PATTERNS
            .iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Rules { any, ordered }
    })
}

fn max_bytes() -> usize {
    std::env::var(MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact credentials and contact details from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = if rules.any.is_match(prefix) {
        let mut text = prefix.to_string();
        for rule in &rules.ordered {
            text = rule.regex.replace_all(&text, rule.replacement).into_owned();
        }
        text
    } else {
        prefix.to_string()
    };

    if truncated {
        out.push_str(" [TRUNCATED]");
        // Keep record boundaries intact for the next line.
        if input.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// `MakeWriter` wrapper that sanitizes each formatted line before it reaches
/// the inner writer.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let sanitized = sanitize(&String::from_utf8_lossy(bytes));
        self.inner.write_all(sanitized.as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_lines()?;

        // A single line without a newline must not grow the buffer forever.
        if self.buffer.len() > max_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}
