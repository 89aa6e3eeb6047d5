//! Text normalization for OCR and direct-extraction output.
//!
//! Line structure is load-bearing for the extractors (labels and table
//! rows are matched per line), so newlines are preserved. Everything else
//! that OCR tends to mangle is flattened: CR/CRLF line endings, tabs,
//! runs of spaces, and non-ASCII artifacts.

/// Normalize raw document text.
///
/// - CRLF and bare CR become LF
/// - tabs become single spaces
/// - non-printable and non-ASCII characters are dropped
/// - runs of spaces collapse to one space
/// - trailing spaces are trimmed from each line
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_space = false;

    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        let c = match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                '\n'
            }
            '\t' => ' ',
            c if c == '\n' => '\n',
            c if !c.is_ascii() || (c.is_control() && c != '\n') => {
                // OCR noise; drop but treat as a word boundary
                if !prev_space {
                    out.push(' ');
                    prev_space = true;
                }
                continue;
            }
            c => c,
        };

        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
            out.push(' ');
        } else if c == '\n' {
            // Trim the trailing space this line may have accumulated
            if out.ends_with(' ') {
                out.pop();
            }
            prev_space = false;
            out.push('\n');
        } else {
            prev_space = false;
            out.push(c);
        }
    }

    if out.ends_with(' ') {
        out.pop();
    }
    out
}
