//! Locating the one YAML document in a record file.
//!
//! A record file holds exactly one document, optionally opened by a `---`
//! marker. The marker is `---` alone or followed by whitespace and inline
//! content, as in `--- a: 1`. The scan is a two-state machine:
//!
//! ```text
//!   BeforeDocument --"---" or content--> InDocument --"---"--> error
//! ```
//!
//! Blank lines, comments and directives before the document are skipped.

use crate::error::DocumentError;

/// Line that opens a YAML document.
pub const DOCUMENT_START: &str = "---";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    BeforeDocument,
    InDocument,
}

/// Extract the body of the single document in `text`, without its marker.
pub fn extract_document(text: &str) -> Result<String, DocumentError> {
    let mut state = State::BeforeDocument;
    let mut body: Vec<&str> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let marker = start_marker(line);
        state = match state {
            State::BeforeDocument if marker.is_some() => {
                body.extend(marker.filter(|rest| !rest.is_empty()));
                State::InDocument
            }
            State::BeforeDocument if is_preamble(line) => State::BeforeDocument,
            State::BeforeDocument => {
                body.push(line);
                State::InDocument
            }
            State::InDocument if marker.is_some() => {
                return Err(DocumentError::MultipleDocuments { line: index + 1 });
            }
            State::InDocument => {
                body.push(line);
                State::InDocument
            }
        };
    }

    if body.iter().all(|line| is_trivia(line)) {
        return Err(DocumentError::Empty);
    }
    Ok(body.join("\n"))
}

/// Content following a document start marker on the same line, if `line`
/// is one.
fn start_marker(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(DOCUMENT_START)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

fn is_trivia(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

fn is_preamble(line: &str) -> bool {
    is_trivia(line) || line.starts_with('%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_then_body() {
        let doc = extract_document("---\nid:\n  name: example\n").unwrap();
        assert_eq!(doc, "id:\n  name: example");
    }

    #[test]
    fn marker_is_optional() {
        let doc = extract_document("id:\n  name: example\n").unwrap();
        assert_eq!(doc, "id:\n  name: example");
    }

    #[test]
    fn preamble_is_skipped() {
        let doc = extract_document("# a thing\n\n%YAML 1.2\n---\nid: {}\n").unwrap();
        assert_eq!(doc, "id: {}");
    }

    #[test]
    fn crlf_lines() {
        let doc = extract_document("---\r\nid: {}\r\n").unwrap();
        assert_eq!(doc, "id: {}");
    }

    #[test]
    fn second_marker_is_rejected() {
        assert_eq!(
            extract_document("---\na: 1\n---\nb: 2\n"),
            Err(DocumentError::MultipleDocuments { line: 3 })
        );
        assert_eq!(
            extract_document("a: 1\n---\n"),
            Err(DocumentError::MultipleDocuments { line: 2 })
        );
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(extract_document(""), Err(DocumentError::Empty));
        assert_eq!(extract_document("---\n"), Err(DocumentError::Empty));
        assert_eq!(extract_document("---\n\n# only a comment\n"), Err(DocumentError::Empty));
    }

    #[test]
    fn marker_with_inline_content() {
        assert_eq!(extract_document("--- a: 1\n").unwrap(), "a: 1");
        assert_eq!(extract_document("---\ta: 1\nb: 2\n").unwrap(), "a: 1\nb: 2");
        assert_eq!(extract_document("---   \n"), Err(DocumentError::Empty));
    }

    #[test]
    fn second_marker_with_inline_content_is_rejected() {
        assert_eq!(
            extract_document("---\na: 1\n--- b: 2\n"),
            Err(DocumentError::MultipleDocuments { line: 3 })
        );
    }

    #[test]
    fn marker_must_be_exact() {
        let doc = extract_document("---\ntext: |\n  ---x\n  ---\n").unwrap();
        assert_eq!(doc, "text: |\n  ---x\n  ---");
    }
}
