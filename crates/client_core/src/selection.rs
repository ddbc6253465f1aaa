use crate::error::SelectionError;

/// MIME type the drag source or picker must declare, when it declares one.
pub const BMP_MIME: &str = "image/bmp";

const BMP_EXTENSION: &str = ".bmp";
/// Matches the service-side upload cap; screening here only saves a doomed
/// round-trip, the service re-validates the real bytes.
const MAX_CONTENT_BYTES: usize = 100 * 1024 * 1024;

/// A file as offered by a drag source or file picker, before screening.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub content: Vec<u8>,
    /// Declared MIME type, if the source reports one. Not re-derived from
    /// the content; the format constraint is a picker boundary contract.
    pub mime_type: Option<String>,
}

/// A file that passed the selection gate. Only producible through
/// [`screen_candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Screens an offered set of files down to exactly one acceptable BMP.
///
/// Rejection reasons are aggregated into one human-readable message, one
/// entry per offending file, joined with `", "`. A rejected offer never
/// yields a [`SelectedFile`].
pub fn screen_candidates(candidates: Vec<FileCandidate>) -> Result<SelectedFile, SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError::new("No valid BMP file selected"));
    }

    if candidates.len() > 1 {
        let message = candidates
            .iter()
            .map(|candidate| format!("{}: only one file may be selected", candidate.name))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SelectionError::new(message));
    }

    let candidate = candidates
        .into_iter()
        .next()
        .ok_or_else(|| SelectionError::new("No valid BMP file selected"))?;

    let violations = violations_for(&candidate);
    if violations.is_empty() {
        Ok(SelectedFile {
            name: candidate.name,
            content: candidate.content,
        })
    } else {
        Err(SelectionError::new(format!(
            "{}: {}",
            candidate.name,
            violations.join(", ")
        )))
    }
}

fn violations_for(candidate: &FileCandidate) -> Vec<String> {
    let mut violations = Vec::new();

    if !candidate.name.to_lowercase().ends_with(BMP_EXTENSION) {
        violations.push("file must have a .bmp extension".to_string());
    }

    if let Some(mime) = &candidate.mime_type {
        if mime != BMP_MIME {
            violations.push(format!("file type must be {BMP_MIME}, got {mime}"));
        }
    }

    if candidate.content.is_empty() {
        violations.push("file is empty".to_string());
    } else if candidate.content.len() > MAX_CONTENT_BYTES {
        violations.push(format!(
            "file exceeds the {MAX_CONTENT_BYTES} byte upload limit"
        ));
    }

    violations
}
