// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for scan failures and the auto-crop miss notice.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a presentation layer shows the message.

use crate::error::ScanError;

/// Severity of a message from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing went wrong; the result is usable but worth mentioning.
    Informational,
    /// User must do something (retake the photo, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying — damaged file, unsupported data.
    Permanent,
}

/// A human-readable message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::InvalidInput(detail) => HumanError {
            message: "This photo can't be processed.".into(),
            suggestion: format!(
                "Try taking the photo again so the whole page is visible. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        ScanError::ConfigInvalid(detail) => HumanError {
            message: "One of the scan settings isn't valid.".into(),
            suggestion: format!("Reset the scan settings to their defaults. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        ScanError::PdfError(_) => HumanError {
            message: "The scan couldn't be saved as a PDF.".into(),
            suggestion: "Try exporting again. If it keeps failing, save the scan as an image instead.".into(),
            severity: Severity::Permanent,
        },

        ScanError::Io(err) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check that the file exists and that there is free space. ({err})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Serialization(_) => HumanError {
            message: "The saved scan settings are damaged.".into(),
            suggestion: "Reset the scan settings to their defaults.".into(),
            severity: Severity::Permanent,
        },
    }
}

/// Notice shown when auto-crop was requested but no page edge was found.
///
/// The scan still succeeds with the whole, uncropped frame.
pub fn detection_miss_notice() -> HumanError {
    HumanError {
        message: "We couldn't find the edges of the page.".into(),
        suggestion: "The whole photo was used instead. For a tighter crop, photograph the page on a darker, plain background.".into(),
        severity: Severity::Informational,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_needs_action() {
        let h = humanize_error(&ScanError::InvalidInput("image has zero width".into()));
        assert_eq!(h.severity, Severity::ActionRequired);
        assert!(h.suggestion.contains("zero width"));
    }

    #[test]
    fn broken_image_is_permanent() {
        let h = humanize_error(&ScanError::ImageError("bad header".into()));
        assert_eq!(h.severity, Severity::Permanent);
    }

    #[test]
    fn detection_miss_is_informational() {
        assert_eq!(detection_miss_notice().severity, Severity::Informational);
    }
}
