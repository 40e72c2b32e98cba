//! Import report types.
//!
//! Import never stops at a bad row. Every skipped row and every policy
//! decision (duplicate identities, dropped columns) is recorded here and the
//! report is returned to the caller as a summary.

use serde::Serialize;
use std::fmt;

/// Summary of one table import.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// `case-label` records created by collation.
    pub label_records: usize,
    /// `roi` records reconstructed from geometry.
    pub roi_records: usize,
    pub issues: Vec<ImportIssue>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ImportIssue) {
        self.issues.push(issue);
    }

    /// Number of rows skipped because they were malformed.
    pub fn malformed_row_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.code == ImportIssueCode::MalformedRow)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.count(ImportSeverity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(ImportSeverity::Info)
    }

    fn count(&self, severity: ImportSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// True if every row made it into the store.
    pub fn is_clean(&self) -> bool {
        self.malformed_row_count() == 0
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Imported {} label record(s), {} ROI record(s)",
            self.label_records, self.roi_records
        )?;

        for (title, severity) in [
            ("Warnings", ImportSeverity::Warning),
            ("Notes", ImportSeverity::Info),
        ] {
            let count = self.count(severity);
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, count)?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue)?;
            }
        }

        let skipped = self.malformed_row_count();
        if skipped > 0 {
            writeln!(f)?;
            writeln!(f, "Skipped {} malformed row(s)", skipped)?;
        }
        Ok(())
    }
}

/// A single issue found during import.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportIssue {
    pub severity: ImportSeverity,
    pub code: ImportIssueCode,
    /// 1-based line of the table the issue refers to; the header is line 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub message: String,
}

impl ImportIssue {
    pub fn warning(code: ImportIssueCode, row: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: ImportSeverity::Warning,
            code,
            row,
            message: message.into(),
        }
    }

    pub fn info(code: ImportIssueCode, row: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: ImportSeverity::Info,
            code,
            row,
            message: message.into(),
        }
    }

    /// A skipped row.
    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        Self::warning(ImportIssueCode::MalformedRow, Some(row), message)
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {}: {}", row, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSeverity {
    /// Data was not imported.
    Warning,
    /// A policy note; nothing was lost that the policy did not intend.
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportIssueCode {
    /// Row skipped: wrong column count, empty identity or bad points.
    MalformedRow,
    /// A later row replaced an earlier row with the same identity.
    DuplicateIdentity,
    /// A column is neither metadata nor a declared label key.
    UndeclaredColumn,
    /// ROI rows were present but no ROI mapping is registered.
    RoiMappingMissing,
    /// The table had no header row.
    EmptyTable,
}
