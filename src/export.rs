//! Export a model response to a document format.
//!
//! An export is two explicit steps:
//!
//! 1. **Persist** `<base>.md` with exactly the response text. Always runs
//!    first, whatever format was asked for.
//! 2. **Convert** to the requested format: `md` is already done by step 1;
//!    `xlsx` is built in-process (one sheet, a `Response` header and the
//!    text in the cell below); txt/pptx/docx are delegated to the external
//!    converter (`pandoc <base>.md -o <base>.<ext>`).
//!
//! A failure in step 2 leaves the Markdown copy from step 1 in place.
//! Existing files with the same names are overwritten.

use crate::config::{ExportFormat, SessionConfig};
use crate::error::PdfChatError;
use crate::process::CommandSpec;
use crate::xlsx::Workbook;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Header cell of the spreadsheet export.
pub const SPREADSHEET_HEADER: &str = "Response";

/// Sheet name of the spreadsheet export.
pub const SPREADSHEET_SHEET_NAME: &str = "Output";

/// The files an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub markdown_path: PathBuf,
    pub artifact_path: PathBuf,
    pub format: ExportFormat,
}

/// `<base>.<ext>`; the base name is used as given (it may include a directory).
pub fn artifact_path(base_name: &str, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", base_name, format.extension()))
}

/// Persist `response` as `<base>.md`, then convert it to `format`.
pub async fn export_response(
    response: &str,
    base_name: &str,
    format: ExportFormat,
    config: &SessionConfig,
) -> Result<ExportReport, PdfChatError> {
    let markdown_path = persist_markdown(response, base_name).await?;
    let artifact = artifact_path(base_name, format);

    if format.is_delegated() {
        delegate_to_converter(&config.converter_program, &markdown_path, &artifact).await?;
    } else if format == ExportFormat::Xlsx {
        write_spreadsheet(response, &artifact).await?;
    }

    info!("Exported response to {}", artifact.display());
    Ok(ExportReport {
        markdown_path,
        artifact_path: artifact,
        format,
    })
}

/// Step 1: write `<base>.md` containing exactly `response`.
pub async fn persist_markdown(response: &str, base_name: &str) -> Result<PathBuf, PdfChatError> {
    let path = artifact_path(base_name, ExportFormat::Md);
    tokio::fs::write(&path, response)
        .await
        .map_err(|e| PdfChatError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    Ok(path)
}

/// Step 2 for txt/pptx/docx.
async fn delegate_to_converter(
    program: &str,
    markdown_path: &Path,
    artifact: &Path,
) -> Result<(), PdfChatError> {
    let output = CommandSpec::new(program)
        .arg(markdown_path.to_string_lossy())
        .arg("-o")
        .arg(artifact.to_string_lossy())
        .run(None)
        .await?;

    if !output.success() {
        let stderr = output.stderr_lossy();
        warn!("{} exited with {}: {}", program, output.status, stderr.trim());
        return Err(PdfChatError::ConverterFailed {
            program: program.to_string(),
            status: output.status,
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(())
}

/// Step 2 for xlsx.
async fn write_spreadsheet(response: &str, artifact: &Path) -> Result<(), PdfChatError> {
    let mut workbook = Workbook::new(SPREADSHEET_SHEET_NAME);
    workbook.append([SPREADSHEET_HEADER]).append([response]);

    let path = artifact.to_path_buf();
    tokio::task::spawn_blocking(move || workbook.save(&path))
        .await
        .map_err(|e| PdfChatError::Internal(format!("Spreadsheet task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_in(dir: &Path, name: &str) -> String {
        dir.join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn artifact_uses_base_and_extension() {
        assert_eq!(artifact_path("notes", ExportFormat::Docx), PathBuf::from("notes.docx"));
        assert_eq!(artifact_path("out/v1", ExportFormat::Txt), PathBuf::from("out/v1.txt"));
    }

    #[tokio::test]
    async fn markdown_survives_converter_failure() {
        let dir = tempfile::tempdir().unwrap();
        let base = base_in(dir.path(), "answer");
        let config = SessionConfig::builder()
            .converter_program("/definitely/not/pandoc")
            .build()
            .unwrap();

        let err = export_response("The answer is 42.", &base, ExportFormat::Docx, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PdfChatError::CommandSpawnFailed { .. }));
        let md = std::fs::read_to_string(dir.path().join("answer.md")).unwrap();
        assert_eq!(md, "The answer is 42.");
        assert!(!dir.path().join("answer.docx").exists());
    }

    #[tokio::test]
    async fn xlsx_does_not_need_converter() {
        let dir = tempfile::tempdir().unwrap();
        let base = base_in(dir.path(), "sheet");
        let config = SessionConfig::builder()
            .converter_program("/definitely/not/pandoc")
            .build()
            .unwrap();

        let report = export_response("cell text", &base, ExportFormat::Xlsx, &config)
            .await
            .unwrap();

        assert_eq!(report.artifact_path, dir.path().join("sheet.xlsx"));
        assert!(report.artifact_path.exists());
        assert_eq!(std::fs::read_to_string(report.markdown_path).unwrap(), "cell text");
    }

    #[tokio::test]
    async fn export_overwrites_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = base_in(dir.path(), "again");
        std::fs::write(dir.path().join("again.md"), "old and much longer content").unwrap();

        persist_markdown("new", &base).await.unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("again.md")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn md_export_keeps_response_verbatim() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        // Re-wraps its input at 20 columns, like pandoc reflowing Markdown.
        let converter = dir.path().join("rewrap");
        std::fs::write(&converter, "#!/bin/sh\nfold -w 20 \"$1\" > \"$3.out\" && mv \"$3.out\" \"$3\"\n").unwrap();
        std::fs::set_permissions(&converter, std::fs::Permissions::from_mode(0o755)).unwrap();
        let config = SessionConfig::builder()
            .converter_program(converter.to_string_lossy())
            .build()
            .unwrap();
        let response = "* a list item that is long enough to be re-wrapped by the converter";

        let report = export_response(response, &base_in(dir.path(), "ans"), ExportFormat::Md, &config)
            .await
            .unwrap();

        assert_eq!(report.artifact_path, dir.path().join("ans.md"));
        assert_eq!(std::fs::read_to_string(dir.path().join("ans.md")).unwrap(), response);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn converter_non_zero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let base = base_in(dir.path(), "fail");
        let config = SessionConfig::builder().converter_program("false").build().unwrap();

        let err = export_response("x", &base, ExportFormat::Pptx, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PdfChatError::ConverterFailed { .. }));
        assert!(dir.path().join("fail.md").exists());
    }
}
