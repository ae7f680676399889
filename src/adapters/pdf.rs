//! Black-box PDF conversion through a headless LibreOffice instance.

use crate::utils::error::{KinolistError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

fn soffice_binary() -> String {
    std::env::var("SOFFICE_PATH").unwrap_or_else(|_| "soffice".to_string())
}

/// Convert a finished document to PDF next to it and return the PDF path.
pub async fn convert_to_pdf(docx_path: &Path) -> Result<PathBuf> {
    convert_with(&soffice_binary(), docx_path).await
}

async fn convert_with(binary: &str, docx_path: &Path) -> Result<PathBuf> {
    let out_dir = docx_path.parent().unwrap_or_else(|| Path::new("."));
    tracing::info!("Converting {} to PDF", docx_path.display());

    let output = Command::new(binary)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(out_dir)
        .arg(docx_path)
        .output()
        .await
        .map_err(|err| KinolistError::PdfError {
            message: format!("cannot launch {binary}: {err}"),
        })?;

    if !output.status.success() {
        return Err(KinolistError::PdfError {
            message: format!(
                "{binary} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let pdf_path = docx_path.with_extension("pdf");
    if !pdf_path.exists() {
        return Err(KinolistError::PdfError {
            message: format!("converter produced no output for {}", docx_path.display()),
        });
    }
    Ok(pdf_path)
}
