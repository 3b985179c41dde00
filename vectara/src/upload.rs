use std::path::Path;
use vectara_core::operation::FileUpload;

/// Reads `path` into an upload named after the file.
pub async fn read_file(path: &Path) -> std::io::Result<FileUpload> {
    let bytes = tokio::fs::read(path).await?;

    Ok(FileUpload {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string()),
        content_type: content_type_of(path).map(str::to_string),
        bytes,
    })
}

/// Mime type for the common document extensions; the platform sniffs the rest.
pub fn content_type_of(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "md" => Some("text/markdown"),
        "json" => Some("application/json"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}
