use crate::error::UploadError;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "json", "xlsx"];

/// Lower-cased text after the last dot, if the name has one.
pub fn file_extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

pub fn is_allowed(name: &str) -> bool {
    file_extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn validate(name: &str) -> Result<(), UploadError> {
    if is_allowed(name) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedFileType(
            file_extension(name).unwrap_or_default(),
        ))
    }
}

/// MIME type sent with the multipart file part.
pub fn content_type(name: &str) -> &'static str {
    match file_extension(name).as_deref() {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_in_any_case() {
        for name in [
            "data.csv",
            "DATA.CSV",
            "report.Json",
            "sheet.xlsx",
            "sheet.XLSX",
            "archive.2024.csv",
            ".csv",
        ] {
            assert!(is_allowed(name), "{name} should be accepted");
            assert!(validate(name).is_ok());
        }
    }

    #[test]
    fn rejects_everything_else() {
        for name in ["notes.txt", "data.xls", "data.csv.zip", "csv", "data.", "", "data.cs v"] {
            assert!(!is_allowed(name), "{name} should be rejected");
        }
    }

    #[test]
    fn rejection_carries_the_offending_extension() {
        match validate("notes.TXT") {
            Err(UploadError::UnsupportedFileType(ext)) => assert_eq!(ext, "txt"),
            other => panic!("unexpected: {:?}", other),
        }
        match validate("README") {
            Err(UploadError::UnsupportedFileType(ext)) => assert!(ext.is_empty()),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.CSV"), "text/csv");
        assert_eq!(content_type("a.json"), "application/json");
        assert_eq!(
            content_type("a.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(content_type("a.bin"), "application/octet-stream");
    }
}
