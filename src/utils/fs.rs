//! IO helper: JSON file import

use std::{fs::File, io::BufReader, path::Path};

use serde_json::Value;
use crate::model::data_core::AppError;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, AppError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: Value = serde_json::from_reader(rdr)?;
    Ok(v)
}

/// 解析用户粘贴/上传的JSON文本
pub fn parse_json_text(text: &str) -> Result<Value, AppError> {
    Ok(serde_json::from_str(text)?)
}

/// 文件名（用于“Selected: xxx”展示）
pub fn display_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_valid_file() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(br#"{"a": [1, 2]}"#).unwrap();
        let v = read_json_file(f.path()).unwrap();
        assert_eq!(v["a"][1], 2);
    }

    #[test]
    fn test_read_invalid_file_is_parse_error() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"{not json").unwrap();
        assert!(matches!(read_json_file(f.path()), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let missing = PathBuf::from("/definitely/not/here.json");
        assert!(matches!(read_json_file(&missing), Err(AppError::Io(_))));
    }

    #[test]
    fn test_parse_json_text() {
        assert!(parse_json_text("[1, 2, 3]").unwrap().is_array());
        assert!(parse_json_text("").is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/data/people.json")), "people.json");
    }
}
