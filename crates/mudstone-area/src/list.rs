//! The area list: one file name per line, terminated by `$`.

use std::fs;
use std::path::Path;

use crate::error::{AreaError, AreaResult};

/// Reads `area.lst`. Missing terminator is boot-fatal, matching the
/// original loader.
pub fn read_area_list(path: &Path) -> AreaResult<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| AreaError::io(path, e))?;
    let mut files = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        if line == "$" {
            return Ok(files);
        }
        files.push(line.to_string());
    }
    Err(AreaError::UnterminatedList {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn list_reads_until_dollar() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "plaza.are\nkeep.json\n* comment\n$\nignored.are").unwrap();
        let files = read_area_list(file.path()).unwrap();
        assert_eq!(files, vec!["plaza.are", "keep.json"]);
    }

    #[test]
    fn missing_terminator_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "plaza.are").unwrap();
        assert!(matches!(
            read_area_list(file.path()),
            Err(AreaError::UnterminatedList { .. })
        ));
    }
}
