//! Processing log and output archive.
//!
//! Both run after every file of a batch has settled. Failures here never
//! touch the image outputs already on disk.

use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ReportError;
use crate::types::ProcessingResult;

/// Columns of the processing log, in order.
pub const LOG_HEADER: [&str; 5] = ["timestamp", "source_file", "output_file", "status", "error"];

/// Timestamp layout of the log: ISO 8601 with microseconds, local time.
const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Deflate level used for archives.
const ARCHIVE_COMPRESSION_LEVEL: i64 = 6;

/// Serialize results as CSV, header row first.
pub fn to_csv(results: &[ProcessingResult]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(LOG_HEADER)?;
    for result in results {
        writer.write_record([
            result.timestamp.format(LOG_TIMESTAMP_FORMAT).to_string(),
            result.source.display().to_string(),
            result.output_field(),
            result.log_status().to_string(),
            result.error.clone(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

/// Write the processing log to `output_dir/file_name`, returning its path.
pub fn write_log(
    output_dir: &Path,
    file_name: &str,
    results: &[ProcessingResult],
) -> Result<PathBuf, ReportError> {
    if !output_dir.is_dir() {
        return Err(ReportError::NotADirectory(output_dir.to_path_buf()));
    }
    let path = output_dir.join(file_name);
    let bytes = to_csv(results)?;
    std::fs::write(&path, bytes)?;
    tracing::info!("Processing log saved to {:?}", path);
    Ok(path)
}

/// `<prefix>_<YYYY-MM-DD_hh-MMAM>.zip`, local time.
pub fn default_archive_name(prefix: &str) -> String {
    format!("{}_{}.zip", prefix, Local::now().format("%Y-%m-%d_%I-%M%p"))
}

/// Zip every file below `source_dir` into `source_dir/name`.
///
/// Entries are stored at their path relative to `source_dir` with forward
/// slashes. The archive never contains itself.
pub fn archive(source_dir: &Path, name: Option<&str>, prefix: &str) -> Result<PathBuf, ReportError> {
    if !source_dir.is_dir() {
        return Err(ReportError::NotADirectory(source_dir.to_path_buf()));
    }

    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| default_archive_name(prefix));
    let zip_path = source_dir.join(name);

    let file = File::create(&zip_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(ARCHIVE_COMPRESSION_LEVEL));

    let mut entries = 0usize;
    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ReportError::Io(e.into()))?;
        if !entry.file_type().is_file() || entry.path() == zip_path {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .unwrap_or_else(|_| entry.path());
        let entry_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(entry_name, options)?;
        let mut input = File::open(entry.path())?;
        std::io::copy(&mut input, &mut zip)?;
        entries += 1;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    tracing::info!("ZIP archive created: {:?} ({} files)", zip_path, entries);
    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DRY_RUN_PLACEHOLDER, SKIPPED_PLACEHOLDER};
    use std::io::Read;
    use std::time::Duration;

    fn sample_results() -> Vec<ProcessingResult> {
        vec![
            ProcessingResult::success(
                PathBuf::from("in/a.jpg"),
                vec![PathBuf::from("out/a.jpg"), PathBuf::from("out/a.webp")],
                false,
                Duration::from_millis(12),
            ),
            ProcessingResult::skipped(PathBuf::from("in/b.png"), Duration::ZERO),
            ProcessingResult::failure(
                PathBuf::from("in/c.bmp"),
                "Decode error for in/c.bmp: bad header, truncated",
                false,
                Duration::ZERO,
            ),
            ProcessingResult::success(PathBuf::from("in/d.png"), vec![], true, Duration::ZERO),
        ]
    }

    fn parse(bytes: &[u8]) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes)
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_csv_rows() {
        let rows = parse(&to_csv(&sample_results()).unwrap());
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), LOG_HEADER.to_vec());

        assert_eq!(&rows[1][1], "in/a.jpg");
        assert_eq!(&rows[1][2], "out/a.jpg; out/a.webp");
        assert_eq!(&rows[1][3], "SUCCESS");
        assert_eq!(&rows[1][4], "");

        assert_eq!(&rows[2][2], SKIPPED_PLACEHOLDER);
        assert_eq!(&rows[2][3], "SUCCESS");

        assert_eq!(&rows[3][3], "ERROR");
        assert_eq!(&rows[3][4], "Decode error for in/c.bmp: bad header, truncated");

        assert_eq!(&rows[4][2], DRY_RUN_PLACEHOLDER);
    }

    #[test]
    fn test_csv_timestamp_layout() {
        let rows = parse(&to_csv(&sample_results()[..1]).unwrap());
        let stamp = &rows[1][0];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, LOG_TIMESTAMP_FORMAT).is_ok());
        assert_eq!(stamp.len(), "2024-01-02T03:04:05.123456".len());
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        let rows = parse(&to_csv(&[]).unwrap());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_write_log_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_log(&dir.path().join("missing"), "log.csv", &sample_results()).unwrap_err();
        assert!(matches!(err, ReportError::NotADirectory(_)));

        let path = write_log(dir.path(), "log.csv", &sample_results()).unwrap();
        assert_eq!(path, dir.path().join("log.csv"));
        assert_eq!(parse(&std::fs::read(&path).unwrap()).len(), 5);
    }

    #[test]
    fn test_default_archive_name() {
        let name = default_archive_name("watermarked_batch");
        assert!(name.starts_with("watermarked_batch_"));
        assert!(name.ends_with("M.zip"));
        // watermarked_batch_YYYY-MM-DD_hh-MMAM.zip
        assert_eq!(name.len(), "watermarked_batch_".len() + "2024-01-02_03-04PM".len() + 4);
    }

    #[test]
    fn test_archive_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub").join("deep")).unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"aaaa").unwrap();
        std::fs::write(dir.path().join("sub").join("b.png"), b"bbbb").unwrap();
        std::fs::write(dir.path().join("sub").join("deep").join("c.webp"), b"cccc").unwrap();

        let path = archive(dir.path(), Some("batch.zip"), "unused").unwrap();
        assert_eq!(path, dir.path().join("batch.zip"));

        let mut zip = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "sub/b.png", "sub/deep/c.webp"]);

        let mut content = String::new();
        zip.by_name("sub/deep/c.webp")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "cccc");
    }

    #[test]
    fn test_archive_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = archive(&dir.path().join("nope"), None, "batch").unwrap_err();
        assert!(matches!(err, ReportError::NotADirectory(_)));
    }
}
