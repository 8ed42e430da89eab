use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Context;

use crate::types::OutputRow;

pub const COLUMN_HEADERS: [&str; 4] = ["Place", "Runner", "Run Link", "Video Link"];

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Append one category block: a single-cell row with the category name, the
/// column header row, then the data rows. Existing content is never touched.
pub fn append_category(path: &Path, category: &str, rows: &[OutputRow]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {} for append", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);
    writer.write_record([category])?;
    writer.write_record(COLUMN_HEADERS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Place;
    use tempfile::tempdir;

    fn row(place: Place, runner: &str, video: &str) -> OutputRow {
        OutputRow {
            place,
            runner: runner.to_string(),
            run_link: "https://www.speedrun.com/run/r1".to_string(),
            video_link: video.to_string(),
        }
    }

    #[test]
    fn writes_header_block_then_rows() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out").join("leaderboard_x.csv");

        append_category(
            &path,
            "Any%",
            &[row(Place::Rank(1), "alpha", "https://twitch.tv/a")],
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Any%\r\nPlace,Runner,Run Link,Video Link\r\n1,alpha,https://www.speedrun.com/run/r1,https://twitch.tv/a\r\n"
        );
    }

    #[test]
    fn appends_without_truncating() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("leaderboard_x.csv");

        append_category(&path, "Any%", &[]).unwrap();
        append_category(&path, "Any%", &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Place,Runner,Run Link,Video Link").count(), 2);
    }

    #[test]
    fn quotes_embedded_commas_and_quotes() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("leaderboard_x.csv");

        append_category(
            &path,
            "100%, No Clips",
            &[row(Place::NotApplicable, "the \"fast\" one", "https://twitch.tv/a")],
        )
        .unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][0], "100%, No Clips");
        assert_eq!(&records[2][0], "N/A");
        assert_eq!(&records[2][1], "the \"fast\" one");
    }
}
