use crate::error::Result;
use crate::structs::BuildingRecord;
use log::info;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const INDENT: &[u8] = b"    ";

/// Writes building records to a pretty-formatted JSON file.
///
/// The file holds a single array of objects in record order, indented with
/// four spaces. Non-ASCII text is written as-is. An existing file at
/// `output_path` is overwritten.
///
/// # Arguments
/// * `records` - Slice of cleaned records
/// * `output_path` - Path where the JSON file will be created
///
/// # Returns
/// Returns `Ok(())` on success.
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_json(records: &[BuildingRecord], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer)?;
    writer.flush()?;
    info!("Data saved to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Vec<BuildingRecord> {
        vec![
            BuildingRecord {
                rank: 1,
                building_name: "бурдж-халифа".to_string(),
                city: "дубай".to_string(),
                height_meters: 828.0,
            },
            BuildingRecord {
                rank: 2,
                building_name: "merdeka 118".to_string(),
                city: "kuala lumpur".to_string(),
                height_meters: 678.9,
            },
        ]
    }

    #[test]
    fn writes_literal_utf8_with_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_data.json");
        write_json(&sample(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"Rank\": 1,"));
        assert!(text.contains("\"Building_Name\": \"бурдж-халифа\""));
        assert!(!text.contains("\\u"));

        let rank = text.find("\"Rank\"").unwrap();
        let name = text.find("\"Building_Name\"").unwrap();
        let city = text.find("\"City\"").unwrap();
        let height = text.find("\"Height_Meters\"").unwrap();
        assert!(rank < name && name < city && city < height);
    }

    #[test]
    fn reparsed_file_matches_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&sample(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let back: Vec<BuildingRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "stale content that is longer than an empty array").unwrap();

        write_json(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = write_json(&sample(), &path).unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Io(_)));
    }
}
