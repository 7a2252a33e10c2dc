use std::fs;

use lib::publish::encode_record;
use lib::{
    BuildingRecord, MessageSink, PipelineError, RawTable, Result, clean, extract_table,
    publish_with, write_json,
};

const PAGE: &str = r#"<html><body>
<table class="navbox"><tr><th>Навигация</th></tr></table>
<table class="wikitable sortable">
  <tr>
    <th>№</th><th>Название</th><th>Город</th><th>Высота<br>(м)</th><th>Высота (фут)</th><th>Этажность</th>
  </tr>
  <tr><td>1</td><td>Бурдж-Халифа<sup>[1]</sup></td><td>Дубай</td><td>828</td><td>2717</td><td>163</td></tr>
  <tr><td colspan="6">Строящиеся</td></tr>
  <tr><td>2</td><td>Merdeka 118[2]</td><td>Куала-Лумпур</td><td>678,9</td><td>2227</td><td>118</td></tr>
  <tr><td>3</td><td></td><td>Шанхай</td><td>632</td><td>2073</td><td>128</td></tr>
  <tr><td>4</td><td>Абрадж аль-Бейт</td><td>Мекка</td><td>601 м</td><td>1972</td><td>120</td></tr>
</table>
</body></html>"#;

fn expected() -> Vec<BuildingRecord> {
    vec![
        BuildingRecord {
            rank: 1,
            building_name: "бурдж-халифа".into(),
            city: "дубай".into(),
            height_meters: 828.0,
        },
        BuildingRecord {
            rank: 2,
            building_name: "merdeka 118".into(),
            city: "куала-лумпур".into(),
            height_meters: 678.0,
        },
        BuildingRecord {
            rank: 4,
            building_name: "абрадж аль-бейт".into(),
            city: "мекка".into(),
            height_meters: 601.0,
        },
    ]
}

#[derive(Default)]
struct MemorySink {
    payloads: Vec<Vec<u8>>,
}

impl MessageSink for MemorySink {
    fn send(&mut self, _topic: &str, payload: &[u8]) -> Result<()> {
        self.payloads.push(payload.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[test]
fn page_to_file_and_messages() {
    let table = extract_table(PAGE, "wikitable", 20).unwrap();
    assert_eq!(table.rows.len(), 4);

    let records = clean(table);
    assert_eq!(records, expected());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned_data.json");
    write_json(&records, &path).unwrap();
    let back: Vec<BuildingRecord> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, records);

    let mut sink = MemorySink::default();
    assert_eq!(publish_with(&mut sink, &records, "bonus").unwrap(), 3);
    let sent: Vec<Vec<u8>> = records.iter().map(|r| encode_record(r).unwrap()).collect();
    assert_eq!(sink.payloads, sent);
}

#[test]
fn worked_example_keeps_only_complete_row() {
    let table = RawTable::new(
        vec!["№".into(), "Название".into(), "Город".into(), "Высота (м)".into()],
        vec![
            vec!["1".into(), "Burj Khalifa[1]".into(), "Dubai".into(), "828".into()],
            vec!["2".into(), "".into(), "Shanghai".into(), "632".into()],
        ],
    );

    let records = clean(table);
    assert_eq!(
        records,
        vec![BuildingRecord {
            rank: 1,
            building_name: "burj khalifa".into(),
            city: "dubai".into(),
            height_meters: 828.0,
        }]
    );

    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "Rank": 1,
            "Building_Name": "burj khalifa",
            "City": "dubai",
            "Height_Meters": 828.0
        })
    );
}

#[test]
fn page_without_height_column_cleans_to_nothing() {
    let page = r#"<table class="wikitable"><tr><th>№</th><th>Название</th><th>Город</th></tr>
        <tr><td>1</td><td>A</td><td>B</td></tr></table>"#;
    let table = extract_table(page, "wikitable", 20).unwrap();
    assert!(clean(table).is_empty());
}

#[test]
fn page_without_marked_table_is_not_found() {
    let err = extract_table("<table><tr><th>a</th></tr></table>", "wikitable", 20).unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));
}
