//! End-to-end conversion of a field workbook

use std::fs::{self, File};

use approx::assert_abs_diff_eq;
use ice_survey::api::{write_output, PointRecord};
use ice_survey::{
    ConfigurationManager, Converter, OutputFormat, SurveyError, SurveyKind, Workbook,
};
use tempfile::tempdir;

const WORKBOOK: &str = r#"{
  "worksheets": [
    {
      "name": "A Front Room",
      "rows": [
        {"Point": 1, "Azm": 0,   "Dist m": 4.0, "Inc": 0,   "Down m": null, "Back m": null, "Comment": "lip"},
        {"Point": 2, "Azm": 90,  "Dist m": 4.0, "Inc": 0,   "Down m": 1.5,  "Back m": "",   "Comment": ""},
        {"Point": 3, "Azm": 180, "Dist m": 4.0, "Inc": 0,   "Down m": 1.0,  "Back m": 0.5,  "Comment": ""},
        {"Point": 4, "Azm": "",  "Dist m": "",  "Inc": "",  "Down m": "",   "Back m": "",   "Comment": ""},
        {"Point": 5, "Azm": 270, "Dist m": 2.0, "Inc": -30, "Down m": 0,    "Back m": 0,    "Comment": "floor"}
      ]
    },
    {
      "name": "Tie-In",
      "rows": [
        {"From": "Datum", "To": "T1", "Dist m": 0, "Azm": 0, "Inc": 0, "Comment": "brass cap",
         "UTM East": 624250.0, "UTM North": 4618880.0, "Alt m": 1455.0},
        {"From": "B0", "To": "A0", "Dist m": 6.0, "Azm": 270, "Inc": 0, "Comment": ""},
        {"From": "T1", "To": "A0", "Dist m": 10.0, "Azm": 90, "Inc": 0, "Comment": ""}
      ]
    },
    {
      "name": "B Back Transect",
      "rows": [
        {"Point": 1, "Azm": 0, "Dist m": 3.0, "Inc": 90}
      ]
    }
  ]
}"#;

fn workbook() -> Workbook {
    Workbook::from_json_str(WORKBOOK).expect("workbook parses")
}

#[test]
fn resolves_tie_in_network_and_projects_surveys() {
    let conversion = Converter::default().convert(&workbook()).unwrap();

    // B0 is only reachable after A0 is placed in the first pass
    assert_eq!(conversion.report.passes, 2);
    let a0 = conversion.stations.point("A0").unwrap();
    assert_abs_diff_eq!(a0.x, 624260.0, epsilon = 1e-6);
    assert_abs_diff_eq!(a0.y, 4618880.0, epsilon = 1e-6);
    let b0 = conversion.stations.point("B0").unwrap();
    assert_abs_diff_eq!(b0.x, 624266.0, epsilon = 1e-6);
    assert_abs_diff_eq!(conversion.stations.point("Datum").unwrap().z, 1455.0, epsilon = 1e-9);

    let front = conversion.survey("A Front Room").unwrap();
    assert_eq!(front.kind, SurveyKind::Perimeter);
    let names: Vec<&str> = front.points.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(
        names,
        ["S_A01", "A02", "S_dA02", "A03", "dA03", "S_bA03", "S_A05"]
    );

    let back = &front.points[5];
    assert_abs_diff_eq!(back.x, 624260.0, epsilon = 1e-6);
    assert_abs_diff_eq!(back.y, 4618880.0 - 4.5, epsilon = 1e-6);
    assert_abs_diff_eq!(back.z, 1454.0, epsilon = 1e-6);

    let floor = &front.points[6];
    assert_abs_diff_eq!(floor.z, 1455.0 - 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(floor.x, 624260.0 - 3f64.sqrt(), epsilon = 1e-6);

    let transect = conversion.survey("B Back Transect").unwrap();
    assert_eq!(transect.kind, SurveyKind::Transect);
    assert_abs_diff_eq!(transect.points[0].x, 624266.0, epsilon = 1e-6);
    assert_abs_diff_eq!(transect.points[0].z, 1458.0, epsilon = 1e-6);
}

#[test]
fn too_few_passes_reports_unreachable_stations() {
    let mut manager = ConfigurationManager::new();
    manager.set_max_passes(1).unwrap();
    let err = Converter::try_new(manager.into_config())
        .unwrap()
        .convert(&workbook())
        .unwrap_err();

    assert!(matches!(err, SurveyError::UnderdeterminedNetwork { .. }));
    assert_eq!(err.unresolved_stations(), ["B0"]);
    let partial = err.partial_table().unwrap();
    assert!(partial.is_resolved("A0"));
    assert!(!partial.is_resolved("B0"));
}

#[test]
fn writes_surface_points_to_csv_file() {
    let dir = tempdir().unwrap();
    let workbook_path = dir.path().join("ice.json");
    fs::write(&workbook_path, WORKBOOK).unwrap();

    let mut manager = ConfigurationManager::new();
    manager.set_output_format(OutputFormat::NamedCsv);
    manager.set_surface_only(true);
    let converter = Converter::try_new(manager.into_config()).unwrap();

    let conversion = converter
        .convert(&Workbook::from_path(&workbook_path).unwrap())
        .unwrap();
    let output = &converter.config().output;
    let records = PointRecord::collect(&conversion, output.surface_only);
    assert!(records.iter().all(|r| r.name.starts_with("S_")));

    let csv_path = dir.path().join("ice_points.csv");
    write_output(output, &records, File::create(&csv_path).unwrap()).unwrap();

    let text = fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Survey,Name,X,Y,Z"));
    assert_eq!(lines.count(), records.len());
    assert!(text.contains("A Front Room,S_bA03,"));
    assert!(!text.contains(",A02,"));
}

#[test]
fn writes_json_records() {
    let mut manager = ConfigurationManager::new();
    manager.set_output_format(OutputFormat::Json);
    let converter = Converter::try_new(manager.into_config()).unwrap();
    let conversion = converter.convert(&workbook()).unwrap();
    let records = PointRecord::collect(&conversion, false);

    let mut buffer = Vec::new();
    write_output(&converter.config().output, &records, &mut buffer).unwrap();
    let parsed: Vec<PointRecord> = serde_json::from_slice(&buffer).unwrap();
    assert_eq!(parsed.len(), 8);
    for (read, written) in parsed.iter().zip(&records) {
        assert_eq!(read.survey, written.survey);
        assert_eq!(read.name, written.name);
        assert_abs_diff_eq!(read.x, written.x, epsilon = 1e-6);
        assert_abs_diff_eq!(read.y, written.y, epsilon = 1e-6);
        assert_abs_diff_eq!(read.z, written.z, epsilon = 1e-6);
    }
}

#[test]
fn missing_workbook_file_is_reported() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Workbook::from_path(dir.path().join("absent.json")),
        Err(SurveyError::WorkbookRead { .. })
    ));
}
