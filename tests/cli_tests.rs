use assert_cmd::prelude::*;
use mess::ReportView;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn mess_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mess"));
    cmd.env_remove("MESS_API_TOKEN").env_remove("RUST_LOG");
    cmd
}

fn init(config_path: &Path) {
    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
}

fn write_view(config_path: &Path, view: &str) {
    fs::write(config_path.join("view.json"), view).unwrap();
}

const INVENTORY_VIEW: &str = r#"{
  "report_type": "inventory",
  "latest_seq": 1,
  "filter": { "report_type": "inventory", "low_stock_only": true },
  "result": {
    "report_type": "inventory",
    "data": {
      "itemStocks": [
        { "id": 1, "name": "Basmati Rice", "category": "grains", "unit": "kg", "current_stock": 120.0, "minimum_stock": 50.0 },
        { "id": 2, "name": "Toor Dal", "category": "pulses", "unit": "kg", "current_stock": 15.0, "minimum_stock": 25.0 },
        { "id": 3, "name": "Sunflower Oil", "category": "oils", "unit": "l", "current_stock": 10.0, "minimum_stock": 10.0, "unit_price": 140.0 }
      ],
      "totalValue": 9850.0
    }
  }
}"#;

#[test]
fn test_help() {
    mess_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mess billing and report client"));
}

#[test]
fn test_version() {
    mess_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mess"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized mess config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("exports").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");

    init(&config_path);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mess Status"))
        .stdout(predicate::str::contains("http://localhost:8000/api"))
        .stdout(predicate::str::contains("Token:            not set"))
        .stdout(predicate::str::contains("Loaded report:    none"));
}

#[test]
fn test_token_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .env("MESS_API_TOKEN", "secret")
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token:            set"));
}

#[test]
fn test_report_unknown_type() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report", "payroll"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown report type 'payroll'"));
}

#[test]
fn test_report_consumption_requires_date_range() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "report", "consumption"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid date range: consumption reports require --from and --to",
        ));

    // Nothing was dispatched, so no view was recorded
    assert!(!config_path.join("view.json").exists());
}

#[test]
fn test_report_menu_half_range() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "report",
            "menu",
            "--from",
            "2024-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("both --from and --to are required"));
}

#[test]
fn test_report_expense_invalid_month() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "report",
            "expense",
            "--month",
            "13",
            "--year",
            "2024",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid month"));
}

#[test]
fn test_generate_bills_invalid_period() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "generate-bills",
            "--month",
            "0",
            "--year",
            "2024",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid month"));
}

#[test]
fn test_show_low_stock_inventory() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);
    write_view(&config_path, INVENTORY_VIEW);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inventory (low stock)"))
        .stdout(predicate::str::contains("Toor Dal"))
        .stdout(predicate::str::contains("Sunflower Oil"))
        .stdout(predicate::str::contains("Basmati Rice").not())
        .stdout(predicate::str::contains("Stock value: 9,850.00"));
}

#[test]
fn test_show_without_report() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No report loaded"));
}

#[test]
fn test_export_writes_header_and_rows() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);
    write_view(&config_path, INVENTORY_VIEW);

    let out = temp_dir.path().join("inventory.csv");
    mess_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "export",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 rows"));

    // The stored view is low-stock only, so Basmati Rice is left out
    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        r#""id","name","category","unit","current_stock","minimum_stock","unit_price""#
    );
    assert_eq!(lines[1], r#""2","Toor Dal","pulses","kg",15,25,"#);
    assert_eq!(lines[2], r#""3","Sunflower Oil","oils","l",10,10,140"#);
}

#[test]
fn test_export_default_path_in_export_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);
    write_view(&config_path, INVENTORY_VIEW);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory-report-"));

    let exported: Vec<_> = fs::read_dir(config_path.join("exports"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(exported.len(), 1);
    assert!(exported[0].starts_with("inventory-report-"));
    assert!(exported[0].ends_with(".csv"));
}

#[test]
fn test_export_empty_report_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);
    write_view(
        &config_path,
        r#"{
  "report_type": "expense",
  "latest_seq": 4,
  "filter": { "report_type": "expense", "month": 3, "year": 2024 },
  "result": { "report_type": "expense", "data": { "totalExpense": 0.0 } }
}"#,
    );

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nothing to export: expense report is empty.",
        ));

    assert_eq!(fs::read_dir(config_path.join("exports")).unwrap().count(), 0);
}

#[test]
fn test_export_without_report() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);

    mess_cmd()
        .args(["-C", config_path.to_str().unwrap(), "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to export: no report loaded."));

    assert_eq!(fs::read_dir(config_path.join("exports")).unwrap().count(), 0);
}

#[test]
fn test_failed_fetch_keeps_previous_report() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mess-config");
    init(&config_path);
    fs::write(
        config_path.join("config.toml"),
        "[api]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n",
    )
    .unwrap();
    write_view(&config_path, INVENTORY_VIEW);

    mess_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "report",
            "inventory",
            "--low-stock",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request to http://127.0.0.1:9/mess/reports/inventory failed"));

    let view: ReportView =
        serde_json::from_str(&fs::read_to_string(config_path.join("view.json")).unwrap()).unwrap();
    let original: ReportView = serde_json::from_str(INVENTORY_VIEW).unwrap();
    assert!(view.result.is_some());
    assert_eq!(view.result, original.result);
    assert_eq!(view.filter, original.filter);
    assert_eq!(view.latest_seq, 2);
}
