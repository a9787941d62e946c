use std::path::Path;

use tanklog_core::FuelReceiptRecord;

use crate::commands::common::{
    format_record_detail, format_record_lines, image_content_type, record_to_list_item,
    station_label,
};
use crate::commands::config::normalize_api_base_url;
use crate::error::CliError;

fn sample_record() -> FuelReceiptRecord {
    FuelReceiptRecord {
        id: 42,
        station_name: Some("Shell Downtown".to_string()),
        station_brand: Some("Shell".to_string()),
        amount: Some(54.2),
        liters: Some(31.5),
        price_per_liter: Some(1.72),
        receipt_image_url: Some("https://cdn.example.com/receipt.jpg".to_string()),
        location: Some("Springfield".to_string()),
        purchase_date: Some("2026-08-01".to_string()),
        created_at: "2026-08-01T10:00:00Z".to_string(),
        ocr_processed: true,
        ocr_confidence: Some(0.93),
    }
}

#[test]
fn image_content_type_by_extension() {
    assert_eq!(image_content_type(Path::new("a.jpg")).unwrap(), "image/jpeg");
    assert_eq!(image_content_type(Path::new("a.JPEG")).unwrap(), "image/jpeg");
    assert_eq!(image_content_type(Path::new("a.png")).unwrap(), "image/png");
    assert_eq!(image_content_type(Path::new("a.webp")).unwrap(), "image/webp");
    assert!(matches!(
        image_content_type(Path::new("a.pdf")),
        Err(CliError::UnsupportedImageType(_))
    ));
    assert!(image_content_type(Path::new("noextension")).is_err());
}

#[test]
fn station_label_falls_back_to_brand_then_placeholder() {
    let mut record = sample_record();
    assert_eq!(station_label(&record), "Shell Downtown");

    record.station_name = None;
    assert_eq!(station_label(&record), "Shell");

    record.station_brand = None;
    assert_eq!(station_label(&record), "(unknown station)");
}

#[test]
fn record_lines_include_id_station_and_amount() {
    let lines = format_record_lines(&[sample_record()]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("42"));
    assert!(lines[0].contains("Shell Downtown"));
    assert!(lines[0].contains("54.20"));
    assert!(lines[0].contains("31.5L"));
}

#[test]
fn record_lines_render_missing_fields_as_dashes() {
    let record = FuelReceiptRecord {
        id: 7,
        station_name: None,
        station_brand: None,
        amount: None,
        liters: None,
        price_per_liter: None,
        receipt_image_url: None,
        location: None,
        purchase_date: None,
        created_at: "2026-08-02T09:00:00Z".to_string(),
        ocr_processed: false,
        ocr_confidence: None,
    };
    let lines = format_record_lines(&[record]);
    assert!(lines[0].contains('-'));
    assert!(lines[0].contains("2026-08-02T09:00:00Z"));
}

#[test]
fn record_detail_reports_ocr_confidence() {
    let lines = format_record_detail(&sample_record());
    assert!(lines.iter().any(|line| line.contains("93% confidence")));
    assert!(lines.iter().any(|line| line.contains("31.50 L @ 1.720")));
}

#[test]
fn record_detail_reports_pending_ocr() {
    let mut record = sample_record();
    record.ocr_processed = false;
    record.ocr_confidence = None;
    let lines = format_record_detail(&record);
    assert!(lines.iter().any(|line| line.contains("pending")));
}

#[test]
fn list_item_serializes_station_label() {
    let item = record_to_list_item(&sample_record());
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["station"], "Shell Downtown");
    assert_eq!(json["id"], 42);
}

#[test]
fn normalize_api_base_url_requires_http_scheme() {
    assert_eq!(
        normalize_api_base_url("https://api.example.com/".to_string()).unwrap(),
        "https://api.example.com"
    );
    assert!(normalize_api_base_url("api.example.com".to_string()).is_err());
}

#[test]
fn retry_hint_points_auth_rejections_at_login() {
    let rejected = CliError::Core(tanklog_core::error::api_error(401, ""));
    let hint = crate::retry_hint(&rejected).unwrap();
    assert!(hint.contains("tanklog auth login"));

    let duplicate = CliError::Core(tanklog_core::Error::DuplicateRequest("upload".to_string()));
    assert!(crate::retry_hint(&duplicate).is_none());
}
