use std::path::Path;

use serde::Serialize;

use tanklog_core::config::ApiConfig;
use tanklog_core::auth::AuthClient;
use tanklog_core::records::FuelRecordClient;
use tanklog_core::session::{restore_from_store, AuthState};
use tanklog_core::util::unix_timestamp_now;
use tanklog_core::FuelReceiptRecord;

use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;
use crate::store::KeyringTokenStore;

/// Profile-resolved backend context for a command invocation.
pub struct Backend {
    pub profile_name: String,
    pub config: ApiConfig,
    pub store: KeyringTokenStore,
}

impl Backend {
    /// Resolve the active profile and its API configuration.
    pub fn resolve(explicit_profile: Option<&str>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(explicit_profile);
        let api_base_url = profiles
            .profile(&profile_name)
            .and_then(CliProfile::api_base_url);
        let config = ApiConfig::resolve(api_base_url)?;

        Ok(Self {
            store: KeyringTokenStore::new(&profile_name),
            profile_name,
            config,
        })
    }

    pub fn auth_client(&self) -> Result<AuthClient<KeyringTokenStore>, CliError> {
        Ok(AuthClient::new(self.config.auth_url(), self.store.clone())?)
    }

    pub fn record_client(&self) -> Result<FuelRecordClient<KeyringTokenStore>, CliError> {
        Ok(FuelRecordClient::new(
            self.config.records_url(),
            self.store.clone(),
        )?)
    }

    /// Restore the persisted session, failing when none is valid.
    ///
    /// Authenticated commands run this before touching the network so an
    /// expired session surfaces as a login prompt instead of a 401.
    pub fn require_session(&self) -> Result<AuthState, CliError> {
        let mut state = AuthState::new();
        let restored = restore_from_store(&self.store, &mut state, unix_timestamp_now())?;
        if restored {
            Ok(state)
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}

/// Content type for a receipt image path, by extension.
pub fn image_content_type(path: &Path) -> Result<&'static str, CliError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        other => Err(CliError::UnsupportedImageType(other.to_string())),
    }
}

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: i64,
    pub station: String,
    pub amount: Option<f64>,
    pub liters: Option<f64>,
    pub price_per_liter: Option<f64>,
    pub purchase_date: Option<String>,
    pub created_at: String,
    pub ocr_processed: bool,
}

pub fn record_to_list_item(record: &FuelReceiptRecord) -> RecordListItem {
    RecordListItem {
        id: record.id,
        station: station_label(record),
        amount: record.amount,
        liters: record.liters,
        price_per_liter: record.price_per_liter,
        purchase_date: record.purchase_date.clone(),
        created_at: record.created_at.clone(),
        ocr_processed: record.ocr_processed,
    }
}

pub fn station_label(record: &FuelReceiptRecord) -> String {
    record
        .station_name
        .clone()
        .or_else(|| record.station_brand.clone())
        .unwrap_or_else(|| "(unknown station)".to_string())
}

pub fn format_record_lines(records: &[FuelReceiptRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let amount = record
                .amount
                .map_or_else(|| "-".to_string(), |amount| format!("{amount:.2}"));
            let liters = record
                .liters
                .map_or_else(|| "-".to_string(), |liters| format!("{liters:.1}L"));
            let date = record
                .purchase_date
                .as_deref()
                .unwrap_or(record.created_at.as_str());
            format!(
                "{:>6}  {:<24} {:>9} {:>8}  {}",
                record.id,
                station_label(record),
                amount,
                liters,
                date
            )
        })
        .collect()
}

pub fn format_record_detail(record: &FuelReceiptRecord) -> Vec<String> {
    let mut lines = vec![
        format!("Record #{}", record.id),
        format!("  Station:    {}", station_label(record)),
    ];
    if let Some(amount) = record.amount {
        lines.push(format!("  Amount:     {amount:.2}"));
    }
    if let (Some(liters), Some(price)) = (record.liters, record.price_per_liter) {
        lines.push(format!("  Fuel:       {liters:.2} L @ {price:.3}"));
    }
    if let Some(location) = &record.location {
        lines.push(format!("  Location:   {location}"));
    }
    if let Some(date) = &record.purchase_date {
        lines.push(format!("  Purchased:  {date}"));
    }
    lines.push(format!("  Created:    {}", record.created_at));
    match record.ocr_confidence {
        Some(confidence) if record.ocr_processed => {
            lines.push(format!("  OCR:        processed ({confidence:.0}% confidence)",
                confidence = confidence * 100.0));
        }
        _ if record.ocr_processed => lines.push("  OCR:        processed".to_string()),
        _ => lines.push("  OCR:        pending".to_string()),
    }
    if let Some(url) = &record.receipt_image_url {
        lines.push(format!("  Receipt:    {url}"));
    }
    lines
}
