use std::path::Path;

use tanklog_core::records::UploadReceipt;
use tanklog_core::Error;

use crate::commands::common::{
    format_record_detail, format_record_lines, image_content_type, record_to_list_item, Backend,
};
use crate::error::CliError;

pub async fn run_upload(
    image: &Path,
    station_name: Option<String>,
    location: Option<String>,
    purchase_date: Option<String>,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let backend = Backend::resolve(profile)?;
    backend.require_session()?;

    if !image.is_file() {
        return Err(CliError::ImageNotFound(image.display().to_string()));
    }
    let content_type = image_content_type(image)?;
    let file_name = image
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("receipt")
        .to_string();
    let bytes = std::fs::read(image)?;

    let upload = UploadReceipt {
        bytes,
        file_name,
        content_type: content_type.to_string(),
        station_name,
        location,
        purchase_date,
    };

    match backend.record_client()?.upload_receipt(upload).await {
        Ok(record) => {
            println!("Uploaded receipt, record #{}", record.id);
            for line in format_record_detail(&record) {
                println!("{line}");
            }
            Ok(())
        }
        // Taxonomy case (d): the original in-flight request will succeed or
        // fail visibly, so a suppressed duplicate is not an error.
        Err(Error::DuplicateRequest(signature)) => {
            tracing::warn!(%signature, "duplicate upload suppressed");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

pub async fn run_list(
    page: u32,
    size: u32,
    as_json: bool,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let backend = Backend::resolve(profile)?;
    backend.require_session()?;

    let records = backend.record_client()?.list(page, size).await?;

    if as_json {
        let items = records
            .content
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if records.content.is_empty() {
        println!("No fuel records on page {page}.");
    } else {
        for line in format_record_lines(&records.content) {
            println!("{line}");
        }
        println!(
            "Page {} of {} ({} records total)",
            records.number + 1,
            records.total_pages,
            records.total_elements
        );
    }

    Ok(())
}

pub async fn run_show(id: i64, as_json: bool, profile: Option<&str>) -> Result<(), CliError> {
    let backend = Backend::resolve(profile)?;
    backend.require_session()?;

    let record = backend.record_client()?.get(id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        for line in format_record_detail(&record) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_delete(id: i64, profile: Option<&str>) -> Result<(), CliError> {
    let backend = Backend::resolve(profile)?;
    backend.require_session()?;

    match backend.record_client()?.delete(id).await {
        Ok(()) => {
            println!("Deleted record #{id}");
            Ok(())
        }
        Err(Error::DuplicateRequest(signature)) => {
            tracing::warn!(%signature, "duplicate delete suppressed");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
