//! Table export of scraped listings.
//!
//! Both formats share the fixed column order of
//! [`COLUMN_LABELS`](crate::domain::COLUMN_LABELS). The file is named
//! `ML_<base name>.<ext>` with whitespace runs in the base name replaced by `_`.

#![allow(clippy::uninlined_format_args)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::{COLUMN_LABELS, ListingRecord, NOT_DISCRIMINATED, ResultSet};

/// Worksheet name of the EXCEL export
pub const SHEET_NAME: &str = "Products";

const FILE_PREFIX: &str = "ML_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Excel => write!(f, "EXCEL"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown export format {0:?}, expected CSV or EXCEL")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CSV" => Ok(Self::Csv),
            "EXCEL" => Ok(Self::Excel),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// `ML_<base name, whitespace runs as "_">.<csv|xlsx>`
pub fn export_file_name(base_name: &str, format: ExportFormat) -> String {
    let stem = base_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}{}.{}", FILE_PREFIX, stem, format.extension())
}

/// Write the result set into `dir` and return the path of the file written
pub fn export(
    result_set: &ResultSet,
    base_name: &str,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {:?}", dir))?;

    let path = dir.join(export_file_name(base_name, format));
    let written = match format {
        ExportFormat::Csv => write_csv(result_set, &path),
        ExportFormat::Excel => write_xlsx(result_set, &path),
    };
    written.with_context(|| format!("Failed to export {} to {:?}", format, path))?;

    info!("Exported {} records to {:?}", result_set.len(), path);
    Ok(path)
}

fn write_csv(result_set: &ResultSet, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(COLUMN_LABELS)?;
    for record in result_set {
        wtr.write_record(record.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_xlsx(result_set: &ResultSet, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, label) in (0u16..).zip(COLUMN_LABELS) {
        worksheet.write_string_with_format(0, col, label, &header)?;
    }

    for (row, record) in (1u32..).zip(result_set) {
        let cells = XlsxCells::from(record);
        worksheet.write_string(row, 0, &record.url)?;
        worksheet.write_string(row, 1, &record.name)?;
        worksheet.write_number_with_format(row, 2, cells.price, &money)?;
        match cells.installments {
            Some((multiplier, price)) => {
                worksheet.write_number(row, 3, multiplier)?;
                worksheet.write_number_with_format(row, 4, price, &money)?;
            }
            None => {
                worksheet.write_string(row, 3, NOT_DISCRIMINATED)?;
                worksheet.write_string(row, 4, NOT_DISCRIMINATED)?;
            }
        }
        worksheet.write_boolean(row, 5, record.interest_free)?;
        worksheet.write_string(row, 6, record.seller_or_sentinel())?;
        worksheet.write_boolean(row, 7, record.free_shipping())?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Numeric cells of one spreadsheet row
struct XlsxCells {
    price: f64,
    installments: Option<(f64, f64)>,
}

impl From<&ListingRecord> for XlsxCells {
    fn from(record: &ListingRecord) -> Self {
        Self {
            price: record.price.to_f64().unwrap_or_default(),
            installments: record
                .installments
                .map(|i| (f64::from(i.multiplier), i.price.to_f64().unwrap_or_default())),
        }
    }
}
