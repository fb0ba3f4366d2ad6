//! CSV reports. A report is a `Serialize` row type registered under a short name; each report
//! is written to `<output_dir>/<file_prefix><name>.csv`, one row per `send_report` call.
use std::any::TypeId;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::trace;
use serde::Serialize;

use crate::error::SimError;
use crate::HashMap;

pub trait Report: Serialize + 'static {
    /// File stem of the report, e.g. `"daily"`.
    fn name() -> &'static str;
}

/// Use this macro to register a row type as a report with the given file stem.
#[macro_export]
macro_rules! define_report {
    ($name:ident, $file_stem:literal) => {
        impl $crate::report::Report for $name {
            fn name() -> &'static str {
                $file_stem
            }
        }
    };
}
pub use define_report;

/// Where report files go and whether existing files may be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            file_prefix: String::new(),
            output_dir: PathBuf::from("."),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    pub fn file_prefix(&mut self, file_prefix: impl Into<String>) -> &mut Self {
        self.file_prefix = file_prefix.into();
        self
    }

    pub fn directory(&mut self, directory: impl Into<PathBuf>) -> &mut Self {
        self.output_dir = directory.into();
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{name}.csv", self.file_prefix))
    }
}

// Checks that the path is valid and may be written. Creates the file and all parent
// directories if they do not exist.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, SimError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if !overwrite && path.exists() {
                return Err(SimError::ReportError(format!(
                    "report file {} already exists; pass --overwrite to replace it",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(SimError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// The open report files of a run.
#[derive(Default)]
pub struct Reports {
    options: ReportOptions,
    file_writers: HashMap<TypeId, Writer<File>>,
}

impl Reports {
    pub fn new(options: ReportOptions) -> Self {
        Reports {
            options,
            file_writers: HashMap::default(),
        }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Creates the file for report `T` and writes its header on the first row.
    pub fn add_report<T: Report>(&mut self) -> Result<PathBuf, SimError> {
        let path = self.options.path_for(T::name());
        let file = generate_validate_filepath(&path, self.options.overwrite)?;
        trace!("writing report {} to {}", T::name(), path.display());
        self.file_writers
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(path)
    }

    /// Writes one row to report `T`.
    pub fn send_report<T: Report>(&mut self, row: &T) -> Result<(), SimError> {
        let writer = self.file_writers.get_mut(&TypeId::of::<T>()).ok_or_else(|| {
            SimError::ReportError(format!("no writer found for report `{}`", T::name()))
        })?;
        writer.serialize(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SimError> {
        for writer in self.file_writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
