//! The append-only result ledger.
//!
//! One whitespace-separated text table keyed by sample name: a header row
//! naming every column, a `#` metadata line recording the tool version and
//! the active noise threshold, then one row per processed sample. Appends
//! are idempotent (a name already present is silently skipped), which makes
//! re-running the batch over a growing file set safe.
//!
//! Duplicate lookup reproduces the original grep-style semantics: a sample
//! counts as present when its name occurs as a *substring* of any existing
//! key. That treats a file whose name is contained in an already-processed
//! name as a duplicate; `--exact-names` opts into exact-key lookup instead
//! (see DESIGN.md).
//!
//! Resetting the ledger is the only destructive operation in the tool and
//! requires interactive confirmation.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::domain::SampleRecord;
use crate::error::AppError;

/// Ledger column names, in row order.
pub const LEDGER_COLUMNS: [&str; 35] = [
    "name",
    "g_height",
    "g_location",
    "g_width",
    "g_area",
    "d1_height",
    "d1_location",
    "d1_width",
    "d1_area",
    "d2_height",
    "d2_location",
    "d2_width",
    "d2_area",
    "d3_height",
    "d3_location",
    "d3_width",
    "d3_area",
    "d4_height",
    "d4_location",
    "d4_width",
    "d4_area",
    "r1_ratio",
    "r2_ratio",
    "r2_temp",
    "ra1_ratio",
    "ra1_temp",
    "ra2_ratio",
    "ra2_temp",
    "r2voigt",
    "plottemp",
    "totalwidth",
    "totalwidthvoigt",
    "fitstyle",
    "sig-noise",
    "iterations",
];

/// Decimal places for numeric cells.
const CELL_PRECISION: usize = 4;

/// How `contains` matches sample names against existing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Original behavior: a name occurring as a substring of any existing
    /// key counts as a duplicate.
    Substring,
    /// Exact-key lookup (`--exact-names`).
    Exact,
}

/// The persisted, append-only record collection.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    names: Vec<String>,
    match_mode: NameMatch,
}

impl Ledger {
    /// Open the ledger, creating it (header + metadata line) if missing.
    pub fn open(path: &Path, match_mode: NameMatch, threshold: i64) -> Result<Self, AppError> {
        if !path.exists() {
            write_header(path, threshold)?;
            return Ok(Self {
                path: path.to_path_buf(),
                names: Vec::new(),
                match_mode,
            });
        }

        let file = File::open(path).map_err(|e| {
            AppError::new(2, format!("Failed to open ledger '{}': {e}", path.display()))
        })?;
        let reader = BufReader::new(file);

        let mut names = Vec::new();
        let mut saw_header = false;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::new(2, format!("Failed to read ledger '{}': {e}", path.display()))
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !saw_header {
                if !line.starts_with("name ") && line != "name" {
                    return Err(AppError::new(
                        2,
                        format!(
                            "'{}' does not look like a ledger (bad header on line {}).",
                            path.display(),
                            idx + 1
                        ),
                    ));
                }
                saw_header = true;
                continue;
            }
            if let Some(name) = line.split_whitespace().next() {
                names.push(name.to_string());
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            names,
            match_mode,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True if the sample counts as already recorded under the active
    /// matching mode.
    pub fn contains(&self, name: &str) -> bool {
        match self.match_mode {
            NameMatch::Substring => self.names.iter().any(|k| k.contains(name)),
            NameMatch::Exact => self.names.iter().any(|k| k == name),
        }
    }

    /// Append a record unless its name is already present. Returns whether a
    /// row was written.
    pub fn append(&mut self, record: &SampleRecord) -> Result<bool, AppError> {
        if self.contains(&record.name) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::new(
                    2,
                    format!("Failed to open ledger '{}' for append: {e}", self.path.display()),
                )
            })?;
        writeln!(file, "{}", format_row(record)).map_err(|e| {
            AppError::new(2, format!("Failed to append to ledger '{}': {e}", self.path.display()))
        })?;

        self.names.push(record.name.clone());
        Ok(true)
    }

    /// Destructively clear the ledger after interactive confirmation.
    ///
    /// Reads a `y`/`yes` line from `input`; anything else aborts without
    /// touching the file. Returns whether the reset happened.
    pub fn reset_with_io(
        path: &Path,
        threshold: i64,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<bool, AppError> {
        write!(
            output,
            "This permanently clears all rows in '{}'. Continue? [y/N] ",
            path.display()
        )
        .and_then(|_| output.flush())
        .map_err(|e| AppError::new(2, format!("Failed to prompt for confirmation: {e}")))?;

        let mut answer = String::new();
        input
            .read_line(&mut answer)
            .map_err(|e| AppError::new(2, format!("Failed to read confirmation: {e}")))?;
        let answer = answer.trim().to_ascii_lowercase();
        if answer != "y" && answer != "yes" {
            return Ok(false);
        }

        write_header(path, threshold)?;
        Ok(true)
    }

    /// `reset_with_io` wired to the process stdin/stdout.
    pub fn reset(path: &Path, threshold: i64) -> Result<bool, AppError> {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        Self::reset_with_io(path, threshold, &mut input, &mut output)
    }
}

/// (Re)write the file as just the header row plus the metadata line.
fn write_header(path: &Path, threshold: i64) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create ledger '{}': {e}", path.display()))
    })?;
    writeln!(file, "{}", LEDGER_COLUMNS.join(" ")).and_then(|_| {
        writeln!(
            file,
            "# raman-cm {} threshold={threshold}",
            env!("CARGO_PKG_VERSION")
        )
    })
    .map_err(|e| {
        AppError::new(2, format!("Failed to write ledger header '{}': {e}", path.display()))
    })?;
    Ok(())
}

/// Format one record as a whitespace-separated row, in `LEDGER_COLUMNS`
/// order. No cell is ever empty.
pub fn format_row(record: &SampleRecord) -> String {
    let mut fields: Vec<String> = Vec::with_capacity(LEDGER_COLUMNS.len());
    fields.push(record.name.clone());
    for cells in [&record.g, &record.d1, &record.d2, &record.d3, &record.d4] {
        fields.push(cells.height.ledger_text(CELL_PRECISION));
        fields.push(cells.location.ledger_text(CELL_PRECISION));
        fields.push(cells.width.ledger_text(CELL_PRECISION));
        fields.push(cells.area.ledger_text(CELL_PRECISION));
    }
    for cell in [
        record.r1_ratio,
        record.r2_ratio,
        record.r2_temp,
        record.ra1_ratio,
        record.ra1_temp,
        record.ra2_ratio,
        record.ra2_temp,
        record.r2_voigt,
        record.plot_temp,
        record.total_width,
        record.total_width_voigt,
    ] {
        fields.push(cell.ledger_text(CELL_PRECISION));
    }
    fields.push(record.fit_style.ledger_label().to_string());
    fields.push(record.snr.to_string());
    fields.push(record.iterations.ledger_text(0));
    fields.join(" ")
}
