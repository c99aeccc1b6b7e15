//! CPU-reference comparison utilities.
//!
//! For correctness debugging a GPU result is compared element-by-element
//! against a matrix computed by the CPU reference path: either exactly, or
//! against an absolute-deviation threshold with a summary report of how many
//! elements failed, by how much, and in which rows/columns.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use tracing::error;

use crate::matrix::{DeviceMatrix, Element, HostMatrix};
use crate::transfer::TransferEngine;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("operation '{label}' failed: {report}")]
    ToleranceExceeded { label: String, report: CheckReport },
}

/// Summary of a threshold comparison.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Total number of elements compared.
    pub total: usize,

    /// Number of elements whose deviation exceeded the threshold.
    pub failed: usize,

    /// Largest finite deviation among failing elements.
    pub max_diff: f64,

    /// Mean deviation over failing elements (finite deviations only).
    pub mean_diff: f64,

    /// Distinct row indices containing a failure.
    pub bad_rows: BTreeSet<usize>,

    /// Distinct column indices containing a failure.
    pub bad_cols: BTreeSet<usize>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} elements outside tolerance (max {:e}, mean {:e}, {} bad rows, {} bad cols)",
            self.failed,
            self.total,
            self.max_diff,
            self.mean_diff,
            self.bad_rows.len(),
            self.bad_cols.len()
        )
    }
}

/// Exact element-wise equality between a reference and a candidate.
///
/// Returns false on any shape or element mismatch. Intended for integral
/// buffers and bit-exact round-trips; use [`compare`] for kernel output.
pub fn exact_match<T: Element>(expected: &HostMatrix<T>, actual: &HostMatrix<T>) -> bool {
    if expected.rows() != actual.rows() || expected.cols() != actual.cols() {
        return false;
    }
    expected.as_slice() == actual.as_slice()
}

/// Threshold comparison between a reference and a candidate.
///
/// A deviation strictly greater than `threshold` fails; a deviation exactly
/// equal to it passes. A non-finite deviation (NaN/inf on either side) always
/// fails.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn compare<T: Element>(
    expected: &HostMatrix<T>,
    actual: &HostMatrix<T>,
    threshold: f64,
) -> CheckReport {
    assert!(
        expected.rows() == actual.rows() && expected.cols() == actual.cols(),
        "shape mismatch: {}x{} vs {}x{}",
        expected.rows(),
        expected.cols(),
        actual.rows(),
        actual.cols()
    );

    let mut report = CheckReport {
        total: expected.len(),
        ..CheckReport::default()
    };
    let mut fail_sum = 0.0;

    for j in 0..expected.cols() {
        for i in 0..expected.rows() {
            let diff = (expected.get(i, j).to_f64() - actual.get(i, j).to_f64()).abs();
            // `!(diff <= threshold)` so NaN deviations count as failures.
            if !(diff <= threshold) {
                report.failed += 1;
                report.bad_rows.insert(i);
                report.bad_cols.insert(j);
                if diff.is_finite() {
                    fail_sum += diff;
                    // f64::max ignores a NaN argument, keeping max_diff finite.
                    report.max_diff = report.max_diff.max(diff);
                }
            }
        }
    }

    if report.failed > 0 {
        report.mean_diff = fail_sum / report.failed as f64;
    }
    report
}

/// Compare a device-resident candidate against a CPU reference.
///
/// Downloads the device buffer, runs the threshold comparison, and logs the
/// report under `label`. Any failure is an error; callers treat it as fatal.
pub fn check_device<T: Element>(
    expected: &HostMatrix<T>,
    device: &DeviceMatrix<T>,
    engine: &mut TransferEngine,
    label: &str,
    threshold: f64,
) -> Result<(), CheckError> {
    let actual = engine.download_new(device);
    let report = compare(expected, &actual, threshold);

    if report.passed() {
        Ok(())
    } else {
        error!(
            operation = label,
            total = report.total,
            failed = report.failed,
            max_diff = report.max_diff,
            mean_diff = report.mean_diff,
            bad_rows = ?report.bad_rows,
            bad_cols = ?report.bad_cols,
            "GPU result diverged from CPU reference"
        );
        Err(CheckError::ToleranceExceeded {
            label: label.to_string(),
            report,
        })
    }
}

/// Compare two device-resident buffers against each other.
///
/// Downloads both, runs the threshold comparison with the first as the
/// reference, and logs the report under `label`. Used to cross-check a
/// rewritten kernel's output against the known-good path it replaces.
pub fn check_device_pair<T: Element>(
    reference: &DeviceMatrix<T>,
    candidate: &DeviceMatrix<T>,
    engine: &mut TransferEngine,
    label: &str,
    threshold: f64,
) -> Result<(), CheckError> {
    let expected = engine.download_new(reference);
    check_device(&expected, candidate, engine, label, threshold)
}
