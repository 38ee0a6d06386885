//! Input validation for process plans.
//!
//! Checks the structural integrity of a [`PlanData`] before scheduling:
//! count ranges, timing parameters, buffer capacities, matrix shapes, and
//! station references. The scheduler assumes validated input and performs
//! no re-checking of its own.
//!
//! Degenerate plans are *not* errors: a workpiece with zero operations, or
//! a station value ≤ 0 marking the end of a plan, is normal input.

use crate::models::PlanData;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A structural count is outside its supported range.
    CountOutOfRange,
    /// Transport speed is zero or negative.
    NonPositiveSpeed,
    /// A timing parameter is negative.
    NegativeTiming,
    /// A buffer capacity is not 1 or 2.
    InvalidBufferCapacity,
    /// A matrix is ragged or wrongly sized.
    ShapeMismatch,
    /// An operation targets a station beyond `station_count`.
    StationOutOfRange,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a plan before scheduling.
///
/// Checks:
/// 1. Counts within range: workpieces 1..=21, steps 1..=14,
///    stations 1..=10, transport units 0..=10.
/// 2. Positive speed, non-negative load/unload/give-take times.
/// 3. Buffer capacities all 1 or 2.
/// 4. All matrices rectangular and sized to the counts.
/// 5. Every positive station reference within `station_count`.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_plan(plan: &PlanData) -> ValidationResult {
    let mut errors = Vec::new();

    check_count(&mut errors, "workpiece_count", plan.workpiece_count, 1, 21);
    check_count(&mut errors, "step_count", plan.step_count, 1, 14);
    check_count(&mut errors, "station_count", plan.station_count, 1, 10);
    check_count(&mut errors, "transport_count", plan.transport_count, 0, 10);

    if plan.speed <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveSpeed,
            format!("speed must be positive, got {}", plan.speed),
        ));
    }
    for (name, value) in [
        ("load_time", plan.load_time),
        ("unload_time", plan.unload_time),
        ("give_take_time", plan.give_take_time),
    ] {
        if value < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeTiming,
                format!("{name} must be non-negative, got {value}"),
            ));
        }
    }

    check_matrix(
        &mut errors,
        "operation_station",
        plan.operation_station.len(),
        plan.operation_station.iter().map(Vec::len),
        plan.workpiece_count,
        plan.step_count,
    );
    check_matrix(
        &mut errors,
        "operation_time",
        plan.operation_time.len(),
        plan.operation_time.iter().map(Vec::len),
        plan.workpiece_count,
        plan.step_count,
    );
    let points = plan.station_count + 1;
    check_matrix(
        &mut errors,
        "distance",
        plan.distance.len(),
        plan.distance.iter().map(Vec::len),
        points,
        points,
    );
    check_matrix(
        &mut errors,
        "travel_time",
        plan.travel_time.len(),
        plan.travel_time.iter().map(Vec::len),
        points,
        points,
    );
    if plan.buffer_capacity.len() != plan.station_count {
        errors.push(ValidationError::new(
            ValidationErrorKind::ShapeMismatch,
            format!(
                "buffer_capacity has {} entries, expected {}",
                plan.buffer_capacity.len(),
                plan.station_count
            ),
        ));
    }

    for (s, &capacity) in plan.buffer_capacity.iter().enumerate() {
        if capacity != 1 && capacity != 2 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBufferCapacity,
                format!("station {}: buffer capacity must be 1 or 2, got {capacity}", s + 1),
            ));
        }
    }

    for (w, row) in plan.operation_station.iter().enumerate() {
        for (k, &station) in row.iter().enumerate() {
            if station > plan.station_count as i32 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::StationOutOfRange,
                    format!(
                        "workpiece {}, step {}: station {station} exceeds station_count {}",
                        w + 1,
                        k + 1,
                        plan.station_count
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_count(
    errors: &mut Vec<ValidationError>,
    name: &str,
    value: usize,
    min: usize,
    max: usize,
) {
    if value < min || value > max {
        errors.push(ValidationError::new(
            ValidationErrorKind::CountOutOfRange,
            format!("{name} must be in {min}..={max}, got {value}"),
        ));
    }
}

fn check_matrix(
    errors: &mut Vec<ValidationError>,
    name: &str,
    rows: usize,
    row_lengths: impl Iterator<Item = usize>,
    expected_rows: usize,
    expected_columns: usize,
) {
    if rows != expected_rows {
        errors.push(ValidationError::new(
            ValidationErrorKind::ShapeMismatch,
            format!("{name} has {rows} rows, expected {expected_rows}"),
        ));
    }
    for (i, length) in row_lengths.enumerate() {
        if length != expected_columns {
            errors.push(ValidationError::new(
                ValidationErrorKind::ShapeMismatch,
                format!("{name} row {i} has {length} values, expected {expected_columns}"),
            ));
        }
    }
}
