//! Line-oriented flat-file persistence of [`PlanData`].
//!
//! # Format
//!
//! Plain text, fixed order, no headers or delimiters:
//!
//! 1. Four integer counts, one per line: workpieces, stations, transport
//!    units, steps.
//! 2. Four decimal timing parameters, one per line: load, unload,
//!    give-take, speed.
//! 3. The workpiece×step integer station matrix, one whitespace-separated
//!    row per line.
//! 4. The workpiece×step decimal duration matrix.
//! 5. The (stations+1)² decimal distance matrix.
//! 6. The per-station integer buffer-capacity row.
//! 7. The (stations+1)² decimal derived travel-time matrix.
//!
//! The travel-time matrix is persisted and read back as stored; it is not
//! recomputed on load.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::models::PlanData;

/// Codec failure.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A value failed to parse or a row was too short.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The input ended before the layout was complete.
    #[error("unexpected end of input at line {0}")]
    UnexpectedEof(usize),
}

/// Codec result alias.
pub type CodecResult<T> = Result<T, CodecError>;

/// Writes a plan to a file at `path`.
pub fn save_plan(plan: &PlanData, path: impl AsRef<Path>) -> CodecResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_plan(plan, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads a plan from a file at `path`.
pub fn load_plan(path: impl AsRef<Path>) -> CodecResult<PlanData> {
    read_plan(BufReader::new(File::open(path)?))
}

/// Writes a plan to any writer in the flat-file layout.
pub fn write_plan<W: Write>(plan: &PlanData, writer: &mut W) -> CodecResult<()> {
    writeln!(writer, "{}", plan.workpiece_count)?;
    writeln!(writer, "{}", plan.station_count)?;
    writeln!(writer, "{}", plan.transport_count)?;
    writeln!(writer, "{}", plan.step_count)?;
    writeln!(writer, "{}", plan.load_time)?;
    writeln!(writer, "{}", plan.unload_time)?;
    writeln!(writer, "{}", plan.give_take_time)?;
    writeln!(writer, "{}", plan.speed)?;

    for row in &plan.operation_station {
        write_row(writer, row)?;
    }
    for row in &plan.operation_time {
        write_row(writer, row)?;
    }
    for row in &plan.distance {
        write_row(writer, row)?;
    }
    write_row(writer, &plan.buffer_capacity)?;
    for row in &plan.travel_time {
        write_row(writer, row)?;
    }
    Ok(())
}

/// Reads a plan from any buffered reader.
///
/// Useful for testing (pass a byte slice) or loading from non-file
/// sources.
pub fn read_plan<R: BufRead>(reader: R) -> CodecResult<PlanData> {
    let mut lines = LineReader::new(reader);

    let workpiece_count: usize = lines.value()?;
    let station_count: usize = lines.value()?;
    let transport_count: usize = lines.value()?;
    let step_count: usize = lines.value()?;

    let mut plan = PlanData::new(workpiece_count, step_count, station_count, transport_count);
    plan.load_time = lines.value()?;
    plan.unload_time = lines.value()?;
    plan.give_take_time = lines.value()?;
    plan.speed = lines.value()?;

    for w in 0..workpiece_count {
        plan.operation_station[w] = lines.row(step_count)?;
    }
    for w in 0..workpiece_count {
        plan.operation_time[w] = lines.row(step_count)?;
    }
    for i in 0..=station_count {
        plan.distance[i] = lines.row(station_count + 1)?;
    }
    plan.buffer_capacity = lines.row(station_count)?;
    for i in 0..=station_count {
        plan.travel_time[i] = lines.row(station_count + 1)?;
    }

    Ok(plan)
}

fn write_row<W: Write, T: Display>(writer: &mut W, row: &[T]) -> io::Result<()> {
    let mut first = true;
    for value in row {
        if first {
            write!(writer, "{value}")?;
            first = false;
        } else {
            write!(writer, " {value}")?;
        }
    }
    writeln!(writer)
}

/// Line cursor tracking the 1-based position for error reporting.
struct LineReader<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> CodecResult<String> {
        self.line += 1;
        match self.lines.next() {
            Some(result) => Ok(result?),
            None => Err(CodecError::UnexpectedEof(self.line)),
        }
    }

    /// Parses one value on its own line.
    fn value<T: FromStr>(&mut self) -> CodecResult<T>
    where
        T::Err: Display,
    {
        let text = self.next_line()?;
        let trimmed = text.trim();
        trimmed.parse().map_err(|e: T::Err| CodecError::Parse {
            line: self.line,
            message: format!("invalid value '{trimmed}': {e}"),
        })
    }

    /// Parses a whitespace-separated row of at least `expected` values;
    /// surplus values are ignored.
    fn row<T: FromStr>(&mut self, expected: usize) -> CodecResult<Vec<T>>
    where
        T::Err: Display,
    {
        let text = self.next_line()?;
        let line = self.line;
        let mut values = Vec::with_capacity(expected);
        for token in text.split_whitespace().take(expected) {
            values.push(token.parse().map_err(|e: T::Err| CodecError::Parse {
                line,
                message: format!("invalid value '{token}': {e}"),
            })?);
        }
        if values.len() < expected {
            return Err(CodecError::Parse {
                line,
                message: format!("expected {expected} values, found {}", values.len()),
            });
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> PlanData {
        PlanData::new(2, 2, 2, 1)
            .with_timing(0.5, 1.5, 0.25, 2.0)
            .with_operation(0, 0, 1, 4.0)
            .with_operation(0, 1, 2, 3.0)
            .with_operation(1, 0, 2, 6.0)
            .with_distance(0, 1, 2.0)
            .with_distance(1, 2, 4.0)
            .with_distance(2, 0, 8.0)
            .with_buffer_capacity(2, 1)
    }

    #[test]
    fn test_round_trip_preserves_plan() {
        let plan = sample_plan();
        let mut buffer = Vec::new();
        write_plan(&plan, &mut buffer).unwrap();
        let back = read_plan(buffer.as_slice()).unwrap();
        assert_eq!(plan, back);
    }

    #[test]
    fn test_layout_is_pinned() {
        let plan = PlanData::new(1, 1, 1, 1)
            .with_operation(0, 0, 1, 10.0)
            .with_distance(0, 1, 2.0)
            .with_distance(1, 0, 3.0);
        let mut buffer = Vec::new();
        write_plan(&plan, &mut buffer).unwrap();

        let expected = "\
1
1
1
1
0
0
0
1
1
10
0 2
3 0
2
0 2
3 0
";
        assert_eq!(String::from_utf8(buffer).unwrap(), expected);
    }

    #[test]
    fn test_truncated_input_reports_eof() {
        let result = read_plan("2\n2\n1\n".as_bytes());
        assert!(matches!(result, Err(CodecError::UnexpectedEof(4))));
    }

    #[test]
    fn test_invalid_count_reports_line() {
        let result = read_plan("abc\n".as_bytes());
        match result {
            Err(CodecError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_matrix_row_reports_line() {
        // 1 workpiece, 1 station, 0 transports, 2 steps — the station
        // matrix row carries only one of the two expected values.
        let result = read_plan("1\n1\n0\n2\n0\n0\n0\n1\n1\n".as_bytes());
        match result {
            Err(CodecError::Parse { line, message }) => {
                assert_eq!(line, 9);
                assert!(message.contains("expected 2 values"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_surplus_row_values_are_ignored() {
        // The station matrix row carries one value more than step_count.
        let input = "1\n1\n1\n1\n0\n0\n0\n1\n1 99\n10\n0 0\n0 0\n2\n0 0\n0 0\n";
        let plan = read_plan(input.as_bytes()).unwrap();
        assert_eq!(plan.operation_station[0], vec![1]);
    }
}
