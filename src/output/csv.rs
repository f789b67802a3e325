// Comma-separated tables: the filtered score table and the polarization matrix.
//
// Written through `csv::Writer`, so fields are quoted only when they contain a
// delimiter, quote or newline. Numbers use the shortest round-trip decimal
// form, with ".0" kept on integral values and exponent notation for very
// small or very large magnitudes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::network::SquareMatrix;
use crate::scoring::table::{ScoreTable, AUTHOR_COLUMN};

/// Destination path meaning standard output.
pub const STDOUT: &str = "-";

/// Magnitudes below this (other than zero) switch to exponent notation.
const EXPONENT_BELOW: f64 = 1e-4;
/// Magnitudes at or above this switch to exponent notation.
const EXPONENT_FROM: f64 = 1e16;

/// Format a score cell: `2.0`, `1.005`, `2.5e-05`, `1e+16`.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(EXPONENT_BELOW..EXPONENT_FROM).contains(&magnitude) {
        return exponent_form(value);
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// `1.25e-7` becomes `1.25e-07`: signed exponent, at least two digits.
fn exponent_form(value: f64) -> String {
    let raw = format!("{value:e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
            }
            Err(_) => raw.clone(),
        },
        None => raw.clone(),
    }
}

/// Header record, then one record per row in table order. The header is
/// always written, even for an empty table.
pub fn write_score_table<W: Write>(out: W, table: &ScoreTable) -> Result<()> {
    let mut wtr = ::csv::Writer::from_writer(out);
    wtr.write_record(table.header())?;
    for row in &table.rows {
        let mut record = Vec::with_capacity(row.scores.len() + 2);
        record.push(row.avatar_url.clone());
        record.push(row.user_id.clone());
        record.extend(row.scores.iter().map(|s| format_value(*s)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `author_name,<label...>` header, then one labelled record per matrix row.
pub fn write_matrix<W: Write>(out: W, labels: &[String], matrix: &SquareMatrix) -> Result<()> {
    let mut wtr = ::csv::Writer::from_writer(out);
    wtr.write_record(std::iter::once(AUTHOR_COLUMN).chain(labels.iter().map(String::as_str)))?;
    for (i, label) in labels.iter().enumerate() {
        let mut record = Vec::with_capacity(labels.len() + 1);
        record.push(label.clone());
        record.extend(matrix.row(i).iter().map(|v| format_value(*v)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Open `dest` for writing, or stdout when it is `-`.
pub fn open_destination(dest: &str) -> Result<Box<dyn Write>> {
    if dest == STDOUT {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(Path::new(dest))
        .with_context(|| format!("Failed to create output file {dest}"))?;
    Ok(Box::new(BufWriter::new(file)))
}

pub fn save_score_table(dest: &str, table: &ScoreTable) -> Result<()> {
    let out = open_destination(dest)?;
    write_score_table(out, table).with_context(|| format!("Failed to write score table to {dest}"))
}

pub fn save_matrix(dest: &str, labels: &[String], matrix: &SquareMatrix) -> Result<()> {
    let out = open_destination(dest)?;
    write_matrix(out, labels, matrix).with_context(|| format!("Failed to write matrix to {dest}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::table::ScoreRow;

    fn score_csv(table: &ScoreTable) -> String {
        let mut buf = Vec::new();
        write_score_table(&mut buf, table).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.0), "2.0");
        assert_eq!(format_value(1.005), "1.005");
        assert_eq!(format_value(0.0), "0.0");
        assert_eq!(format_value(-3.0), "-3.0");
        assert_eq!(format_value(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_value(0.0001), "0.0001");
        assert_eq!(format_value(1e15), "1000000000000000.0");
    }

    #[test]
    fn test_format_value_exponent() {
        assert_eq!(format_value(0.000025), "2.5e-05");
        assert_eq!(format_value(1.25e-7), "1.25e-07");
        assert_eq!(format_value(1e-5), "1e-05");
        assert_eq!(format_value(1e16), "1e+16");
        assert_eq!(format_value(-1.5e20), "-1.5e+20");
        // 0.005^100 stays short
        let tiny = 0.005f64.powi(100);
        assert!(format_value(tiny).len() < 30, "{}", format_value(tiny));
        assert!(format_value(tiny).contains("e-"));
    }

    #[test]
    fn test_empty_table_still_has_header() {
        assert_eq!(score_csv(&ScoreTable::default()), "profile_image_url,author_name\n");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let table = ScoreTable {
            buckets: Vec::new(),
            rows: vec![ScoreRow {
                avatar_url: "https://img.example/a,b.jpg".to_string(),
                user_id: "alice".to_string(),
                scores: Vec::new(),
            }],
        };
        let text = score_csv(&table);
        assert_eq!(
            text,
            "profile_image_url,author_name\n\"https://img.example/a,b.jpg\",alice\n"
        );

        let mut reader = ::csv::Reader::from_reader(text.as_bytes());
        let header_len = reader.headers().unwrap().len();
        for record in reader.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), header_len);
            assert_eq!(&record[0], "https://img.example/a,b.jpg");
        }
    }

    #[test]
    fn test_matrix_layout() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let m = SquareMatrix::from_rows(&[vec![0.0, 1.5], vec![1.5, 0.0]]);
        let mut buf = Vec::new();
        write_matrix(&mut buf, &labels, &m).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "author_name,a,b\na,0.0,1.5\nb,1.5,0.0\n"
        );
    }

    #[test]
    fn test_matrix_quotes_labels() {
        let labels = vec!["x\"y".to_string()];
        let m = SquareMatrix::from_rows(&[vec![0.0]]);
        let mut buf = Vec::new();
        write_matrix(&mut buf, &labels, &m).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "author_name,\"x\"\"y\"\n\"x\"\"y\",0.0\n"
        );
    }
}
