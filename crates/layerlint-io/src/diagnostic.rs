//! Diagnostic GDS-text stream for comparing two violation sets visually.
//!
//! The grammar is fixed for interoperability with external polygon-diff
//! tooling: `HEADER 600`, `BGNLIB`, `LIBNAME <name>`, `UNITS 0.001 1e-9`,
//! `BGNSTR`, `STRNAME <name>`, one `BOUNDARY … ENDEL` block per violation
//! rectangle (closed 5-point outline, DATATYPE carrying the violation-type
//! integer), then `ENDSTR`, `ENDLIB`. Do not reformat.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use log::debug;
use thiserror::Error;

use layerlint_core::{BBox, LayerId};
use layerlint_drc::{ViolationEnumType, ViolationMap};

/// Violation rectangles grouped the way the stream is laid out.
pub type LayerTypeRects = BTreeMap<LayerId, BTreeMap<ViolationEnumType, Vec<BBox>>>;

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected {expected}, got '{got}'")]
    UnexpectedLine {
        line: usize,
        expected: &'static str,
        got: String,
    },

    #[error("line {line}: bad integer '{got}'")]
    BadInteger { line: usize, got: String },

    #[error("line {line}: unknown violation type {value}")]
    UnknownViolationType { line: usize, value: u32 },
}

/// Group a violation map by layer then type, the stream's nesting order.
pub fn group_by_layer(map: &ViolationMap) -> LayerTypeRects {
    let mut grouped: LayerTypeRects = BTreeMap::new();
    for (&violation_type, violations) in map {
        for violation in violations {
            grouped
                .entry(violation.layer_id())
                .or_default()
                .entry(violation_type)
                .or_default()
                .push(violation.bbox());
        }
    }
    grouped
}

/// Write the diagnostic stream for a violation map.
pub fn write_violation_map<W: Write>(writer: &mut W, map: &ViolationMap) -> io::Result<()> {
    write_rects(writer, &group_by_layer(map))
}

/// Write the diagnostic stream for pre-grouped rectangles.
pub fn write_rects<W: Write>(writer: &mut W, grouped: &LayerTypeRects) -> io::Result<()> {
    writeln!(writer, "HEADER 600")?;
    writeln!(writer, "BGNLIB")?;
    writeln!(writer, "LIBNAME GDSLib")?;
    writeln!(writer, "UNITS 0.001 1e-9")?;
    writeln!(writer, "BGNSTR")?;
    writeln!(writer, "STRNAME top")?;

    for (&layer_id, type_rects) in grouped {
        for (&violation_type, rects) in type_rects {
            for rect in rects {
                writeln!(writer, "BOUNDARY")?;
                writeln!(writer, "LAYER {layer_id}")?;
                writeln!(writer, "DATATYPE {}", violation_type.as_u32())?;
                writeln!(writer, "XY")?;
                writeln!(writer, "{} : {}", rect.llx, rect.lly)?;
                writeln!(writer, "{} : {}", rect.urx, rect.lly)?;
                writeln!(writer, "{} : {}", rect.urx, rect.ury)?;
                writeln!(writer, "{} : {}", rect.llx, rect.ury)?;
                writeln!(writer, "{} : {}", rect.llx, rect.lly)?;
                writeln!(writer, "ENDEL")?;
            }
        }
    }

    writeln!(writer, "ENDSTR")?;
    writeln!(writer, "ENDLIB")?;
    Ok(())
}

/// Parse a diagnostic stream back into grouped rectangles. Coordinates are
/// recovered integer-exact from the first and third outline points.
pub fn parse<R: BufRead>(reader: R) -> Result<LayerTypeRects, DiagnosticError> {
    let mut grouped: LayerTypeRects = BTreeMap::new();

    let mut lines = reader.lines().enumerate();
    let mut next_line = |expected: &'static str| -> Result<(usize, String), DiagnosticError> {
        match lines.next() {
            Some((idx, line)) => Ok((idx + 1, line?)),
            None => Err(DiagnosticError::UnexpectedLine {
                line: 0,
                expected,
                got: "<eof>".to_string(),
            }),
        }
    };
    let expect = |expected: &'static str,
                  (line, got): (usize, String)|
     -> Result<(), DiagnosticError> {
        if got.trim() == expected {
            Ok(())
        } else {
            Err(DiagnosticError::UnexpectedLine {
                line,
                expected,
                got,
            })
        }
    };

    expect("HEADER 600", next_line("HEADER 600")?)?;
    expect("BGNLIB", next_line("BGNLIB")?)?;
    let (line, libname) = next_line("LIBNAME")?;
    if !libname.starts_with("LIBNAME") {
        return Err(DiagnosticError::UnexpectedLine {
            line,
            expected: "LIBNAME",
            got: libname,
        });
    }
    let (line, units) = next_line("UNITS")?;
    if !units.starts_with("UNITS") {
        return Err(DiagnosticError::UnexpectedLine {
            line,
            expected: "UNITS",
            got: units,
        });
    }
    expect("BGNSTR", next_line("BGNSTR")?)?;
    let (line, strname) = next_line("STRNAME")?;
    if !strname.starts_with("STRNAME") {
        return Err(DiagnosticError::UnexpectedLine {
            line,
            expected: "STRNAME",
            got: strname,
        });
    }

    loop {
        let (line, text) = next_line("BOUNDARY or ENDSTR")?;
        match text.trim() {
            "ENDSTR" => break,
            "BOUNDARY" => {}
            other => {
                return Err(DiagnosticError::UnexpectedLine {
                    line,
                    expected: "BOUNDARY or ENDSTR",
                    got: other.to_string(),
                })
            }
        }

        let layer_id = parse_tagged_u32(next_line("LAYER")?, "LAYER")?;
        let (dt_line, dt_text) = next_line("DATATYPE")?;
        let datatype = parse_tagged_u32((dt_line, dt_text), "DATATYPE")?;
        let violation_type = ViolationEnumType::from_u32(datatype).ok_or(
            DiagnosticError::UnknownViolationType {
                line: dt_line,
                value: datatype,
            },
        )?;

        expect("XY", next_line("XY")?)?;
        let mut points = [(0i32, 0i32); 5];
        for point in &mut points {
            let (line, text) = next_line("x : y")?;
            *point = parse_coordinate(line, &text)?;
        }
        expect("ENDEL", next_line("ENDEL")?)?;

        // Outline order is ll, lr, ur, ul, ll.
        let (llx, lly) = points[0];
        let (urx, ury) = points[2];
        grouped
            .entry(layer_id)
            .or_default()
            .entry(violation_type)
            .or_default()
            .push(BBox::new(llx, lly, urx, ury));
    }

    expect("ENDLIB", next_line("ENDLIB")?)?;
    debug!("parsed diagnostic stream covering {} layers", grouped.len());
    Ok(grouped)
}

fn parse_tagged_u32(
    (line, text): (usize, String),
    tag: &'static str,
) -> Result<u32, DiagnosticError> {
    let rest = text
        .trim()
        .strip_prefix(tag)
        .ok_or_else(|| DiagnosticError::UnexpectedLine {
            line,
            expected: tag,
            got: text.clone(),
        })?;
    rest.trim()
        .parse()
        .map_err(|_| DiagnosticError::BadInteger { line, got: text })
}

fn parse_coordinate(line: usize, text: &str) -> Result<(i32, i32), DiagnosticError> {
    let mut parts = text.split(':');
    let bad = || DiagnosticError::BadInteger {
        line,
        got: text.to_string(),
    };
    let x = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(bad)?;
    let y = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(bad)?;
    Ok((x, y))
}
