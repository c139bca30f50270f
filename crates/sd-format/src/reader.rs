//! Output stream parser.
//!
//! Layout, one record per line, values separated by single spaces:
//!
//! ```text
//! v1 v2 ... vK        parameter record (per schema)
//! x1 x2 ... x_nx      explicit grid, if the schema says so
//! a1 a2 ... a_nx      one line per declared auxiliary array
//! u1 u2 ... u_nx      one line per written time step, up to nt_out lines
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use sd_core::is_integral;
use tracing::{debug, warn};

use crate::error::{FormatError, FormatResult};
use crate::field::{AuxData, Dataset, Field};
use crate::grid::{explicit_grid, reconstruct};
use crate::params::{ParamValue, ParameterSet, RunParams};
use crate::schema::{FieldKind, ParamLayout, ParamSchema};

/// Split a record on the space delimiter.
///
/// Runs of spaces collapse and a trailing `\r` is dropped. Other whitespace
/// (tabs) is not a delimiter.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.strip_suffix('\r')
        .unwrap_or(line)
        .split(' ')
        .filter(|t| !t.is_empty())
}

fn parse_number(token: &str, line: usize, column: usize) -> FormatResult<f64> {
    token.parse::<f64>().map_err(|_| FormatError::ParseError {
        line,
        column,
        token: token.to_string(),
    })
}

fn parse_typed(
    name: &str,
    kind: FieldKind,
    token: &str,
    line: usize,
    column: usize,
) -> FormatResult<ParamValue> {
    let v = parse_number(token, line, column)?;
    match kind {
        FieldKind::Auto => Ok(ParamValue::classify(v)),
        FieldKind::Real => Ok(ParamValue::Real(v)),
        FieldKind::Int if is_integral(v) => Ok(ParamValue::Int(v as i64)),
        FieldKind::Int => Err(FormatError::SchemaMismatch {
            what: format!("{name} is declared integer but line {line} has {token}"),
        }),
    }
}

/// Parse the parameter record against `schema`, then derive `nt_out`.
pub fn parse_parameter_line(
    schema: &ParamSchema,
    line: &str,
    line_no: usize,
) -> FormatResult<ParameterSet> {
    let tokens: Vec<&str> = tokenize(line).collect();
    let mut params = ParameterSet::new();

    match schema.layout {
        ParamLayout::Positional => {
            if tokens.len() != schema.fields.len() {
                return Err(FormatError::SchemaMismatch {
                    what: format!(
                        "schema {} expects {} parameters, line {} has {}",
                        schema.name,
                        schema.fields.len(),
                        line_no,
                        tokens.len()
                    ),
                });
            }
            for (col, (spec, token)) in schema.fields.iter().zip(&tokens).enumerate() {
                let value = parse_typed(&spec.name, spec.kind, token, line_no, col + 1)?;
                params.insert(spec.name.clone(), value);
            }
        }
        ParamLayout::Named => {
            for (col, token) in tokens.iter().enumerate() {
                let (name, raw) =
                    token
                        .split_once('=')
                        .ok_or_else(|| FormatError::SchemaMismatch {
                            what: format!(
                                "token '{token}' at line {line_no}, column {} is not name=value",
                                col + 1
                            ),
                        })?;
                let kind = schema.field(name).map(|f| f.kind).unwrap_or_default();
                let value = parse_typed(name, kind, raw, line_no, col + 1)?;
                params.insert(name, value);
            }
            if let Some(missing) = schema.field_names().find(|n| !params.contains(n)) {
                return Err(FormatError::SchemaMismatch {
                    what: format!("schema {} requires {missing}, absent from line {line_no}", schema.name),
                });
            }
        }
    }

    params.derive_nt_out();
    Ok(params)
}

/// Numbered line source that remembers where it stopped.
struct LineSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineSource<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next(&mut self) -> FormatResult<Option<(usize, String)>> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some((self.line_no, line?)))
            }
            None => Ok(None),
        }
    }

    /// A header row that must exist.
    fn require(&mut self, section: &str, row: usize, nx: usize) -> FormatResult<(usize, String)> {
        let next_line = self.line_no + 1;
        self.next()?.ok_or_else(|| FormatError::MalformedRow {
            section: section.to_string(),
            row,
            line: next_line,
            expected: nx,
            found: 0,
        })
    }
}

fn parse_row(
    line: &str,
    line_no: usize,
    section: &str,
    row: usize,
    nx: usize,
) -> FormatResult<Vec<f64>> {
    let tokens: Vec<&str> = tokenize(line).collect();
    if tokens.len() != nx {
        return Err(FormatError::MalformedRow {
            section: section.to_string(),
            row,
            line: line_no,
            expected: nx,
            found: tokens.len(),
        });
    }
    tokens
        .iter()
        .enumerate()
        .map(|(col, token)| parse_number(token, line_no, col + 1))
        .collect()
}

/// Parse a complete output stream.
///
/// Streams with fewer body rows than `nt_out` are accepted; the field
/// records how many rows were actually observed.
pub fn read_dataset<R: BufRead>(reader: R, schema: &ParamSchema) -> FormatResult<Dataset> {
    let mut source = LineSource::new(reader);

    let (line_no, header) = source.next()?.ok_or_else(|| FormatError::SchemaMismatch {
        what: "stream is empty, parameter line missing".to_string(),
    })?;
    let params = parse_parameter_line(schema, &header, line_no)?;
    let run = RunParams::from_params(&params)?;
    debug!(
        schema = %schema.name,
        nx = run.nx,
        nt_out = run.nt_out,
        "parsed parameter line"
    );

    let explicit = if schema.explicit_grid {
        let (line_no, line) = source.require("grid", 0, run.nx)?;
        let values = parse_row(&line, line_no, "grid", 0, run.nx)?;
        Some(explicit_grid(values, run.nx, line_no)?)
    } else {
        None
    };
    let (grid, mut time) = reconstruct(&run, explicit)?;

    let mut aux = AuxData::default();
    for (k, name) in schema.aux.iter().enumerate() {
        let section = format!("aux '{name}'");
        let (line_no, line) = source.require(&section, k, run.nx)?;
        let values = parse_row(&line, line_no, &section, k, run.nx)?;
        aux.push(name.clone(), values);
    }

    let mut field = Field::with_nominal_rows(run.nt_out, run.nx);
    while field.observed_rows() < run.nt_out {
        let Some((line_no, line)) = source.next()? else {
            break;
        };
        let values = parse_row(&line, line_no, "body", field.observed_rows(), run.nx)?;
        field.push_row(&values, line_no)?;
    }

    time.record(field.observed_rows());

    if field.is_truncated() {
        debug!(
            observed = field.observed_rows(),
            nominal = field.nominal_rows(),
            "output ends before nt_out rows"
        );
    } else if let Some((line_no, line)) = source.next()?
        && tokenize(&line).next().is_some()
    {
        warn!(line = line_no, "ignoring rows beyond nt_out");
    }

    Ok(Dataset {
        params,
        run,
        grid,
        time,
        field,
        aux,
    })
}

pub fn read_dataset_path(path: &Path, schema: &ParamSchema) -> FormatResult<Dataset> {
    let file = File::open(path)?;
    read_dataset(BufReader::new(file), schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SimulationFamily;

    #[test]
    fn tokenize_collapses_spaces_and_cr() {
        let tokens: Vec<_> = tokenize("1  2 3 \r").collect();
        assert_eq!(tokens, ["1", "2", "3"]);
        let tabbed: Vec<_> = tokenize("1\t2").collect();
        assert_eq!(tabbed, ["1\t2"]);
    }

    #[test]
    fn positional_parameter_line() {
        let schema = SimulationFamily::BurgersAb.schema();
        let params = parse_parameter_line(&schema, "64 512 0 1 0.015625 0.001 8 2 0.5", 1).unwrap();
        assert_eq!(params.get("nx"), Some(ParamValue::Int(64)));
        assert_eq!(params.get("which_AB"), Some(ParamValue::Int(2)));
        assert_eq!(params.get("cfl"), Some(ParamValue::Real(0.5)));
        assert_eq!(params.get("nt_out"), Some(ParamValue::Int(65)));
    }

    #[test]
    fn short_parameter_line_is_schema_mismatch() {
        let schema = SimulationFamily::Burgers.schema();
        let err = parse_parameter_line(&schema, "0.01 64 512", 1).unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));
    }

    #[test]
    fn non_numeric_parameter_reports_column() {
        let schema = SimulationFamily::Burgers.schema();
        let err =
            parse_parameter_line(&schema, "0.01 64 x 0 1 0.015625 0.001 8 0.5", 1).unwrap_err();
        assert!(matches!(err, FormatError::ParseError { line: 1, column: 3, .. }));
    }

    #[test]
    fn declared_int_rejects_fraction() {
        let schema = SimulationFamily::Advection.schema();
        let err = parse_parameter_line(&schema, "1 64 512 0 1 0.015625 0.001 8 2.5 0.5", 1)
            .unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));
    }

    #[test]
    fn named_parameter_line() {
        let schema = ParamSchema::named("self-describing");
        let params =
            parse_parameter_line(&schema, "nx=4 nt=8 dt=0.5 write_every=2 tag=7", 1).unwrap();
        assert_eq!(params.get("nt_out"), Some(ParamValue::Int(5)));
        assert_eq!(params.get_f64("dt"), Some(0.5));
    }

    #[test]
    fn named_line_requires_listed_fields() {
        let mut schema = ParamSchema::named("self-describing");
        schema.fields = vec![crate::schema::FieldSpec::auto("cfl")];
        let err = parse_parameter_line(&schema, "nx=4 nt=8", 1).unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));

        let err = parse_parameter_line(&schema, "nx=4 8", 1).unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));
    }

    #[test]
    fn empty_stream_is_schema_mismatch() {
        let schema = SimulationFamily::Burgers.schema();
        let err = read_dataset("".as_bytes(), &schema).unwrap_err();
        assert!(matches!(err, FormatError::SchemaMismatch { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn tokenize_ignores_space_runs(
            tokens in prop::collection::vec("[0-9a-z.=-]{1,8}", 0..12),
            gap in 1_usize..4,
        ) {
            let line = format!(" {}\r", tokens.join(" ".repeat(gap).as_str()));
            let split: Vec<&str> = tokenize(&line).collect();
            prop_assert_eq!(split, tokens.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn body_rows_round_trip_through_text(
            rows in prop::collection::vec(prop::collection::vec(-1e6_f64..1e6_f64, 3), 1..6),
        ) {
            let schema = crate::schema::ParamSchema::positional(
                "rows",
                &["nx", "nt", "min_x", "max_x", "dt", "write_every"],
            );
            let mut text = format!("3 {} 0 1 0.1 1\n", rows.len() - 1);
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                text.push_str(&cells.join(" "));
                text.push('\n');
            }
            let ds = read_dataset(text.as_bytes(), &schema).unwrap();
            prop_assert_eq!(ds.field.observed_rows(), rows.len());
            for (i, row) in rows.iter().enumerate() {
                prop_assert_eq!(ds.field.row(i), Some(row.as_slice()));
            }
        }
    }
}
