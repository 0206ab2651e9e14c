// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! A reader for 0/1 programs in MPS format. Supported sections: NAME, ROWS
//! (N/L/G/E), COLUMNS (integrality markers tolerated), RHS, BOUNDS (BV, UP,
//! LO, FX, MI treated as far as binary variables allow). `E` rows are split
//! into a `<=` and a `>=` row. Variables fixed by their bounds are folded
//! into the right-hand sides; every remaining variable must be binary. The
//! MPS objective is assumed to be minimized and is negated, since the
//! diagram always maximizes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::Error;
use crate::problems::bp::instance::{BpInstance, BpRow, BpVar, RowSense};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Section {
    None,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum MpsRowKind {
    Objective,
    Le,
    Ge,
    Eq,
}

struct MpsRow {
    kind: MpsRowKind,
    rhs: f64,
    entries: Vec<(usize, f64)>,
}

/// Read a binary program from an MPS file.
pub fn read_bp_instance(path: &Path) -> Result<BpInstance, Error> {
    let file = BufReader::new(File::open(path)?);

    let mut section = Section::None;
    let mut rows: Vec<MpsRow> = vec![];
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut objective_row: Option<usize> = None;
    let mut col_index: HashMap<String, usize> = HashMap::new();
    let mut ncols = 0usize;
    let mut lower: Vec<f64> = vec![];
    let mut upper: Vec<f64> = vec![];

    for line in file.lines() {
        let line = line?;
        if line.starts_with('*') || line.trim().is_empty() {
            continue;
        }
        let header = !line.starts_with(' ') && !line.starts_with('\t');
        let fields: Vec<&str> = line.split_whitespace().collect();

        if header {
            section = match fields[0] {
                "NAME" => Section::None,
                "OBJSENSE" => {
                    return Err(Error::Parse("OBJSENSE section is not supported".to_string()))
                }
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "RANGES" => Section::Ranges,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => break,
                other => {
                    return Err(Error::Parse(format!("unsupported MPS section `{other}`")));
                }
            };
            continue;
        }

        match section {
            Section::None => continue,
            Section::Ranges => {
                return Err(Error::Parse("RANGES section is not supported".to_string()));
            }
            Section::Rows => {
                if fields.len() != 2 {
                    return Err(Error::Parse(format!("malformed ROWS line `{line}`")));
                }
                let kind = match fields[0] {
                    "N" => MpsRowKind::Objective,
                    "L" => MpsRowKind::Le,
                    "G" => MpsRowKind::Ge,
                    "E" => MpsRowKind::Eq,
                    other => {
                        return Err(Error::Parse(format!("unknown row sense `{other}`")));
                    }
                };
                let idx = rows.len();
                rows.push(MpsRow { kind, rhs: 0.0, entries: vec![] });
                row_index.insert(fields[1].to_string(), idx);
                if kind == MpsRowKind::Objective && objective_row.is_none() {
                    objective_row = Some(idx);
                }
            }
            Section::Columns => {
                // integrality markers delimit integer columns; every
                // variable must be binary anyway, so they carry no extra
                // information here
                if fields.len() >= 3 && fields[1] == "'MARKER'" {
                    continue;
                }
                if fields.len() < 3 || fields.len() % 2 == 0 {
                    return Err(Error::Parse(format!("malformed COLUMNS line `{line}`")));
                }
                let col = *col_index.entry(fields[0].to_string()).or_insert_with(|| {
                    let idx = ncols;
                    ncols += 1;
                    lower.push(0.0);
                    upper.push(1.0);
                    idx
                });
                for pair in fields[1..].chunks(2) {
                    let row = *row_index
                        .get(pair[0])
                        .ok_or_else(|| Error::Parse(format!("unknown row `{}`", pair[0])))?;
                    let coeff = parse_f64(pair[1])?;
                    rows[row].entries.push((col, coeff));
                }
            }
            Section::Rhs => {
                if fields.len() < 3 || fields.len() % 2 == 0 {
                    return Err(Error::Parse(format!("malformed RHS line `{line}`")));
                }
                for pair in fields[1..].chunks(2) {
                    let row = *row_index
                        .get(pair[0])
                        .ok_or_else(|| Error::Parse(format!("unknown row `{}`", pair[0])))?;
                    rows[row].rhs = parse_f64(pair[1])?;
                }
            }
            Section::Bounds => {
                if fields.len() < 3 {
                    return Err(Error::Parse(format!("malformed BOUNDS line `{line}`")));
                }
                let col = *col_index
                    .get(fields[2])
                    .ok_or_else(|| Error::Parse(format!("unknown column `{}`", fields[2])))?;
                match fields[0] {
                    "BV" => {
                        lower[col] = 0.0;
                        upper[col] = 1.0;
                    }
                    "UP" => upper[col] = parse_f64(field_at(&fields, 3, &line)?)?,
                    "LO" => lower[col] = parse_f64(field_at(&fields, 3, &line)?)?,
                    "FX" => {
                        let val = parse_f64(field_at(&fields, 3, &line)?)?;
                        lower[col] = val;
                        upper[col] = val;
                    }
                    "MI" => lower[col] = 0.0,
                    other => {
                        return Err(Error::Parse(format!("unsupported bound type `{other}`")));
                    }
                }
            }
        }
    }

    let objective_row =
        objective_row.ok_or_else(|| Error::Parse("missing objective row".to_string()))?;

    // validate domains: every variable is either binary or fixed
    for col in 0..ncols {
        let fixed = lower[col] == upper[col];
        let binary = lower[col] == 0.0 && upper[col] == 1.0;
        if !fixed && !binary {
            return Err(Error::Parse(format!(
                "variable with bounds [{}, {}] is not binary",
                lower[col], upper[col]
            )));
        }
        if fixed && lower[col] != 0.0 && lower[col] != 1.0 {
            return Err(Error::Parse(format!(
                "variable fixed to non-binary value {}",
                lower[col]
            )));
        }
    }

    // free variables keep their order; fixed ones fold into the rhs
    let mut free_index: Vec<Option<usize>> = vec![None; ncols];
    let mut nfree = 0;
    for col in 0..ncols {
        if lower[col] != upper[col] {
            free_index[col] = Some(nfree);
            nfree += 1;
        }
    }

    let mut objective = vec![0.0; nfree];
    for &(col, coeff) in rows[objective_row].entries.iter() {
        if let Some(idx) = free_index[col] {
            // the MPS objective minimizes, the diagram maximizes
            objective[idx] = -coeff;
        }
    }

    let mut bp_rows: Vec<BpRow> = vec![];
    for (idx, row) in rows.iter().enumerate() {
        if idx == objective_row || row.kind == MpsRowKind::Objective {
            continue;
        }
        let mut ind = vec![];
        let mut coeffs = vec![];
        let mut rhs = row.rhs;
        for &(col, coeff) in row.entries.iter() {
            match free_index[col] {
                Some(free) => {
                    ind.push(free);
                    coeffs.push(coeff);
                }
                None => rhs -= coeff * lower[col],
            }
        }
        match row.kind {
            MpsRowKind::Le => bp_rows.push(BpRow::new(RowSense::Le, rhs, ind, coeffs)),
            MpsRowKind::Ge => bp_rows.push(BpRow::new(RowSense::Ge, rhs, ind, coeffs)),
            MpsRowKind::Eq => {
                bp_rows.push(BpRow::new(RowSense::Le, rhs, ind.clone(), coeffs.clone()));
                bp_rows.push(BpRow::new(RowSense::Ge, rhs, ind, coeffs));
            }
            MpsRowKind::Objective => unreachable!(),
        }
    }

    let vars: Vec<BpVar> = objective
        .into_iter()
        .enumerate()
        .map(|(idx, obj)| BpVar::new(obj, idx))
        .collect();
    Ok(BpInstance::new(vars, bp_rows))
}

fn field_at<'a>(fields: &[&'a str], idx: usize, line: &str) -> Result<&'a str, Error> {
    fields
        .get(idx)
        .copied()
        .ok_or_else(|| Error::Parse(format!("malformed BOUNDS line `{line}`")))
}

fn parse_f64(token: &str) -> Result<f64, Error> {
    token
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("invalid number `{token}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_mps(name: &str, content: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("ddcut-test-{}-{name}", std::process::id()));
        let mut out = File::create(&path).unwrap();
        out.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_a_small_packing_program() {
        let path = write_mps(
            "packing.mps",
            "NAME          PACKING\n\
             ROWS\n\
             \x20N  COST\n\
             \x20L  C1\n\
             \x20L  C2\n\
             COLUMNS\n\
             \x20   X0  COST  -1.0  C1  1.0\n\
             \x20   X0  C2  1.0\n\
             \x20   X1  COST  -1.0  C1  1.0\n\
             \x20   X2  COST  -1.0  C2  1.0\n\
             RHS\n\
             \x20   RHS  C1  1.0  C2  1.0\n\
             BOUNDS\n\
             \x20BV BND  X0\n\
             \x20BV BND  X1\n\
             \x20BV BND  X2\n\
             ENDATA\n",
        );
        let inst = read_bp_instance(&path).unwrap();
        assert_eq!(3, inst.nvars());
        assert_eq!(2, inst.nrows());
        // minimization of -x is maximization of x
        assert_eq!(vec![1.0, 1.0, 1.0], inst.weights);
        assert_eq!(RowSense::Le, inst.rows[0].sense);
        assert_eq!(vec![0, 1], inst.rows[0].ind);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn equality_rows_split_in_two() {
        let path = write_mps(
            "eq.mps",
            "NAME          EQ\n\
             ROWS\n\
             \x20N  COST\n\
             \x20E  C1\n\
             COLUMNS\n\
             \x20   X0  COST  -1.0  C1  1.0\n\
             \x20   X1  C1  1.0\n\
             RHS\n\
             \x20   RHS  C1  1.0\n\
             BOUNDS\n\
             \x20BV BND  X0\n\
             \x20BV BND  X1\n\
             ENDATA\n",
        );
        let inst = read_bp_instance(&path).unwrap();
        assert_eq!(2, inst.nrows());
        assert_eq!(RowSense::Le, inst.rows[0].sense);
        assert_eq!(RowSense::Ge, inst.rows[1].sense);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn fixed_variables_fold_into_the_rhs() {
        let path = write_mps(
            "fixed.mps",
            "NAME          FIXED\n\
             ROWS\n\
             \x20N  COST\n\
             \x20L  C1\n\
             COLUMNS\n\
             \x20   X0  COST  -1.0  C1  1.0\n\
             \x20   X1  C1  1.0\n\
             RHS\n\
             \x20   RHS  C1  1.0\n\
             BOUNDS\n\
             \x20BV BND  X0\n\
             \x20FX BND  X1  1.0\n\
             ENDATA\n",
        );
        let inst = read_bp_instance(&path).unwrap();
        assert_eq!(1, inst.nvars());
        assert_eq!(0.0, inst.rows[0].rhs);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn non_binary_variables_are_rejected() {
        let path = write_mps(
            "bad.mps",
            "NAME          BAD\n\
             ROWS\n\
             \x20N  COST\n\
             \x20L  C1\n\
             COLUMNS\n\
             \x20   X0  COST  -1.0  C1  1.0\n\
             RHS\n\
             \x20   RHS  C1  5.0\n\
             BOUNDS\n\
             \x20UP BND  X0  3.0\n\
             ENDATA\n",
        );
        assert!(read_bp_instance(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
