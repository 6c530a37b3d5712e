use crate::common_io::{quote_field, read_lines_of_words_delim, write_lines};
use crate::traits::*;
pub use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use std::fmt::{Debug, Display};
use std::str::FromStr;

fn parse_row<T>(words: &[Box<str>], line: usize) -> anyhow::Result<Vec<T>>
where
    T: FromStr,
    <T as FromStr>::Err: Debug,
{
    words
        .iter()
        .map(|w| {
            w.parse::<T>()
                .map_err(|e| anyhow::anyhow!("line {}: failed to parse `{}`: {:?}", line, w, e))
        })
        .collect()
}

fn format_line<'a, T, I>(name: &str, values: I, delim: &str) -> Box<str>
where
    T: Display + 'a,
    I: Iterator<Item = &'a T>,
{
    std::iter::once(quote_field(name))
        .chain(values.map(|x| quote_field(&x.to_string())))
        .collect::<Vec<_>>()
        .join(delim)
        .into_boxed_str()
}

impl<T> IoOps for DMatrix<T>
where
    T: nalgebra::Scalar + Send + Sync + FromStr + Display + Copy,
    <T as FromStr>::Err: Debug,
{
    type Mat = Self;

    fn read_named_delim(file: &str, delim: &str) -> anyhow::Result<MatWithNames<Self::Mat>> {
        let out = read_lines_of_words_delim(file, delim, 0)?;

        if out.lines.is_empty() {
            return Err(anyhow::anyhow!("No data in file {}", file));
        }

        let width = out.lines[0].len();
        if width < 1 {
            return Err(anyhow::anyhow!("empty lines in {}", file));
        }
        let ncols = width - 1;

        let cols: Vec<Box<str>> = if out.header.len() == width {
            out.header[1..].to_vec()
        } else if out.header.len() == ncols {
            out.header.clone()
        } else {
            return Err(anyhow::anyhow!(
                "{}: header has {} fields, but data lines have {}",
                file,
                out.header.len(),
                width
            ));
        };

        let parsed = out
            .lines
            .par_iter()
            .enumerate()
            .map(|(i, words)| -> anyhow::Result<(Box<str>, Vec<T>)> {
                if words.len() != width {
                    return Err(anyhow::anyhow!(
                        "{}: line {} has {} fields, expected {}",
                        file,
                        i + 2,
                        words.len(),
                        width
                    ));
                }
                Ok((words[0].clone(), parse_row(&words[1..], i + 2)?))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let nrows = parsed.len();
        let mut rows = Vec::with_capacity(nrows);
        let mut data = Vec::with_capacity(nrows * ncols);
        for (name, values) in parsed {
            rows.push(name);
            data.extend(values);
        }

        Ok(MatWithNames {
            rows,
            cols,
            mat: DMatrix::<T>::from_row_iterator(nrows, ncols, data),
        })
    }

    fn write_named_delim(
        &self,
        file: &str,
        delim: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
        corner: &str,
    ) -> anyhow::Result<()> {
        if rows.len() != self.nrows() || cols.len() != self.ncols() {
            return Err(anyhow::anyhow!(
                "names ({} x {}) don't match the matrix ({} x {})",
                rows.len(),
                cols.len(),
                self.nrows(),
                self.ncols()
            ));
        }

        let mut lines = Vec::with_capacity(self.nrows() + 1);
        lines.push(format_line(corner, cols.iter(), delim));

        // rows stay in order
        lines.extend(
            self.row_iter()
                .zip(rows.iter())
                .map(|(row, name)| format_line(name, row.iter(), delim)),
        );

        write_lines(&lines, file)
    }
}
