use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Split a line into fields, dropping the surrounding double quotes a
/// CSV writer may have put around a field. A single-character
/// delimiter inside a quoted field does not split it.
fn split_fields(line: &str, delim: &str) -> Vec<Box<str>> {
    let line = line.trim_end_matches('\r');
    let mut chars = delim.chars();
    let fields: Vec<&str> = match (chars.next(), chars.next()) {
        (Some(c), None) => split_outside_quotes(line, |x| x == c),
        _ => line.split(delim).collect(),
    };
    fields.into_iter().map(unquote).collect()
}

/// Split on delimiter characters that are not inside a double-quoted
/// field
fn split_outside_quotes(line: &str, is_delim: impl Fn(char) -> bool) -> Vec<&str> {
    let mut fields = vec![];
    let mut in_quotes = false;
    let mut start = 0;
    for (pos, c) in line.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes && is_delim(c) {
            fields.push(&line[start..pos]);
            start = pos + c.len_utf8();
        }
    }
    fields.push(&line[start..]);
    fields
}

fn unquote(field: &str) -> Box<str> {
    let field = field.trim();
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"").into_boxed_str()
    } else {
        field.to_string().into_boxed_str()
    }
}

/// Quote a field if it would otherwise break a comma-separated line
pub fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Guess the delimiter from the file extension
/// (`.csv`, `.csv.gz` → `,`; anything else → tab)
pub fn detect_delimiter(file_path: &str) -> &'static str {
    if file_path.ends_with(".csv") || file_path.ends_with(".csv.gz") {
        ","
    } else {
        "\t"
    }
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines(lines: &[Box<str>], output_file_path: &str) -> anyhow::Result<()> {
    write_types(lines, output_file_path)
}

///
/// Write anything displayable, one item per line
///
/// * `lines` - vector of items
/// * `output_file` - file name--either gzipped or not
///
pub fn write_types<T>(lines: &[T], output_file_path: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file_path)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

///
/// Read lines and parse each of them into a vector of fields.
/// Comment lines (`#`, `%`) are skipped, and so are blank lines after
/// the header. A blank header line is kept: it is the header of a
/// matrix without columns.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: &str,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let buf_reader: Box<dyn BufRead> = open_buf_reader(input_file)?;

    let n_hdr = if hdr_line < 0 { 0 } else { hdr_line as usize + 1 };

    let mut lines_raw: Vec<Box<str>> = vec![];
    for line in buf_reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        if line.trim().is_empty() && lines_raw.len() >= n_hdr {
            continue;
        }
        lines_raw.push(line.into_boxed_str());
    }

    let mut header = vec![];
    let body = if hdr_line < 0 {
        &lines_raw[..]
    } else {
        let n_skip = hdr_line as usize;
        if lines_raw.len() < (n_skip + 1) {
            return Err(anyhow::anyhow!("not enough data in {}", input_file));
        }
        header.extend(split_fields(&lines_raw[n_skip], delim));
        &lines_raw[(n_skip + 1)..]
    };

    // par_iter on a slice keeps the order
    let lines = body
        .par_iter()
        .map(|s| split_fields(s, delim))
        .collect::<Vec<_>>();

    Ok(ReadLinesOut { lines, header })
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn std::io::Write>> {
    let file = File::create(output_file)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {}", output_file, e))?;
    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Create a directory (and all of its parents) if needed
/// * `dir` - directory name
///
pub fn mkdir_all(dir: &str) -> anyhow::Result<()> {
    if !Path::new(dir).is_dir() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

///
/// Create a temporary directory that is removed when dropped
///
pub fn create_temp_dir() -> anyhow::Result<tempfile::TempDir> {
    Ok(tempfile::tempdir()?)
}
