use matrix_util::common_io::{create_temp_dir, read_lines_of_words_delim, write_lines};
use matrix_util::traits::IoOps;
use nalgebra::DMatrix;

fn names(prefix: &str, n: usize) -> Vec<Box<str>> {
    (0..n)
        .map(|i| format!("{}{}", prefix, i).into_boxed_str())
        .collect()
}

#[test]
fn dmatrix_named_tsv_gz_round_trip() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let xx = DMatrix::<f32>::from_fn(20, 7, |i, j| (i * 7 + j) as f32 / 3.0);
    let rows = names("gene", 20);
    let cols = names("k", 7);

    let tsv_file = dir.path().join("xx.tsv.gz");
    let tsv_file = tsv_file.to_str().unwrap();
    xx.write_named_delim(tsv_file, "\t", &rows, &cols, "")?;

    let yy = DMatrix::<f32>::read_named(tsv_file)?;

    approx::assert_abs_diff_eq!(xx, yy.mat);
    assert_eq!(yy.rows, rows);
    assert_eq!(yy.cols, cols);
    Ok(())
}

#[test]
fn matrix_without_columns_keeps_every_row() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let file = dir.path().join("empty_cols.csv");
    let file = file.to_str().unwrap();

    let xx = DMatrix::<f32>::zeros(4, 0);
    let rows = names("gene", 4);
    xx.to_csv_with_names(file, &rows, &[])?;

    let read = DMatrix::<f32>::read_named(file)?;
    assert_eq!(read.rows, rows);
    assert!(read.cols.is_empty());
    assert_eq!(read.mat.shape(), (4, 0));
    Ok(())
}

#[test]
fn blank_lines_after_header_are_skipped() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let file = dir.path().join("blank.csv");
    let file = file.to_str().unwrap();

    let lines: Vec<Box<str>> = vec![",a".into(), "".into(), "x,1".into(), "  ".into()];
    write_lines(&lines, file)?;

    let read = DMatrix::<u32>::read_named(file)?;
    assert_eq!(read.rows, vec![Box::from("x")]);
    assert_eq!(read.mat[(0, 0)], 1);
    Ok(())
}

#[test]
fn dmatrix_named_csv_round_trip() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let xx = DMatrix::<u32>::from_fn(5, 3, |i, j| (i * 3 + j) as u32);
    let rows = names("gene", 5);
    let cols = names("cell", 3);

    let csv_file = dir.path().join("xx.csv");
    let csv_file = csv_file.to_str().unwrap();
    xx.to_csv_with_names(csv_file, &rows, &cols)?;

    let lines = read_lines_of_words_delim(csv_file, ",", -1)?.lines;
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0][0].as_ref(), "");
    assert_eq!(lines[1][0].as_ref(), "gene0");

    let read = DMatrix::<u32>::read_named(csv_file)?;
    assert_eq!(read.rows, rows);
    assert_eq!(read.cols, cols);
    assert_eq!(read.mat, xx);
    Ok(())
}

#[test]
fn named_read_without_corner_field() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let file = dir.path().join("cnv.tsv");
    let file = file.to_str().unwrap();

    let lines: Vec<Box<str>> = vec![
        "c1\tc2".into(),
        "g1\t2\t3".into(),
        "# a comment".into(),
        "g2\t4\t1".into(),
    ];
    write_lines(&lines, file)?;

    let read = DMatrix::<f32>::read_named(file)?;
    assert_eq!(read.cols, vec![Box::from("c1"), Box::from("c2")]);
    assert_eq!(read.rows, vec![Box::from("g1"), Box::from("g2")]);
    assert_eq!(read.mat[(1, 0)], 4.0);
    Ok(())
}

#[test]
fn named_read_rejects_ragged_lines() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let file = dir.path().join("bad.csv");
    let file = file.to_str().unwrap();

    let lines: Vec<Box<str>> = vec![",a,b".into(), "x,1,2".into(), "y,1".into()];
    write_lines(&lines, file)?;

    assert!(DMatrix::<f32>::read_named(file).is_err());
    Ok(())
}

#[test]
fn quoted_fields_are_unquoted() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let file = dir.path().join("quoted.csv");
    let file = file.to_str().unwrap();

    let xx = DMatrix::<u32>::from_element(1, 1, 9);
    xx.to_csv_with_names(file, &["a,b".into()], &["c".into()])?;

    let read = DMatrix::<u32>::read_named(file)?;
    assert_eq!(read.rows[0].as_ref(), "a,b");
    Ok(())
}

#[test]
fn quoted_column_names_round_trip() -> anyhow::Result<()> {
    let dir = create_temp_dir()?;
    let file = dir.path().join("clones.csv");
    let file = file.to_str().unwrap();

    let xx = DMatrix::<u32>::from_fn(2, 3, |i, j| (i + j) as u32);
    let rows = names("gene", 2);
    let cols: Vec<Box<str>> = vec!["A,1".into(), "B \"x\"".into(), "C".into()];
    xx.to_csv_with_names(file, &rows, &cols)?;

    let read = DMatrix::<u32>::read_named(file)?;
    assert_eq!(read.cols, cols);
    assert_eq!(read.mat, xx);
    Ok(())
}
