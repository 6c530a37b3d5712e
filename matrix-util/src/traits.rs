use crate::common_io::detect_delimiter;

/// A matrix together with its row and column names
pub struct MatWithNames<T> {
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
    pub mat: T,
}

/// Read and write matrices from and to delimited text files
pub trait IoOps {
    type Mat;

    /// Read a matrix whose first line holds column names and whose
    /// first field on every other line is the row name. A leading
    /// corner field in the header (as written by data frame libraries)
    /// is recognized and dropped.
    fn read_named_delim(file: &str, delim: &str) -> anyhow::Result<MatWithNames<Self::Mat>>;

    /// Same as `read_named_delim` with the delimiter guessed from
    /// the file extension
    fn read_named(file: &str) -> anyhow::Result<MatWithNames<Self::Mat>> {
        Self::read_named_delim(file, detect_delimiter(file))
    }

    /// Write a matrix with a header line of column names and the row
    /// name in front of each line
    /// * `corner` - header field above the row names
    fn write_named_delim(
        &self,
        file: &str,
        delim: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
        corner: &str,
    ) -> anyhow::Result<()>;

    fn to_csv_with_names(
        &self,
        csv_file: &str,
        rows: &[Box<str>],
        cols: &[Box<str>],
    ) -> anyhow::Result<()> {
        self.write_named_delim(csv_file, ",", rows, cols, "")
    }
}
