//! Read and write labeled matrices as Numpy arrays
//!
//! A matrix is exported densely as `<stem>.npy` (little-endian `<f8`, C order) with its labels
//! beside it in `<stem>.rows` and `<stem>.cols`, one per line, so it loads straight into numpy.
use crate::errors::*;
use crate::matrix::{Cell, LabeledMatrix};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::prelude::*;
use ndarray::Data;
use regex::bytes::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::str;

/// Write an array as a numpy array
pub fn write_matrix<S, P>(path: P, arr: &ArrayBase<S, Ix2>) -> Result<()>
where
    S: Data<Elem = f64>,
    P: AsRef<Path>,
{
    let header_nospace = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        arr.nrows(),
        arr.ncols()
    );
    let virtual_len =
        // Calculating how many bytes we have in the header, so we can get alignment
        header_nospace.len()
        + 6 // The magic string
        + 2 // The version number
        + 2 // An unsigned 2-byte integer for header length
        + 1; // Because there will be a \n added
    let padding_needed = ((virtual_len + 15) / 16) * 16 - virtual_len; // to get to the next 16

    // Numpy version 1.0
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(b"\x93NUMPY\x01\x00")?;
    writer.write_u16::<LittleEndian>((header_nospace.len() + padding_needed + 1) as u16)?;
    writeln!(writer, "{}{}", header_nospace, " ".repeat(padding_needed))?;
    // Row major, whatever the layout in memory
    for &x in arr.iter() {
        writer.write_f64::<LittleEndian>(x)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a Numpy matrix into memory. Be careful if it's large. You could run out of memory.
///
/// You need to know the number of dimensions at compile time so for convenience, we assume you
/// need a matrix.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let header_match = Regex::new(
        r"(?s-u)^\x93NUMPY\x01\x00..\{'descr': ?'<f8', ?'fortran_order': ?False, ?'shape': ?\((\d+), ?(\d+)\),? ?\} *\n",
    )?;
    let mut content = vec![];
    File::open(path.as_ref())?.read_to_end(&mut content)?;
    let (skip, h, w) = {
        let captures = header_match
            .captures(&content)
            .ok_or_else(|| helpful_complaint(path.as_ref(), &content))?;
        let dim = |i: usize| -> Result<usize> {
            str::from_utf8(&captures[i])
                .ok()
                .and_then(|d| d.parse().ok())
                .ok_or_else(|| helpful_complaint(path.as_ref(), &content))
        };
        // where the full match ends, then the shape of the array as described in the metadata
        (captures[0].len(), dim(1)?, dim(2)?)
    };
    let length = content.len() - skip;
    if length != h * w * 8 {
        return Err(Error::InvalidDimensions(format!(
            "The numpy file's array is the wrong length for a {}x{} array. \
            It should be {} elements, ({} bytes), but it is actually {} bytes.",
            h,
            w,
            h * w,
            h * w * 8,
            length
        )));
    }
    let mut values = vec![0f64; h * w];
    Cursor::new(&content[skip..]).read_f64_into::<LittleEndian>(&mut values)?;
    Array2::from_shape_vec((h, w), values)
        .map_err(|err| Error::InvalidDimensions(err.to_string()))
}

/// `<stem>.<extension>`, keeping any dots already in the stem
fn sibling(stem: &Path, extension: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_labels(path: &Path, labels: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for label in labels {
        writeln!(writer, "{}", label)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_labels(path: &Path) -> Result<Vec<String>> {
    BufReader::new(File::open(path)?)
        .lines()
        .map(|line| line.map_err(Error::from))
        .collect()
}

/// Write `<stem>.npy`, `<stem>.rows` and `<stem>.cols`
pub fn export<V: Cell, P: AsRef<Path>>(matrix: &LabeledMatrix<V>, stem: P) -> Result<()> {
    let stem = stem.as_ref();
    let dense = matrix.to_dense().mapv(Cell::to_f64);
    write_matrix(sibling(stem, "npy"), &dense)?;
    write_labels(&sibling(stem, "rows"), matrix.row_labels())?;
    write_labels(&sibling(stem, "cols"), matrix.col_labels())?;
    info!("Exported a {}x{} matrix to {}.npy", dense.nrows(), dense.ncols(), stem.display());
    Ok(())
}

/// Read back what `export` wrote
pub fn import<P: AsRef<Path>>(stem: P) -> Result<LabeledMatrix<f64>> {
    let stem = stem.as_ref();
    let dense = read_matrix(sibling(stem, "npy"))?;
    let rows = read_labels(&sibling(stem, "rows"))?;
    let cols = read_labels(&sibling(stem, "cols"))?;
    if dense.dim() != (rows.len(), cols.len()) {
        return Err(Error::InvalidDimensions(format!(
            "{}.npy is {:?} but there are {} row and {} column labels",
            stem.display(),
            dense.dim(),
            rows.len(),
            cols.len()
        )));
    }
    let triplets = dense
        .indexed_iter()
        .filter(|&(_, &x)| x != 0.0)
        .map(|((r, c), &x)| (r, c, x))
        .collect();
    LabeledMatrix::from_triplets(rows, cols, triplets)
}

/// Tell the user more info about the file
///
/// It seems verbose but you can see this error often so it save you time.
fn helpful_complaint(p: &Path, header: &[u8]) -> Error {
    let cap = std::cmp::min(header.len(), 100);
    let complaint = format!(
        "Expected {} to be an uncompressed numpy (.npy) file, but couldn't \
        parse the header. The first hundred bytes look like:

        {}


        As bytes, the header is as follows:

        {:?}


        It should look something like this example, where . are non-printable characters: \
        .NUMPY..{{'descr': '<f8', 'fortran_order': False, 'shape': (34, 27), }}\
        Note: only 2D little-endian 64-bit float matrices in C order are supported (for \
        simplicity). You may need to change the dtype accordingly.",
        p.display(),
        String::from_utf8_lossy(&header[..cap]),
        &header[..cap]
    );
    Error::Other(complaint)
}
