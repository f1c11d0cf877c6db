//! Utility functions for working with files.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

const SIZE_UNITS: [(f64, &str); 5] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
];

/// Returns a human-readable representation of the given number of bytes.
///
/// # Examples
///
/// ```
/// use gloci::utils;
///
/// assert_eq!(utils::human_readable_size(512), "512.000 B");
/// assert_eq!(utils::human_readable_size(3 * 1024 * 1024 / 2), "1.500 MiB");
/// ```
pub fn human_readable_size(bytes: usize) -> String {
    let value = bytes as f64;
    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file, or [`None`] if the file cannot be accessed.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file starts with the gzip magic number.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let mut file = match File::open(filename) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut magic = [0; 2];
    matches!(file.read_exact(&mut magic), Ok(())) && magic == [0x1F, 0x8B]
}

/// Returns a buffered reader for the file, which may be gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, String> {
    let file = File::open(&filename).map_err(|x| x.to_string())?;
    let inner = BufReader::new(file);
    if is_gzipped(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
