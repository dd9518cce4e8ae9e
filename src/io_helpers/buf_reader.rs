use std::{
    ffi::OsStr,
    fs::File,
    io::{self, BufRead},
    path::Path,
};

use flate2::read::GzDecoder;

/// Opens `file_path` for buffered reading, decompressing `.gz` files on the fly
pub fn get_bufreader(file_path: &Path) -> Result<Box<dyn BufRead + Send>, io::Error> {
    let extension = file_path.extension().and_then(OsStr::to_str);
    let file = File::open(file_path)?;
    if extension == Some("gz") {
        let file = GzDecoder::new(file);
        Ok(Box::new(io::BufReader::new(file)))
    } else {
        Ok(Box::new(io::BufReader::new(file)))
    }
}
