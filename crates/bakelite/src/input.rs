use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, USAGE};

/// Open the input stream: a file, or stdin when no path is given.
///
/// With `hex`, the whole input is read as hex text first.
pub fn open_source(file: Option<&Path>, hex: bool) -> CliResult<Box<dyn Read>> {
    if hex {
        let data = read_source(file, true)?;
        return Ok(Box::new(Cursor::new(data)));
    }
    match file {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

/// Read the whole input into memory.
pub fn read_source(file: Option<&Path>, hex: bool) -> CliResult<Vec<u8>> {
    let mut data = Vec::new();
    match file {
        Some(path) => {
            File::open(path)
                .and_then(|mut f| f.read_to_end(&mut data))
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        }
        None => {
            io::stdin()
                .read_to_end(&mut data)
                .map_err(|err| io_error("failed reading stdin", err))?;
        }
    }

    if !hex {
        return Ok(data);
    }
    let text = std::str::from_utf8(&data)
        .map_err(|_| CliError::new(DATA_INVALID, "hex input is not valid UTF-8"))?;
    parse_hex(text).map_err(|err| CliError::new(DATA_INVALID, err.message))
}

/// Parse hex text, ignoring whitespace.
pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| CliError::new(USAGE, format!("invalid hex: {err}")))
}
