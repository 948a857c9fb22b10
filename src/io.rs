//! Input/Output structs and functions: reading the existing hosts file,
//! finding and reading override files, and writing the result.
//!
//! Text is handled as bytes throughout. Files that start with a UTF-16 Byte
//! Order Mark are translated to UTF-8; anything else is passed through as is.
use anyhow::{Context, Result};
use bstr::io::BufReadExt;
use bstr::ByteSlice;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use memchr::memchr;
use std::{
    fs,
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::error::HostsError;

/// Reads the existing hosts file in its entirety. A missing or unreadable
/// file is `HostsError::MissingPrerequisite`.
pub fn read_hosts_file(path: &Path) -> Result<Vec<u8>, HostsError> {
    fs::read(path)
        .map(decode_if_utf16)
        .map_err(|source| HostsError::MissingPrerequisite { path: path.to_owned(), source })
}

/// Decode UTF-16 to UTF-8 if we see a UTF-16 Byte Order Mark at the beginning of `candidate`.
/// Otherwise return `candidate` unchanged
pub(crate) fn decode_if_utf16(candidate: Vec<u8>) -> Vec<u8> {
    // Note: `decode_without_bom_handling` will change malformed sequences to the
    // Unicode REPLACEMENT CHARACTER.
    //
    // "with BOM handling" means that the UTF-16 BOM is translated to a UTF-8 BOM
    //
    if let Some((enc, _)) = encoding_rs::Encoding::for_bom(&candidate) {
        if [encoding_rs::UTF_16LE, encoding_rs::UTF_16BE].contains(&enc) {
            let (translated, _had_malformed_sequences) =
                enc.decode_without_bom_handling(&candidate);
            return translated.into_owned().into_bytes();
        }
    }
    return candidate;
}

/// The lines of `text`, without their `\n` or `\r\n` terminators.
pub fn lines_of(text: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    text.lines()
}

/// How the output should be framed: a UTF-8 Byte Order Mark (or nothing), and
/// the line terminator to put after every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    /// Byte Order Mark or empty
    pub bom: &'static [u8],
    /// `\n` or `\r\n`
    pub line_terminator: &'static [u8],
}

impl Default for Framing {
    fn default() -> Self {
        Framing { bom: b"", line_terminator: b"\n" }
    }
}

/// Returns the `Framing` of `slice` and `slice` without its Byte Order Mark.
/// The line terminator is `\r\n` if the first line of `slice` ends with
/// `\r\n`, and `\n` if the first line ends just with `\n` (or is the only
/// line in the file and has no line terminator).
pub fn framing_of(slice: &[u8]) -> (Framing, &[u8]) {
    let mut framing = Framing::default();
    if has_bom(slice) {
        framing.bom = BOM_BYTES;
    }
    let body = &slice[framing.bom.len()..];
    if let Some(n) = memchr(b'\n', body) {
        if n > 0 && body[n - 1] == b'\r' {
            framing.line_terminator = b"\r\n";
        }
    }
    (framing, body)
}

const BOM_0: u8 = b'\xEF';
const BOM_1: u8 = b'\xBB';
const BOM_2: u8 = b'\xBF';
const BOM_BYTES: &[u8] = b"\xEF\xBB\xBF";
/// Does `text` begin with a (UTF-8) Byte Order Mark?
fn has_bom(text: &[u8]) -> bool {
    text.len() >= 3 && text[0] == BOM_0 && text[1] == BOM_1 && text[2] == BOM_2
}

/// `text` without a leading UTF-8 Byte Order Mark
pub(crate) fn strip_bom(text: &[u8]) -> &[u8] {
    if has_bom(text) {
        &text[BOM_BYTES.len()..]
    } else {
        text
    }
}

/// Writes `lines` to `out`, framed by `framing`.
pub fn output_to(lines: &[Vec<u8>], framing: Framing, mut out: impl io::Write) -> Result<()> {
    out.write_all(framing.bom)?;
    for line in lines {
        out.write_all(line)?;
        out.write_all(framing.line_terminator)?;
    }
    out.flush()?;
    Ok(())
}

/// A file of local definitions. The only requirement the driver has of one
/// is a name for its section header and a way to visit its lines.
pub trait OverrideFile {
    /// The name used in the section header
    fn name(&self) -> String;

    /// Calls `for_each_line` with each line, stopping at the first error.
    fn try_for_byte_line(
        self,
        for_each_line: impl FnMut(&[u8]) -> Result<(), HostsError>,
    ) -> Result<()>;
}

/// Returns the `*.txt` files directly inside `dir`, in alphabetical order.
/// Hidden files and directories are skipped, as is `exclude` (the output
/// file, if we're writing one), so a previous run's output isn't read back in.
pub fn override_paths(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.txt");
    let pattern = pattern.to_string_lossy();
    let excluded = exclude.and_then(|path| fs::canonicalize(path).ok());

    let mut paths = Vec::new();
    // Hidden files aren't overrides, just as a shell's `*.txt` skips them
    let options = glob::MatchOptions { require_literal_leading_dot: true, ..Default::default() };
    let matches = glob::glob_with(&pattern, options)
        .with_context(|| format!("Bad override pattern: {pattern}"))?;
    for entry in matches {
        let path = entry.with_context(|| format!("Can't search {}", dir.display()))?;
        if !path.is_file() {
            warn!(path = %path.display(), "skipping override entry that isn't a file");
            continue;
        }
        if excluded.is_some() && fs::canonicalize(&path).ok() == excluded {
            debug!(path = %path.display(), "skipping the output file");
            continue;
        }
        paths.push(path);
    }
    Ok(paths)
}

/// An iterator over override files, opening each one only when it's reached.
pub struct Overrides {
    paths: std::vec::IntoIter<PathBuf>,
}

impl From<Vec<PathBuf>> for Overrides {
    fn from(paths: Vec<PathBuf>) -> Self {
        Overrides { paths: paths.into_iter() }
    }
}

impl Iterator for Overrides {
    type Item = Result<LocalFile<File>>;
    fn next(&mut self) -> Option<Self::Item> {
        self.paths.next().map(|path| LocalFile::open(&path))
    }
}

/// `LocalFile` is the `Item` type for the `Overrides` iterator. The `reader`
/// field is a reader for the file, and `path` is kept for its name and for
/// error messages.
pub struct LocalFile<T: Read> {
    path: PathBuf,
    reader: BufReader<DecodeReaderBytes<T, Vec<u8>>>,
}

impl LocalFile<File> {
    /// The reader is a buffered reader with the ability to decode UTF-16 files.
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Can't open file: {}", path.display()))?;
        Ok(LocalFile::new(path.to_owned(), file))
    }
}

impl<T: Read> LocalFile<T> {
    fn new(path: PathBuf, source: T) -> Self {
        let reader = BufReader::new(
            DecodeReaderBytesBuilder::new()
                .bom_sniffing(true) // Look at the BOM to detect UTF-16 files and convert to UTF-8
                .strip_bom(true) // Remove the BOM before sending data to us
                .utf8_passthru(true) // Don't enforce UTF-8 (BOM or no BOM)
                .build(source),
        );
        LocalFile { path, reader }
    }
}

impl<T: Read> OverrideFile for LocalFile<T> {
    fn name(&self) -> String {
        self.path.file_name().unwrap_or(self.path.as_os_str()).to_string_lossy().into_owned()
    }

    /// A wrapper around `bstr::for_byte_line` that lets the callback fail.
    fn try_for_byte_line(
        self,
        mut for_each_line: impl FnMut(&[u8]) -> Result<(), HostsError>,
    ) -> Result<()> {
        let LocalFile { path, mut reader } = self;
        let mut failure = None;
        reader
            .for_byte_line(|line| match for_each_line(line) {
                Ok(()) => Ok(true),
                Err(e) => {
                    failure = Some(e);
                    Ok(false)
                }
            })
            .with_context(|| format!("Error reading file: {}", path.display()))?;
        match failure {
            Some(e) => Err(e).with_context(|| format!("In override file {}", path.display())),
            None => Ok(()),
        }
    }
}
