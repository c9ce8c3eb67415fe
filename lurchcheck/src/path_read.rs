use crate::error::Error;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Name of a document together with a reader for its source.
pub type PathRead = (String, Box<dyn Read>);
pub type PathReads<'a> = Box<dyn Iterator<Item = Result<PathRead, Error>> + 'a>;

const STDIN: &str = "-";

/// Return stdin if no files given, else lazily open and return the files.
///
/// The file name "-" also stands for stdin.
pub fn path_reads(files: &[PathBuf]) -> PathReads<'_> {
    if files.is_empty() {
        Box::new(std::iter::once(Ok(stdin())))
    } else {
        Box::new(files.iter().map(|file| {
            let name = module_name(file).ok_or(Error::Module)?;
            if name == STDIN {
                return Ok(stdin());
            }
            let read: Box<dyn Read> = Box::new(std::fs::File::open(file)?);
            Ok((name, read))
        }))
    }
}

fn stdin() -> PathRead {
    (STDIN.into(), Box::new(io::stdin()))
}

fn module_name(path: &Path) -> Option<String> {
    path.to_str().map(String::from)
}

/// Read the whole source of a document.
pub fn read_source((name, mut read): PathRead) -> Result<(String, String), Error> {
    let mut source = String::new();
    read.read_to_string(&mut source)?;
    Ok((name, source))
}

#[test]
fn stdin_name() {
    let files = [PathBuf::from("a.putdown"), PathBuf::from("-")];
    let mut reads = path_reads(&files);
    // the first file does not exist
    assert!(matches!(reads.next(), Some(Err(Error::Io(_)))));
    assert_eq!(reads.next().unwrap().unwrap().0, "-");
    assert!(reads.next().is_none());
}
