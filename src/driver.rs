//! Engine handle and the per-directory / per-file report driver

use std::io::Write;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use tracing::{debug, info, warn};

use crate::config::RunOptions;
use crate::error::{Error, Result};
use crate::pdf::{export_assembly, output_path_for};
use crate::pdl::{BodyParser, ParserSelector};
use crate::pjl::{duplex_mode, PjlScanner, PrologueEvent};
use crate::report::report_assembly;
use crate::stream::PushbackStream;

/// Library handle: created once per run and lent to every file
pub struct Engine {
    selector: ParserSelector,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with no body parsers enabled
    pub fn new() -> Self {
        Self {
            selector: ParserSelector::new(),
        }
    }

    /// Enable the PCL5, PCL/XL and PostScript parsers
    pub fn enable_all_features(&mut self) -> &mut Self {
        self.selector = ParserSelector::with_builtin_parsers();
        debug!("all body parsers enabled");
        self
    }

    /// Register an extra parser, replacing any for the same language
    pub fn register_parser(&mut self, parser: Box<dyn BodyParser>) -> &mut Self {
        self.selector.register(parser);
        self
    }

    pub fn selector(&self) -> &ParserSelector {
        &self.selector
    }
}

/// Regular files directly inside `directory`, sorted by path
pub fn input_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    let pattern = format!(
        "{}/*",
        Pattern::escape(&directory.to_string_lossy())
    );
    let entries = glob(&pattern).map_err(|e| {
        Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable directory entry"),
        }
    }
    Ok(files)
}

/// Process every regular file in `options.directory`, writing the report to `out`
pub fn process_directory<W: Write>(
    engine: &Engine,
    options: &RunOptions,
    out: &mut W,
) -> Result<()> {
    let files = input_files(&options.directory)?;
    info!(
        directory = %options.directory.display(),
        files = files.len(),
        "processing directory"
    );
    process_files(engine, options, &files, out)
}

/// Process `files` in order.
///
/// A file that cannot be opened is skipped with a warning unless it is the
/// last one, in which case its error is returned. Any other failure stops
/// the run.
pub fn process_files<W: Write>(
    engine: &Engine,
    options: &RunOptions,
    files: &[PathBuf],
    out: &mut W,
) -> Result<()> {
    let last = files.len().saturating_sub(1);
    for (i, path) in files.iter().enumerate() {
        match process_file(engine, options, path, out) {
            Ok(jobs) => debug!(file = %path.display(), jobs, "file done"),
            Err(e @ Error::StreamOpen { .. }) if i < last => {
                warn!(error = %e, "skipping file");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Process one file: every PJL prologue in it and the job body that follows.
///
/// Returns the number of job bodies parsed.
pub fn process_file<W: Write>(
    engine: &Engine,
    options: &RunOptions,
    path: &Path,
    out: &mut W,
) -> Result<usize> {
    let mut stream = PushbackStream::open(path)?;
    let mut scanner = PjlScanner::new();
    let mut jobs = 0;

    loop {
        let event = scanner.scan(&mut stream)?;
        if event == PrologueEvent::Exhausted {
            break;
        }

        if let Some(mode) = duplex_mode(scanner.attributes()) {
            writeln!(out, "Duplex mode: {mode}")?;
        }
        writeln!(out, "End of PJL")?;

        if event == PrologueEvent::EndOfFile {
            break;
        }

        let assembly = match engine.selector().parse_body(event, &mut stream) {
            Ok(assembly) => assembly,
            Err(e) if e.is_prologue_exhausted() => break,
            Err(e) => return Err(e),
        };
        jobs += 1;

        report_assembly(out, path, &assembly)?;

        if options.convert {
            let output = output_path_for(path, &options.pdf_dir_name, jobs);
            export_assembly(&assembly, path, &output)?;
        }
    }

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.enable_all_features();
        engine
    }

    fn run_file(contents: &[u8]) -> (String, usize) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("job.prn");
        fs::write(&path, contents).unwrap();

        let mut out = Vec::new();
        let options = RunOptions::for_directory(temp_dir.path());
        let jobs = process_file(&engine(), &options, &path, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), jobs)
    }

    #[test]
    fn test_two_jobs_in_one_file() {
        let (text, jobs) = run_file(
            b"\x1b%-12345X@PJL SET DUPLEX = ON\r\n\
              @PJL ENTER LANGUAGE = PCL\r\n\x1bEPage\x0c\x1bE\
              \x1b%-12345X@PJL ENTER LANGUAGE = PCL\r\n\x1bEOne\x0cTwo\x0c\x1bE\
              \x1b%-12345X",
        );
        assert_eq!(jobs, 2);
        assert_eq!(text.matches("End of PJL").count(), 2);
        assert_eq!(text.matches("Duplex mode: TwoSidedLongEdge").count(), 1);
        assert!(text.contains("Page-level print ticket for page 2 of 2:"));
    }

    #[test]
    fn test_trailer_prologue_reports_end_of_pjl() {
        let (text, jobs) = run_file(
            b"@PJL ENTER LANGUAGE = PCL\r\n\x1bEPage\x0c\
              \x1b%-12345X@PJL EOJ\r\n\x1b%-12345X",
        );
        assert_eq!(jobs, 1);
        assert!(text.starts_with("End of PJL\nFile "));
        assert!(text.ends_with("End of PJL\n"));
    }

    #[test]
    fn test_engine_without_parsers_rejects_body() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job.pcl");
        fs::write(&path, b"@PJL ENTER LANGUAGE = PCL\r\n\x1bEPage\x0c").unwrap();

        let mut out = Vec::new();
        let options = RunOptions::for_directory(temp_dir.path());
        let err = process_file(&Engine::new(), &options, &path, &mut out).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedPrologueEvent(PrologueEvent::EnterPcl5)
        ));
    }

    #[test]
    fn test_empty_body_ends_file_cleanly() {
        let (text, jobs) = run_file(b"@PJL ENTER LANGUAGE = PCL\r\n");
        assert_eq!(jobs, 0);
        assert_eq!(text, "End of PJL\n");
    }

    #[test]
    fn test_postscript_trailing_ctrl_d_keeps_next_job() {
        let (text, jobs) = run_file(
            b"\x1b%-12345X@PJL ENTER LANGUAGE = POSTSCRIPT\r\n\
              %!PS-Adobe-3.0\r\n%%Page: 1 1\r\nshowpage\r\n%%EOF\r\n\x04\
              \x1b%-12345X@PJL SET DUPLEX = ON\r\n\
              @PJL ENTER LANGUAGE = PCL\r\n\x1bEHello\x0c\x1bE\
              \x1b%-12345X",
        );
        assert_eq!(jobs, 2);
        assert!(text.contains("Duplex mode: TwoSidedLongEdge\nEnd of PJL\n"));
        assert_eq!(text.matches("File ").count(), 2);
    }

    #[test]
    fn test_long_comment_keeps_job() {
        let mut contents = b"\x1b%-12345X@PJL COMMENT ".to_vec();
        contents.extend(std::iter::repeat(b'x').take(5000));
        contents.extend_from_slice(
            b"\r\n@PJL SET DUPLEX = ON\r\n@PJL ENTER LANGUAGE = PCL\r\n\x1bEHello\x0c\x1bE",
        );
        let (text, jobs) = run_file(&contents);
        assert_eq!(jobs, 1);
        assert!(text.starts_with("Duplex mode: TwoSidedLongEdge\nEnd of PJL\nFile "));
    }

    #[test]
    fn test_unopenable_file_is_skipped_when_not_last() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.prn");
        let good = temp_dir.path().join("good.prn");
        fs::write(&good, b"@PJL SET DUPLEX = OFF\r\n").unwrap();

        let mut out = Vec::new();
        let options = RunOptions::for_directory(temp_dir.path());
        process_files(&engine(), &options, &[missing, good], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Duplex mode: OFF\nEnd of PJL\n");
    }

    #[test]
    fn test_unopenable_last_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.prn");
        let missing = temp_dir.path().join("gone.prn");
        fs::write(&good, b"@PJL SET DUPLEX = OFF\r\n").unwrap();

        let mut out = Vec::new();
        let options = RunOptions::for_directory(temp_dir.path());
        let err = process_files(&engine(), &options, &[good, missing], &mut out).unwrap_err();
        assert!(matches!(err, Error::StreamOpen { .. }));
        assert_eq!(err.code(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "Duplex mode: OFF\nEnd of PJL\n");
    }

    #[test]
    fn test_input_files_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.prn"), b"x").unwrap();
        fs::write(temp_dir.path().join("a.prn"), b"x").unwrap();
        fs::create_dir(temp_dir.path().join("PDF")).unwrap();

        let files = input_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.prn", "b.prn"]);
    }

    #[test]
    fn test_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.prn");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(input_files(&file), Err(Error::NotADirectory(_))));
    }
}
