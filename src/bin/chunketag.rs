use std::error::Error as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chunketag::{ChunkSize, Etag};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chunketag", version)]
#[command(about = "Predict the S3 ETag of local files for a multipart upload")]
struct Cli {
    /// multipart_chunksize used for upload, in bytes or with a size suffix KB, MB, GB or TB
    #[arg(short, long = "chunksize", value_name = "SIZE", default_value_t = ChunkSize::DEFAULT)]
    chunk_size: ChunkSize,

    /// Files to fingerprint
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

// Paths are written as raw bytes so names that are not UTF-8 come out as given.
fn write_path(out: &mut impl Write, path: &Path) -> io::Result<()> {
    out.write_all(path.as_os_str().as_encoded_bytes())
}

fn write_etag(out: &mut impl Write, etag: &Etag, file: &Path) -> io::Result<()> {
    write!(out, "{etag:<39} ")?;
    write_path(out, file)?;
    out.write_all(b"\n")
}

fn write_error(out: &mut impl Write, err: &chunketag::Error) -> io::Result<()> {
    write!(out, "ERROR: {} ", err.operation())?;
    write_path(out, err.path())?;
    match err.source() {
        Some(source) => writeln!(out, ": {source}"),
        None => writeln!(out),
    }
}

fn exit_code(errors: usize) -> ExitCode {
    if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let mut errors = 0usize;
    for file in &cli.files {
        match chunketag::compute_file(file, cli.chunk_size) {
            Ok(etag) => match write_etag(&mut stdout, &etag, file) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    tracing::debug!("stdout closed, stopping");
                    return exit_code(errors);
                }
                Err(err) => {
                    let _ = writeln!(stderr, "ERROR: write stdout: {err}");
                    return ExitCode::FAILURE;
                }
            },
            Err(err) => {
                tracing::debug!(error = ?err, "failed to compute etag");
                let _ = write_error(&mut stderr, &err);
                errors += 1;
            }
        }
    }

    if let Err(err) = stdout.flush() {
        if err.kind() != io::ErrorKind::BrokenPipe {
            let _ = writeln!(stderr, "ERROR: write stdout: {err}");
            return ExitCode::FAILURE;
        }
    }

    if errors > 0 {
        tracing::debug!(errors, total = cli.files.len(), "finished with errors");
    }
    exit_code(errors)
}
