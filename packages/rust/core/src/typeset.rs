//! Typesetter invocation.
//!
//! Runs the configured command (default `xelatex -halt-on-error`) on the
//! written document from the document's own directory. The exit status
//! decides success. The success marker in stdout is only reported.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use tracing::{info, instrument, trace, warn};

use academiccv_shared::{CvError, Result, TypesetConfig};

/// Output lines kept for the error message.
const TAIL_LINES: usize = 20;

/// What the typesetter reported.
#[derive(Debug, Clone)]
pub struct TypesetOutcome {
    /// First stdout line containing the success marker, if any.
    pub marker_line: Option<String>,
    /// Number of stdout lines read.
    pub line_count: usize,
}

/// Run the typesetter on `document`.
#[instrument(skip_all, fields(command = %config.command, document = %document.display()))]
pub async fn run_typesetter(config: &TypesetConfig, document: &Path) -> Result<TypesetOutcome> {
    let dir = match document.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = document
        .file_name()
        .ok_or_else(|| CvError::typeset(format!("no file name in {}", document.display())))?;

    info!("running typesetter");

    let mut child = Command::new(&config.command)
        .args(&config.args)
        .arg(file_name)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| {
            CvError::typeset(format!(
                "failed to start `{}`: {e}. Is it installed?",
                config.command
            ))
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CvError::typeset("failed to capture typesetter stdout"))?;

    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    let mut marker_line = None;
    let mut line_count = 0;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| CvError::typeset(format!("failed to read typesetter output: {e}")))?;
        if n == 0 {
            break;
        }

        // TeX engines do not guarantee UTF-8 log output.
        let line = String::from_utf8_lossy(&buf).trim_end().to_string();
        trace!(%line);
        line_count += 1;

        if marker_line.is_none() && line.contains(&config.success_marker) {
            marker_line = Some(line.clone());
        }
        if tail.len() == TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| CvError::typeset(format!("failed to wait for `{}`: {e}", config.command)))?;

    if !status.success() {
        let tail: Vec<String> = tail.into_iter().collect();
        return Err(CvError::typeset(format!(
            "`{}` exited with {status}; last output:\n{}",
            config.command,
            tail.join("\n")
        )));
    }

    match &marker_line {
        Some(line) => info!(%line, "typesetting succeeded"),
        None => warn!(
            marker = %config.success_marker,
            "typesetter exited cleanly without reporting its output file"
        ),
    }

    Ok(TypesetOutcome {
        marker_line,
        line_count,
    })
}
