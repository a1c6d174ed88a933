// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatch. Results go to `out` (stdout in the binary); progress and
// diagnostics go through tracing on stderr.

use std::io::Write;
use std::path::{Path, PathBuf};

use schriftwerk_core::error::Result;
use schriftwerk_core::human_errors::humanize_error;
use schriftwerk_core::types::{BatchJob, ExportFormat, TaskStatus, ValidationOutcome};
use schriftwerk_document::{SearchOptions, TextStats, find_matches, replace_all};
use schriftwerk_security::{basename, sanitize_filename};
use tracing::{info, warn};

use crate::cli::{Cli, Commands, ConfigAction, image_ops};
use crate::services::app_services::AppServices;
use crate::services::data_dir;
use crate::usecases::audit_outcome;

/// Whether the command did everything it was asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// The command ran but something was refused or failed (a rejected path
    /// in `check-path`, a failed image in `batch`).
    Partial,
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<Status> {
    let dir = data_dir::resolve(cli.data_dir);
    let services = AppServices::init(&dir)?;
    dispatch(&services, cli.command, out)
}

pub fn dispatch(services: &AppServices, command: Commands, out: &mut dyn Write) -> Result<Status> {
    match command {
        Commands::Extract {
            image,
            export,
            format,
            paragraphs,
        } => extract(services, &image, export.as_deref(), format, paragraphs, out),
        Commands::Batch {
            inputs,
            out_dir,
            format,
            jobs,
        } => batch(services, inputs, out_dir.as_deref(), format, jobs, out),
        Commands::Export {
            input,
            output,
            format,
        } => {
            let export = services.export_text();
            let text = export.read_source(&input)?;
            let format = resolve_format(services, &output, format);
            let report = export.execute(&text, &output, format)?;
            writeln!(
                out,
                "Wrote {} ({} bytes{})",
                report.path.display(),
                report.bytes_written,
                if report.overwritten { ", replaced existing file" } else { "" }
            )?;
            Ok(Status::Success)
        }
        Commands::Edit {
            input,
            output,
            rotate,
            brightness,
            contrast,
            crop,
            grayscale,
        } => {
            let ops = image_ops(rotate, brightness, contrast, crop, grayscale);
            let info = services.edit_image().execute(&input, &output, &ops)?;
            writeln!(
                out,
                "Saved {} ({}x{}, {} operations)",
                info.path.display(),
                info.width,
                info.height,
                ops.len()
            )?;
            Ok(Status::Success)
        }
        Commands::CheckPath { path, write, ext } => {
            let validator = services.validator();
            let outcome = if write {
                validator.validate_write_path(&path, ext.as_deref())
            } else {
                validator.validate_read_path(&path)
            };
            audit_outcome(services.audit(), "check_path", Some(&path), &outcome);
            check_path(&outcome, out)
        }
        Commands::Sanitize { name } => {
            writeln!(out, "{}", sanitize_filename(&name))?;
            Ok(Status::Success)
        }
        Commands::Search {
            file,
            needle,
            replace,
            output,
            case_sensitive,
            whole_word,
        } => {
            let options = SearchOptions {
                case_sensitive,
                whole_word,
            };
            search(services, &file, &needle, replace.as_deref(), output.as_deref(), options, out)
        }
        Commands::Stats { clear, text } => stats(services, clear, text.as_deref(), out),
        Commands::Recent { clear } => {
            let usage = services.usage();
            if clear {
                usage.clear_recent()?;
                writeln!(out, "Recent files cleared")?;
                return Ok(Status::Success);
            }
            let recent = usage.recent();
            if recent.is_empty() {
                writeln!(out, "No recent files")?;
            }
            for entry in recent {
                writeln!(
                    out,
                    "{}  {:>7} chars  {}",
                    entry.added_at.format("%Y-%m-%d %H:%M"),
                    entry.char_count,
                    entry.path.display()
                )?;
            }
            Ok(Status::Success)
        }
        Commands::Config { action } => {
            let configuration = services.configuration();
            let config = match action {
                ConfigAction::Show => configuration.get(),
                ConfigAction::Theme { theme } => configuration.set_theme(theme)?,
                ConfigAction::Format { format } => configuration.set_default_format(format)?,
                ConfigAction::PageSize { page_size } => configuration.set_page_size(page_size)?,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
            Ok(Status::Success)
        }
    }
}

fn extract(
    services: &AppServices,
    image: &Path,
    export: Option<&Path>,
    format: Option<ExportFormat>,
    paragraphs: bool,
    out: &mut dyn Write,
) -> Result<Status> {
    let mut use_case = services.extract_text()?;
    if paragraphs {
        use_case = use_case.with_paragraph_mode(true);
    }
    let result = use_case.execute(image)?;
    remember(services, image, result.char_count(), result.processing_secs);
    writeln!(out, "{}", result.text)?;

    if let Some(target) = export {
        let format = resolve_format(services, target, format);
        let report = services.export_text().execute(&result.text, target, format)?;
        info!(path = %report.path.display(), "exported");
    }
    Ok(Status::Success)
}

fn batch(
    services: &AppServices,
    inputs: Vec<PathBuf>,
    out_dir: Option<&Path>,
    format: Option<ExportFormat>,
    jobs: usize,
    out: &mut dyn Write,
) -> Result<Status> {
    let use_case = services.extract_batch(jobs)?;
    let folder = match inputs.as_slice() {
        [dir] if dir.is_dir() => Some(dir.clone()),
        _ => None,
    };
    let paths = match folder {
        Some(dir) => use_case.collect_images(&dir)?,
        None => inputs,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let job = runtime.block_on(use_case.execute(paths));

    let format = format.unwrap_or(services.config().default_export_format);
    let exporter = services.export_text();
    let mut status = if job.failed_tasks() == 0 {
        Status::Success
    } else {
        Status::Partial
    };

    for task in &job.tasks {
        let name = basename(&task.image_path);
        match (&task.status, &task.result) {
            (TaskStatus::Completed, Some(result)) => {
                remember(services, &task.image_path, result.char_count(), result.processing_secs);
                writeln!(out, "ok      {name} ({} chars)", result.char_count())?;
                let Some(dir) = out_dir else { continue };
                let target = dir.join(export_name(&task.image_path, format));
                if let Err(e) = exporter.execute(&result.text, &target, format) {
                    status = Status::Partial;
                    writeln!(out, "        export failed: {}", humanize_error(&e))?;
                }
            }
            _ => writeln!(
                out,
                "failed  {name}: {}",
                task.error.as_deref().unwrap_or("unknown error")
            )?,
        }
    }
    write_summary(&job, out)?;
    Ok(status)
}

fn write_summary(job: &BatchJob, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{} of {} images done, {} failed ({:.0}%)",
        job.completed_tasks(),
        job.total_tasks(),
        job.failed_tasks(),
        job.progress()
    )?;
    Ok(())
}

/// `<image stem><format extension>`, e.g. `scan-01.png` -> `scan-01.pdf`.
fn export_name(image: &Path, format: ExportFormat) -> String {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".into());
    format!("{stem}{}", format.extension())
}

fn check_path(outcome: &ValidationOutcome, out: &mut dyn Write) -> Result<Status> {
    match outcome {
        ValidationOutcome::Accepted => {
            writeln!(out, "OK")?;
            Ok(Status::Success)
        }
        ValidationOutcome::AcceptedWithWarning(notice) => {
            writeln!(out, "WARNING: {notice}")?;
            Ok(Status::Success)
        }
        ValidationOutcome::Rejected(rejection) => {
            writeln!(out, "REJECTED ({}): {}", rejection.check, rejection.reason)?;
            Ok(Status::Partial)
        }
    }
}

fn search(
    services: &AppServices,
    file: &Path,
    needle: &str,
    replacement: Option<&str>,
    output: Option<&Path>,
    options: SearchOptions,
    out: &mut dyn Write,
) -> Result<Status> {
    let export = services.export_text();
    let text = export.read_source(file)?;

    let Some(replacement) = replacement else {
        let matches = find_matches(&text, needle, options);
        for (line, column) in line_columns(&text, &matches) {
            writeln!(out, "{line}:{column}")?;
        }
        writeln!(out, "{} matches", matches.len())?;
        return Ok(Status::Success);
    };

    let (replaced, count) = replace_all(&text, needle, replacement, options);
    match output {
        Some(target) => {
            let format = resolve_format(services, target, None);
            let report = export.execute(&replaced, target, format)?;
            writeln!(out, "{count} replacements written to {}", report.path.display())?;
        }
        None => {
            write!(out, "{replaced}")?;
            info!(replacements = count, "replaced");
        }
    }
    Ok(Status::Success)
}

/// 1-based line and column for each character offset in `offsets`
/// (ascending).
fn line_columns(text: &str, offsets: &[usize]) -> Vec<(usize, usize)> {
    let mut positions = Vec::with_capacity(offsets.len());
    let mut wanted = offsets.iter().copied().peekable();
    let (mut line, mut column) = (1, 1);
    for (index, c) in text.chars().enumerate() {
        while wanted.peek() == Some(&index) {
            positions.push((line, column));
            wanted.next();
        }
        if wanted.peek().is_none() {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    positions
}

fn stats(
    services: &AppServices,
    clear: bool,
    text: Option<&Path>,
    out: &mut dyn Write,
) -> Result<Status> {
    if let Some(file) = text {
        let text = services.export_text().read_source(file)?;
        let counts = TextStats::of(&text);
        writeln!(out, "characters: {}", counts.characters)?;
        writeln!(out, "words:      {}", counts.words)?;
        writeln!(out, "lines:      {} ({} non-blank)", counts.lines, counts.non_blank_lines)?;
        return Ok(Status::Success);
    }

    let usage = services.usage();
    if clear {
        usage.clear_stats()?;
        writeln!(out, "Statistics cleared")?;
        return Ok(Status::Success);
    }
    let stats = usage.stats();
    writeln!(out, "files processed:  {}", stats.files_processed)?;
    writeln!(out, "characters:       {}", stats.total_characters)?;
    writeln!(out, "processing time:  {:.2}s", stats.total_processing_secs)?;
    writeln!(out, "average per file: {:.2}s", stats.average_secs())?;
    Ok(Status::Success)
}

/// Explicit flag, then the target's extension, then the configured default.
fn resolve_format(services: &AppServices, target: &Path, explicit: Option<ExportFormat>) -> ExportFormat {
    explicit
        .or_else(|| services.validator().export_format_for(target))
        .unwrap_or(services.config().default_export_format)
}

/// Usage bookkeeping never fails the command that produced the text.
fn remember(services: &AppServices, image: &Path, chars: usize, secs: f64) {
    let usage = services.usage();
    if let Err(e) = usage.record_extraction(chars, secs) {
        warn!(error = %e, "could not update usage statistics");
    }
    if let Err(e) = usage.add_recent(image, chars) {
        warn!(error = %e, "could not update recent files");
    }
}
