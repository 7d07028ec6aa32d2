use std::fs;
use std::io::Write;
use std::path::Path;

use crate::discovery;
use crate::error::{EnactError, Result};
use crate::jsonl;
use crate::model::{ResolvedTranscript, TranscriptSet};
use crate::render;
use crate::resolver::TranscriptResolver;
use crate::roots::TranscriptRoots;

/// Resolves the transcript to summarize; `latest` wins over any identifier.
pub fn resolve_transcript(
    roots: &TranscriptRoots,
    identifier: Option<&str>,
    latest: bool,
) -> Result<ResolvedTranscript> {
    let resolver = TranscriptResolver::new(&roots.projects_root);
    if latest {
        return resolver.latest();
    }
    resolver.resolve(identifier)
}

/// Run id to inspect: the given one, or the newest under the scratch root.
pub fn resolve_run_id(roots: &TranscriptRoots, run_id: Option<&str>) -> Result<String> {
    match run_id {
        Some(run_id) => Ok(run_id.to_string()),
        None => discovery::latest_run_id(&roots.scratch_root).ok_or_else(|| {
            EnactError::NoEnactRuns {
                root: roots.scratch_root.clone(),
            }
        }),
    }
}

pub fn discover_transcripts(run_id: &str, roots: &TranscriptRoots) -> Result<TranscriptSet> {
    discovery::discover(run_id, roots)
}

pub fn render_summary_markdown(path: &Path) -> Result<String> {
    let entries = jsonl::read_transcript(path)?;
    Ok(render::render_summary(path, &entries))
}

/// Progress block printed before any discovery output.
pub fn render_discovery_progress(set: &TranscriptSet) -> String {
    format!(
        "Enact ID: {}\nSession ID: {}\nProject dir: {}\nFound {} transcripts ({} subagents, {} team members)\n\n",
        set.run_id,
        set.orchestrator.session_id,
        set.orchestrator.project_dir.display(),
        set.transcript_count(),
        set.subagents.len(),
        set.team_member_count(),
    )
}

/// Labeled listing: direct lineage first, then one block per team.
pub fn render_transcript_listing(set: &TranscriptSet) -> String {
    let mut output = String::new();
    output.push_str("Orchestrator\n");
    output.push_str(&format!("{}\n", set.orchestrator.path.display()));

    for agent in &set.subagents {
        output.push_str(&format!(
            "\n{}\n{}\n",
            agent.display_label(),
            agent.path.display()
        ));
    }

    for team in &set.teams {
        output.push_str(&format!("\n--- Team: {} ---\n", team.short_name));
        for member in &team.members {
            output.push_str(&format!(
                "\n  {}\n  {}\n",
                member.agent_name,
                member.path.display()
            ));
        }
    }

    output
}

pub fn render_transcript_paths(set: &TranscriptSet) -> String {
    set.paths()
        .into_iter()
        .map(|path| format!("{}\n", path.display()))
        .collect()
}

/// Streams every transcript's raw bytes to `out`, each preceded by a
/// `=== <path> ===` banner on `err`.
///
/// An unreadable transcript gets a diagnostic on `err` and is skipped;
/// only a failing writer aborts.
pub fn cat_transcripts(
    set: &TranscriptSet,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    for path in set.paths() {
        let io_error = |source| EnactError::Io {
            path: path.to_path_buf(),
            source,
        };

        writeln!(err, "=== {} ===", path.display()).map_err(io_error)?;
        match fs::read(path) {
            Ok(content) => out.write_all(&content).map_err(io_error)?,
            Err(read_err) => {
                tracing::debug!(path = %path.display(), error = %read_err, "unreadable transcript");
                writeln!(err, "Error reading {}: {read_err}", path.display()).map_err(io_error)?;
            }
        }
    }
    out.flush().map_err(|source| EnactError::Io {
        path: set.orchestrator.path.clone(),
        source,
    })
}
