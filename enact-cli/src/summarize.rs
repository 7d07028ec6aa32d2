use std::process::ExitCode;

use clap::Parser;
use enact_core::{TranscriptRoots, render_summary_markdown, resolve_transcript};

#[derive(Debug, Parser)]
#[command(
    name = "summarize-session",
    version,
    about = "Summarize a session transcript as markdown"
)]
struct Cli {
    /// Session UUID, agent id, team-name/agent-name, or path to a .jsonl file
    identifier: Option<String>,

    /// Use the most recently modified session, ignoring any identifier
    #[arg(long)]
    latest: bool,
}

fn main() -> ExitCode {
    enact_core::logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> enact_core::Result<()> {
    let roots = TranscriptRoots::from_env_or_home()?;
    let resolved = resolve_transcript(&roots, cli.identifier.as_deref(), cli.latest)?;

    eprintln!("Transcript: {}", resolved.path.display());
    eprintln!();

    let markdown = render_summary_markdown(&resolved.path)?;
    print!("{markdown}");

    Ok(())
}
