use std::io;
use std::process::ExitCode;

use clap::Parser;
use enact_core::{
    TranscriptRoots, cat_transcripts, discover_transcripts, render_discovery_progress,
    render_transcript_listing, render_transcript_paths, resolve_run_id,
};

#[derive(Debug, Parser)]
#[command(
    name = "enact-transcripts",
    version,
    about = "Find every transcript that belongs to an enact run"
)]
struct Cli {
    /// Enact run id (defaults to the most recent run)
    run_id: Option<String>,

    /// Output transcript contents instead of the labeled listing
    #[arg(long)]
    cat: bool,

    /// Output bare paths only, one per line
    #[arg(long)]
    paths: bool,
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
    let run_id = resolve_run_id(&roots, cli.run_id.as_deref())?;
    let set = discover_transcripts(&run_id, &roots)?;

    eprint!("{}", render_discovery_progress(&set));

    if cli.cat {
        cat_transcripts(&set, &mut io::stdout().lock(), &mut io::stderr().lock())?;
    } else if cli.paths {
        print!("{}", render_transcript_paths(&set));
    } else {
        print!("{}", render_transcript_listing(&set));
    }

    Ok(())
}
