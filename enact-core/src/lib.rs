pub mod discovery;
pub mod error;
pub mod format;
pub mod jsonl;
pub mod labels;
pub mod layout;
pub mod logging;
pub mod model;
pub mod render;
pub mod resolver;
pub mod roots;
pub mod service;

pub use error::{EnactError, Result};
pub use model::{
    ContentBlock, EntryKind, LogEntry, Message, MessageContent, ResolvedTranscript, SessionRef,
    SubagentTranscript, TeamGroup, TeamMember, ToolInvocation, ToolResult, TranscriptSet,
};
pub use resolver::TranscriptResolver;
pub use roots::TranscriptRoots;
pub use service::{
    cat_transcripts, discover_transcripts, render_discovery_progress, render_summary_markdown,
    render_transcript_listing, render_transcript_paths, resolve_run_id, resolve_transcript,
};
