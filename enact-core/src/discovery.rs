//! Finds every transcript that belongs to one enact run.
//!
//! The orchestrator is the session that mentions the run id and spawned the
//! most subagents. Its `subagents/` directory gives the direct lineage; team
//! members are separate sessions whose team name starts with `<run_id>-`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnactError, Result};
use crate::jsonl;
use crate::labels;
use crate::layout;
use crate::model::{SessionRef, SubagentTranscript, TeamGroup, TeamMember, TranscriptSet};
use crate::roots::TranscriptRoots;

/// Greatest all-digit directory name under the scratch root, compared
/// numerically. The name is returned as it appears on disk.
pub fn latest_run_id(scratch_root: &Path) -> Option<String> {
    let entries = fs::read_dir(scratch_root).ok()?;

    entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.is_empty() && name.bytes().all(|byte| byte.is_ascii_digit()))
        .max_by(|left, right| {
            let left_trimmed = left.trim_start_matches('0');
            let right_trimmed = right.trim_start_matches('0');
            left_trimmed
                .len()
                .cmp(&right_trimmed.len())
                .then_with(|| left_trimmed.cmp(right_trimmed))
                .then_with(|| right.cmp(left))
        })
}

/// Picks the orchestrator session for `run_id`.
///
/// Candidates are session files whose raw text contains the run id. A
/// candidate with a `subagents/` directory always beats one without; among
/// those, the most `agent-*.jsonl` files wins and ties keep traversal order.
pub fn locate_orchestrator(run_id: &str, project_dirs: &[PathBuf]) -> Option<SessionRef> {
    let mut best_spawning = None::<(SessionRef, usize)>;
    let mut first_plain = None::<SessionRef>;

    for path in project_dirs
        .iter()
        .flat_map(|project_dir| layout::session_files(project_dir))
    {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping unreadable session");
                continue;
            }
        };
        if !content.contains(run_id) {
            continue;
        }

        let Some(session) = SessionRef::from_path(&path) else {
            continue;
        };
        let subagents_dir = session.subagents_dir();

        if subagents_dir.is_dir() {
            let count = layout::subagent_files(&subagents_dir).len();
            tracing::debug!(path = %path.display(), subagents = count, "spawning candidate");
            if best_spawning
                .as_ref()
                .is_none_or(|(_, best_count)| count > *best_count)
            {
                best_spawning = Some((session, count));
            }
        } else {
            tracing::debug!(path = %path.display(), "non-spawning candidate");
            if first_plain.is_none() {
                first_plain = Some(session);
            }
        }
    }

    best_spawning.map(|(session, _)| session).or(first_plain)
}

/// The orchestrator transcript followed by its subagent transcripts in start order.
pub fn collect_direct_subagents(orchestrator: &SessionRef) -> Vec<PathBuf> {
    let mut subagents = layout::subagent_files(&orchestrator.subagents_dir());
    subagents.sort_by_cached_key(|path| jsonl::first_timestamp(path));

    let mut transcripts = Vec::with_capacity(subagents.len() + 1);
    transcripts.push(orchestrator.path.clone());
    transcripts.extend(subagents);
    transcripts
}

/// Sessions outside the orchestrator whose team name starts with `<run_id>-`,
/// sorted by start time.
pub fn collect_team_members(
    run_id: &str,
    project_dirs: &[PathBuf],
    orchestrator_path: &Path,
) -> Vec<TeamMember> {
    let prefix = format!("{run_id}-");

    let mut members = project_dirs
        .iter()
        .flat_map(|project_dir| layout::session_files(project_dir))
        .filter(|path| path != orchestrator_path)
        .filter_map(|path| {
            let (team_name, agent_name) = jsonl::team_info(&path)?;
            team_name.starts_with(&prefix).then_some(TeamMember {
                path,
                team_name,
                agent_name,
            })
        })
        .collect::<Vec<_>>();

    members.sort_by_cached_key(|member| jsonl::first_timestamp(&member.path));
    for member in &members {
        tracing::debug!(
            path = %member.path.display(),
            label = %member.label(run_id),
            "team member"
        );
    }
    members
}

/// Groups members by short team name in first-appearance order; each group
/// keeps the incoming (start time) order.
pub fn group_team_members(run_id: &str, members: Vec<TeamMember>) -> Vec<TeamGroup> {
    let mut groups = Vec::<TeamGroup>::new();

    for member in members {
        let short_name = member.short_team_name(run_id).to_string();
        match groups.iter_mut().find(|group| group.short_name == short_name) {
            Some(group) => group.members.push(member),
            None => groups.push(TeamGroup {
                short_name,
                members: vec![member],
            }),
        }
    }

    groups
}

/// Builds the full transcript set for `run_id`.
pub fn discover(run_id: &str, roots: &TranscriptRoots) -> Result<TranscriptSet> {
    let scratch_dir = roots.scratch_root.join(run_id);
    if !scratch_dir.is_dir() {
        return Err(EnactError::ScratchDirNotFound { path: scratch_dir });
    }

    let project_dirs = layout::project_dirs(&roots.projects_root);
    if project_dirs.is_empty() {
        return Err(EnactError::NoProjectDirs {
            root: roots.projects_root.clone(),
        });
    }

    let orchestrator = locate_orchestrator(run_id, &project_dirs).ok_or_else(|| {
        EnactError::OrchestratorNotFound {
            run_id: run_id.to_string(),
        }
    })?;

    let label_map = labels::agent_labels_for(&orchestrator.path);
    let subagents = collect_direct_subagents(&orchestrator)
        .into_iter()
        .skip(1)
        .map(|path| {
            let agent_id = layout::agent_id_from_path(&path);
            let label = label_map.get(&agent_id).cloned();
            SubagentTranscript {
                agent_id,
                path,
                label,
            }
        })
        .collect();

    let members = collect_team_members(run_id, &project_dirs, &orchestrator.path);
    let teams = group_team_members(run_id, members);

    Ok(TranscriptSet {
        run_id: run_id.to_string(),
        orchestrator,
        subagents,
        teams,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::{TempDir, tempdir};

    use super::{
        collect_direct_subagents, collect_team_members, discover, group_team_members,
        latest_run_id, locate_orchestrator,
    };
    use crate::layout;
    use crate::model::{SessionRef, TeamMember};
    use crate::roots::TranscriptRoots;

    const RUN_ID: &str = "1700000000";

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn session_line(timestamp: &str, text: &str) -> String {
        format!(
            "{{\"timestamp\":\"{timestamp}\",\"type\":\"user\",\"message\":{{\"content\":\"{text}\"}}}}\n"
        )
    }

    fn team_line(timestamp: &str, team: &str, agent: &str) -> String {
        format!(
            "{{\"timestamp\":\"{timestamp}\",\"type\":\"user\",\"teamName\":\"{team}\",\"agentName\":\"{agent}\",\"message\":{{\"content\":\"hi\"}}}}\n"
        )
    }

    fn add_subagents(project: &Path, session_id: &str, count: usize) {
        for idx in 0..count {
            write(
                &project
                    .join(session_id)
                    .join("subagents")
                    .join(format!("agent-a{idx:03x}.jsonl")),
                &session_line("2026-01-01T00:00:00Z", "sub"),
            );
        }
    }

    fn projects(temp: &TempDir) -> Vec<PathBuf> {
        layout::project_dirs(&temp.path().join("projects"))
    }

    #[test]
    fn orchestrator_is_the_candidate_with_most_subagents() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/p");
        let mention = session_line("2026-01-01T00:00:00Z", "enact 1700000000 start");

        write(&project.join("a-plain.jsonl"), &mention);
        write(&project.join("b-two.jsonl"), &mention);
        add_subagents(&project, "b-two", 2);
        write(&project.join("c-three.jsonl"), &mention);
        add_subagents(&project, "c-three", 3);
        write(&project.join("d-unrelated.jsonl"), &session_line("t", "other"));
        add_subagents(&project, "d-unrelated", 9);

        let found = locate_orchestrator(RUN_ID, &projects(&temp)).expect("orchestrator");
        assert_eq!(found.session_id, "c-three");
        assert_eq!(found.project_dir, project);
    }

    #[test]
    fn orchestrator_ties_keep_traversal_order() {
        let temp = tempdir().expect("tempdir");
        let mention = session_line("2026-01-01T00:00:00Z", "1700000000");
        let project_a = temp.path().join("projects/a");
        let project_b = temp.path().join("projects/b");

        write(&project_b.join("s1.jsonl"), &mention);
        add_subagents(&project_b, "s1", 2);
        write(&project_a.join("s2.jsonl"), &mention);
        add_subagents(&project_a, "s2", 2);

        let found = locate_orchestrator(RUN_ID, &projects(&temp)).expect("orchestrator");
        assert_eq!(found.path, project_a.join("s2.jsonl"));
    }

    #[test]
    fn empty_subagents_dir_still_outranks_plain_candidates() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/p");
        let mention = session_line("2026-01-01T00:00:00Z", "1700000000");
        write(&project.join("a-plain.jsonl"), &mention);
        write(&project.join("b-spawner.jsonl"), &mention);
        fs::create_dir_all(project.join("b-spawner").join("subagents")).expect("mkdir");

        let found = locate_orchestrator(RUN_ID, &projects(&temp)).expect("orchestrator");
        assert_eq!(found.session_id, "b-spawner");
        assert_eq!(collect_direct_subagents(&found).len(), 1);
    }

    #[test]
    fn orchestrator_falls_back_to_first_plain_candidate() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/p");
        let mention = session_line("2026-01-01T00:00:00Z", "1700000000");
        write(&project.join("b.jsonl"), &mention);
        write(&project.join("a.jsonl"), &mention);

        let found = locate_orchestrator(RUN_ID, &projects(&temp)).expect("orchestrator");
        assert_eq!(found.session_id, "a");

        assert!(locate_orchestrator("999", &projects(&temp)).is_none());
    }

    #[test]
    fn direct_subagents_follow_start_time() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/p");
        let orchestrator_path = project.join("main.jsonl");
        write(&orchestrator_path, &session_line("2026-01-01T00:00:00Z", "1700000000"));

        let subagents = project.join("main/subagents");
        write(
            &subagents.join("agent-a1.jsonl"),
            &session_line("2026-01-01T00:00:20Z", "T2"),
        );
        write(
            &subagents.join("agent-a2.jsonl"),
            &session_line("2026-01-01T00:00:10Z", "T1"),
        );
        write(&subagents.join("agent-a3.jsonl"), "{\"type\":\"user\"}\n");

        let session = SessionRef::from_path(&orchestrator_path).expect("session");
        let ordered = collect_direct_subagents(&session);
        assert_eq!(
            ordered,
            vec![
                orchestrator_path,
                subagents.join("agent-a3.jsonl"),
                subagents.join("agent-a2.jsonl"),
                subagents.join("agent-a1.jsonl"),
            ]
        );
    }

    #[test]
    fn team_members_exclude_orchestrator_and_foreign_teams() {
        let temp = tempdir().expect("tempdir");
        let project = temp.path().join("projects/p");
        let orchestrator = project.join("main.jsonl");
        write(
            &orchestrator,
            &team_line("2026-01-01T00:00:00Z", "1700000000-lead", "lead"),
        );
        write(
            &project.join("m1.jsonl"),
            &format!(
                "{}{}",
                team_line("2026-01-01T00:00:30Z", "1700000000-review", "reviewer-2"),
                team_line("2026-01-01T00:00:31Z", "1700000000-build", "builder-9"),
            ),
        );
        write(
            &project.join("m2.jsonl"),
            &team_line("2026-01-01T00:00:10Z", "1700000000-review", "reviewer-1"),
        );
        write(
            &project.join("m3.jsonl"),
            &team_line("2026-01-01T00:00:05Z", "17000000001-review", "imposter"),
        );

        let members = collect_team_members(RUN_ID, &projects(&temp), &orchestrator);
        let agents = members
            .iter()
            .map(|member| member.agent_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(agents, vec!["reviewer-1", "reviewer-2"]);
    }

    #[test]
    fn team_groups_keep_first_discovery_order() {
        let member = |team: &str, agent: &str| TeamMember {
            path: PathBuf::from(format!("/p/{agent}.jsonl")),
            team_name: team.to_string(),
            agent_name: agent.to_string(),
        };
        let groups = group_team_members(
            RUN_ID,
            vec![
                member("1700000000-build", "builder-1"),
                member("1700000000-review", "reviewer-1"),
                member("1700000000-build", "builder-2"),
            ],
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].short_name, "build");
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].members[1].agent_name, "builder-2");
        assert_eq!(groups[1].short_name, "review");
    }

    #[test]
    fn latest_run_id_compares_numerically() {
        let temp = tempdir().expect("tempdir");
        for name in ["999", "1000", "abc", "0042"] {
            fs::create_dir_all(temp.path().join(name)).expect("mkdir");
        }
        fs::write(temp.path().join("5000"), "").expect("write file");

        assert_eq!(latest_run_id(temp.path()), Some("1000".to_string()));
        assert_eq!(latest_run_id(&temp.path().join("missing")), None);
    }

    #[test]
    fn latest_run_id_keeps_leading_zeros_so_discovery_finds_the_dir() {
        let temp = tempdir().expect("tempdir");
        let roots = TranscriptRoots::new(temp.path().join("projects"), temp.path().join("scratch"));
        for name in ["7", "0042"] {
            fs::create_dir_all(roots.scratch_root.join(name)).expect("mkdir");
        }
        let project = roots.projects_root.join("p");
        write(&project.join("s1.jsonl"), &session_line("2026-01-01T00:00:00Z", "run 0042"));

        let run_id = latest_run_id(&roots.scratch_root).expect("run id");
        assert_eq!(run_id, "0042");
        let set = discover(&run_id, &roots).expect("discover");
        assert_eq!(set.orchestrator.session_id, "s1");
    }

    #[test]
    fn discover_builds_two_tier_ordering() {
        let temp = tempdir().expect("tempdir");
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(scratch.join(RUN_ID)).expect("mkdir");
        let project = temp.path().join("projects/p");

        let orchestrator = project.join("main.jsonl");
        write(
            &orchestrator,
            concat!(
                "{\"timestamp\":\"2026-01-01T00:00:00Z\",\"type\":\"user\",\"message\":{\"content\":\"run 1700000000\"}}\n",
                "{\"type\":\"assistant\",\"message\":{\"id\":\"m1\",\"content\":[{\"type\":\"tool_use\",\"id\":\"call_1\",\"name\":\"Task\",\"input\":{\"description\":\"Explore code\"}}]}}\n",
                "{\"type\":\"user\",\"message\":{\"content\":[{\"type\":\"tool_result\",\"tool_use_id\":\"call_1\",\"content\":[{\"type\":\"text\",\"text\":\"agentId: a1\"}]}]}}\n",
            ),
        );
        write(
            &project.join("main/subagents/agent-a1.jsonl"),
            &session_line("2026-01-01T00:00:20Z", "T2"),
        );
        write(
            &project.join("main/subagents/agent-a2.jsonl"),
            &session_line("2026-01-01T00:00:10Z", "T1"),
        );
        write(
            &project.join("t1.jsonl"),
            &team_line("2026-01-01T00:01:00Z", "1700000000-review", "reviewer-1"),
        );

        let roots = TranscriptRoots::new(temp.path().join("projects"), &scratch);
        let set = discover(RUN_ID, &roots).expect("discover");

        assert_eq!(set.orchestrator.path, orchestrator);
        assert_eq!(set.subagents.len(), 2);
        assert_eq!(set.subagents[0].agent_id, "a2");
        assert_eq!(set.subagents[0].display_label(), "a2");
        assert_eq!(set.subagents[1].display_label(), "Explore code");
        assert_eq!(set.teams.len(), 1);
        assert_eq!(set.transcript_count(), 4);
        assert_eq!(
            set.paths(),
            vec![
                orchestrator.as_path(),
                project.join("main/subagents/agent-a2.jsonl").as_path(),
                project.join("main/subagents/agent-a1.jsonl").as_path(),
                project.join("t1.jsonl").as_path(),
            ]
        );
    }

    #[test]
    fn discover_reports_missing_pieces() {
        let temp = tempdir().expect("tempdir");
        let scratch = temp.path().join("scratch");
        let roots = TranscriptRoots::new(temp.path().join("projects"), &scratch);

        let err = discover(RUN_ID, &roots).expect_err("no scratch dir");
        assert!(format!("{err}").contains("enact scratch directory not found"));

        fs::create_dir_all(scratch.join(RUN_ID)).expect("mkdir");
        let err = discover(RUN_ID, &roots).expect_err("no projects");
        assert!(format!("{err}").contains("no project directories found"));

        write(
            &temp.path().join("projects/p/s.jsonl"),
            &session_line("t", "unrelated"),
        );
        let err = discover(RUN_ID, &roots).expect_err("no orchestrator");
        assert!(format!("{err}").contains("no session transcript found"));
    }
}
