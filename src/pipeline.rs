//! Two-pass transcode orchestration: a concat pass that scales, pads and
//! joins every source clip into one intermediate file, then a trim pass that
//! drops the exclusion windows and renormalizes timestamps.
//!
//! The passes run strictly in order; the trim pass reads the concat pass's
//! output, so they are never overlapped. Each pass is an external ffmpeg
//! process run under a bounded timeout with its stderr captured for logging.

use crate::config::Config;
use crate::error::PipelineError;
use crate::filtergraph::{concat_graph, trim_filters};
use crate::models::MergePayload;
use crate::timeline::exclusion_windows;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// The final merged file produced for one request.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub file_name: String,
}

/// One external ffmpeg invocation within a merge.
#[derive(Debug)]
pub(crate) struct Stage {
    pub name: &'static str,
    pub args: Vec<OsString>,
}

/// Everything needed to execute one merge request: the ordered stages and the
/// artifact they produce.
#[derive(Debug)]
pub(crate) struct MergePlan {
    pub stages: Vec<Stage>,
    pub artifact: OutputArtifact,
}

pub struct TranscodePipeline {
    ffmpeg: PathBuf,
    storage_root: PathBuf,
    timeout: Duration,
}

impl TranscodePipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            storage_root: config.storage_root.clone(),
            timeout: Duration::from_secs(config.transcode_timeout_secs),
        }
    }

    /// Run the merge for one owner. An empty clip list is a no-op success;
    /// no process is spawned and no file is written.
    pub async fn run(
        &self,
        owner: &str,
        payload: &MergePayload,
    ) -> Result<Option<OutputArtifact>, PipelineError> {
        let Some(plan) = self.plan(owner, payload)? else {
            tracing::info!(owner, "merge request carried no clips, nothing to do");
            return Ok(None);
        };

        for stage in &plan.stages {
            self.run_stage(stage).await?;
        }

        tracing::info!(owner, output = %plan.artifact.path.display(), "merge complete");
        Ok(Some(plan.artifact))
    }

    /// Turn a merge payload into the two-stage plan without touching the
    /// filesystem or spawning anything.
    pub(crate) fn plan(
        &self,
        owner: &str,
        payload: &MergePayload,
    ) -> Result<Option<MergePlan>, PipelineError> {
        if payload.list.is_empty() {
            return Ok(None);
        }

        let windows = exclusion_windows(&payload.list)?;
        let owner_dir = self.storage_root.join(owner);

        // The intermediate is request-scoped so concurrent merges by the same
        // owner cannot clobber each other's concat output.
        let intermediate = owner_dir.join(format!("output-tmp-{}.mp4", payload.time));
        let file_name = format!("output-{}.mp4", payload.time);
        let output = owner_dir.join(&file_name);

        let graph = concat_graph(&payload.list, &owner_dir);
        let mut concat_args: Vec<OsString> = Vec::new();
        for input in &graph.inputs {
            concat_args.push("-i".into());
            concat_args.push(input.clone().into());
        }
        concat_args.extend([
            OsString::from("-filter_complex"),
            graph.filter.into(),
            "-map".into(),
            "[v]".into(),
            "-vsync".into(),
            "2".into(),
            "-preset".into(),
            "faster".into(),
            "-y".into(),
            intermediate.clone().into(),
        ]);

        let filters = trim_filters(&windows);
        let trim_args: Vec<OsString> = vec![
            "-i".into(),
            intermediate.into(),
            "-vf".into(),
            filters.video.into(),
            "-af".into(),
            filters.audio.into(),
            "-vsync".into(),
            "2".into(),
            "-preset".into(),
            "faster".into(),
            "-y".into(),
            output.clone().into(),
        ];

        Ok(Some(MergePlan {
            stages: vec![
                Stage { name: "concat", args: concat_args },
                Stage { name: "trim", args: trim_args },
            ],
            artifact: OutputArtifact { path: output, file_name },
        }))
    }

    async fn run_stage(&self, stage: &Stage) -> Result<(), PipelineError> {
        tracing::info!(stage = stage.name, "starting ffmpeg pass");

        let child = Command::new(&self.ffmpeg)
            .args(&stage.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PipelineError::Spawn { stage: stage.name, source })?;

        // kill_on_drop reaps the child if the timeout fires and the
        // wait_with_output future is dropped.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PipelineError::Timeout {
                stage: stage.name,
                limit_secs: self.timeout.as_secs(),
            })?
            .map_err(PipelineError::Io)?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            tracing::debug!(stage = stage.name, "ffmpeg: {line}");
        }

        if !output.status.success() {
            return Err(PipelineError::Process {
                stage: stage.name,
                status: output.status,
                stderr_tail: stderr_tail(&stderr),
            });
        }

        tracing::info!(stage = stage.name, "ffmpeg pass finished");
        Ok(())
    }
}

/// Last few stderr lines, enough to diagnose a failed pass without dumping
/// the whole transcode log into the error.
fn stderr_tail(stderr: &str) -> String {
    const TAIL_LINES: usize = 8;
    let lines: Vec<&str> = stderr.lines().collect();
    let skip = lines.len().saturating_sub(TAIL_LINES);
    lines[skip..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClipDescriptor;

    fn pipeline() -> TranscodePipeline {
        TranscodePipeline {
            ffmpeg: PathBuf::from("ffmpeg"),
            storage_root: PathBuf::from("/store"),
            timeout: Duration::from_secs(300),
        }
    }

    fn arg_strings(stage: &Stage) -> Vec<String> {
        stage
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn empty_clip_list_plans_nothing() {
        let payload = MergePayload { list: vec![], time: 1 };
        assert!(pipeline().plan("u1", &payload).unwrap().is_none());
    }

    #[test]
    fn plan_orders_concat_before_trim() {
        let payload = MergePayload {
            list: vec![ClipDescriptor::new("a", 10.0, 0.0, 0.0)],
            time: 42,
        };
        let plan = pipeline().plan("u1", &payload).unwrap().unwrap();
        assert_eq!(plan.stages.len(), 2);
        assert_eq!(plan.stages[0].name, "concat");
        assert_eq!(plan.stages[1].name, "trim");
        assert_eq!(plan.artifact.file_name, "output-42.mp4");
        assert_eq!(plan.artifact.path, PathBuf::from("/store/u1/output-42.mp4"));
    }

    #[test]
    fn trim_reads_the_request_scoped_intermediate() {
        let payload = MergePayload {
            list: vec![ClipDescriptor::new("a", 10.0, 0.0, 0.0)],
            time: 42,
        };
        let plan = pipeline().plan("u1", &payload).unwrap().unwrap();
        let concat = arg_strings(&plan.stages[0]);
        let trim = arg_strings(&plan.stages[1]);

        let intermediate = "/store/u1/output-tmp-42.mp4";
        assert_eq!(concat.last().unwrap(), intermediate);
        assert_eq!(trim[0], "-i");
        assert_eq!(trim[1], intermediate);
        assert_eq!(trim.last().unwrap(), "/store/u1/output-42.mp4");
    }

    #[test]
    fn merge_scenario_two_clips_one_window() {
        // [{a,10,0,0},{b,8,2,0}] -> exclusion window [10,12) only.
        let payload = MergePayload {
            list: vec![
                ClipDescriptor::new("a", 10.0, 0.0, 0.0),
                ClipDescriptor::new("b", 8.0, 2.0, 0.0),
            ],
            time: 7,
        };
        let plan = pipeline().plan("owner", &payload).unwrap().unwrap();
        let concat = arg_strings(&plan.stages[0]);
        let trim = arg_strings(&plan.stages[1]);

        assert_eq!(concat[1], "/store/owner/a.mp4");
        assert_eq!(concat[3], "/store/owner/b.mp4");
        let graph = &concat[concat.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("concat=n=2:v=1:a=0[v]"));

        let vf = &trim[trim.iter().position(|a| a == "-vf").unwrap() + 1];
        let af = &trim[trim.iter().position(|a| a == "-af").unwrap() + 1];
        assert_eq!(vf, "select='not(between(t,10,12))',setpts=N/FRAME_RATE/TB");
        assert_eq!(af, "aselect='not(between(t,10,12))',asetpts=N/SR/TB");
    }

    #[test]
    fn invalid_deltas_fail_before_any_stage_is_planned() {
        let payload = MergePayload {
            list: vec![ClipDescriptor::new("a", 5.0, 4.0, 4.0)],
            time: 1,
        };
        assert!(matches!(
            pipeline().plan("u1", &payload),
            Err(PipelineError::InvalidClip { .. })
        ));
    }

    #[tokio::test]
    async fn process_failure_is_surfaced() {
        // `false` exits non-zero; the pipeline must report it, not continue.
        let p = TranscodePipeline {
            ffmpeg: PathBuf::from("false"),
            storage_root: PathBuf::from("/tmp"),
            timeout: Duration::from_secs(5),
        };
        let stage = Stage { name: "concat", args: vec![] };
        match p.run_stage(&stage).await {
            Err(PipelineError::Process { stage, .. }) => assert_eq!(stage, "concat"),
            other => panic!("expected process error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hung_process_times_out() {
        let p = TranscodePipeline {
            ffmpeg: PathBuf::from("sleep"),
            storage_root: PathBuf::from("/tmp"),
            timeout: Duration::from_millis(50),
        };
        let stage = Stage { name: "trim", args: vec![OsString::from("10")] };
        match p.run_stage(&stage).await {
            Err(PipelineError::Timeout { stage, .. }) => assert_eq!(stage, "trim"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
