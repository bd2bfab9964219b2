//! Pure builders for the two ffmpeg filter expressions: the scale/pad/concat
//! graph of the first pass and the select/aselect trim filters of the second.

use crate::models::ClipDescriptor;
use crate::timeline::ExclusionWindow;
use std::path::{Path, PathBuf};

/// Canonical output frame. Every input is scaled to fit and letterboxed /
/// pillarboxed so heterogeneous sources concatenate cleanly.
pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 360;

/// Inputs and filter-graph expression for the concat pass.
#[derive(Debug, Clone)]
pub struct ConcatGraph {
    /// Source paths, in clip order; input `i` in the graph is `inputs[i]`.
    pub inputs: Vec<PathBuf>,
    /// `-filter_complex` expression producing the single `[v]` output label.
    pub filter: String,
}

/// Build the concat-pass graph for the given clips.
///
/// Each input is scaled to the canonical frame, padded with black, and has
/// its sample aspect ratio normalized before concatenation. The graph emits
/// exactly one video stream and drops audio at the concat stage.
pub fn concat_graph(clips: &[ClipDescriptor], owner_dir: &Path) -> ConcatGraph {
    let inputs: Vec<PathBuf> = clips
        .iter()
        .map(|clip| owner_dir.join(format!("{}.mp4", clip.id)))
        .collect();

    let mut filter = String::new();
    for i in 0..clips.len() {
        filter.push_str(&format!(
            "[{i}:v:0]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:-1:-1:color=black,setsar=sar=1[Scaled_{i}];",
            w = FRAME_WIDTH,
            h = FRAME_HEIGHT,
        ));
    }
    for i in 0..clips.len() {
        filter.push_str(&format!("[Scaled_{i}]"));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=0[v]", clips.len()));

    ConcatGraph { inputs, filter }
}

/// Video and audio filter expressions for the trim pass.
#[derive(Debug, Clone)]
pub struct TrimFilters {
    pub video: String,
    pub audio: String,
}

/// Build the trim-pass filters from the exclusion windows.
///
/// Each window becomes a selection predicate keeping only samples whose
/// timestamp falls outside `[start, end)`; predicates are independent set
/// exclusions, so their order is irrelevant. A trailing setpts/asetpts stage
/// re-bases presentation timestamps at zero once the gaps are gone. With no
/// windows the filters degrade to the renormalization stage alone.
pub fn trim_filters(windows: &[ExclusionWindow]) -> TrimFilters {
    let mut video = String::new();
    let mut audio = String::new();

    for w in windows {
        video.push_str(&format!("select='not(between(t,{},{}))',", w.start, w.end));
        audio.push_str(&format!("aselect='not(between(t,{},{}))',", w.start, w.end));
    }
    video.push_str("setpts=N/FRAME_RATE/TB");
    audio.push_str("asetpts=N/SR/TB");

    TrimFilters { video, audio }
}
