//! Timeline arithmetic: converts per-clip trim deltas into absolute
//! exclusion windows on the concatenated output.

use crate::error::PipelineError;
use crate::models::ClipDescriptor;

/// A timestamp interval `[start, end)` in seconds, expressed on the
/// concatenated timeline, whose samples are dropped by the trim pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionWindow {
    pub start: f64,
    pub end: f64,
}

/// Compute the exclusion windows for an ordered clip list.
///
/// Each clip occupies `[offset, offset + duration)` on the concatenated
/// timeline, where `offset` is the prefix sum of the preceding durations. A
/// non-zero `start_delta` excludes the clip's leading edge, a non-zero
/// `end_delta` its trailing edge. The running offset advances by the full
/// clip duration regardless of trim.
///
/// Deltas that are negative or together exceed the clip duration are
/// rejected; the trim arithmetic has no meaningful answer for them.
pub fn exclusion_windows(clips: &[ClipDescriptor]) -> Result<Vec<ExclusionWindow>, PipelineError> {
    let mut windows = Vec::new();
    let mut offset = 0.0_f64;

    for clip in clips {
        validate_clip(clip)?;

        if clip.start_delta > 0.0 {
            windows.push(ExclusionWindow {
                start: offset,
                end: offset + clip.start_delta,
            });
        }
        if clip.end_delta > 0.0 {
            windows.push(ExclusionWindow {
                start: offset + clip.duration - clip.end_delta,
                end: offset + clip.duration,
            });
        }

        offset += clip.duration;
    }

    Ok(windows)
}

fn validate_clip(clip: &ClipDescriptor) -> Result<(), PipelineError> {
    let invalid = |reason: String| PipelineError::InvalidClip {
        clip_id: clip.id.clone(),
        reason,
    };

    if !clip.duration.is_finite() || clip.duration <= 0.0 {
        return Err(invalid(format!("duration {} must be positive", clip.duration)));
    }
    if clip.start_delta < 0.0 || clip.end_delta < 0.0 {
        return Err(invalid("trim deltas must be non-negative".to_string()));
    }
    if clip.start_delta + clip.end_delta > clip.duration {
        return Err(invalid(format!(
            "trim deltas {} + {} exceed clip duration {}",
            clip.start_delta, clip.end_delta, clip.duration
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_starts_are_prefix_sums() {
        let clips = vec![
            ClipDescriptor::new("a", 10.0, 1.0, 0.0),
            ClipDescriptor::new("b", 8.0, 2.0, 0.0),
            ClipDescriptor::new("c", 5.0, 0.5, 0.0),
        ];
        let windows = exclusion_windows(&clips).unwrap();
        // Leading windows open exactly at each clip's absolute start.
        assert_eq!(windows[0].start, 0.0);
        assert_eq!(windows[1].start, 10.0);
        assert_eq!(windows[2].start, 18.0);
    }

    #[test]
    fn windows_stay_inside_their_clip() {
        let clips = vec![
            ClipDescriptor::new("a", 10.0, 3.0, 2.0),
            ClipDescriptor::new("b", 6.0, 0.0, 1.5),
        ];
        let windows = exclusion_windows(&clips).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!((windows[0].start, windows[0].end), (0.0, 3.0));
        assert_eq!((windows[1].start, windows[1].end), (8.0, 10.0));
        assert_eq!((windows[2].start, windows[2].end), (14.5, 16.0));
    }

    #[test]
    fn start_delta_at_absolute_offset() {
        // startDelta=5 on a clip starting at absolute offset 10 -> [10, 15)
        let clips = vec![
            ClipDescriptor::new("a", 10.0, 0.0, 0.0),
            ClipDescriptor::new("b", 8.0, 5.0, 0.0),
        ];
        let windows = exclusion_windows(&clips).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (10.0, 15.0));
    }

    #[test]
    fn untrimmed_clips_emit_no_windows() {
        let clips = vec![
            ClipDescriptor::new("a", 10.0, 0.0, 0.0),
            ClipDescriptor::new("b", 8.0, 0.0, 0.0),
        ];
        assert!(exclusion_windows(&clips).unwrap().is_empty());
    }

    #[test]
    fn empty_list_yields_no_windows() {
        assert!(exclusion_windows(&[]).unwrap().is_empty());
    }

    #[test]
    fn rejects_deltas_exceeding_duration() {
        let clips = vec![ClipDescriptor::new("a", 5.0, 3.0, 3.0)];
        let err = exclusion_windows(&clips).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidClip { .. }));
    }

    #[test]
    fn rejects_negative_delta() {
        let clips = vec![ClipDescriptor::new("a", 5.0, -1.0, 0.0)];
        assert!(exclusion_windows(&clips).is_err());
    }

    #[test]
    fn rejects_zero_duration() {
        let clips = vec![ClipDescriptor::new("a", 0.0, 0.0, 0.0)];
        assert!(exclusion_windows(&clips).is_err());
    }
}
