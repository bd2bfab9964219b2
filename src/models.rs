use serde::Deserialize;

/// One source clip as described by the editing client.
///
/// `start_delta` / `end_delta` are seconds to drop from the clip's leading /
/// trailing edge after concatenation.
#[derive(Deserialize, Debug, Clone)]
pub struct ClipDescriptor {
    pub id: String,
    pub duration: f64,
    #[serde(rename = "startDelta")]
    pub start_delta: f64,
    #[serde(rename = "endDelta")]
    pub end_delta: f64,
}

/// Body of `POST /merge`. `time` is the client-supplied timestamp that names
/// the output artifact, so repeated merges never collide on the final path.
#[derive(Deserialize, Debug)]
pub struct MergePayload {
    pub list: Vec<ClipDescriptor>,
    pub time: u64,
}

#[cfg(test)]
impl ClipDescriptor {
    pub fn new(id: &str, duration: f64, start_delta: f64, end_delta: f64) -> Self {
        Self {
            id: id.to_string(),
            duration,
            start_delta,
            end_delta,
        }
    }
}
