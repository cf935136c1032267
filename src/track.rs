use serde_derive::Serialize;

use crate::Centroid;

/// Snapshot of one identity held by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Track {
    pub id: u32,

    // (x,y) in px, latest matched position
    #[serde(serialize_with = "serialize_centroid")]
    pub centroid: Centroid,

    // consecutive updates without a matching box
    pub disappeared: u32,
}

pub(crate) fn serialize_centroid<S: serde::Serializer>(
    c: &Centroid,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::Serialize;

    [c.x, c.y].serialize(serializer)
}
