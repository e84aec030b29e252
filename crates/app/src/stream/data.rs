/// Annotated, encoded frame ready to serve. Published as an immutable
/// snapshot; the capture loop never touches a packet after `set_latest`.
#[derive(Clone)]
pub(crate) struct FramePacket {
    pub(crate) jpeg: Vec<u8>,
    pub(crate) finger_count: u8,
    pub(crate) hand_detected: bool,
    pub(crate) timestamp_ms: i64,
    pub(crate) frame_number: u64,
    pub(crate) fps: f32,
}
