//! Pre-rendered silence used in place of audio for chunks that exhausted
//! every synthesis attempt. Keeping the substitute in the same format as the
//! service output (24 kHz mono MP3) means assembly and streaming never have
//! to special-case a missing segment.

// MPEG-2 Layer III, 24 kHz mono at 48 kbit/s: fixed 144-byte frames carrying
// 576 samples (24 ms) each. An all-zero payload decodes as silence.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xF3, 0x64, 0xC4];
const FRAME_LEN: usize = 144;

// 8 frames ~= 192 ms, close to the nominal 200 ms gap.
const CLIP_FRAMES: usize = 8;

/// Returns a short silent clip in the synthesis output format.
pub fn fallback_clip() -> Vec<u8> {
    let mut clip = Vec::with_capacity(CLIP_FRAMES * FRAME_LEN);
    for _ in 0..CLIP_FRAMES {
        clip.extend_from_slice(&FRAME_HEADER);
        clip.resize(clip.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    clip
}
