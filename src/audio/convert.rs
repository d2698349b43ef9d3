//! Sample widening from the emulator's u8 stereo buffer into device format

use crate::audio::{CHANNELS, FRAME_SIZE};

/// Raw audio handed over by the emulator on an audio-buffer-full event
///
/// Interleaved unsigned 8-bit stereo. Borrowed for one conversion only.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    /// Interleaved samples, left first
    pub data: &'a [u8],
    /// Number of stereo frames in `data`
    pub frames: usize,
}

impl<'a> AudioBuffer<'a> {
    /// Wrap interleaved stereo data; the frame count is derived from its length
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            frames: data.len() / CHANNELS as usize,
        }
    }
}

/// Widen one 8-bit unsigned sample to 16-bit unsigned
#[inline]
pub fn widen_sample(sample: u8) -> u16 {
    u16::from(sample) << 8
}

/// Convert `src` into `dst` as little-endian u16 stereo frames
///
/// Writes at most as many frames as `dst` can hold; frames beyond that are
/// dropped. Returns the number of frames written.
pub fn convert_samples(src: AudioBuffer<'_>, dst: &mut [u8]) -> usize {
    let channels = CHANNELS as usize;
    let frames = src
        .frames
        .min(dst.len() / FRAME_SIZE)
        .min(src.data.len() / channels);

    let samples = src.data[..frames * channels].iter();
    for (out, &sample) in dst.chunks_exact_mut(FRAME_SIZE / channels).zip(samples) {
        out.copy_from_slice(&widen_sample(sample).to_le_bytes());
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<u16> {
        bytes
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_widening_is_shift_by_eight() {
        let src: Vec<u8> = (0..=255u8).collect();
        let mut dst = vec![0u8; src.len() * 2];

        let frames = convert_samples(AudioBuffer::new(&src), &mut dst);

        assert_eq!(frames, 128);
        for (i, value) in decode(&dst).into_iter().enumerate() {
            assert_eq!(value, (i as u16) << 8);
        }
    }

    #[test]
    fn test_interleaving_preserved() {
        let src = [0x10, 0xf0, 0x20, 0xe0];
        let mut dst = [0u8; 8];

        assert_eq!(convert_samples(AudioBuffer::new(&src), &mut dst), 2);
        assert_eq!(decode(&dst), vec![0x1000, 0xf000, 0x2000, 0xe000]);
    }

    #[test]
    fn test_truncates_to_capacity() {
        let src = [0x80u8; 20];
        let mut dst = [0xaau8; 17];

        // Room for 4 whole frames; the trailing byte is untouched.
        assert_eq!(convert_samples(AudioBuffer::new(&src), &mut dst), 4);
        assert!(decode(&dst[..16]).iter().all(|&s| s == 0x8000));
        assert_eq!(dst[16], 0xaa);
    }

    #[test]
    fn test_frame_count_limits_conversion() {
        let src = [0x40u8; 16];
        let mut dst = [0u8; 64];
        let buffer = AudioBuffer {
            data: &src,
            frames: 3,
        };

        assert_eq!(convert_samples(buffer, &mut dst), 3);
        assert!(dst[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_source() {
        let mut dst = [0u8; 8];
        assert_eq!(convert_samples(AudioBuffer::new(&[]), &mut dst), 0);
    }
}
