use tracing::warn;

/// Narration requests are capped before they reach the backend; longer
/// text slows synthesis without improving the spoken summary.
pub const SPEECH_CHAR_LIMIT: usize = 500;

/// The speech backend returns 16-bit little-endian PCM at this rate.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Decoded, normalized audio ready for a playback sink. Samples are
/// interleaved when `channels > 1`.
#[derive(Debug, Clone)]
pub struct SpeechClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl SpeechClip {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Caps narration text at [`SPEECH_CHAR_LIMIT`] characters without
/// splitting a multi-byte character.
pub fn truncate_for_speech(text: &str) -> &str {
    match text.char_indices().nth(SPEECH_CHAR_LIMIT) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Decodes raw 16-bit little-endian PCM into normalized `f32` samples.
/// A dangling trailing byte is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> SpeechClip {
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    SpeechClip {
        sample_rate,
        channels,
        samples,
    }
}

/// Plays a clip on the default output device, blocking a dedicated thread
/// until it finishes. Playback failures are logged and swallowed; they
/// must never surface into the chat transcript.
pub fn play_clip(clip: SpeechClip) {
    if clip.is_empty() {
        return;
    }
    std::thread::spawn(move || {
        let (_stream, handle) = match rodio::OutputStream::try_default() {
            Ok(output) => output,
            Err(err) => {
                warn!("speech playback unavailable: {err}");
                return;
            }
        };
        let sink = match rodio::Sink::try_new(&handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!("speech playback failed: {err}");
                return;
            }
        };
        sink.append(rodio::buffer::SamplesBuffer::new(
            clip.channels,
            clip.sample_rate,
            clip.samples,
        ));
        sink.sleep_until_end();
    });
}
