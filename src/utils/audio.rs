use anyhow::{anyhow, Result};
use log::{debug, warn};
use std::f64::consts::PI;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

pub const FALLBACK_SAMPLE_RATE: u32 = 22_050;
pub const FALLBACK_FREQUENCY_HZ: f64 = 440.0;
pub const FALLBACK_AMPLITUDE: f64 = 0.1;
pub const FALLBACK_MAX_SECONDS: f64 = 5.0;
const CHARS_PER_SECOND: f64 = 10.0;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
const FMT_CHUNK_SIZE: u32 = 16;
const PCM_FORMAT: u16 = 1;
pub const WAV_HEADER_LEN: usize = 44;

/// Length of the placeholder tone for a piece of text: one second per ten
/// characters, capped at five seconds.
pub fn fallback_duration_seconds(text: &str) -> f64 {
    let chars = text.chars().count() as f64;
    (chars / CHARS_PER_SECOND).min(FALLBACK_MAX_SECONDS)
}

pub fn fallback_sample_count(duration_seconds: f64) -> Result<usize> {
    if !duration_seconds.is_finite() || duration_seconds < 0.0 {
        return Err(anyhow!("Invalid tone duration: {}", duration_seconds));
    }
    Ok((FALLBACK_SAMPLE_RATE as f64 * duration_seconds).round() as usize)
}

fn generate_tone(duration_seconds: f64) -> Result<Vec<i16>> {
    let count = fallback_sample_count(duration_seconds)?;
    let peak = FALLBACK_AMPLITUDE * i16::MAX as f64;
    let step = 2.0 * PI * FALLBACK_FREQUENCY_HZ / FALLBACK_SAMPLE_RATE as f64;
    Ok((0..count)
        .map(|n| (peak * (step * n as f64).sin()).round() as i16)
        .collect())
}

/// Writes 16-bit mono PCM samples as a canonical 44-byte-header WAV file.
pub fn write_pcm16_wav<W: Write>(out: &mut W, samples: &[i16], sample_rate: u32) -> Result<()> {
    let data_size = u32::try_from(samples.len() * BLOCK_ALIGN as usize)
        .map_err(|_| anyhow!("PCM data too large for a WAV container"))?;

    // RIFF [4] + Size [4] + WAVE [4]
    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_size).to_le_bytes())?;
    out.write_all(b"WAVE")?;

    out.write_all(b"fmt ")?;
    out.write_all(&FMT_CHUNK_SIZE.to_le_bytes())?;
    out.write_all(&PCM_FORMAT.to_le_bytes())?;
    out.write_all(&CHANNELS.to_le_bytes())?;
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&(sample_rate * BLOCK_ALIGN as u32).to_le_bytes())?;
    out.write_all(&BLOCK_ALIGN.to_le_bytes())?;
    out.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    out.write_all(b"data")?;
    out.write_all(&data_size.to_le_bytes())?;
    for sample in samples {
        out.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}

pub fn encode_tone_for_text(text: &str) -> Result<Vec<u8>> {
    let samples = generate_tone(fallback_duration_seconds(text))?;
    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2);
    write_pcm16_wav(&mut buf, &samples, FALLBACK_SAMPLE_RATE)?;
    Ok(buf)
}

/// Placeholder audio for a segment whose real synthesis failed. `None` means
/// no fallback audio is available either; that is never fatal.
pub fn fallback_tone(text: &str) -> Option<Vec<u8>> {
    match encode_tone_for_text(text) {
        Ok(wav) => {
            if let Ok(info) = read_wav_header(&mut Cursor::new(&wav)) {
                debug!(
                    "Fallback tone: {:.2}s at {} Hz, {} bytes",
                    info.duration_seconds(),
                    info.sample_rate,
                    wav.len()
                );
            }
            Some(wav)
        }
        Err(e) => {
            warn!("Fallback tone generation failed: {:#}", e);
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub riff_size: u32,
    pub data_offset: u64,
    pub data_size: u32,
}

impl WavInfo {
    pub fn duration_seconds(&self) -> f64 {
        let frame = self.channels as u32 * self.bits_per_sample as u32 / 8;
        if frame == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        self.data_size as f64 / frame as f64 / self.sample_rate as f64
    }
}

/// Walks the RIFF chunks up to `data` and reports the stream format.
pub fn read_wav_header<R: Read + Seek>(f: &mut R) -> Result<WavInfo> {
    let mut id = [0u8; 4];
    f.read_exact(&mut id)?;
    if &id != b"RIFF" {
        return Err(anyhow!("Not a RIFF file"));
    }

    let mut size_buf = [0u8; 4];
    f.read_exact(&mut size_buf)?;
    let riff_size = u32::from_le_bytes(size_buf);

    f.read_exact(&mut id)?;
    if &id != b"WAVE" {
        return Err(anyhow!("Not a WAVE file"));
    }

    let mut fmt: Option<(u16, u32, u16)> = None;

    loop {
        let mut chunk_id = [0u8; 4];
        let n = f.read(&mut chunk_id)?;
        if n < 4 {
            return Err(anyhow!("Missing data chunk"));
        }

        f.read_exact(&mut size_buf)?;
        let chunk_size = u32::from_le_bytes(size_buf);

        if &chunk_id == b"fmt " {
            let mut buf = vec![0u8; chunk_size as usize];
            f.read_exact(&mut buf)?;
            if buf.len() < 16 {
                return Err(anyhow!("fmt chunk too short"));
            }
            let channels = u16::from_le_bytes([buf[2], buf[3]]);
            let sample_rate = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
            let bits = u16::from_le_bytes([buf[14], buf[15]]);
            fmt = Some((channels, sample_rate, bits));
        } else if &chunk_id == b"data" {
            let (channels, sample_rate, bits_per_sample) =
                fmt.ok_or_else(|| anyhow!("Missing fmt chunk"))?;
            return Ok(WavInfo {
                channels,
                sample_rate,
                bits_per_sample,
                riff_size,
                data_offset: f.stream_position()?,
                data_size: chunk_size,
            });
        } else {
            f.seek(SeekFrom::Current(chunk_size as i64))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout_is_byte_exact() -> Result<()> {
        let wav = encode_tone_for_text("abcdefghij")?; // 1 second
        let samples = 22_050u32;
        let data_len = samples * 2;

        assert_eq!(wav.len(), WAV_HEADER_LEN + data_len as usize);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[4..8], &(36 + data_len).to_le_bytes());
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[16..20], &16u32.to_le_bytes());
        assert_eq!(&wav[20..22], &1u16.to_le_bytes());
        assert_eq!(&wav[22..24], &1u16.to_le_bytes());
        assert_eq!(&wav[24..28], &22_050u32.to_le_bytes());
        assert_eq!(&wav[28..32], &44_100u32.to_le_bytes());
        assert_eq!(&wav[32..34], &2u16.to_le_bytes());
        assert_eq!(&wav[34..36], &16u16.to_le_bytes());
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(&wav[40..44], &data_len.to_le_bytes());
        Ok(())
    }

    #[test]
    fn test_twenty_six_chars_gives_two_point_six_seconds() -> Result<()> {
        let text = "Hello there, how are you??";
        assert_eq!(text.chars().count(), 26);
        assert!((fallback_duration_seconds(text) - 2.6).abs() < 1e-9);

        let expected_samples = (22_050f64 * 2.6).round() as u32;
        assert_eq!(expected_samples, 57_330);

        let wav = fallback_tone(text).expect("fallback audio");
        let info = read_wav_header(&mut Cursor::new(&wav))?;
        assert_eq!(info.data_size, expected_samples * 2);
        assert_eq!(info.riff_size, 36 + info.data_size);
        assert_eq!(info.data_offset, WAV_HEADER_LEN as u64);
        assert!((info.duration_seconds() - 2.6).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_duration_is_capped() -> Result<()> {
        let long = "x".repeat(500);
        assert_eq!(fallback_duration_seconds(&long), 5.0);

        let wav = fallback_tone(&long).expect("fallback audio");
        let info = read_wav_header(&mut Cursor::new(&wav))?;
        assert_eq!(info.data_size, 22_050 * 5 * 2);
        assert_eq!(info.sample_rate, FALLBACK_SAMPLE_RATE);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        Ok(())
    }

    #[test]
    fn test_duration_counts_characters_not_bytes() {
        // 10 characters, 20 bytes in UTF-8
        assert!((fallback_duration_seconds("éééééééééé") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tone_is_quiet_sine() -> Result<()> {
        let samples = generate_tone(0.1)?;
        assert_eq!(samples.len(), 2205);
        assert_eq!(samples[0], 0);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        let limit = (FALLBACK_AMPLITUDE * i16::MAX as f64).round() as u16;
        assert!(peak <= limit);
        assert!(peak > limit / 2);
        Ok(())
    }

    #[test]
    fn test_empty_text_gives_header_only() -> Result<()> {
        let wav = encode_tone_for_text("")?;
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        let info = read_wav_header(&mut Cursor::new(&wav))?;
        assert_eq!(info.data_size, 0);
        Ok(())
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        assert!(generate_tone(f64::NAN).is_err());
        assert!(generate_tone(-1.0).is_err());
    }

    #[test]
    fn test_reader_skips_unknown_chunks() -> Result<()> {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&0u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(b"INFO");
        let tone = encode_tone_for_text("abc")?;
        wav.extend_from_slice(&tone[12..]);

        let info = read_wav_header(&mut Cursor::new(&wav))?;
        assert_eq!(info.data_offset, (WAV_HEADER_LEN + 12) as u64);
        assert_eq!(info.data_size, tone.len() as u32 - WAV_HEADER_LEN as u32);
        Ok(())
    }

    #[test]
    fn test_fallback_tone_reads_back_its_own_duration() -> Result<()> {
        let text = "A fallback line that lasts.";
        let wav = fallback_tone(text).expect("fallback audio");
        let info = read_wav_header(&mut Cursor::new(&wav))?;
        assert_eq!(info.sample_rate, FALLBACK_SAMPLE_RATE);
        assert_eq!(info.data_offset, 44);
        assert_eq!(info.data_size as usize, wav.len() - 44);
        assert!((info.duration_seconds() - fallback_duration_seconds(text)).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_reader_rejects_non_wav() {
        assert!(read_wav_header(&mut Cursor::new(b"ID3\x04 not a wav file")).is_err());
    }
}
