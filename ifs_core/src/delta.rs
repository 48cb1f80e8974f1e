//! Reversible inter-pixel delta transform.
//!
//! Each sample is replaced by its wrapping difference from the same channel of
//! the previous pixel. The predictor before the first pixel is the all-zero
//! tuple in both directions, so the first pixel passes through unchanged.
//! Smooth regions turn into long runs of small values, which the compression
//! backend then squeezes.
//!
//! The recurrence runs in one pass over the whole flat stream, row boundaries
//! included.

use crate::error::IfsError;

/// Forward transform: `delta[i] = sample[i] - sample[i - channels]` (mod 256).
pub fn encode(samples: &[u8], channels: usize) -> Result<Vec<u8>, IfsError> {
    check_channels(channels)?;
    let mut deltas = Vec::with_capacity(samples.len());
    let head = samples.len().min(channels);
    deltas.extend_from_slice(&samples[..head]);
    deltas.extend(
        samples[head..]
            .iter()
            .zip(samples)
            .map(|(&cur, &prev)| cur.wrapping_sub(prev)),
    );
    Ok(deltas)
}

/// Inverse transform: `sample[i] = delta[i] + sample[i - channels]` (mod 256).
pub fn decode(deltas: &[u8], channels: usize) -> Result<Vec<u8>, IfsError> {
    let mut samples = deltas.to_vec();
    decode_in_place(&mut samples, channels)?;
    Ok(samples)
}

/// [`decode`] without the extra allocation.
pub fn decode_in_place(buf: &mut [u8], channels: usize) -> Result<(), IfsError> {
    check_channels(channels)?;
    for i in channels..buf.len() {
        buf[i] = buf[i].wrapping_add(buf[i - channels]);
    }
    Ok(())
}

fn check_channels(channels: usize) -> Result<(), IfsError> {
    if channels == 0 {
        return Err(IfsError::InvalidInput("delta transform needs at least one channel".into()));
    }
    Ok(())
}
