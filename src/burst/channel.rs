//! Frequency plan helpers.
//!
//! The band starts at 1616 MHz and is divided into 41.667 kHz channels,
//! grouped eight at a time into 30 duplex sub-bands. Channels above sub-band
//! 30 belong to the simplex band and are labelled `S.nn`.

use crate::error::{Error, Result};

/// Lower edge of the band in Hz
pub const BASE_FREQ: f64 = 1_616_000_000.0;

/// Width of one channel in Hz
pub const CHANNEL_WIDTH: f64 = 1e7 / (30.0 * 8.0);

/// Channels per sub-band
pub const ACCESSES_PER_SUBBAND: i64 = 8;

/// Number of duplex sub-bands
pub const DUPLEX_SUBBANDS: i64 = 30;

/// Sub-band number used for the simplex band
pub const SIMPLEX_SUBBAND: u32 = 31;

/// Highest simplex channel access
pub const SIMPLEX_ACCESSES: u32 = 12;

const F_DOPPLER: f64 = 36e3;
const F_JITTER: f64 = 1e3;
const SDR_PPM: f64 = 100e-6;

/// Lowest frequency at which a simplex burst can appear
pub const F_SIMPLEX: f64 = (1_626_104e3 - F_DOPPLER - F_JITTER) * (1.0 - SDR_PPM);

/// Highest frequency at which a duplex burst can appear
pub const F_DUPLEX: f64 = (1_625_979e3 + F_DOPPLER + F_JITTER) * (1.0 + SDR_PPM);

/// Channel index above the band base and offset from the channel centre in Hz
pub fn channelize(freq: f64) -> (i64, f64) {
    let fbase = freq - BASE_FREQ;
    let channel = (fbase / CHANNEL_WIDTH).trunc() as i64;
    let offset = fbase.rem_euclid(CHANNEL_WIDTH) - CHANNEL_WIDTH / 2.0;
    (channel, offset)
}

/// Label such as `05.3|+00120` (sub-band.access|offset) or `S.07|-00031`
pub fn channel_label(freq: f64) -> String {
    let (channel, offset) = channelize(freq);
    let subband = channel.div_euclid(ACCESSES_PER_SUBBAND) + 1;
    let access = channel.rem_euclid(ACCESSES_PER_SUBBAND) + 1;

    if subband > DUPLEX_SUBBANDS {
        format!(
            "S.{:02}|{:+06.0}",
            channel - DUPLEX_SUBBANDS * ACCESSES_PER_SUBBAND + 1,
            offset
        )
    } else {
        format!("{:02}.{}|{:+06.0}", subband, access, offset)
    }
}

/// Centre frequency in Hz of `access` within `subband` (31 = simplex)
///
/// # Errors
///
/// Returns `Error::InvalidInput` for sub-bands above 31 or simplex accesses above 12
pub fn channel_frequency(subband: u32, access: u32) -> Result<u64> {
    if subband > SIMPLEX_SUBBAND || (subband == SIMPLEX_SUBBAND && access > SIMPLEX_ACCESSES) {
        return Err(Error::InvalidInput(format!(
            "invalid sub-band ({}) or frequency access ({})",
            subband, access
        )));
    }
    let freq = BASE_FREQ
        + CHANNEL_WIDTH / 2.0
        + CHANNEL_WIDTH * ACCESSES_PER_SUBBAND as f64 * (subband as f64 - 1.0)
        + CHANNEL_WIDTH * (access as f64 - 1.0);
    Ok(freq.round() as u64)
}

fn parse_number<T: std::str::FromStr>(s: &str, label: &str) -> Result<T> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid {} {:?}", label, s)))
}

/// Parse a frequency given as Hz, `channel|offset`, `sb.access|offset` or `S.access|offset`
pub fn parse_channel(s: &str) -> Result<f64> {
    let Some((channel, offset)) = s.split_once('|') else {
        return parse_number::<u64>(s, "frequency").map(|f| f as f64);
    };
    let offset: i64 = parse_number(offset, "offset")?;

    match channel.split_once('.') {
        Some((subband, access)) => {
            let subband = if subband == "S" {
                SIMPLEX_SUBBAND
            } else {
                parse_number(subband, "sub-band")?
            };
            let access: u32 = parse_number(access, "access")?;
            Ok(channel_frequency(subband, access)? as f64 + offset as f64)
        }
        None => {
            let channel: i64 = parse_number(channel, "channel")?;
            Ok(BASE_FREQ + CHANNEL_WIDTH * channel as f64 + offset as f64 + CHANNEL_WIDTH / 2.0)
        }
    }
}

/// Whether a burst at `freq` may be in the simplex band
pub fn could_be_simplex(freq: f64) -> bool {
    freq > F_SIMPLEX
}

/// Whether a burst at `freq` may be in the duplex band
pub fn could_be_duplex(freq: f64) -> bool {
    freq < F_DUPLEX
}
