use super::Unpacker;
use crate::errors::CodecError;
use std::ops::RangeInclusive;
use tracing::warn;

/// Read the leading version tag of `entry` and check it is supported.
///
/// Unknown versions fail immediately; decoding never guesses a layout.
pub fn read_version(
    unpacker: &mut Unpacker<'_>,
    entry: &'static str,
    supported: RangeInclusive<i64>,
) -> Result<i64, CodecError> {
    let version = unpacker.unpack_i64()?;
    if !supported.contains(&version) {
        warn!(entry, version, "Unrecognised encoding version");
        return Err(CodecError::UnrecognisedVersion { entry, version });
    }
    Ok(version)
}
