//! MAC subPDU sizing rules (TS 38.321 Section 6.1.2)
//!
//! A MAC SDU is carried behind an R/F/LCID/L subheader whose L field is
//! 8 bits for payloads below 256 bytes and 16 bits otherwise. Fixed-size
//! MAC CEs use a single-octet R/LCID subheader.

/// Smallest MAC SDU subheader (8-bit L field).
pub const MIN_MAC_SDU_SUBHEADER_SIZE: u32 = 2;

/// Largest MAC SDU subheader (16-bit L field).
pub const MAX_MAC_SDU_SUBHEADER_SIZE: u32 = 3;

/// Payload size from which the 16-bit L field is required.
pub const MAC_SDU_SUBHEADER_LENGTH_THRES: u32 = 256;

/// Subheader size of a fixed-size MAC CE.
pub const FIXED_SIZED_MAC_CE_SUBHEADER_SIZE: u32 = 1;

/// Subheader size of a variable-size MAC CE.
pub const VARIABLE_SIZED_MAC_CE_SUBHEADER_SIZE: u32 = 2;

/// Returns the subheader size needed to carry `payload` bytes of MAC SDU.
pub const fn mac_sdu_subheader_size(payload: u32) -> u32 {
    if payload == 0 {
        0
    } else if payload < MAC_SDU_SUBHEADER_LENGTH_THRES {
        MIN_MAC_SDU_SUBHEADER_SIZE
    } else {
        MAX_MAC_SDU_SUBHEADER_SIZE
    }
}

/// Returns the bytes needed to carry `payload` bytes of MAC SDU, subheader
/// included. An empty payload needs no bytes. Saturates at `u32::MAX`.
pub const fn mac_sdu_required_bytes(payload: u32) -> u32 {
    payload.saturating_add(mac_sdu_subheader_size(payload))
}

/// Returns the largest MAC SDU payload that fits in `subpdu_bytes` bytes,
/// subheader included.
///
/// Exactly 258 bytes cannot be used in full: 256 bytes of payload would need
/// the 3-byte subheader. The payload is trimmed to 255 in that case.
pub const fn mac_sdu_payload_size(subpdu_bytes: u32) -> u32 {
    if subpdu_bytes <= MIN_MAC_SDU_SUBHEADER_SIZE {
        0
    } else if subpdu_bytes > MAC_SDU_SUBHEADER_LENGTH_THRES + MIN_MAC_SDU_SUBHEADER_SIZE {
        subpdu_bytes - MAX_MAC_SDU_SUBHEADER_SIZE
    } else if subpdu_bytes == MAC_SDU_SUBHEADER_LENGTH_THRES + MIN_MAC_SDU_SUBHEADER_SIZE {
        MAC_SDU_SUBHEADER_LENGTH_THRES - 1
    } else {
        subpdu_bytes - MIN_MAC_SDU_SUBHEADER_SIZE
    }
}
