// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Record encode/decode

use byteorder::{ByteOrder, NativeEndian};

use crate::error::{DecodeError, Result};
use crate::event::{EventKind, ParkingEvent, VehicleId, VEHICLE_ID_LEN};

const LAT_OFFSET: usize = VEHICLE_ID_LEN;
const LON_OFFSET: usize = LAT_OFFSET + 8;
const KIND_OFFSET: usize = LON_OFFSET + 8;
const TIME_OFFSET: usize = KIND_OFFSET + 4;

/// Size of one packed record on the wire
pub const RECORD_SIZE: usize = TIME_OFFSET + 8;

/// Decode exactly one record.
///
/// # Errors
///
/// `DecodeError::Framing` if `bytes` is not exactly [`RECORD_SIZE`] long,
/// `DecodeError::InvalidKind` if the kind field is neither 0 nor 1.
pub fn decode(bytes: &[u8]) -> Result<ParkingEvent> {
    if bytes.len() != RECORD_SIZE {
        return Err(DecodeError::Framing {
            expected: RECORD_SIZE,
            actual: bytes.len(),
        });
    }

    let mut id = [0u8; VEHICLE_ID_LEN];
    id.copy_from_slice(&bytes[..VEHICLE_ID_LEN]);

    let raw_kind = NativeEndian::read_u32(&bytes[KIND_OFFSET..TIME_OFFSET]);
    let kind = EventKind::from_wire(raw_kind).ok_or(DecodeError::InvalidKind(raw_kind))?;

    Ok(ParkingEvent {
        vehicle_id: VehicleId::from_bytes(id),
        lat: NativeEndian::read_f64(&bytes[LAT_OFFSET..LON_OFFSET]),
        lon: NativeEndian::read_f64(&bytes[LON_OFFSET..KIND_OFFSET]),
        kind,
        timestamp: NativeEndian::read_i64(&bytes[TIME_OFFSET..RECORD_SIZE]),
    })
}

/// Encode one record into its packed wire form
pub fn encode(event: &ParkingEvent) -> [u8; RECORD_SIZE] {
    let mut bytes = [0u8; RECORD_SIZE];
    bytes[..VEHICLE_ID_LEN].copy_from_slice(event.vehicle_id.as_bytes());
    NativeEndian::write_f64(&mut bytes[LAT_OFFSET..LON_OFFSET], event.lat);
    NativeEndian::write_f64(&mut bytes[LON_OFFSET..KIND_OFFSET], event.lon);
    NativeEndian::write_u32(&mut bytes[KIND_OFFSET..TIME_OFFSET], event.kind.to_wire());
    NativeEndian::write_i64(&mut bytes[TIME_OFFSET..RECORD_SIZE], event.timestamp);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_event() -> ParkingEvent {
        ParkingEvent::enter(VehicleId::from_str_padded("CAR123").unwrap(), 23.1, 65.97, 1000)
    }

    #[test]
    fn test_record_size_is_packed() {
        assert_eq!(RECORD_SIZE, 36);
    }

    #[test]
    fn test_field_offsets() {
        let bytes = encode(&sample_event());
        assert_eq!(&bytes[0..8], b"CAR123\0\0");
        assert_eq!(NativeEndian::read_f64(&bytes[8..16]), 23.1);
        assert_eq!(NativeEndian::read_f64(&bytes[16..24]), 65.97);
        assert_eq!(NativeEndian::read_u32(&bytes[24..28]), 1);
        assert_eq!(NativeEndian::read_i64(&bytes[28..36]), 1000);
    }

    #[test]
    fn test_decode_short_input_is_framing_error() {
        let bytes = encode(&sample_event());
        match decode(&bytes[..20]) {
            Err(DecodeError::Framing { expected, actual }) => {
                assert_eq!(expected, 36);
                assert_eq!(actual, 20);
            }
            other => panic!("expected framing error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_long_input_is_framing_error() {
        let mut bytes = encode(&sample_event()).to_vec();
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(DecodeError::Framing { .. })));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let mut bytes = encode(&sample_event());
        NativeEndian::write_u32(&mut bytes[24..28], 7);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidKind(7)));
        assert!(err.is_recoverable());
    }

    proptest! {
        #[test]
        fn prop_encode_decode_preserves_bytes(
            id in any::<[u8; 8]>(),
            lat_bits in any::<u64>(),
            lon_bits in any::<u64>(),
            kind in 0u32..=1,
            timestamp in any::<i64>(),
        ) {
            let mut bytes = [0u8; RECORD_SIZE];
            bytes[..8].copy_from_slice(&id);
            NativeEndian::write_u64(&mut bytes[8..16], lat_bits);
            NativeEndian::write_u64(&mut bytes[16..24], lon_bits);
            NativeEndian::write_u32(&mut bytes[24..28], kind);
            NativeEndian::write_i64(&mut bytes[28..36], timestamp);

            let event = decode(&bytes).unwrap();
            prop_assert_eq!(encode(&event), bytes);
        }
    }
}
