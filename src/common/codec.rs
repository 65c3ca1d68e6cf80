use crate::common::alphabet::{char_of, symbol_of};
use crate::common::ec;
use crate::common::error::{IChingError, IChingResult};
use crate::common::metadata::{MAX_SIZE, OFFSET, SYMBOLS_PER_ERROR, VERSION};

// Encoded code
//------------------------------------------------------------------------------

/// A code matrix: `size * size` field elements laid out column by column.
/// `data[0]` is the version, `data[1]` the payload length; mapped payload
/// symbols and zero padding follow, with the parity symbols in the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedIChing {
    pub version: u8,
    pub size: usize,
    pub data: Vec<u8>,
}

// Content encoder
//------------------------------------------------------------------------------

/// Maps a payload into a code matrix with `ec_fraction` of it recoverable.
pub fn encode(payload: &str, ec_fraction: f64) -> IChingResult<EncodedIChing> {
    if payload.is_empty() {
        return Err(IChingError::EmptyPayload);
    }
    if !(0.0..=1.0).contains(&ec_fraction) {
        return Err(IChingError::InvalidECLevel);
    }

    let payload = payload.to_uppercase();
    let len = payload.chars().count();
    let mut parity = (len as f64 * ec_fraction).ceil() as usize * SYMBOLS_PER_ERROR;

    let min_size = OFFSET + len + parity;
    if min_size > MAX_SIZE {
        return Err(IChingError::CapacityOverflow);
    }

    // Smallest square that fits, surplus slots converted to parity in pairs;
    // an odd surplus leaves one zero pad between payload and parity.
    let size = (1..).find(|&s| s * s >= min_size).expect("bounded by MAX_SIZE");
    let true_size = size * size;
    parity += (true_size - min_size) & !1;

    let mut data = vec![0u8; true_size - parity];
    data[0] = VERSION;
    data[1] = len as u8;
    for (i, c) in payload.chars().enumerate() {
        data[OFFSET + i] = symbol_of(c)?;
    }

    let data = ec::encode(&data, parity);
    Ok(EncodedIChing { version: VERSION, size, data })
}

// Content decoder
//------------------------------------------------------------------------------

/// Recovers the payload from an extracted code matrix, correcting symbol
/// errors through the parity tail.
pub fn decode(code: &EncodedIChing) -> IChingResult<String> {
    let n = code.data.len();
    if code.size * code.size != n || n < OFFSET + 1 {
        return Err(IChingError::InvalidCode);
    }

    // The received length byte sizes the parity tail; the version byte is
    // checked after correction so a damaged one can be repaired.
    let len = code.data[1] as usize;
    if len < 1 || len > n - OFFSET {
        return Err(IChingError::InvalidCode);
    }
    let parity = (n - OFFSET - len) & !1;

    let corrected =
        if parity > 0 { ec::decode(&code.data, parity)? } else { code.data.clone() };

    if corrected[0] != VERSION {
        return Err(IChingError::InvalidCode);
    }
    let len = corrected[1] as usize;
    if len < 1 || len > n - OFFSET {
        return Err(IChingError::InvalidCode);
    }

    let mut payload = String::with_capacity(len);
    for &symbol in &corrected[OFFSET..OFFSET + len] {
        payload.push(char_of(symbol)?);
    }
    Ok(payload)
}

#[cfg(test)]
mod codec_tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_encode_hello() {
        let code = encode("HELLO", 0.0).unwrap();
        assert_eq!(code.version, 1);
        assert_eq!(code.size, 3);
        // Metadata, mapped payload, then the two surplus slots as parity
        assert_eq!(code.data, vec![1, 5, 7, 4, 11, 11, 14, 62, 55]);
    }

    #[test]
    fn test_encode_with_ec_and_pad() {
        let code = encode("VALIDPAYLOAD", 0.25).unwrap();
        assert_eq!(code.size, 5);
        // 2 metadata + 12 symbols + 1 zero pad + 10 parity
        assert_eq!(&code.data[..OFFSET], &[1, 12]);
        assert_eq!(&code.data[OFFSET..14], &[21, 0, 11, 8, 3, 15, 0, 24, 11, 14, 0, 3]);
        assert_eq!(code.data[14], 0);
        assert_eq!(code.data.len(), 25);
    }

    #[test]
    fn test_encode_uppercases() {
        let lower = encode("hello", 0.0).unwrap();
        let upper = encode("HELLO", 0.0).unwrap();
        assert_eq!(lower, upper);
    }

    #[test_case("", 0.0, IChingError::EmptyPayload)]
    #[test_case("HELLO", -0.1, IChingError::InvalidECLevel)]
    #[test_case("HELLO", 1.5, IChingError::InvalidECLevel)]
    #[test_case("HÉLLO", 0.0, IChingError::InvalidChar)]
    fn test_encode_rejects(payload: &str, ec: f64, exp: IChingError) {
        assert_eq!(encode(payload, ec), Err(exp));
    }

    #[test]
    fn test_encode_capacity_overflow() {
        let payload = "A".repeat(63);
        assert_eq!(encode(&payload, 0.0), Err(IChingError::CapacityOverflow));
        // 58 chars + 2 metadata fit in 64 exactly with 4 surplus parity
        let code = encode(&"A".repeat(58), 0.0).unwrap();
        assert_eq!(code.size, 8);
    }

    #[test_case(1, 0.0, 2)]
    #[test_case(5, 0.0, 3)]
    #[test_case(12, 0.25, 5)]
    #[test_case(58, 0.0, 8)]
    #[test_case(20, 0.15, 6)]
    fn test_encode_size_law(len: usize, ec: f64, exp_size: usize) {
        let payload: String = "THEQUICKBROWNFOXJUMPSOVERTHELAZYDOGTHEQUICKBROWNFOXJUMPSOV"
            .chars()
            .take(len)
            .collect();
        let code = encode(&payload, ec).unwrap();
        assert_eq!(code.size, exp_size);

        let min = OFFSET + len + (len as f64 * ec).ceil() as usize * SYMBOLS_PER_ERROR;
        assert!(code.size * code.size >= min);
        assert!((code.size - 1) * (code.size - 1) < min);
    }

    #[test]
    fn test_decode_round_trip() {
        for (payload, ec) in
            [("HELLO", 0.0), ("VALIDPAYLOAD", 0.25), ("A", 0.0), ("MIXED 64: <>?!", 0.15)]
        {
            let code = encode(payload, ec).unwrap();
            assert_eq!(decode(&code).unwrap(), payload.to_uppercase(), "{payload}");
        }
    }

    #[test]
    fn test_decode_corrects_parity_symbol_error() {
        let mut code = encode("HELLO", 0.0).unwrap();
        code.data[7] ^= 0x2a;
        assert_eq!(decode(&code).unwrap(), "HELLO");
    }

    #[test]
    fn test_decode_corrects_metadata_error() {
        let mut code = encode("VALIDPAYLOAD", 0.25).unwrap();
        code.data[0] ^= 0x08;
        assert_eq!(decode(&code).unwrap(), "VALIDPAYLOAD");
    }

    #[test]
    fn test_decode_rejects_non_square() {
        let mut code = encode("HELLO", 0.0).unwrap();
        code.data.push(0);
        assert_eq!(decode(&code), Err(IChingError::InvalidCode));
    }

    #[test]
    fn test_decode_rejects_all_zero() {
        let code = EncodedIChing { version: 0, size: 3, data: vec![0; 9] };
        assert_eq!(decode(&code), Err(IChingError::InvalidCode));
    }

    #[test]
    fn test_decode_rejects_wrong_version_without_parity() {
        // Length byte leaves no parity, so the bad version must surface
        let mut code = encode(&"A".repeat(14), 0.0).unwrap();
        assert_eq!(code.size, 4);
        code.data[0] = 2;
        assert_eq!(decode(&code), Err(IChingError::InvalidCode));
    }
}
