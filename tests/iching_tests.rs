use image::Rgba;

use iching::{ECLevel, IChingBuilder, IChingError, IChingReader};

#[cfg(test)]
mod iching_proptests {
    use prop::string::string_regex;
    use proptest::prelude::*;

    use iching::{IChingBuilder, IChingReader};

    pub fn payload_strategy() -> impl Strategy<Value = String> {
        string_regex(r#"[A-Z0-9!@#$%^&*(){}\[\]_+\-=.,:;/?<>" ]{1,20}"#).unwrap()
    }

    pub fn ec_strategy() -> BoxedStrategy<f64> {
        prop_oneof![Just(0.0), Just(0.05), Just(0.15), Just(0.25)].boxed()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn proptest_round_trip(payload in payload_strategy(), ec in ec_strategy()) {
            let code = IChingBuilder::new(&payload).ec_fraction(ec).build().unwrap();
            let img = code.to_image(1250).unwrap();
            let decoded = IChingReader::read(&img).unwrap();
            prop_assert_eq!(decoded.payload, payload);
            prop_assert_eq!(decoded.version, 1);
            prop_assert_eq!(decoded.size, code.size());
        }

        #[test]
        fn proptest_size_is_minimal_square(payload in payload_strategy(), ec in ec_strategy()) {
            let code = IChingBuilder::new(&payload).ec_fraction(ec).build().unwrap();
            let min = 2 + payload.len() + 2 * (payload.len() as f64 * ec).ceil() as usize;
            let size = code.size();
            prop_assert!(size * size >= min);
            prop_assert!((size - 1) * (size - 1) < min);
        }
    }
}

#[test]
fn test_hello_layout() {
    let code = IChingBuilder::new("HELLO").ec_level(ECLevel::None).build().unwrap();
    assert_eq!(code.version(), 1);
    assert_eq!(code.size(), 3);
    // Version, length, then H E L L O
    assert_eq!(&code.data()[..7], &[1, 5, 7, 4, 11, 11, 14]);
}

#[test]
fn test_hello_render_and_decode() {
    let img = IChingBuilder::new("HELLO")
        .ec_level(ECLevel::None)
        .build()
        .unwrap()
        .to_image(1250)
        .unwrap();
    assert_eq!(img.dimensions(), (1250, 1250));

    let decoded = IChingReader::read(&img).unwrap();
    assert_eq!(decoded.payload, "HELLO");
    assert_eq!(decoded.size, 3);
    assert_eq!(decoded.version, 1);
}

#[test]
fn test_lowercase_payload_decodes_uppercased() {
    let img = IChingBuilder::new("hello world")
        .ec_level(ECLevel::Low)
        .build()
        .unwrap()
        .to_image(1250)
        .unwrap();
    assert_eq!(IChingReader::read(&img).unwrap().payload, "HELLO WORLD");
}

#[test]
fn test_render_hints_do_not_affect_decoding() {
    let img = IChingBuilder::new("ROUNDED")
        .ec_level(ECLevel::Medium)
        .round_edges(true)
        .build()
        .unwrap()
        .to_image(1250)
        .unwrap();
    assert_eq!(IChingReader::read(&img).unwrap().payload, "ROUNDED");

    let img = IChingBuilder::new("INVERTED")
        .ec_level(ECLevel::Medium)
        .inverted(true)
        .build()
        .unwrap()
        .to_image(1250)
        .unwrap();
    assert_eq!(IChingReader::read_lenient(&img).unwrap().payload, "INVERTED");
}

#[test]
fn test_damaged_symbol_is_corrected() {
    // VALIDPAYLOAD at the high preset carries 10 parity symbols on a 5x5
    // grid; wiping one whole glyph leaves a correctable single error.
    let img = IChingBuilder::new("VALIDPAYLOAD")
        .ec_level(ECLevel::High)
        .build()
        .unwrap()
        .to_image(1250)
        .unwrap();

    // Cell (1, 1): pad 70, grid origin 70 + 44 * 5, step 140, glyph 110 px
    let mut damaged = img.clone();
    let origin = 70 + 44 * 5 + 140;
    for y in origin..origin + 110 {
        for x in origin..origin + 110 {
            damaged.put_pixel(x as u32, y as u32, Rgba([255, 255, 255, 255]));
        }
    }

    let decoded = IChingReader::read(&damaged).unwrap();
    assert_eq!(decoded.payload, "VALIDPAYLOAD");
}

#[test]
fn test_blank_image_reports_missing_finders() {
    let img = image::RgbaImage::from_pixel(1250, 1250, Rgba([255, 255, 255, 255]));
    let err = IChingReader::read(&img).unwrap_err();
    assert_eq!(err, IChingError::FinderNotFound);
    assert_eq!(err.to_string(), "Couldn't Locate Finder Patterns!");
}

#[test]
fn test_error_messages() {
    let err = IChingBuilder::new("").build().unwrap_err();
    assert_eq!(err.to_string(), "Empty payload!");

    let err = IChingBuilder::new("HI").ec_fraction(2.0).build().unwrap_err();
    assert_eq!(err.to_string(), "Error correction percentage must be a value between 0 - 1!");

    let err = IChingBuilder::new(&"A".repeat(100)).build().unwrap_err();
    assert_eq!(err.to_string(), "Payload and error correction level combination is too big!");

    let err = IChingBuilder::new("HI")
        .ec_level(ECLevel::None)
        .build()
        .unwrap()
        .to_image(10)
        .unwrap_err();
    assert_eq!(err.to_string(), "Resolution is too small!");

    let err = IChingBuilder::new("Ü").build().unwrap_err();
    assert_eq!(err.to_string(), "Invalid character in payload!");
}

#[test]
fn test_every_payload_length_round_trips() {
    let source: String = ('A'..='Z').chain('0'..='9').cycle().take(58).collect();
    for len in 1..=58 {
        let payload = &source[..len];
        let img = IChingBuilder::new(payload)
            .ec_level(ECLevel::None)
            .build()
            .unwrap()
            .to_image(1250)
            .unwrap();
        let decoded = IChingReader::read(&img).unwrap();
        assert_eq!(decoded.payload, payload, "length {len}");
    }
}

#[test]
fn test_capacity_boundary_payload() {
    // 58 characters is the largest payload at ec 0
    let payload: String = ('A'..='Z').cycle().take(58).collect();
    let img = IChingBuilder::new(&payload)
        .ec_level(ECLevel::None)
        .build()
        .unwrap()
        .to_image(1250)
        .unwrap();
    assert_eq!(IChingReader::read(&img).unwrap().payload, payload);
}
