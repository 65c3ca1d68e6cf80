mod render;

pub use render::IChing;

use crate::common::{
    codec,
    error::IChingResult,
    metadata::ECLevel,
};

// Builder
//------------------------------------------------------------------------------

/// Assembles an IChing code from a payload and options.
///
/// ```
/// use iching::IChingBuilder;
///
/// let img = IChingBuilder::new("HELLO")
///     .ec_level(iching::ECLevel::None)
///     .build()
///     .unwrap()
///     .to_image(1250)
///     .unwrap();
/// ```
pub struct IChingBuilder<'a> {
    payload: &'a str,
    ec_fraction: f64,
    round_edges: bool,
    inverted: bool,
}

impl<'a> IChingBuilder<'a> {
    pub fn new(payload: &'a str) -> Self {
        Self {
            payload,
            ec_fraction: ECLevel::default().fraction(),
            round_edges: false,
            inverted: false,
        }
    }

    pub fn payload(&mut self, payload: &'a str) -> &mut Self {
        self.payload = payload;
        self
    }

    pub fn ec_level(&mut self, level: ECLevel) -> &mut Self {
        self.ec_fraction = level.fraction();
        self
    }

    /// Any fraction in `[0, 1]`; the canonical presets are in [`ECLevel`].
    pub fn ec_fraction(&mut self, fraction: f64) -> &mut Self {
        self.ec_fraction = fraction;
        self
    }

    pub fn round_edges(&mut self, round_edges: bool) -> &mut Self {
        self.round_edges = round_edges;
        self
    }

    pub fn inverted(&mut self, inverted: bool) -> &mut Self {
        self.inverted = inverted;
        self
    }

    pub fn metadata(&self) -> String {
        format!(
            "{{ Payload length: {}, Ec fraction: {}, Round edges: {}, Inverted: {} }}",
            self.payload.chars().count(),
            self.ec_fraction,
            self.round_edges,
            self.inverted
        )
    }

    pub fn build(&self) -> IChingResult<IChing> {
        let code = codec::encode(self.payload, self.ec_fraction)?;
        Ok(IChing::new(code, self.round_edges, self.inverted))
    }
}

#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use crate::common::error::IChingError;
    use crate::common::metadata::ECLevel;

    use super::IChingBuilder;

    #[test]
    fn test_build_defaults() {
        let code = IChingBuilder::new("HELLO").build().unwrap();
        assert_eq!(code.version(), 1);
        // Medium preset: parity 2 * ceil(5 * 0.15) = 2, still fits in 3x3
        assert_eq!(code.size(), 3);
    }

    #[test_case(ECLevel::None, 3)]
    #[test_case(ECLevel::Low, 3)]
    #[test_case(ECLevel::Medium, 3)]
    #[test_case(ECLevel::High, 4)]
    fn test_ec_levels(level: ECLevel, exp_size: usize) {
        let code = IChingBuilder::new("HELLO").ec_level(level).build().unwrap();
        assert_eq!(code.size(), exp_size);
    }

    #[test]
    fn test_build_rejects_bad_input() {
        assert_eq!(IChingBuilder::new("").build().unwrap_err(), IChingError::EmptyPayload);
        assert_eq!(
            IChingBuilder::new("HI").ec_fraction(1.2).build().unwrap_err(),
            IChingError::InvalidECLevel
        );
    }

    #[test]
    fn test_metadata() {
        let mut builder = IChingBuilder::new("HELLO");
        builder.ec_fraction(0.25).round_edges(true);
        assert_eq!(
            builder.metadata(),
            "{ Payload length: 5, Ec fraction: 0.25, Round edges: true, Inverted: false }"
        );
    }
}
