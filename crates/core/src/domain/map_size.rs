use super::DomainError;

/// Edge length of a generated map, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSize {
    Standard(u32),
    Custom { size: u32, output_size: Option<u32> },
}

impl MapSize {
    pub const STANDARD_SIZES: [u32; 4] = [2048, 4096, 8192, 16384];
    pub const MIN_CUSTOM: u32 = 256;
    pub const MAX_CUSTOM: u32 = 65536;

    pub fn standard(size: u32) -> Result<Self, DomainError> {
        if Self::STANDARD_SIZES.contains(&size) {
            Ok(Self::Standard(size))
        } else {
            Err(DomainError::InvalidSize(size))
        }
    }

    pub fn custom(size: u32, output_size: Option<u32>) -> Result<Self, DomainError> {
        if !Self::in_custom_range(size) {
            return Err(DomainError::InvalidSize(size));
        }
        if let Some(output) = output_size
            && !Self::in_custom_range(output)
        {
            return Err(DomainError::InvalidOutputSize(output));
        }
        Ok(Self::Custom { size, output_size })
    }

    /// Resolves the UI's size fields. The output size only applies to custom sizes
    /// and is dropped otherwise.
    pub fn from_ui(size: u32, custom: bool, output_size: Option<u32>) -> Result<Self, DomainError> {
        if custom {
            Self::custom(size, output_size)
        } else {
            Self::standard(size)
        }
    }

    pub fn size(self) -> u32 {
        match self {
            Self::Standard(size) | Self::Custom { size, .. } => size,
        }
    }

    pub fn output_size(self) -> Option<u32> {
        match self {
            Self::Standard(_) => None,
            Self::Custom { output_size, .. } => output_size,
        }
    }

    fn in_custom_range(value: u32) -> bool {
        (Self::MIN_CUSTOM..=Self::MAX_CUSTOM).contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::MapSize;
    use crate::DomainError;

    #[test]
    fn standard_size_drops_output_size() {
        let size = MapSize::from_ui(4096, false, Some(2048)).expect("standard size");

        assert_eq!(size, MapSize::Standard(4096));
        assert_eq!(size.output_size(), None);
    }

    #[test]
    fn non_standard_size_requires_custom_flag() {
        assert_eq!(
            MapSize::from_ui(3000, false, None),
            Err(DomainError::InvalidSize(3000))
        );
        assert!(MapSize::from_ui(3000, true, None).is_ok());
    }

    #[test]
    fn custom_output_size_is_range_checked() {
        let size = MapSize::from_ui(3000, true, Some(2048)).expect("custom size");
        assert_eq!(size.output_size(), Some(2048));

        assert_eq!(
            MapSize::from_ui(3000, true, Some(100)),
            Err(DomainError::InvalidOutputSize(100))
        );
        assert_eq!(
            MapSize::from_ui(70_000, true, None),
            Err(DomainError::InvalidSize(70_000))
        );
    }
}
