pub type RinglensResult<T> = Result<T, RinglensError>;

#[derive(thiserror::Error, Debug)]
pub enum RinglensError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RinglensError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RinglensError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            RinglensError::raster("x")
                .to_string()
                .contains("raster error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RinglensError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
