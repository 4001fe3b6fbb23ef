use crate::error::Result;

/// Structural checks run on loader input before any GPU resource is
/// created for it. Implementations report the first problem found.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
