//! Core shared errors (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Viewport {width}x{height} has no area")]
    DegenerateViewport { width: u32, height: u32 },
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Width over height, rejecting zero-sized (e.g. minimised) viewports.
pub fn aspect_ratio(width: u32, height: u32) -> CoreResult<f32> {
    if width == 0 || height == 0 {
        return Err(CoreError::DegenerateViewport { width, height });
    }
    Ok(width as f32 / height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_default_window() {
        let a = aspect_ratio(1280, 720).unwrap();
        assert!((a - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            aspect_ratio(800, 0),
            Err(CoreError::DegenerateViewport {
                width: 800,
                height: 0
            })
        );
        assert!(aspect_ratio(0, 600).is_err());
    }
}
