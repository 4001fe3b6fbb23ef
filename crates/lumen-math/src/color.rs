/// Scale 0–255 channel values to the 0–1 range shaders expect.
pub fn normalize_color<const N: usize>(color: [f32; N]) -> [f32; N] {
    color.map(|c| c / 255.0)
}

/// Inverse of [`normalize_color`], for presenting colors in a picker.
pub fn denormalize_color<const N: usize>(color: [f32; N]) -> [f32; N] {
    color.map(|c| c * 255.0)
}
