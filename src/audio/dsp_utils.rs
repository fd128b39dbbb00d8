// Utilitaires DSP - Hygiène audio
//
// Petites fonctions partagées par le callback temps-réel et le rendu offline.

/// Flush denormals to zero (anti-dénormaux)
///
/// Seuil: 1e-15 (largement sous le bruit numérique à 32-bit float)
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Hard clipping: clamp strict dans [-1, 1]
///
/// The same clamp the WAV encoder applies, so live output and exported
/// files saturate identically.
#[inline]
pub fn hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// Peak absolute value of a block (0.0 for an empty block)
#[inline]
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}
