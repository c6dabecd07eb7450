use vd_core::{BorderMode, pad_line};

/// Convolves `signal` with a `2*radius+1` tap kernel.
///
/// `out[i] = sum_k signal[i + radius - k] * kernel[k]`, with out-of-range
/// samples resolved by `border`. `scratch` holds the padded signal and can be
/// reused across calls.
pub fn convolve_f32(
    signal: &[f32],
    kernel: &[f32],
    radius: usize,
    border: &BorderMode<f32>,
    scratch: &mut Vec<f32>,
    out: &mut [f32],
) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");
    assert_eq!(
        kernel.len(),
        2 * radius + 1,
        "kernel len must be 2*radius+1"
    );

    if signal.is_empty() {
        return;
    }
    if radius == 0 {
        let k = kernel[0];
        for (o, &s) in out.iter_mut().zip(signal) {
            *o = s * k;
        }
        return;
    }

    pad_line(signal, radius, border, scratch);
    let klen = kernel.len();
    for (i, out_i) in out.iter_mut().enumerate() {
        // padded[i + j] is signal[i - radius + j]; pair it with kernel[klen - 1 - j].
        let window = &scratch[i..i + klen];
        *out_i = window
            .iter()
            .zip(kernel.iter().rev())
            .map(|(&s, &k)| s * k)
            .sum();
    }
}

/// Running-window sum over `2*radius+1` samples, accumulated in `f64`.
///
/// Used for separable box statistics where the window is large and the
/// kernel is flat.
pub fn box_sum_f64(
    signal: &[f64],
    radius: usize,
    border: &BorderMode<f64>,
    scratch: &mut Vec<f64>,
    out: &mut [f64],
) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");
    if signal.is_empty() {
        return;
    }
    if radius == 0 {
        out.copy_from_slice(signal);
        return;
    }

    pad_line(signal, radius, border, scratch);
    let w = 2 * radius + 1;
    let mut acc: f64 = scratch[..w].iter().sum();
    out[0] = acc;
    for i in 1..signal.len() {
        acc += scratch[i + w - 1] - scratch[i - 1];
        out[i] = acc;
    }
}
