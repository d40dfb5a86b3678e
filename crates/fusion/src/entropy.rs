/// Probability substituted for zero entries before taking the logarithm
pub const ZERO_PROBABILITY: f64 = 1e-9;

/// Shannon entropy in bits of a distribution given in percent.
///
/// Zero entries are replaced by [`ZERO_PROBABILITY`] so they contribute a
/// vanishing but finite term.
pub fn shannon_entropy<I>(percents: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    -percents
        .into_iter()
        .map(|percent| {
            let p = percent / 100.0;
            let p = if p == 0.0 { ZERO_PROBABILITY } else { p };
            p * p.log2()
        })
        .sum::<f64>()
}
