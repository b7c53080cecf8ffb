//! Magnitude spectrum of a fixed-size block via radix-2 FFT.

use std::f64::consts::PI;

/// Reusable FFT state for blocks of one power-of-two size.
pub(crate) struct Spectrum {
    window: Vec<f64>,
    twiddles: Vec<(f64, f64)>,
    re: Vec<f64>,
    im: Vec<f64>,
}

impl Spectrum {
    /// `size` must be a power of two.
    pub(crate) fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        let window = (0..size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
            .collect();
        let twiddles = (0..size / 2)
            .map(|k| {
                let angle = -2.0 * PI * k as f64 / size as f64;
                (angle.cos(), angle.sin())
            })
            .collect();
        Self {
            window,
            twiddles,
            re: vec![0.0; size],
            im: vec![0.0; size],
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.window.len()
    }

    /// Index of the strongest non-DC bin below Nyquist, or `None` for silence.
    ///
    /// `block` shorter than the transform size is zero padded.
    pub(crate) fn dominant_bin(&mut self, block: &[f64]) -> Option<usize> {
        let n = self.size();
        for i in 0..n {
            self.re[i] = block.get(i).copied().unwrap_or(0.0) * self.window[i];
            self.im[i] = 0.0;
        }
        self.transform();

        let mut best = None;
        let mut best_power = 0.0;
        for k in 1..n / 2 {
            let power = self.re[k] * self.re[k] + self.im[k] * self.im[k];
            if power > best_power {
                best_power = power;
                best = Some(k);
            }
        }
        best
    }

    fn transform(&mut self) {
        let n = self.size();
        if n <= 1 {
            return;
        }

        let bits = n.trailing_zeros();
        for i in 0..n {
            let j = i.reverse_bits() >> (usize::BITS - bits);
            if i < j {
                self.re.swap(i, j);
                self.im.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for k in 0..half {
                    let (wr, wi) = self.twiddles[k * stride];
                    let a = start + k;
                    let b = a + half;
                    let tr = wr * self.re[b] - wi * self.im[b];
                    let ti = wr * self.im[b] + wi * self.re[b];
                    self.re[b] = self.re[a] - tr;
                    self.im[b] = self.im[a] - ti;
                    self.re[a] += tr;
                    self.im[a] += ti;
                }
            }
            len *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_dominant_bin_of_tone() {
        let mut spectrum = Spectrum::new(1024);
        // bin 64 at 1024 points and 16 kHz is exactly 1000 Hz
        let block = tone(1000.0, 16000.0, 1024);
        assert_eq!(spectrum.dominant_bin(&block), Some(64));

        let block = tone(250.0, 16000.0, 1024);
        assert_eq!(spectrum.dominant_bin(&block), Some(16));
    }

    #[test]
    fn test_silence_has_no_dominant_bin() {
        let mut spectrum = Spectrum::new(256);
        assert_eq!(spectrum.dominant_bin(&[0.0; 256]), None);
    }

    #[test]
    fn test_reuse_between_blocks() {
        let mut spectrum = Spectrum::new(512);
        let high = tone(4000.0, 16000.0, 512);
        let low = tone(500.0, 16000.0, 512);
        assert_eq!(spectrum.dominant_bin(&high), Some(128));
        assert_eq!(spectrum.dominant_bin(&low), Some(16));
        assert_eq!(spectrum.dominant_bin(&high), Some(128));
    }
}
