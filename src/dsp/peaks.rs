use std::collections::VecDeque;

/// Windows for envelope peak-picking, all in samples.
///
/// A sample `n` is a peak when:
///   1. `x[n] == max(x[n - pre_max .. n + post_max])`
///   2. `x[n] >= mean(x[n - pre_avg .. n + post_avg]) + delta`
///   3. `n > last_peak + wait`
///
/// Windows are half-open and clipped at the signal edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPickConfig {
    pub pre_max: usize,
    pub post_max: usize,
    pub pre_avg: usize,
    pub post_avg: usize,
    pub delta: f32,
    pub wait: usize,
}

impl PeakPickConfig {
    /// Same look-around for every window, e.g. a quarter second of samples.
    pub fn symmetric(window: usize, delta: f32) -> Self {
        Self {
            pre_max: window,
            post_max: window,
            pre_avg: window,
            post_avg: window,
            delta,
            wait: window,
        }
    }
}

/// Indices of accepted peaks, in ascending order.
///
/// Zero-valued samples are never peaks. Runs in O(n) regardless of window
/// size: the moving maximum uses a monotonic deque and the moving average a
/// prefix sum, so quarter-second windows at audio rates stay cheap.
pub fn pick_peaks(x: &[f32], config: &PeakPickConfig) -> Vec<usize> {
    if x.is_empty() {
        return Vec::new();
    }

    let maxima = moving_max(x, config.pre_max, config.post_max);
    let averages = moving_average(x, config.pre_avg, config.post_avg);

    let mut peaks = Vec::new();
    let mut last: Option<usize> = None;

    for (n, &value) in x.iter().enumerate() {
        if value == 0.0 || value != maxima[n] {
            continue;
        }
        if (value as f64) < averages[n] + config.delta as f64 {
            continue;
        }
        // Refractory gap since the last accepted peak
        if let Some(prev) = last {
            if n <= prev + config.wait {
                continue;
            }
        }
        peaks.push(n);
        last = Some(n);
    }

    peaks
}

/// Maximum of `x[n - pre .. n + post]` for every `n` (clipped to the signal;
/// the window always contains `n` itself).
fn moving_max(x: &[f32], pre: usize, post: usize) -> Vec<f32> {
    let len = x.len();
    let mut out = Vec::with_capacity(len);
    // Indices whose values are decreasing from front to back
    let mut deque: VecDeque<usize> = VecDeque::new();
    let mut next = 0;

    for n in 0..len {
        let hi = (n + post.max(1)).min(len);
        while next < hi {
            while deque.back().is_some_and(|&b| x[b] <= x[next]) {
                deque.pop_back();
            }
            deque.push_back(next);
            next += 1;
        }
        let lo = n.saturating_sub(pre);
        while deque.front().is_some_and(|&f| f < lo) {
            deque.pop_front();
        }
        out.push(deque.front().map_or(x[n], |&f| x[f]));
    }

    out
}

/// Mean of `x[n - pre .. n + post]` for every `n` (clipped to the signal;
/// the window always contains `n` itself).
fn moving_average(x: &[f32], pre: usize, post: usize) -> Vec<f64> {
    let len = x.len();
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0_f64);
    for &v in x {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v as f64);
    }

    (0..len)
        .map(|n| {
            let lo = n.saturating_sub(pre);
            let hi = (n + post.max(1)).min(len);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}
