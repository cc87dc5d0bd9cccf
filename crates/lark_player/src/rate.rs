//! 播放速率
//!
//! 对交错采样做线性插值重采样。速率改变音高，与磁带变速一致。

/// 允许的速率范围
pub const MIN_PLAYBACK_RATE: f32 = 0.25;
pub const MAX_PLAYBACK_RATE: f32 = 4.0;

/// 线性插值速率适配器
#[derive(Debug, Clone)]
pub struct RateAdapter {
    channels: usize,
    rate: f64,
    /// 下一个输出帧相对于 `last` 的小数位置
    phase: f64,
    /// 上一块的最后一帧，跨块插值用
    last: Option<Vec<f32>>,
}

impl RateAdapter {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: channels.max(1),
            rate: 1.0,
            phase: 0.0,
            last: None,
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        if (rate - self.rate).abs() > f64::EPSILON {
            self.rate = rate;
            self.reset();
        }
    }

    /// 丢弃跨块状态（seek 之后调用）
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.last = None;
    }

    /// 处理一块交错采样
    pub fn process(&mut self, input: Vec<f32>) -> Vec<f32> {
        if (self.rate - 1.0).abs() <= f64::EPSILON {
            return input;
        }

        let ch = self.channels;
        let in_frames = input.len() / ch;
        if in_frames == 0 {
            return Vec::new();
        }

        // 帧序列 = [last] + input
        let offset = usize::from(self.last.is_some());
        let total = in_frames + offset;
        let last = self.last.as_deref();
        let frame = |idx: usize| frame_at(last, &input, ch, idx);

        let mut out = Vec::with_capacity((in_frames as f64 / self.rate) as usize * ch + ch);
        let mut pos = self.phase;
        while pos + 1.0 < total as f64 {
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = frame(idx);
            let b = frame(idx + 1);
            for c in 0..ch {
                out.push(a[c] + (b[c] - a[c]) * frac);
            }
            pos += self.rate;
        }

        self.phase = pos - (total - 1) as f64;
        self.last = Some(input[(in_frames - 1) * ch..in_frames * ch].to_vec());
        out
    }
}

fn frame_at<'a>(last: Option<&'a [f32]>, input: &'a [f32], ch: usize, idx: usize) -> &'a [f32] {
    match (last, idx) {
        (Some(last), 0) => last,
        (Some(_), i) => &input[(i - 1) * ch..i * ch],
        (None, i) => &input[i * ch..(i + 1) * ch],
    }
}
