use buddhabrot4d_core::ChannelThresholds;

/// The three colour channels of the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    fn slot(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Per-pixel visit counts for the three channels, plus their running
/// maxima.
///
/// Grids are row-major (`row * width + col`) and owned by the scan between
/// two resets; counts only grow in between.
#[derive(Debug, Clone)]
pub struct Accumulator {
    pub width: u32,
    pub height: u32,
    grids: [Vec<u32>; 3],
    max: [u32; 3],
}

impl Accumulator {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            grids: [vec![0; size], vec![0; size], vec![0; size]],
            max: [0; 3],
        }
    }

    pub fn reset(&mut self) {
        for grid in &mut self.grids {
            grid.fill(0);
        }
        self.max = [0; 3];
    }

    /// Record one trajectory sample at `index` for an orbit that escaped
    /// after `n` steps. Each channel whose threshold exceeds `n` counts it.
    #[inline]
    pub fn deposit(&mut self, index: usize, n: u32, thresholds: &ChannelThresholds) {
        let limits = [thresholds.red, thresholds.green, thresholds.blue];
        for slot in 0..3 {
            if n < limits[slot] {
                let cell = &mut self.grids[slot][index];
                *cell = cell.saturating_add(1);
                self.max[slot] = self.max[slot].max(*cell);
            }
        }
    }

    pub fn channel(&self, channel: Channel) -> &[u32] {
        &self.grids[channel.slot()]
    }

    /// Largest count seen in `channel` since the last reset.
    pub fn max(&self, channel: Channel) -> u32 {
        self.max[channel.slot()]
    }

    /// `[red, green, blue]` at one pixel.
    pub fn counts(&self, index: usize) -> [u32; 3] {
        [self.grids[0][index], self.grids[1][index], self.grids[2][index]]
    }

    pub fn pixel_count(&self) -> usize {
        self.grids[0].len()
    }

    pub fn total(&self, channel: Channel) -> u64 {
        self.channel(channel).iter().map(|&c| c as u64).sum()
    }
}
