use crate::value_objects::bar::Bar;

/// Pull seam between the engine and whoever produced the price series. The
/// engine drains the source once, before the simulation loop starts.
pub trait MarketDataSource {
    fn next_bar(&mut self) -> Option<Bar>;
}

/// In-memory source over an already-loaded series.
pub struct VecBarSource {
    bars: Vec<Bar>,
    index: usize,
}

impl VecBarSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl MarketDataSource for VecBarSource {
    fn next_bar(&mut self) -> Option<Bar> {
        if self.index >= self.bars.len() {
            return None;
        }
        let bar = self.bars[self.index].clone();
        self.index += 1;
        Some(bar)
    }
}
