use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 60fps-equivalent budget for one physics tick. Advisory only.
pub const DEFAULT_BUDGET: Duration = Duration::from_micros(16_670);
pub const DEFAULT_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Physics,
    Render,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physics => "physics",
            Self::Render => "render",
        }
    }
}

#[derive(Debug, Default)]
struct StageStats {
    samples: VecDeque<Duration>,
    overruns: u64,
    total: u64,
}

impl StageStats {
    fn record(&mut self, d: Duration, window: usize) {
        if self.samples.len() == window {
            self.samples.pop_front();
        }
        self.samples.push_back(d);
        self.total += 1;
    }

    fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        self.samples.iter().sum::<Duration>() / self.samples.len() as u32
    }

    fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or(Duration::ZERO)
    }
}

/// Observes stage timings; never feeds back into the engine.
#[derive(Debug)]
pub struct PerfMonitor {
    budget: Duration,
    window: usize,
    physics: StageStats,
    render: StageStats,
    frames: VecDeque<Instant>,
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET, DEFAULT_WINDOW)
    }
}

impl PerfMonitor {
    pub fn new(budget: Duration, window: usize) -> Self {
        Self {
            budget,
            window: window.max(1),
            physics: StageStats::default(),
            render: StageStats::default(),
            frames: VecDeque::new(),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    fn stats(&self, stage: Stage) -> &StageStats {
        match stage {
            Stage::Physics => &self.physics,
            Stage::Render => &self.render,
        }
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let window = self.window;
        let budget = self.budget;
        let stats = match stage {
            Stage::Physics => &mut self.physics,
            Stage::Render => &mut self.render,
        };
        stats.record(elapsed, window);
        if stage == Stage::Physics && elapsed > budget {
            stats.overruns += 1;
            tracing::warn!(
                stage = stage.as_str(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "tick exceeded time budget"
            );
        }
    }

    /// Runs `f`, records its duration under `stage`, and returns its result.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(stage, start.elapsed());
        out
    }

    /// Marks a presented frame for the frame-rate estimate.
    pub fn mark_frame(&mut self, now: Instant) {
        if self.frames.len() == self.window + 1 {
            self.frames.pop_front();
        }
        self.frames.push_back(now);
    }

    pub fn average(&self, stage: Stage) -> Duration {
        self.stats(stage).average()
    }

    pub fn max(&self, stage: Stage) -> Duration {
        self.stats(stage).max()
    }

    pub fn overruns(&self, stage: Stage) -> u64 {
        self.stats(stage).overruns
    }

    pub fn samples(&self, stage: Stage) -> u64 {
        self.stats(stage).total
    }

    pub fn fps(&self) -> f32 {
        let (Some(first), Some(last)) = (self.frames.front(), self.frames.back()) else {
            return 0.0;
        };
        let span = last.saturating_duration_since(*first).as_secs_f32();
        if span <= 0.0 {
            return 0.0;
        }
        (self.frames.len() - 1) as f32 / span
    }
}
