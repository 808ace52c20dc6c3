/// A market clock that walks the (day, hour) grid of a run.
///
/// Days are 1-based and hours are 0-based, matching the stamps the
/// scheduler expects.
///
/// # Examples
///
/// ```
/// use iso_sim::market::clock::MarketClock;
///
/// let mut clock = MarketClock::new(2, 2);
/// let mut stamps = Vec::new();
///
/// clock.run(|day, hour| stamps.push((day, hour)));
/// assert_eq!(stamps, vec![(1, 0), (1, 1), (2, 0), (2, 1)]);
/// ```
#[derive(Debug, Clone)]
pub struct MarketClock {
    /// Next step index, counted from (1, 0)
    current: usize,
    days: usize,
    hours_per_day: usize,
}

impl MarketClock {
    /// Creates a clock covering `days` days of `hours_per_day` hours.
    pub fn new(days: usize, hours_per_day: usize) -> Self {
        Self {
            current: 0,
            days,
            hours_per_day,
        }
    }

    fn total(&self) -> usize {
        self.days * self.hours_per_day
    }

    /// Returns the next (day, hour) without advancing.
    pub fn peek(&self) -> Option<(usize, usize)> {
        (self.current < self.total()).then(|| {
            (
                self.current / self.hours_per_day + 1,
                self.current % self.hours_per_day,
            )
        })
    }

    /// Advances the clock by one hour.
    ///
    /// # Returns
    ///
    /// * `Some((day, hour))` - The stamp before advancing
    /// * `None` - If the clock has passed the last hour of the last day
    pub fn tick(&mut self) -> Option<(usize, usize)> {
        let stamp = self.peek()?;
        self.current += 1;
        Some(stamp)
    }

    /// Runs a function for each remaining (day, hour).
    pub fn run(&mut self, mut f: impl FnMut(usize, usize)) {
        while let Some((day, hour)) = self.tick() {
            f(day, hour);
        }
    }

    /// Whether `(day, hour)` is the final stamp of the run.
    pub fn is_last(&self, day: usize, hour: usize) -> bool {
        day == self.days && hour + 1 == self.hours_per_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_rolls_days() {
        let mut clock = MarketClock::new(2, 3);
        let stamps: Vec<_> = std::iter::from_fn(|| clock.tick()).collect();
        assert_eq!(
            stamps,
            vec![(1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut clock = MarketClock::new(1, 2);
        assert_eq!(clock.peek(), Some((1, 0)));
        assert_eq!(clock.peek(), Some((1, 0)));
        clock.tick();
        assert_eq!(clock.peek(), Some((1, 1)));
    }

    #[test]
    fn last_stamp() {
        let clock = MarketClock::new(4, 24);
        assert!(clock.is_last(4, 23));
        assert!(!clock.is_last(3, 23));
        assert!(!clock.is_last(4, 22));
    }

    #[test]
    fn empty_clock() {
        let mut clock = MarketClock::new(0, 24);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_, _| was_called = true);
        assert!(!was_called);
    }
}
