/// Rate limiter for repeated per-frame diagnostics.
///
/// The first occurrence of a streak is reported, then every `every`-th
/// consecutive occurrence. `clear` ends the streak and returns its length so
/// the caller can log a recovery message.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    every: u32,
    streak: u32,
}

impl LogThrottle {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            streak: 0,
        }
    }

    /// Records one occurrence. Returns the current streak length when it
    /// should be logged.
    pub fn hit(&mut self) -> Option<u32> {
        self.streak = self.streak.saturating_add(1);
        let due = self.streak == 1 || (self.streak - 1) % self.every == 0;
        due.then_some(self.streak)
    }

    /// Ends the streak. Returns its length if there was one.
    pub fn clear(&mut self) -> Option<u32> {
        let streak = std::mem::take(&mut self.streak);
        (streak > 0).then_some(streak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_first_then_every_nth() {
        let mut t = LogThrottle::new(3);
        let logged: Vec<u32> = (0..8).filter_map(|_| t.hit()).collect();
        assert_eq!(logged, vec![1, 4, 7]);
        assert_eq!(t.clear(), Some(8));
    }

    #[test]
    fn clear_reports_streak_once() {
        let mut t = LogThrottle::new(10);
        assert_eq!(t.clear(), None);
        t.hit();
        t.hit();
        assert_eq!(t.clear(), Some(2));
        assert_eq!(t.clear(), None);
        assert_eq!(t.hit(), Some(1));
    }

    #[test]
    fn zero_interval_logs_everything() {
        let mut t = LogThrottle::new(0);
        assert!((0..5).all(|_| t.hit().is_some()));
    }
}
