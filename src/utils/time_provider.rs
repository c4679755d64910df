use chrono::{DateTime, Duration, Utc};

///
/// An overridable clock - tests fix it and then travel through time with advance.
///
#[derive(Debug, Default)]
pub struct TimeProvider {
    fixed: Option<DateTime<Utc>>
}

impl TimeProvider {
    pub fn now(&self) -> DateTime<Utc> {
        match self.fixed {
            Some(fixed) => fixed,
            None => Utc::now()
        }
    }

    pub fn fix(&mut self, fixed: Option<DateTime<Utc>>) {
        self.fixed = fixed;
    }

    ///
    /// Move a fixed clock forward. A clock that isn't fixed becomes fixed at now + by.
    ///
    pub fn advance(&mut self, by: Duration) {
        self.fixed = Some(self.now() + by);
    }
}
