use tokio::time::{sleep, Duration};

use crate::config::{MAX_ATTEMPTS, POLL_TIMEOUT, PRE_READ_DELAY, RESPONSE_GRACE, RETRY_BACKOFF, WRITE_TIMEOUT};

/// Bounded retry for writes: how many attempts and how long to wait between them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy{
    attempts: u32,
    backoff: Duration,
    write_timeout: Duration,
}

impl RetryPolicy{
    /// Never less than one attempt
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts
    }
    pub fn backoff_time(&self) -> Duration {
        self.backoff
    }
    pub fn write_timeout_time(&self) -> Duration {
        self.write_timeout
    }

    /// Sleeps the backoff unless `attempt` was the last one
    pub async fn pause_after(&self, attempt: u32){
        if attempt < self.attempts{
            sleep(self.backoff).await;
        }
    }
}

impl Default for RetryPolicy{
    fn default() -> Self {
        Self{
            attempts: MAX_ATTEMPTS,
            backoff: RETRY_BACKOFF,
            write_timeout: WRITE_TIMEOUT,
        }
    }
}

/// The waits around reading a reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTiming{
    /// Slept after a successful send before the reply is read
    pub grace: Duration,
    /// Slept right before the read
    pub pre_read: Duration,
    /// Upper bound on the read itself
    pub poll: Duration,
}

impl Default for ReadTiming{
    fn default() -> Self {
        Self{
            grace: RESPONSE_GRACE,
            pre_read: PRE_READ_DELAY,
            poll: POLL_TIMEOUT,
        }
    }
}
