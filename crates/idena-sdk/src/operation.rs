//! Submitted transactions and confirmation polling

use idena_primitives::H256;
use std::sync::{Arc, Weak};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::client::RpcClient;
use crate::config::PollConfig;
use crate::types::TransactionRecord;
use crate::SdkError;

/// A transaction accepted by the node and not yet known to be mined
///
/// Holds only a weak handle on the client; polling stops when the client is
/// gone or when the future returned by [`Operation::confirmation`] is dropped.
#[derive(Debug, Clone)]
pub struct Operation {
    hash: H256,
    client: Weak<RpcClient>,
    poll: PollConfig,
}

impl Operation {
    pub(crate) fn new(hash: H256, client: &Arc<RpcClient>, poll: PollConfig) -> Self {
        Self {
            hash,
            client: Arc::downgrade(client),
            poll,
        }
    }

    /// Transaction hash
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// Polling configuration used by [`Operation::confirmation`]
    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Same operation with another polling configuration
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Wait until the transaction is mined
    ///
    /// Resolves with the mined record the first time the node reports a
    /// positive `usedFee`, or fails with [`SdkError::ConfirmationTimeout`]
    /// after `max_attempts` polls.
    pub async fn confirmation(&self) -> Result<TransactionRecord, SdkError> {
        ConfirmationPoller::new(self.hash, self.poll)
            .run(&self.client)
            .await
    }
}

/// Poller state
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Not mined yet after `attempts` polls
    Pending {
        /// Polls made so far
        attempts: u32,
    },
    /// Mined
    Confirmed(TransactionRecord),
    /// Attempt budget spent
    TimedOut {
        /// Polls made
        attempts: u32,
    },
}

impl PollState {
    /// Whether polling is over
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending { .. })
    }
}

/// `Pending -> {Confirmed, TimedOut}` state machine for one hash
#[derive(Debug, Clone)]
pub struct ConfirmationPoller {
    hash: H256,
    config: PollConfig,
    state: PollState,
}

impl ConfirmationPoller {
    /// Poller for `hash`
    pub fn new(hash: H256, config: PollConfig) -> Self {
        Self {
            hash,
            config,
            state: PollState::Pending { attempts: 0 },
        }
    }

    /// Current state
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Apply the outcome of one poll
    ///
    /// A failed lookup counts as a poll that found nothing. Terminal states
    /// never change.
    pub fn record(&mut self, outcome: Result<TransactionRecord, SdkError>) -> &PollState {
        let attempts = match self.state {
            PollState::Pending { attempts } => attempts + 1,
            _ => return &self.state,
        };

        self.state = match outcome {
            Ok(record) if record.is_mined() => PollState::Confirmed(record),
            Ok(_) if attempts >= self.config.max_attempts => PollState::TimedOut { attempts },
            Ok(_) => PollState::Pending { attempts },
            Err(err) => {
                tracing::warn!(hash = %self.hash, attempt = attempts, error = %err, "confirmation poll failed");
                if attempts >= self.config.max_attempts {
                    PollState::TimedOut { attempts }
                } else {
                    PollState::Pending { attempts }
                }
            }
        };
        &self.state
    }

    /// Poll every interval until a terminal state, waiting one interval first
    ///
    /// A zero interval or a zero attempt budget is [`SdkError::InvalidArgument`].
    pub async fn run(mut self, client: &Weak<RpcClient>) -> Result<TransactionRecord, SdkError> {
        let hash = self.hash;
        let period = self.config.interval();
        if period.is_zero() {
            return Err(SdkError::InvalidArgument(
                "poll interval must be at least 1 ms".to_string(),
            ));
        }
        if self.config.max_attempts == 0 {
            return Err(SdkError::InvalidArgument(
                "poll attempts must be positive".to_string(),
            ));
        }
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let client = client
                .upgrade()
                .ok_or_else(|| SdkError::NetworkUnavailable("client dropped".to_string()))?;
            let outcome = client.get_transaction_by_hash(&hash).await;

            match self.record(outcome) {
                PollState::Pending { attempts } => {
                    tracing::debug!(hash = %hash, attempt = *attempts, "transaction pending");
                }
                PollState::Confirmed(record) => {
                    tracing::info!(hash = %hash, used_fee = ?record.used_fee, "transaction confirmed");
                    return Ok(record.clone());
                }
                PollState::TimedOut { attempts } => {
                    tracing::warn!(hash = %hash, attempts = *attempts, "confirmation timed out");
                    return Err(SdkError::ConfirmationTimeout {
                        hash,
                        attempts: *attempts,
                    });
                }
            }
        }
    }
}
