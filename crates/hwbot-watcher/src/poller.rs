//! The poll loop: fetch, validate, interpret, notify, sleep, repeat.
//!
//! All mutable state lives in [`PollState`], owned by the [`Poller`]. One
//! cycle finishes before the next begins; the only suspension points are the
//! outbound HTTP calls and the fixed sleep between cycles.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn, Span};

use hwbot_telegram::TelegramBot;

use crate::api::{HomeworkSource, PracticumClient};
use crate::config::{Config, Credentials};
use crate::error::{Result, WatcherError};
use crate::notifier::{Notifier, TelegramNotifier};
use crate::response::{latest_homework, ApiResponse};
use crate::status::{failure_message, interpret};

// ============================================================================
// CyclePhase
// ============================================================================

/// Step of the poll cycle currently being executed.
///
/// A cycle moves `Fetching -> Validating -> Interpreting -> Notifying` and
/// then `Sleeping`; any failure short-circuits straight to `Sleeping`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePhase {
    /// Waiting for the homework API.
    #[default]
    Fetching,
    /// Checking the reply structure.
    Validating,
    /// Turning the newest homework into a message.
    Interpreting,
    /// Delivering the message.
    Notifying,
    /// Waiting for the next cycle.
    Sleeping,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "fetching"),
            Self::Validating => write!(f, "validating"),
            Self::Interpreting => write!(f, "interpreting"),
            Self::Notifying => write!(f, "notifying"),
            Self::Sleeping => write!(f, "sleeping"),
        }
    }
}

// ============================================================================
// PollState
// ============================================================================

/// Everything the loop remembers between cycles.
///
/// Held in memory only; a restart begins again from "now" with no history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    /// Lower bound (`from_date`) of the next query window.
    pub cursor: i64,

    /// Last notification that was delivered.
    pub last_message: Option<String>,

    /// Last failure alert that was delivered since the last good cycle.
    pub last_alert: Option<String>,

    /// Current phase.
    pub phase: CyclePhase,

    /// Number of cycles started so far.
    pub cycles: u64,
}

impl PollState {
    /// Creates a state whose window starts at `cursor`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_watcher::{CyclePhase, PollState};
    ///
    /// let state = PollState::new(1000);
    /// assert_eq!(state.cursor, 1000);
    /// assert_eq!(state.phase, CyclePhase::Fetching);
    /// assert!(state.last_message.is_none());
    /// ```
    #[must_use]
    pub const fn new(cursor: i64) -> Self {
        Self {
            cursor,
            last_message: None,
            last_alert: None,
            phase: CyclePhase::Fetching,
            cycles: 0,
        }
    }

    /// Creates a state whose window starts at the current time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(Utc::now().timestamp())
    }
}

// ============================================================================
// CycleOutcome
// ============================================================================

/// What a single cycle ended up doing.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A new status message was delivered.
    Notified {
        /// The delivered text.
        message: String,
    },
    /// The newest status equals the last delivered one; nothing was sent.
    Duplicate,
    /// The API reported no homework in the query window.
    NoHomeworks,
    /// A new message was built but the chat transport failed.
    ///
    /// The cursor is kept so the same change is picked up again next cycle.
    DeliveryFailed {
        /// The text that could not be delivered.
        message: String,
        /// Why delivery failed.
        error: WatcherError,
    },
    /// The cycle stopped early.
    Failed {
        /// Phase in which the failure happened.
        phase: CyclePhase,
        /// The failure itself.
        error: WatcherError,
        /// Whether a failure alert reached the chat.
        alerted: bool,
    },
}

impl CycleOutcome {
    /// Returns `true` if the cycle completed without any failure.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Notified { .. } | Self::Duplicate | Self::NoHomeworks
        )
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Drives the poll loop against a homework source and a notifier.
#[derive(Debug)]
pub struct Poller<S, N> {
    source: S,
    notifier: N,
    state: PollState,
    retry_period: Duration,
    suppress_repeated_alerts: bool,
}

impl<S, N> Poller<S, N>
where
    S: HomeworkSource,
    N: Notifier,
{
    /// Creates a poller whose cursor starts at the current time.
    #[must_use]
    pub fn new(source: S, notifier: N, config: &Config) -> Self {
        Self {
            source,
            notifier,
            state: PollState::starting_now(),
            retry_period: config.retry_period(),
            suppress_repeated_alerts: config.suppress_repeated_alerts,
        }
    }

    /// Replaces the initial state.
    #[must_use]
    pub fn with_state(mut self, state: PollState) -> Self {
        self.state = state;
        self
    }

    /// Returns the current loop state.
    #[must_use]
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// Returns the homework source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the notifier.
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns the pause between cycles.
    #[must_use]
    pub const fn retry_period(&self) -> Duration {
        self.retry_period
    }

    /// Runs forever.
    pub async fn run(&mut self) {
        self.run_until(std::future::pending()).await;
    }

    /// Runs cycles separated by the retry period until `shutdown` resolves.
    ///
    /// Shutdown interrupts both an in-flight cycle and the sleep.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            cursor = self.state.cursor,
            retry_period_secs = self.retry_period.as_secs(),
            "Poll loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                outcome = self.run_cycle() => {
                    debug!(success = outcome.is_success(), "Cycle finished");
                }
            }

            self.state.phase = CyclePhase::Sleeping;

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = sleep(self.retry_period) => {}
            }
        }

        info!(cycles = self.state.cycles, "Poll loop stopped");
    }

    /// Performs one fetch, validate, interpret, notify pass.
    ///
    /// Never fails: every error is logged, optionally alerted, and reported in
    /// the returned [`CycleOutcome`].
    #[instrument(skip_all, fields(cycle = tracing::field::Empty, cursor = self.state.cursor))]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.state.cycles += 1;
        Span::current().record("cycle", self.state.cycles);

        self.state.phase = CyclePhase::Fetching;
        let response = match self.source.fetch(self.state.cursor).await {
            Ok(response) => response,
            Err(error) => return self.fail(error).await,
        };

        self.state.phase = CyclePhase::Validating;
        let newest = match latest_homework(&response) {
            Ok(homework) => homework,
            Err(error) if error.is_no_homeworks() => {
                debug!("No homework updates in the query window");
                self.state.last_alert = None;
                return CycleOutcome::NoHomeworks;
            }
            Err(error) => return self.fail(error).await,
        };

        self.state.phase = CyclePhase::Interpreting;
        let message = match interpret(&newest) {
            Ok(message) => message,
            Err(error) => return self.fail(error).await,
        };

        if self.state.last_message.as_deref() == Some(message.as_str()) {
            debug!("Status unchanged, notification suppressed");
            self.complete(&response);
            return CycleOutcome::Duplicate;
        }

        self.state.phase = CyclePhase::Notifying;
        match self.notifier.notify(&message).await {
            Ok(()) => {
                info!(message = %message, "Status change delivered");
                self.state.last_message = Some(message.clone());
                self.complete(&response);
                CycleOutcome::Notified { message }
            }
            Err(error) => {
                error!(error = %error, "Status change not delivered, will retry next cycle");
                CycleOutcome::DeliveryFailed { message, error }
            }
        }
    }

    /// Finishes a good cycle: moves the cursor and forgets the last alert.
    fn complete(&mut self, response: &ApiResponse) {
        self.state.last_alert = None;
        match response.current_date() {
            Some(current_date) => {
                debug!(from = self.state.cursor, to = current_date, "Cursor advanced");
                self.state.cursor = current_date;
            }
            None => warn!("Response has no integer 'current_date', cursor kept"),
        }
    }

    /// Logs a failed cycle and raises an alert for the kinds that warrant one.
    async fn fail(&mut self, error: WatcherError) -> CycleOutcome {
        let phase = self.state.phase;
        if error.is_fetch_failure() {
            warn!(phase = %phase, error = %error, "Homework API unavailable, cycle skipped");
        } else {
            error!(phase = %phase, error = %error, "Cycle failed");
        }

        let alerted = if error.should_alert() {
            self.send_alert(&error).await
        } else {
            false
        };

        CycleOutcome::Failed {
            phase,
            error,
            alerted,
        }
    }

    /// Best-effort failure alert. Returns `true` if the chat received it.
    async fn send_alert(&mut self, error: &WatcherError) -> bool {
        let alert = failure_message(error);

        if self.suppress_repeated_alerts && self.state.last_alert.as_deref() == Some(alert.as_str())
        {
            debug!("Same alert already delivered, not repeating it");
            return false;
        }

        match self.notifier.notify(&alert).await {
            Ok(()) => {
                self.state.last_alert = Some(alert);
                true
            }
            Err(notify_error) => {
                error!(error = %notify_error, "Failure alert not delivered");
                false
            }
        }
    }
}

impl Poller<PracticumClient, TelegramNotifier> {
    /// Builds the production poller: homework API client plus Telegram bot.
    ///
    /// # Errors
    ///
    /// Returns `WatcherError::ConfigValidationError` if a token cannot be
    /// used in a request.
    pub fn connect(config: &Config, credentials: &Credentials) -> Result<Self> {
        let source = PracticumClient::new(
            &credentials.practicum_token,
            config.endpoint.clone(),
            config.request_timeout(),
        )?;

        let bot = TelegramBot::with_options(
            credentials.telegram_token.clone(),
            config.telegram_api_url.clone(),
            config.request_timeout(),
        )
        .map_err(|e| {
            WatcherError::config_validation(
                format!("TELEGRAM_TOKEN cannot be used: {e}"),
                "Copy the token exactly as issued by @BotFather",
            )
        })?;
        let notifier = TelegramNotifier::new(bot, credentials.telegram_chat_id.clone());

        Ok(Self::new(source, notifier, config))
    }
}
