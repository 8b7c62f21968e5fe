//! Tracing setup for hosts embedding Lattice.
//!
//! The Lattice crates only emit `tracing` events: space creation and
//! teardown, behavior registration and import, instance construction, and
//! lenient-mode recoveries (undeclared generated fields, mistyped property
//! writes). Installing a subscriber is left to the host. [`TracingSetup`] is
//! a ready-made one.
//!
//! # Example
//!
//! ```
//! use lattice_diagnostics::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! // Development: compact output, everything Lattice does at debug level.
//! let dev = TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("lattice_space=debug,lattice_behavior=debug");
//!
//! // Production: JSON output for log aggregation.
//! let prod = TracingSetup::new()
//!     .with_level(Level::WARN)
//!     .with_format(TracingFormat::Json);
//! # let _ = (dev, prod);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter directives that show every Lattice event down to `trace`.
pub const LATTICE_TRACE_FILTER: &str = "lattice_space=trace,lattice_behavior=trace";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    /// The env filter directives did not parse.
    #[error("invalid filter directives `{directives}`: {reason}")]
    InvalidFilter {
        /// The rejected directives.
        directives: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already set.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for the global `tracing` subscriber.
///
/// Uses a [`tracing_subscriber::registry`] with an [`EnvFilter`] and a `fmt`
/// layer in the chosen [`TracingFormat`].
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Maximum level, used when no env filter is given.
    level: Level,
    format: TracingFormat,
    /// Directives such as `lattice_space=debug,my_app=info`.
    env_filter: Option<String>,
    /// Emit span enter/exit events.
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a setup with default settings: `INFO`, pretty, no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets filter directives, `target=level,target=level,...`.
    ///
    /// They take precedence over [`with_level`](Self::with_level).
    #[must_use]
    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.env_filter = Some(directives.into());
        self
    }

    /// Enables span enter/exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// The configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Builds the env filter this setup would install.
    ///
    /// # Errors
    ///
    /// [`DiagnosticsError::InvalidFilter`] if the directives do not parse.
    pub fn build_filter(&self) -> Result<EnvFilter, DiagnosticsError> {
        match &self.env_filter {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|err| DiagnosticsError::InvalidFilter {
                    directives: directives.clone(),
                    reason: err.to_string(),
                })
            }
            None => Ok(EnvFilter::new(self.level.as_str())),
        }
    }

    /// Installs the subscriber globally.
    ///
    /// # Errors
    ///
    /// - [`DiagnosticsError::InvalidFilter`] if the directives do not parse.
    /// - [`DiagnosticsError::AlreadyInstalled`] if a global subscriber exists.
    pub fn install(&self) -> Result<(), DiagnosticsError> {
        let filter = self.build_filter()?;
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(filter);
        let installed = match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        };
        installed.map_err(|_| DiagnosticsError::AlreadyInstalled)?;

        tracing::debug!(
            level = %self.level,
            format = ?self.format,
            "tracing subscriber installed"
        );
        Ok(())
    }

    /// Installs the subscriber, ignoring an already installed one.
    ///
    /// # Errors
    ///
    /// [`DiagnosticsError::InvalidFilter`] if the directives do not parse.
    pub fn install_or_keep(&self) -> Result<(), DiagnosticsError> {
        match self.install() {
            Err(DiagnosticsError::AlreadyInstalled) => Ok(()),
            other => other,
        }
    }
}
