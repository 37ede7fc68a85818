//! Logging setup
//!
//! The library only emits `tracing` events; nothing is printed unless a
//! subscriber is installed. Test suites call [`init`] (or [`try_init`] when
//! several tests race to do it) to see request dispatch and element
//! matching as it happens.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("info,webprobe=debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Install the global subscriber
///
/// Pretty output in debug builds, JSON in release builds. `RUST_LOG`
/// overrides the default filter.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use webprobe::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("suite started");
/// # Ok(())
/// # }
/// ```
pub fn init() -> anyhow::Result<()> {
    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().pretty().with_test_writer())
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    }

    Ok(())
}

/// Like [`init`], but a no-op when a subscriber is already installed
///
/// Returns whether this call installed it.
#[must_use]
pub fn try_init() -> bool {
    init().is_ok()
}
