/*!

Logging with a global verbosity threshold.

Individual log entries are logged "at" a given threshold and are only emitted if that threshold is _at most_ the
global threshold. A message with threshold 0 is always emitted. The macros `critical!`, `error!`, `warning!`,
`info!`, `debug!`, and `trace!` take an optional leading threshold argument:

```ignore
warning!("derived a certain constraint");     // threshold 0, always emitted
debug!(2, "component {} of {}", idx, count);  // emitted iff global threshold >= 2
```

The backing implementation is the `tracing` crate; that is an implementation detail encapsulated here.

*/
mod formatter;
mod macros;
mod threshold_filter;

use std::sync::{
  atomic::{AtomicU8, Ordering},
  LazyLock,
};

use tracing_subscriber::{fmt, layer::SubscriberExt, Registry};

use formatter::FieldFormatter;
use threshold_filter::ThresholdFilterLayer;
pub use macros::*;

/// Used for implicit initialization.
static INIT_LOGGER: LazyLock<()> = LazyLock::new(|| {
  let subscriber = Registry::default()
      .with(ThresholdFilterLayer)
      .with(
        fmt::layer()
            .fmt_fields(FieldFormatter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr),
      );

  tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
});

/// This does not need to be called directly. Initializes the logging system.
pub fn init_logger() {
  LazyLock::force(&INIT_LOGGER);
}

static GLOBAL_LOGGING_THRESHOLD: AtomicU8 = AtomicU8::new(1); // Default threshold

/// Sets the global threshold. Takes effect immediately, even for an already initialized logger.
pub fn set_global_logging_threshold(new_threshold: u8) {
  GLOBAL_LOGGING_THRESHOLD.store(new_threshold, Ordering::SeqCst);
}

/// Retrieves the global threshold.
pub fn get_global_logging_threshold() -> u8 {
  GLOBAL_LOGGING_THRESHOLD.load(Ordering::SeqCst)
}
