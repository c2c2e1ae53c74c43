//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
/// Later sources override earlier ones key by key.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("tracker.namespace", "tracker")?
        .set_default("tracker.platform", "core")?
        .set_default("queue.batch_size", 10)?
        .set_default("queue.batch_delay_ms", 1000)?
        .set_default("queue.concurrency", 4)
}
