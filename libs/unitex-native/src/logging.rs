// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! stderr `tracing` subscriber for the Unity process.
//!
//! The subscriber goes up before the config is read so problems with the
//! config file or environment are logged; the config's filter is swapped in
//! afterwards through a reload handle.

use std::sync::OnceLock;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};
use unitex::UnitexConfig;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// `None` when the host process already had a global subscriber.
static FILTER: OnceLock<Option<FilterHandle>> = OnceLock::new();

const EARLY_FILTER: &str = "info";

fn build_subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> (impl Subscriber + Send + Sync, FilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false));
    (subscriber, handle)
}

/// Install the subscriber once per process, then resolve the config and
/// apply its log filter.
///
/// Unity may load the plugin more than once per session (editor domain
/// reloads); later loads re-read the config and update the filter of the
/// subscriber the first load installed.
pub fn init(lookup: impl Fn(&str) -> Option<String>) -> UnitexConfig {
    let handle = FILTER.get_or_init(|| {
        let early = lookup(UnitexConfig::ENV_LOG)
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(EARLY_FILTER));
        let (subscriber, handle) = build_subscriber(early, std::io::stderr);
        subscriber.try_init().is_ok().then_some(handle)
    });

    resolve_config(handle.as_ref(), lookup)
}

fn resolve_config(
    handle: Option<&FilterHandle>,
    lookup: impl Fn(&str) -> Option<String>,
) -> UnitexConfig {
    let config = UnitexConfig::resolve(lookup);
    let Some(handle) = handle else {
        return config;
    };

    match EnvFilter::try_new(config.log_directive()) {
        Ok(filter) => match handle.reload(filter) {
            Ok(()) => tracing::debug!("Logging initialized ({})", config.log_directive()),
            Err(e) => tracing::warn!("Failed to apply log filter: {}", e),
        },
        Err(e) => tracing::warn!("Invalid log filter {:?}: {}", config.log_directive(), e),
    }
    config
}
