// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use roster_config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over the configured level. Logs go to stderr so the
/// review and summary on stdout stay readable.
pub fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_directive(&logging.level)));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

/// Our crates at `level`, everything else at warn.
fn default_directive(level: &str) -> String {
	let level = level.trim().to_lowercase();
	format!("warn,roster={level},roster_cli={level},roster_provisioning={level},roster_directory={level},roster_companion={level},roster_smtp={level},roster_ingest={level},roster_identity={level},roster_config={level}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn directive_parses() {
		let directive = default_directive(" DEBUG ");
		assert!(directive.contains("roster_provisioning=debug"));
		assert!(EnvFilter::try_new(directive).is_ok());
	}
}
