//  Copyright 2022, The Tari Project
//
//  Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//  following conditions are met:
//
//  1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//  disclaimer.
//
//  2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//  following disclaimer in the documentation and/or other materials provided with the distribution.
//
//  3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//  products derived from this software without specific prior written permission.
//
//  THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//  INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//  DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//  SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//  SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//  WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//  USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{mailbox::MailboxConfig, peer_exchange::PeerExchangeConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load overlay configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub peer_exchange: PeerExchangeConfig,
    pub mailbox: MailboxConfig,
}

impl OverlayConfig {
    /// The configuration section read by `load_from`
    pub const MAIN_KEY: &'static str = "overlay";

    /// Reads the `overlay` section of the given configuration. Missing keys (or a missing section) take their default
    /// values.
    pub fn load_from(config: &config::Config) -> Result<Self, ConfigError> {
        let loaded = match config.get::<Self>(Self::MAIN_KEY) {
            Ok(loaded) => loaded,
            Err(config::ConfigError::NotFound(_)) => Self::default(),
            Err(err) => return Err(err.into()),
        };
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn default_local_test() -> Self {
        Self {
            peer_exchange: PeerExchangeConfig {
                request_timeout: Duration::from_secs(2),
                initial_retry_delay: Duration::from_millis(100),
                max_retry_delay: Duration::from_secs(1),
                ..Default::default()
            },
            mailbox: MailboxConfig {
                prune_interval: Duration::from_secs(1),
                ..Default::default()
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let pe = &self.peer_exchange;
        if pe.max_reported_peers == 0 {
            return Err(ConfigError::Invalid {
                field: "peer_exchange.max_reported_peers",
                message: "must be greater than zero".to_string(),
            });
        }
        if pe.max_retry_delay < pe.initial_retry_delay {
            return Err(ConfigError::Invalid {
                field: "peer_exchange.max_retry_delay",
                message: format!(
                    "must not be less than initial_retry_delay ({:.2?})",
                    pe.initial_retry_delay
                ),
            });
        }
        if self.mailbox.max_map_size == 0 {
            return Err(ConfigError::Invalid {
                field: "mailbox.max_map_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.mailbox.prune_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "mailbox.prune_interval",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use config::{Config, File, FileFormat};

    use super::*;
    use crate::net_address::NetworkAddress;

    fn load(toml: &str) -> Result<OverlayConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        OverlayConfig::load_from(&config)
    }

    #[test]
    fn it_uses_defaults_for_a_missing_section() {
        let config = load("[other]\nvalue = 1").unwrap();
        assert_eq!(config.peer_exchange.max_reported_peers, 200);
        assert_eq!(config.peer_exchange.request_timeout, Duration::from_secs(30));
        assert_eq!(config.mailbox.max_map_size, 10_000);
        assert_eq!(config.mailbox.max_age, Duration::from_secs(10 * 24 * 60 * 60));
    }

    #[test]
    fn it_overrides_given_keys() {
        let config = load(
            r#"
            [overlay.peer_exchange]
            seed_nodes = ["seed1.onion:8000", "seed2.onion:8001"]
            request_timeout = 5
            min_num_connected_peers = 12

            [overlay.mailbox]
            max_map_size = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.peer_exchange.seed_nodes, vec![
            NetworkAddress::new("seed1.onion", 8000),
            NetworkAddress::new("seed2.onion", 8001)
        ]);
        assert_eq!(config.peer_exchange.request_timeout, Duration::from_secs(5));
        assert_eq!(config.peer_exchange.min_num_connected_peers, 12);
        assert_eq!(config.peer_exchange.target_num_connected_peers, 10);
        assert_eq!(config.mailbox.max_map_size, 42);
        assert_eq!(config.mailbox.prune_interval, Duration::from_secs(60));
    }

    #[test]
    fn it_accepts_fractional_seconds() {
        let config = load("[overlay.peer_exchange]\ninitial_retry_delay = 0.25\nmax_retry_delay = 2").unwrap();
        assert_eq!(config.peer_exchange.initial_retry_delay, Duration::from_millis(250));
        assert_eq!(config.peer_exchange.max_retry_delay, Duration::from_secs(2));

        let err = load("[overlay.peer_exchange]\nrequest_timeout = -1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn it_rejects_unknown_fields() {
        let err = load("[overlay.mailbox]\nmax_map_sise = 42").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn it_rejects_invalid_values() {
        let err = load("[overlay.peer_exchange]\ninitial_retry_delay = 10\nmax_retry_delay = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid {
            field: "peer_exchange.max_retry_delay",
            ..
        }));
    }
}
