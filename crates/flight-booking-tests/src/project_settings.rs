use std::io::ErrorKind;

use eyre::Result;
use serde::Deserialize;

/// Settings read from `flight-booking.toml`, if present
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSettings {
    #[serde(default)]
    pub transport: Transport,

    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

/// How tests reach the service
#[derive(Clone, Copy, PartialEq, Eq, Default, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// Requests are handed to the balancer in-process
    #[default]
    Mock,
    /// Requests go through a real UDP socket on localhost
    Udp,
}

impl ProjectSettings {
    pub fn load() -> Result<Self> {
        let mut path = std::env::current_dir()?;
        let contents = loop {
            path.push("flight-booking.toml");

            match std::fs::read_to_string(&path) {
                Ok(s) => break Some(s),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            path.pop();
            if !path.pop() {
                break None;
            }
        };

        let mut settings: ProjectSettings = match contents {
            Some(contents) => toml::from_str(&contents)?,
            None => ProjectSettings::default(),
        };

        if let Some(v) = std::env::var_os("FB_TRANSPORT") {
            if v.eq_ignore_ascii_case("udp") {
                settings.transport = Transport::Udp;
            } else if v.eq_ignore_ascii_case("mock") {
                settings.transport = Transport::Mock;
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case() {
        let settings: ProjectSettings =
            toml::from_str("transport = \"udp\"\nqueue-capacity = 32\n").unwrap();
        assert_eq!(settings.transport, Transport::Udp);
        assert_eq!(settings.queue_capacity, Some(32));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings: ProjectSettings = toml::from_str("").unwrap();
        assert_eq!(settings.transport, Transport::Mock);
        assert_eq!(settings.queue_capacity, None);
    }
}
