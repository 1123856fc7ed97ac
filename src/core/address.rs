use thiserror::Error;

use super::endpoint::Destination;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("expected host:port, got {0:?}")]
    MissingSeparator(String),
    #[error("host is empty")]
    EmptyHost,
    #[error("port {0:?} is not a number between 1 and 65535")]
    InvalidPort(String),
}

/// Parses `host:port`, splitting on the first colon.
pub fn parse_destination(text: &str) -> Result<Destination, AddressError> {
    let text = text.trim();
    let (host, port) = text
        .split_once(':')
        .ok_or_else(|| AddressError::MissingSeparator(text.to_string()))?;

    if host.is_empty() {
        return Err(AddressError::EmptyHost);
    }

    match port.parse::<u16>() {
        Ok(port) if port > 0 => Ok(Destination::new(host, port)),
        _ => Err(AddressError::InvalidPort(port.to_string())),
    }
}

/// The last destination the user entered that parsed.
#[derive(Debug, Clone, Default)]
pub struct AddressConfig {
    current: Destination,
}

impl AddressConfig {
    pub fn new(initial: Destination) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> &Destination {
        &self.current
    }

    /// On success the new destination replaces the current one and is
    /// returned for the caller to hand to the endpoint. On failure the current
    /// destination is left untouched.
    pub fn parse(&mut self, text: &str) -> Result<&Destination, AddressError> {
        self.current = parse_destination(text)?;
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_and_port() {
        assert_eq!(
            parse_destination("127.0.0.1:9000"),
            Ok(Destination::new("127.0.0.1", 9000))
        );
        assert_eq!(
            parse_destination(" studio.local:8080\n"),
            Ok(Destination::new("studio.local", 8080))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            parse_destination("badstring"),
            Err(AddressError::MissingSeparator("badstring".into()))
        );
        assert_eq!(parse_destination(":9000"), Err(AddressError::EmptyHost));
        assert!(matches!(
            parse_destination("host:"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_destination("host:0"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_destination("host:-1"),
            Err(AddressError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_destination("host:70000"),
            Err(AddressError::InvalidPort(_))
        ));
        // only the first colon separates
        assert!(matches!(
            parse_destination("host:90:00"),
            Err(AddressError::InvalidPort(p)) if p == "90:00"
        ));
    }

    #[test]
    fn failed_parse_keeps_previous() {
        let mut config = AddressConfig::default();
        assert_eq!(config.current(), &Destination::new("localhost", 8080));

        assert_eq!(
            config.parse("127.0.0.1:9000"),
            Ok(&Destination::new("127.0.0.1", 9000))
        );
        assert!(config.parse("badstring").is_err());
        assert_eq!(config.current(), &Destination::new("127.0.0.1", 9000));
    }
}
