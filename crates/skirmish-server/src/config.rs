// config.rs — Command-line surface: port, AI toggle, verbosity.
// Argv is parsed by hand rather than reaching for a CLI crate.

pub const DEFAULT_PORT: u16 = 7777;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// When false, chasers go idle and patrollers patrol without attacking.
    pub ai_enabled: bool,
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: DEFAULT_PORT, ai_enabled: true, verbose: false }
    }
}

/// Parses the one positional port argument and the `--multiplayer-test` /
/// `--verbose` flags. Returns `Err` with a usage message on a malformed
/// port; the caller is responsible for the exit-code contract.
pub fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<ServerConfig, String> {
    args.next(); // argv[0]

    let mut config = ServerConfig::default();
    let mut port_set = false;

    for arg in args {
        match arg.as_str() {
            "--multiplayer-test" | "--test-multiplayer" => config.ai_enabled = false,
            "--verbose" => config.verbose = true,
            _ if !port_set => {
                config.port = arg
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {arg}"))?;
                port_set = true;
            }
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("skirmish-server".to_string())
            .chain(v.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_standard_port_with_ai_enabled() {
        let cfg = parse_args(args(&[])).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert!(cfg.ai_enabled);
        assert!(!cfg.verbose);
    }

    #[test]
    fn parses_explicit_port() {
        let cfg = parse_args(args(&["9000"])).unwrap();
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn multiplayer_test_flag_disables_ai() {
        let cfg = parse_args(args(&["--multiplayer-test"])).unwrap();
        assert!(!cfg.ai_enabled);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn rejects_unparsable_port() {
        assert!(parse_args(args(&["not-a-port"])).is_err());
    }
}
