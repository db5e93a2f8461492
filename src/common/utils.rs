use std::num::ParseIntError;

/// Splits `host[:port]`, falling back to `default_port` when no port is given.
pub fn parse_host(host: &str, default_port: u16) -> Result<(&str, u16), ParseIntError> {
    if let Some((host, port)) = host.split_once(":") {
        let port: u16 = port.parse()?;
        Ok((host, port))
    } else {
        Ok((host, default_port))
    }
}
