/// Parse a dev server port, rejecting 0.
///
/// Port 0 would make the OS pick a port, which the preview page cannot
/// know in advance.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a port number between 1 and 65535"))?;
    if port == 0 {
        return Err("port must be between 1 and 65535".to_string());
    }
    Ok(port)
}
