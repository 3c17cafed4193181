use std::fs;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::Path;

/// Total disk space in bytes for the filesystem backing `path`, or `0` if
/// it cannot be determined.
pub fn total_disk_space(path: &str) -> u64 {
    fs2::total_space(Path::new(path)).unwrap_or(0)
}

/// System uptime in seconds, read from `/proc/uptime`. Linux only; `0` on
/// any other platform or read failure.
pub fn uptime_seconds() -> u64 {
    fs::read_to_string("/proc/uptime")
        .ok()
        .and_then(|contents| contents.split_whitespace().next().map(str::to_owned))
        .and_then(|first| first.parse::<f64>().ok())
        .map(|secs| secs as u64)
        .unwrap_or(0)
}

/// The machine's outbound-facing local IP address, found by opening a UDP
/// socket toward a public address without ever sending a packet.
pub fn local_ip() -> IpAddr {
    (|| -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip())
    })()
    .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// The machine's hostname: `/etc/hostname`, then `$HOSTNAME`, then
/// `"localhost"`.
pub fn hostname() -> String {
    if let Ok(contents) = fs::read_to_string("/etc/hostname") {
        let trimmed = contents.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

/// The operating system this node is running on, e.g. `"linux"`.
pub fn platform() -> String {
    std::env::consts::OS.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_never_panics_and_is_non_negative() {
        let _ = uptime_seconds();
    }

    #[test]
    fn local_ip_always_resolves_to_something() {
        let ip = local_ip();
        assert!(!ip.is_unspecified());
    }

    #[test]
    fn hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }

    #[test]
    fn platform_is_never_empty() {
        assert!(!platform().is_empty());
    }
}
