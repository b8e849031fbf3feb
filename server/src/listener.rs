//! TCP listener with port fallback.

use std::io;

use tokio::net::TcpListener;

/// Additional ports tried after the configured one.
pub const PORT_ATTEMPTS: u16 = 10;

/// Bind `host:port`, moving to the next port while the address is in use,
/// at most `attempts` times. Other bind errors are returned immediately.
pub async fn bind_with_fallback(host: &str, port: u16, attempts: u16) -> io::Result<TcpListener> {
    let mut port = port;
    let mut remaining = attempts;
    loop {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse && remaining > 0 => {
                let Some(next) = port.checked_add(1) else {
                    return Err(e);
                };
                tracing::warn!(port, next, "port in use, retrying");
                port = next;
                remaining -= 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn busy_port_moves_up() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        match bind_with_fallback("127.0.0.1", port, PORT_ATTEMPTS).await {
            Ok(listener) => assert!(listener.local_addr().unwrap().port() > port),
            // An ephemeral port at the top of the range has nowhere to go.
            Err(e) => assert_eq!(port, u16::MAX, "unexpected bind error: {e}"),
        }
    }

    #[tokio::test]
    async fn no_attempts_left_returns_the_error() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind_with_fallback("127.0.0.1", port, 0).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }
}
