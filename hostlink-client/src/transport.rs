//! Blocking byte transports: plain TCP or TLS over TCP.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::tls::client_tls_config;
use rustls::{ClientConnection, StreamOwned};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A connected, blocking byte stream to the host.
pub trait Transport: Read + Write + Send {
    /// Bounds every subsequent read; `None` blocks forever.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Tears the stream down in both directions.
    fn shutdown(&mut self) -> io::Result<()>;

    fn is_tls(&self) -> bool {
        false
    }
}

/// A client stream that can be either plain TCP or TLS.
pub enum ClientStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl ClientStream {
    /// Opens a stream to the configured host, upgrading to TLS if enabled.
    pub fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let addr = config.address();
        tracing::debug!("Connecting to {}...", addr);

        let tcp = connect_any(&addr, config.connect_timeout()).map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;
        tcp.set_nodelay(true).ok();
        tcp.set_read_timeout(config.read_timeout())?;
        tcp.set_write_timeout(config.read_timeout())?;

        if !config.tls.enabled {
            return Ok(ClientStream::Plain(tcp));
        }

        let (tls_config, server_name) = client_tls_config(&config.tls, &config.host)?;
        let conn = ClientConnection::new(tls_config, server_name)
            .map_err(|e| ClientError::TlsConfig(e.to_string()))?;
        let mut stream = StreamOwned::new(conn, tcp);

        tracing::debug!("Performing TLS handshake...");
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(|e| ClientError::TlsHandshake(e.to_string()))?;
        }
        tracing::debug!("TLS handshake complete");

        Ok(ClientStream::Tls(Box::new(stream)))
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            ClientStream::Plain(stream) => stream,
            ClientStream::Tls(stream) => &stream.sock,
        }
    }
}

fn connect_any(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for sock_addr in addr.to_socket_addrs()? {
        let attempt = if timeout.is_zero() {
            TcpStream::connect(sock_addr)
        } else {
            TcpStream::connect_timeout(&sock_addr, timeout)
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{} did not resolve to any address", addr),
        )
    }))
}

impl Read for ClientStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain(stream) => stream.read(buf),
            ClientStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ClientStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain(stream) => stream.write(buf),
            ClientStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ClientStream::Plain(stream) => stream.flush(),
            ClientStream::Tls(stream) => stream.flush(),
        }
    }
}

impl Transport for ClientStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.tcp().set_read_timeout(timeout)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        if let ClientStream::Tls(stream) = self {
            stream.conn.send_close_notify();
            let _ = stream.flush();
        }
        self.tcp().shutdown(Shutdown::Both)
    }

    fn is_tls(&self) -> bool {
        matches!(self, ClientStream::Tls(_))
    }
}
