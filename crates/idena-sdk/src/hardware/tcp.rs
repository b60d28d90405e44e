//! TCP device transport (Speculos APDU port)
//!
//! Each command goes out as `len(4, big-endian) | apdu`; each response comes
//! back as `len(4, big-endian) | data(len) | status word(2)`.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::apdu::STATUS_WORD_LEN;
use super::device::{ApduTransport, DeviceConnector};
use crate::SdkError;

/// Upper bound on a response body
const MAX_RESPONSE_LEN: usize = 64 * 1024;

/// Open session over TCP
#[derive(Debug)]
pub struct TcpDevice {
    stream: Option<TcpStream>,
}

impl TcpDevice {
    /// Connect to `addr`, e.g. `127.0.0.1:9999`
    pub async fn connect(addr: &str) -> Result<Self, SdkError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| SdkError::DeviceUnavailable(format!("{}: {}", addr, e)))?;
        Ok(Self {
            stream: Some(stream),
        })
    }
}

fn io_error(e: std::io::Error) -> SdkError {
    SdkError::DeviceUnavailable(e.to_string())
}

#[async_trait]
impl ApduTransport for TcpDevice {
    async fn exchange(&mut self, command: &[u8]) -> Result<Vec<u8>, SdkError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SdkError::DeviceUnavailable("session closed".to_string()))?;

        let len = u32::try_from(command.len())
            .map_err(|_| SdkError::InvalidArgument("command too long".to_string()))?;
        let mut frame = Vec::with_capacity(4 + command.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(command);
        stream.write_all(&frame).await.map_err(io_error)?;

        let data_len = stream.read_u32().await.map_err(io_error)? as usize;
        if data_len > MAX_RESPONSE_LEN {
            return Err(SdkError::InvalidDeviceResponse(format!(
                "response length {} too large",
                data_len
            )));
        }
        let mut response = vec![0u8; data_len + STATUS_WORD_LEN];
        stream.read_exact(&mut response).await.map_err(io_error)?;
        Ok(response)
    }

    async fn close(&mut self) -> Result<(), SdkError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await.map_err(io_error)?;
        }
        Ok(())
    }
}

/// Connector opening a [`TcpDevice`] at a fixed address
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    /// Connector for `addr`
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl DeviceConnector for TcpConnector {
    async fn open(&self) -> Result<Box<dyn ApduTransport>, SdkError> {
        Ok(Box::new(TcpDevice::connect(&self.addr).await?))
    }
}
