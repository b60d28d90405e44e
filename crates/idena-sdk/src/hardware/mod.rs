//! Hardware device support: APDU codec and device transports

pub mod apdu;
pub mod device;
pub mod tcp;

pub use apdu::{
    build_get_address_command, build_sign_command, decode_address_response,
    decode_signature_response, encode_bip32_path, strip_status_word,
};
pub use device::{ApduTransport, DeviceConnector, MockConnector, MockDevice};
pub use tcp::{TcpConnector, TcpDevice};
