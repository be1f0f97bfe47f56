use thiserror::Error;

use parley_proto::error::ProtoError;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}
