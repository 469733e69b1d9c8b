use crate::transport::TransportError;

/// Why a fetch produced no data.
///
/// Map-data fetchers log this and hand the renderer a no-data series; it
/// never reaches the caller.
#[derive(Debug)]
pub enum FetchError {
    InvalidUrl { url: String, message: String },
    Transport(TransportError),
    Status { url: String, status: u16 },
    Malformed { url: String, message: String },
    Empty { url: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidUrl { url, message } => write!(f, "invalid url {url}: {message}"),
            FetchError::Transport(e) => write!(f, "transport error: {e}"),
            FetchError::Status { url, status } => write!(f, "HTTP {status} from {url}"),
            FetchError::Malformed { url, message } => {
                write!(f, "malformed response from {url}: {message}")
            }
            FetchError::Empty { url } => write!(f, "no coordinates in response from {url}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        FetchError::Transport(e)
    }
}
