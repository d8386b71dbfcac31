use thiserror::Error;

#[derive(Error, Debug)]
pub enum SsdpError {
    #[error("Socket error: {0}")]
    Socket(#[from] std::io::Error),

    #[error("Bind error on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Multicast join error on {address}: {source}")]
    MulticastJoin {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Send error on {address}: {source}")]
    Send {
        address: String,
        #[source]
        source: std::io::Error,
    },
}
