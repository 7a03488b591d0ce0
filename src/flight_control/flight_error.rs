use strum_macros::Display;

/// Everything that can go wrong while commanding or reading the vessel.
#[derive(Debug, Display)]
pub enum FlightError {
    #[strum(to_string = "kRPC call failed: {source}")]
    Krpc { source: krpc_client::error::RpcError },
    #[strum(to_string = "celestial body '{name}' is not known to the server")]
    UnknownBody { name: String },
    #[strum(to_string = "unexpected value: {what}")]
    UnexpectedValue { what: &'static str },
}

impl std::error::Error for FlightError {}

impl From<krpc_client::error::RpcError> for FlightError {
    fn from(source: krpc_client::error::RpcError) -> Self { FlightError::Krpc { source } }
}
