use crate::config::LaunchConfig;
use crate::flight_control::{FlightError, KrpcVessel};
use crate::{error, info};
use krpc_client::{Client, services::space_center::SpaceCenter};
use std::sync::Arc;

/// Struct bundling the handles built on the open kRPC connection.
#[derive(Clone)]
pub struct Keychain {
    /// The active vessel, resolved through the connection on every access.
    vessel: Arc<KrpcVessel>,
}

impl Keychain {
    /// Opens the RPC and the stream connection under the configured name.
    pub async fn connect(config: &LaunchConfig) -> Result<Self, FlightError> {
        let client = Client::new(
            &config.connection_name,
            &config.address,
            config.rpc_port,
            config.stream_port,
        )
        .await?;
        let vessel = Arc::new(KrpcVessel::new(SpaceCenter::new(client), &config.launch_body));
        Ok(Self { vessel })
    }

    /// Provides a cloned reference to the vessel.
    pub fn vessel(&self) -> Arc<KrpcVessel> { Arc::clone(&self.vessel) }
}

/// Connects to the kRPC server, logging instead of propagating any failure.
///
/// There is no retry. `None` means the server could not be reached or refused the
/// handshake.
pub async fn establish_connection(config: &LaunchConfig) -> Option<Keychain> {
    match Keychain::connect(config).await {
        Ok(keychain) => {
            info!(
                "Connection '{}' established to {}:{}",
                config.connection_name, config.address, config.rpc_port
            );
            Some(keychain)
        }
        Err(e) => {
            error!("Could not establish connection to {}:{}", config.address, config.rpc_port);
            error!("Error was: {e}");
            None
        }
    }
}
