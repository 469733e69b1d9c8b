use std::sync::Arc;

use crate::config::SourceConfig;
use crate::migration::{fetch_migration_series, MigrationFetch};
use crate::occurrence::{fetch_occurrences, OccurrenceError, OccurrenceResponse};
use crate::relay::HttpRelay;
use crate::series::CoordinateSeries;
use crate::shipping::fetch_shipping_lane_series;
use crate::transport::{HttpTransport, ReqwestTransport, TransportError};

/// Fetchers bound to one transport and one configuration.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct DataClient {
    transport: Arc<dyn HttpTransport>,
    config: SourceConfig,
}

impl DataClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: SourceConfig) -> Self {
        Self { transport, config }
    }

    /// Network client with `Cache-Control: no-store` and the configured timeout.
    pub fn connect(config: SourceConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Relay client sharing this client's transport.
    pub fn relay(&self) -> HttpRelay {
        HttpRelay::new(
            self.transport(),
            self.config.relay_urls.clone(),
            self.config.model.clone(),
        )
    }

    pub async fn migration(
        &self,
        species_name: &str,
        year: Option<&str>,
        month: Option<&str>,
    ) -> MigrationFetch {
        fetch_migration_series(
            self.transport.as_ref(),
            &self.config.data_url,
            species_name,
            year,
            month,
        )
        .await
    }

    pub async fn shipping(&self, year: Option<&str>, month: Option<&str>) -> CoordinateSeries {
        fetch_shipping_lane_series(self.transport.as_ref(), &self.config.data_url, year, month)
            .await
    }

    pub async fn occurrences(
        &self,
        scientific_name: &str,
    ) -> Result<OccurrenceResponse, OccurrenceError> {
        fetch_occurrences(self.transport.as_ref(), &self.config.obis_url, scientific_name).await
    }
}
