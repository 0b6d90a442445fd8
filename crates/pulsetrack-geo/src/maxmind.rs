use std::net::IpAddr;
use std::path::Path;

use async_trait::async_trait;

use pulsetrack_core::geo::{GeoDriver, GeoDriverError, GeoLookupResult, GeoSource};

/// Local MaxMind-format database lookups.
///
/// The City database is required; the ASN database is optional and only
/// widens the result when present. Both files are opened once at startup —
/// a missing or corrupt file is a construction error the resolver builder
/// turns into a degraded chain, never a per-request panic.
pub struct MaxMindDriver {
    city: maxminddb::Reader<Vec<u8>>,
    asn: Option<maxminddb::Reader<Vec<u8>>>,
}

impl MaxMindDriver {
    pub fn open(city_db_path: &str, asn_db_path: &str) -> Result<Self, GeoDriverError> {
        let city = maxminddb::Reader::open_readfile(city_db_path)
            .map_err(|e| GeoDriverError::Database(format!("{city_db_path}: {e}")))?;

        // The ASN database is best-effort: absence just means no ASN fields.
        let asn = if Path::new(asn_db_path).exists() {
            match maxminddb::Reader::open_readfile(asn_db_path) {
                Ok(reader) => Some(reader),
                Err(e) => {
                    tracing::warn!(path = %asn_db_path, error = %e, "ASN database unreadable, continuing without ASN data");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self { city, asn })
    }
}

#[async_trait]
impl GeoDriver for MaxMindDriver {
    fn source(&self) -> GeoSource {
        GeoSource::MaxMind
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoLookupResult, GeoDriverError> {
        let record: maxminddb::geoip2::City = self.city.lookup(ip).map_err(|e| match e {
            maxminddb::MaxMindDBError::AddressNotFoundError(_) => {
                GeoDriverError::NotFound(ip.to_string())
            }
            other => GeoDriverError::Database(other.to_string()),
        })?;

        let country = record
            .country
            .as_ref()
            .and_then(|c| c.iso_code)
            .map(|s| s.to_string());

        let region = record
            .subdivisions
            .as_ref()
            .and_then(|subs| subs.first())
            .and_then(|sub| sub.names.as_ref())
            .and_then(|names| names.get("en"))
            .map(|s| s.to_string());

        let city = record
            .city
            .as_ref()
            .and_then(|c| c.names.as_ref())
            .and_then(|names| names.get("en"))
            .map(|s| s.to_string());

        let (asn, asn_organization) = match &self.asn {
            Some(reader) => match reader.lookup::<maxminddb::geoip2::Asn>(ip) {
                Ok(asn_record) => (
                    asn_record.autonomous_system_number,
                    asn_record
                        .autonomous_system_organization
                        .map(|s| s.to_string()),
                ),
                // An IP absent from the ASN database does not fail the lookup.
                Err(_) => (None, None),
            },
            None => (None, None),
        };

        Ok(GeoLookupResult {
            ip: ip.to_string(),
            country,
            region,
            city,
            asn,
            asn_organization,
            source: GeoSource::MaxMind,
            error: None,
        })
    }
}
