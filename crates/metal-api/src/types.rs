use serde::{Deserialize, Serialize};

// ── Device types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateDeviceRequest {
    pub metro: String,
    pub operating_system: String,
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

/// Body of a successful create. Only the id is needed from it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedDevice {
    pub id: String,
}

/// Device as returned by `GET /devices/{id}`.
///
/// Both fields are optional on the wire; an absent state reads as empty and an
/// absent or `null` address list as no addresses.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub ip_addresses: Option<Vec<IpAssignment>>,
}

impl Device {
    /// First address the provider lists for this device, if any.
    pub fn primary_address(&self) -> Option<&str> {
        self.ip_addresses
            .as_deref()
            .and_then(<[IpAssignment]>::first)
            .map(|ip| ip.address.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpAssignment {
    pub address: String,
}
