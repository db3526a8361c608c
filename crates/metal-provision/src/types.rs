use std::fmt;

/// Opaque provider-side device identifier, issued when the device is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerId(pub String);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to provision. Built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub metro: String,
    pub plan: String,
    pub operating_system: String,
    pub user_data: Option<String>,
}

/// Coarse device state derived from the provider's raw state string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Pending,
    Active,
    Failed,
}

/// A device that reached `active` and has a resolved address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub server_id: ServerId,
    pub ip_address: String,
}
