use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

/// Preview server settings, loaded from `preview.{toml,json,yaml}` plus `LN__` overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Token rendered into the CSRF meta tag and required on every POST.
    pub csrf_token: String,
    /// Class the navigation bar marks its active links with.
    pub active_class: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4590,
            csrf_token: "preview-token".to_owned(),
            active_class: "is-active".to_owned(),
        }
    }
}
