use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_host")]
    pub host: IpAddr,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    /// The recursive resolver unanswered queries fall through to.
    #[serde(default = "Config::default_upstream")]
    pub upstream: SocketAddr,
    /// Name advertised for this server itself.
    #[serde(default = "Config::default_ns_name")]
    pub ns_name: String,
    /// Public address of this server, answered for the reverse PTR of
    /// itself and used for the destination check.
    #[serde(default)]
    pub public_ip: Option<Ipv4Addr>,
    /// When set, every command query must come from loopback.
    #[serde(default)]
    pub local_only: bool,
    #[serde(default)]
    pub debug_level: u8,
    /// Address answered for domains filtered as WARNING.
    #[serde(default = "Config::default_redirect")]
    pub warning_host: Ipv4Addr,
    /// Address answered for domains filtered as STOP.
    #[serde(default = "Config::default_redirect")]
    pub stop_host: Ipv4Addr,
    /// Server receiving a copy of every TRACE-filtered query.
    #[serde(default = "Config::default_trace_host")]
    pub trace_host: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            upstream: Self::default_upstream(),
            ns_name: Self::default_ns_name(),
            public_ip: None,
            local_only: false,
            debug_level: 0,
            warning_host: Self::default_redirect(),
            stop_host: Self::default_redirect(),
            trace_host: Self::default_trace_host(),
        }
    }
}

impl Config {
    fn default_host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
    }

    fn default_port() -> u16 {
        53
    }

    fn default_upstream() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::new(1, 1, 1, 1), 53))
    }

    fn default_ns_name() -> String {
        "ns.nsgate.local".to_string()
    }

    fn default_redirect() -> Ipv4Addr {
        Ipv4Addr::UNSPECIFIED
    }

    fn default_trace_host() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 53))
    }
}

impl Config {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}
