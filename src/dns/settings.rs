use std::net::{Ipv4Addr, SocketAddr};
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct State {
    upstream: SocketAddr,
    ns_name: String,
    public_ip: Option<Ipv4Addr>,
    local_only: bool,
    debug_level: u8,
    warning_host: Ipv4Addr,
    stop_host: Ipv4Addr,
    trace_host: SocketAddr,
}

/// The server's mutable knobs. Seeded from configuration, adjusted at
/// runtime through the command channel; reads take a short shared lock.
#[derive(Debug)]
pub struct Settings {
    inner: RwLock<State>,
}

impl Settings {
    pub fn new(config: &super::config::Config) -> Self {
        Self {
            inner: RwLock::new(State {
                upstream: config.upstream,
                ns_name: config.ns_name.clone(),
                public_ip: config.public_ip,
                local_only: config.local_only,
                debug_level: config.debug_level,
                warning_host: config.warning_host,
                stop_host: config.stop_host,
                trace_host: config.trace_host,
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.inner.read().expect("settings lock")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.inner.write().expect("settings lock")
    }

    pub fn upstream(&self) -> SocketAddr {
        self.read().upstream
    }

    pub fn set_upstream(&self, value: SocketAddr) {
        self.write().upstream = value;
    }

    pub fn ns_name(&self) -> String {
        self.read().ns_name.clone()
    }

    pub fn set_ns_name(&self, value: String) {
        self.write().ns_name = value;
    }

    pub fn public_ip(&self) -> Option<Ipv4Addr> {
        self.read().public_ip
    }

    pub fn set_public_ip(&self, value: Ipv4Addr) {
        self.write().public_ip = Some(value);
    }

    pub fn local_only(&self) -> bool {
        self.read().local_only
    }

    pub fn set_local_only(&self, value: bool) {
        self.write().local_only = value;
    }

    pub fn debug_level(&self) -> u8 {
        self.read().debug_level
    }

    pub fn set_debug_level(&self, value: u8) {
        self.write().debug_level = value;
    }

    pub fn warning_host(&self) -> Ipv4Addr {
        self.read().warning_host
    }

    pub fn set_warning_host(&self, value: Ipv4Addr) {
        self.write().warning_host = value;
    }

    pub fn stop_host(&self) -> Ipv4Addr {
        self.read().stop_host
    }

    pub fn set_stop_host(&self, value: Ipv4Addr) {
        self.write().stop_host = value;
    }

    pub fn trace_host(&self) -> SocketAddr {
        self.read().trace_host
    }

    pub fn set_trace_host(&self, value: SocketAddr) {
        self.write().trace_host = value;
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use std::net::Ipv4Addr;

    #[test]
    fn should_update_and_read_back() {
        let settings = Settings::new(&Default::default());
        assert!(!settings.local_only());
        settings.set_local_only(true);
        assert!(settings.local_only());

        settings.set_stop_host(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(settings.stop_host(), Ipv4Addr::new(10, 0, 0, 1));

        settings.set_upstream("9.9.9.9:53".parse().unwrap());
        assert_eq!(settings.upstream(), "9.9.9.9:53".parse().unwrap());
    }
}
