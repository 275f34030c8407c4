use crate::repository::filters::FilterMode;
use std::net::Ipv4Addr;

/// Answer rdata for a successful command.
pub const OK: Ipv4Addr = Ipv4Addr::new(1, 1, 1, 1);
/// Answer rdata for a refused or failed command.
pub const FAIL: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);
/// Answer rdata confirming the server is shutting down.
pub const SHUTDOWN: Ipv4Addr = Ipv4Addr::new(88, 88, 88, 88);

/// Scalar readbacks are encoded in the last octet.
pub fn scalar(value: u8) -> Ipv4Addr {
    Ipv4Addr::new(0, 0, 0, value)
}

/// The runtime knobs addressable as `<setting>=<value>` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    UpperDns,
    Warning,
    Trace,
    Local,
    Debug,
    Ns,
}

impl Setting {
    fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "upperdns" => Some(Self::UpperDns),
            "warning" => Some(Self::Warning),
            "trace" => Some(Self::Trace),
            "local" => Some(Self::Local),
            "debug" => Some(Self::Debug),
            "ns" => Some(Self::Ns),
            _ => None,
        }
    }

    /// Settings that reconfigure the server itself are only accepted over
    /// loopback.
    pub fn must_from_local(self) -> bool {
        matches!(self, Self::Local | Self::Debug | Self::Ns)
    }
}

/// A control operation smuggled in the query name of an A query:
/// `keyword=argument`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `command=stop`: shut the server down.
    Stop,
    /// `<setting>=<value>`
    SetSetting(Setting, String),
    /// `<setting>=?`
    GetSetting(Setting),
    /// `<domain>=<ipv4>`: bind a static record.
    BindRecord(String, Ipv4Addr),
    /// `<domain>=?`: read the effective filter mode.
    QueryFilter(String),
    /// `<domain>=<filter keyword>`
    SetFilter(String, FilterMode),
}

impl Command {
    /// Ordinary domains never contain `=`; every name that does is routed
    /// through the command branch.
    pub fn is_command(name: &str) -> bool {
        name.contains('=')
    }

    /// `None` means the name looks like a command but matches no rule.
    pub fn parse(name: &str) -> Option<Self> {
        let (key, value) = name.split_once('=')?;
        match key {
            "command" => match value {
                "stop" => Some(Self::Stop),
                _ => None,
            },
            keyword => {
                if let Some(setting) = Setting::from_keyword(keyword) {
                    if value == "?" {
                        Some(Self::GetSetting(setting))
                    } else {
                        Some(Self::SetSetting(setting, value.to_string()))
                    }
                } else if value == "?" {
                    Some(Self::QueryFilter(key.to_string()))
                } else if let Ok(addr) = value.parse::<Ipv4Addr>() {
                    Some(Self::BindRecord(key.to_string(), addr))
                } else {
                    FilterMode::from_keyword(value)
                        .map(|mode| Self::SetFilter(key.to_string(), mode))
                }
            }
        }
    }

    pub fn must_from_local(&self) -> bool {
        match self {
            Self::Stop => true,
            Self::SetSetting(setting, _) | Self::GetSetting(setting) => setting.must_from_local(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Setting};
    use crate::repository::filters::FilterMode;
    use std::net::Ipv4Addr;

    #[test]
    fn should_parse_stop() {
        assert_eq!(Command::parse("command=stop"), Some(Command::Stop));
        assert_eq!(Command::parse("command=restart"), None);
    }

    #[test]
    fn should_parse_settings() {
        assert_eq!(
            Command::parse("upperdns=9.9.9.9"),
            Some(Command::SetSetting(Setting::UpperDns, "9.9.9.9".into()))
        );
        assert_eq!(
            Command::parse("debug=?"),
            Some(Command::GetSetting(Setting::Debug))
        );
        assert_eq!(
            Command::parse("local=1"),
            Some(Command::SetSetting(Setting::Local, "1".into()))
        );
    }

    #[test]
    fn should_parse_domain_operations() {
        assert_eq!(
            Command::parse("printer.lan=10.0.0.9"),
            Some(Command::BindRecord(
                "printer.lan".into(),
                Ipv4Addr::new(10, 0, 0, 9)
            ))
        );
        assert_eq!(
            Command::parse("ads.example.com=stop"),
            Some(Command::SetFilter(
                "ads.example.com".into(),
                FilterMode::Stop
            ))
        );
        assert_eq!(
            Command::parse("ads.example.com=?"),
            Some(Command::QueryFilter("ads.example.com".into()))
        );
        assert_eq!(Command::parse("ads.example.com=bogus"), None);
    }

    #[test]
    fn should_gate_sensitive_commands() {
        assert!(Command::Stop.must_from_local());
        assert!(Command::parse("debug=2").unwrap().must_from_local());
        assert!(Command::parse("ns=gateway").unwrap().must_from_local());
        assert!(!Command::parse("upperdns=?").unwrap().must_from_local());
        assert!(!Command::parse("a.b=stop").unwrap().must_from_local());
    }
}
