use super::command::{self, Command, Setting};
use super::error::HandleError;
use super::forward::ForwardTable;
use super::settings::Settings;
use crate::repository::filters::{FilterMode, FilterStore};
use crate::repository::records::{RecordStore, DEFAULT_TTL};
use nsgate_proto::{set_transaction_id, DnsMessage, QueryType, Rcode, Record};
use nsgate_server::prelude::Message;
use nsgate_server::shutdown::ShutdownFlag;
use nsgate_wire::UdpDatagram;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// The reverse lookup name answered for the server's own address.
fn reverse_ptr(addr: Ipv4Addr) -> String {
    let [a, b, c, d] = addr.octets();
    format!("{d}.{c}.{b}.{a}.in-addr.arpa")
}

/// Query types this server knows how to answer; everything else is refused.
fn is_served(qtype: QueryType) -> bool {
    matches!(
        qtype,
        QueryType::A | QueryType::AAAA | QueryType::MX | QueryType::HTTPS | QueryType::PTR
    )
}

pub(crate) struct DnsHandler {
    settings: Arc<Settings>,
    records: Arc<RecordStore>,
    filters: Arc<FilterStore>,
    forward: Arc<ForwardTable>,
    shutdown: ShutdownFlag,
}

impl DnsHandler {
    pub fn new(
        settings: Arc<Settings>,
        records: Arc<RecordStore>,
        filters: Arc<FilterStore>,
        forward: Arc<ForwardTable>,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            settings,
            records,
            filters,
            forward,
            shutdown,
        }
    }
}

impl DnsHandler {
    fn reply(
        &self,
        message: &Message,
        response: &DnsMessage,
    ) -> Result<Vec<Message>, HandleError> {
        let buffer = response.create_buffer()?;
        Ok(vec![Message::to(
            message.peer,
            message.local,
            buffer.as_slice(),
        )])
    }

    /// A synthetic A answer carrying `addr` as rdata, used for every command
    /// result and filter redirect.
    fn a_reply(
        &self,
        message: &Message,
        request: &DnsMessage,
        addr: Ipv4Addr,
    ) -> Result<Vec<Message>, HandleError> {
        let domain = request
            .first_question()
            .map(|question| question.name.to_lowercase())
            .unwrap_or_default();
        let response = DnsMessage::response_from(request).with_answer(Record::A {
            domain,
            addr,
            ttl: DEFAULT_TTL,
        });
        self.reply(message, &response)
    }

    fn rcode_reply(
        &self,
        message: &Message,
        request: &DnsMessage,
        rcode: Rcode,
    ) -> Result<Vec<Message>, HandleError> {
        let mut response = DnsMessage::response_from(request);
        response.header.rcode = rcode;
        self.reply(message, &response)
    }

    /// Matches an upstream reply against the forwarding table, restores the
    /// client's transaction id and addresses the datagram back at it.
    fn relay(&self, message: &Message, reply: &DnsMessage) -> Vec<Message> {
        if message.peer.ip() != self.settings.upstream().ip() {
            tracing::debug!("reply from {:?} is not the upstream, dropped", message.peer);
            return Vec::new();
        }
        let Some(pending) = self.forward.take(reply.header.id) else {
            tracing::debug!("no pending query for id {}, dropped", reply.header.id);
            return Vec::new();
        };
        let mut bytes = message.bytes().to_vec();
        set_transaction_id(&mut bytes, pending.original_id);
        vec![Message::to(pending.client, message.local, &bytes)]
    }

    /// Rewrites a copy of the client's query under a fresh local id and
    /// sends it to the upstream. The pending entry is recorded by `claim`
    /// before the datagram exists, so even an instant reply finds it.
    fn forward_upstream(
        &self,
        message: &Message,
        request: &DnsMessage,
    ) -> Result<Vec<Message>, HandleError> {
        let local_id = self.forward.claim(message.peer, request.header.id);
        let mut bytes = message.bytes().to_vec();
        set_transaction_id(&mut bytes, local_id);
        Ok(vec![Message::to(
            self.settings.upstream(),
            message.local,
            &bytes,
        )])
    }

    /// The destination check: datagrams not addressed to this server are
    /// dropped. A wildcard-bound socket accepts everything.
    fn is_for_us(&self, datagram: &UdpDatagram) -> bool {
        let Ok(dst) = datagram.dst() else {
            return false;
        };
        if dst.ip().is_unspecified() || dst.ip().is_loopback() {
            return true;
        }
        match self.settings.public_ip() {
            Some(ip) => dst.ip() == IpAddr::V4(ip),
            None => true,
        }
    }

    fn execute_command(
        &self,
        message: &Message,
        request: &DnsMessage,
        name: &str,
    ) -> Result<Vec<Message>, HandleError> {
        let Some(parsed) = Command::parse(name) else {
            tracing::debug!("unknown command {name:?}");
            return self.rcode_reply(message, request, Rcode::NotImplemented);
        };
        let from_local = message.peer.ip().is_loopback();
        if (parsed.must_from_local() || self.settings.local_only()) && !from_local {
            tracing::debug!("command {name:?} refused for remote origin");
            return self.a_reply(message, request, command::FAIL);
        }

        match parsed {
            Command::Stop => {
                tracing::info!("stop command received, shutting down");
                self.shutdown.trip();
                self.a_reply(message, request, command::SHUTDOWN)
            }
            Command::SetSetting(setting, value) => {
                let accepted = self.apply_setting(setting, &value);
                self.a_reply(
                    message,
                    request,
                    if accepted { command::OK } else { command::FAIL },
                )
            }
            Command::GetSetting(setting) => {
                let addr = self.read_setting(setting);
                self.a_reply(message, request, addr)
            }
            Command::BindRecord(domain, addr) => {
                self.records.bind_ipv4(&domain, addr, DEFAULT_TTL);
                self.a_reply(message, request, addr)
            }
            Command::QueryFilter(domain) => {
                let mode = self.filters.evaluate(&domain);
                self.a_reply(message, request, command::scalar(mode.to_num()))
            }
            Command::SetFilter(domain, mode) => {
                self.filters.set(&domain, mode);
                self.a_reply(message, request, command::OK)
            }
        }
    }

    fn apply_setting(&self, setting: Setting, value: &str) -> bool {
        match setting {
            Setting::UpperDns => match value.parse::<Ipv4Addr>() {
                Ok(addr) => {
                    self.settings.set_upstream(SocketAddr::from((addr, 53)));
                    true
                }
                Err(_) => value
                    .parse::<SocketAddr>()
                    .map(|addr| self.settings.set_upstream(addr))
                    .is_ok(),
            },
            Setting::Warning => value
                .parse::<Ipv4Addr>()
                .map(|addr| self.settings.set_warning_host(addr))
                .is_ok(),
            Setting::Trace => value
                .parse::<Ipv4Addr>()
                .map(|addr| self.settings.set_trace_host(SocketAddr::from((addr, 53))))
                .is_ok(),
            Setting::Local => match value {
                "0" => {
                    self.settings.set_local_only(false);
                    true
                }
                "1" => {
                    self.settings.set_local_only(true);
                    true
                }
                _ => false,
            },
            Setting::Debug => value
                .parse::<u8>()
                .map(|level| self.settings.set_debug_level(level))
                .is_ok(),
            Setting::Ns => {
                match value.parse::<Ipv4Addr>() {
                    Ok(addr) => self.settings.set_public_ip(addr),
                    Err(_) => self.settings.set_ns_name(value.to_string()),
                }
                true
            }
        }
    }

    /// Readbacks answer the setting's address, or a `0.0.0.N` scalar.
    fn read_setting(&self, setting: Setting) -> Ipv4Addr {
        match setting {
            Setting::UpperDns => match self.settings.upstream().ip() {
                IpAddr::V4(addr) => addr,
                IpAddr::V6(_) => command::FAIL,
            },
            Setting::Warning => self.settings.warning_host(),
            Setting::Trace => match self.settings.trace_host().ip() {
                IpAddr::V4(addr) => addr,
                IpAddr::V6(_) => command::FAIL,
            },
            Setting::Local => command::scalar(self.settings.local_only() as u8),
            Setting::Debug => command::scalar(self.settings.debug_level()),
            Setting::Ns => self.settings.public_ip().unwrap_or(command::FAIL),
        }
    }

    /// Answers from the static table: a bound any-address means the name is
    /// known but deliberately unresolvable. `None` falls through upstream.
    fn local_answer(
        &self,
        message: &Message,
        request: &DnsMessage,
        qname: &str,
        qtype: QueryType,
    ) -> Result<Option<Vec<Message>>, HandleError> {
        let Some(entry) = self.records.get(qname) else {
            return Ok(None);
        };
        let record = match qtype {
            QueryType::A => match entry.ipv4 {
                Some(addr) if addr.is_unspecified() => {
                    return self
                        .rcode_reply(message, request, Rcode::Unknown)
                        .map(Some)
                }
                Some(addr) => Record::A {
                    domain: qname.to_string(),
                    addr,
                    ttl: entry.ttl,
                },
                None => return Ok(None),
            },
            QueryType::AAAA => match entry.ipv6 {
                Some(addr) if addr.is_unspecified() => {
                    return self
                        .rcode_reply(message, request, Rcode::Unknown)
                        .map(Some)
                }
                Some(addr) => Record::Aaaa {
                    domain: qname.to_string(),
                    addr,
                    ttl: entry.ttl,
                },
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        let response = DnsMessage::response_from(request).with_answer(record);
        self.reply(message, &response).map(Some)
    }

    fn try_handle(
        &self,
        message: &Message,
        request: &DnsMessage,
    ) -> Result<Vec<Message>, HandleError> {
        let question = request.first_question().ok_or(HandleError::NoQuestion)?;
        let qname = question.name.to_lowercase();
        let qtype = question.qtype;

        // the server answers the reverse lookup of its own address
        if qtype == QueryType::PTR {
            if let Some(ip) = self.settings.public_ip() {
                if qname == reverse_ptr(ip) {
                    let response = DnsMessage::response_from(request).with_answer(Record::Ptr {
                        domain: qname,
                        host: self.settings.ns_name(),
                        ttl: DEFAULT_TTL,
                    });
                    return self.reply(message, &response);
                }
            }
        }

        if !is_served(qtype) {
            tracing::debug!("refusing query type {qtype:?}");
            return self.rcode_reply(message, request, Rcode::Refused);
        }

        if Command::is_command(&qname) {
            return self.execute_command(message, request, &qname);
        }

        let mut produced = Vec::new();
        match self.filters.evaluate(&qname) {
            FilterMode::Pass => {}
            FilterMode::Trace => {
                // the trace server gets a copy; resolution continues
                tracing::debug!("tracing query for {qname:?}");
                produced.push(Message::to(
                    self.settings.trace_host(),
                    message.local,
                    message.bytes(),
                ));
            }
            FilterMode::Warning => {
                return self.a_reply(message, request, self.settings.warning_host())
            }
            FilterMode::Stop => return self.a_reply(message, request, self.settings.stop_host()),
            FilterMode::Reject => return self.rcode_reply(message, request, Rcode::Refused),
        }

        if let Some(replies) = self.local_answer(message, request, &qname, qtype)? {
            produced.extend(replies);
            return Ok(produced);
        }

        produced.extend(self.forward_upstream(message, request)?);
        Ok(produced)
    }
}

impl DnsHandler {
    /// Rebuilds the full addressing of the datagram the way the OS saw it
    /// and parses the DNS payload.
    fn decode(&self, message: &Message) -> Result<(UdpDatagram, DnsMessage), HandleError> {
        let datagram = UdpDatagram::synthesize(message.peer, message.local, message.bytes())?;
        let request = DnsMessage::try_from(datagram.payload())?;
        Ok((datagram, request))
    }
}

#[async_trait::async_trait]
impl nsgate_server::Handler for DnsHandler {
    #[tracing::instrument(skip_all, fields(origin = ?message.peer, id = tracing::field::Empty))]
    async fn handle(&self, message: Message) -> Vec<Message> {
        let (datagram, request) = match self.decode(&message) {
            Ok(decoded) => decoded,
            Err(error) => {
                // not even a DNS message; nothing to answer
                tracing::debug!("unable to read datagram: {error}");
                return Vec::new();
            }
        };
        tracing::Span::current().record("id", request.header.id);

        // replies coming back from the upstream resolver take the relay path
        if request.header.response {
            return self.relay(&message, &request);
        }

        if !self.is_for_us(&datagram) {
            tracing::debug!("datagram for {:?} is not ours, dropped", datagram.dst().ok());
            return Vec::new();
        }

        match self.try_handle(&message, &request) {
            Ok(produced) => produced,
            Err(HandleError::NoQuestion) => {
                tracing::debug!("no question was specified");
                Vec::new()
            }
            Err(error) => {
                if self.settings.debug_level() > 0 {
                    tracing::debug!("session failed: {error}");
                }
                self.rcode_reply(&message, &request, Rcode::Refused)
                    .unwrap_or_default()
            }
        }
    }
}
