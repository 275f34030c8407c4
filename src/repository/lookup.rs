use nsgate_proto::{transaction_id, DnsHeader, DnsMessage, QueryType, Question, Record};
use std::io::Result;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;

/// A CNAME chain longer than this is abandoned.
const MAX_CNAME_DEPTH: usize = 4;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "Config::default_server")]
    pub server: SocketAddr,
    #[serde(default = "Config::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "Config::default_retries")]
    pub retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            server: Self::default_server(),
            timeout_ms: Self::default_timeout_ms(),
            retries: Self::default_retries(),
        }
    }
}

impl Config {
    fn default_bind() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
    }

    fn default_server() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(1, 1, 1, 1), 53))
    }

    fn default_timeout_ms() -> u64 {
        2000
    }

    fn default_retries() -> u32 {
        2
    }
}

impl Config {
    pub async fn build(self) -> Result<DnsClient> {
        DnsClient::new(self).await
    }
}

/// Blocking request/response DNS client: send, await the matching reply,
/// resend on timeout until the retry budget runs out.
pub struct DnsClient {
    socket: UdpSocket,
    server: SocketAddr,
    timeout: Duration,
    retries: u32,
    index: AtomicU16,
}

impl DnsClient {
    async fn new(config: Config) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind).await?;
        Ok(Self {
            socket,
            server: config.server,
            timeout: Duration::from_millis(config.timeout_ms),
            retries: config.retries,
            index: AtomicU16::new(1),
        })
    }

    /// Sends the query and waits for the reply carrying the same transaction
    /// id. `None` means every attempt timed out.
    #[tracing::instrument(skip_all, fields(id = message.header.id))]
    pub async fn query(&self, message: &DnsMessage) -> Result<Option<DnsMessage>> {
        let buffer = message.create_buffer()?;
        let request = buffer.as_slice();

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tracing::debug!("retrying, attempt {attempt}");
            }
            self.socket.send_to(request, self.server).await?;

            let deadline = tokio::time::Instant::now() + self.timeout;
            loop {
                let mut raw = [0u8; 512];
                match tokio::time::timeout_at(deadline, self.socket.recv_from(&mut raw)).await {
                    Ok(Ok((size, _))) => {
                        // a stray datagram with a foreign id is not ours
                        if transaction_id(&raw[..size]) != transaction_id(request) {
                            continue;
                        }
                        return Ok(Some(DnsMessage::try_from(&raw[..size])?));
                    }
                    Ok(Err(error)) => return Err(error),
                    Err(_) => break,
                }
            }
        }

        tracing::debug!("no answer after {} attempts", self.retries + 1);
        Ok(None)
    }

    /// Resolves a domain to addresses, chasing CNAME chains.
    pub async fn address_list(&self, domain: &str, qtype: QueryType) -> Result<Vec<IpAddr>> {
        let mut current = domain.to_lowercase();
        let mut found = Vec::new();

        for _ in 0..=MAX_CNAME_DEPTH {
            let request = DnsMessage::new(DnsHeader::question(self.next_id()))
                .with_question(Question::new(current.clone(), qtype));
            let Some(response) = self.query(&request).await? else {
                break;
            };

            for record in &response.answers {
                match record {
                    Record::A { addr, .. } if qtype == QueryType::A => {
                        found.push(IpAddr::V4(*addr));
                    }
                    Record::Aaaa { addr, .. } if qtype == QueryType::AAAA => {
                        found.push(IpAddr::V6(*addr));
                    }
                    _ => {}
                }
            }
            if !found.is_empty() {
                break;
            }
            // nothing direct: follow the alias if the server handed one out
            match response.cnames().last() {
                Some(next) => current = next.to_string(),
                None => break,
            }
        }

        Ok(found)
    }

    fn next_id(&self) -> u16 {
        match self.index.fetch_add(1, Ordering::SeqCst) {
            0 => self.index.fetch_add(1, Ordering::SeqCst),
            id => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DnsClient};
    use nsgate_proto::{DnsHeader, DnsMessage, QueryType, Question, Record};
    use std::net::Ipv4Addr;
    use tokio::net::UdpSocket;

    async fn client_against(server: &UdpSocket, retries: u32) -> DnsClient {
        Config {
            server: server.local_addr().unwrap(),
            timeout_ms: 200,
            retries,
            ..Default::default()
        }
        .build()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_match_reply_by_transaction_id() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client_against(&server, 0).await;

        let request = DnsMessage::new(DnsHeader::question(0x1234))
            .with_question(Question::new("perdu.com", QueryType::A));

        let exchange = async {
            let mut buffer = [0u8; 512];
            let (size, peer) = server.recv_from(&mut buffer).await.unwrap();
            let received = DnsMessage::try_from(&buffer[..size]).unwrap();

            // a reply under a wrong id first: the client must ignore it
            let mut stray = DnsMessage::response_from(&received);
            stray.header.id = 0x9999;
            let stray = stray.create_buffer().unwrap();
            server.send_to(stray.as_slice(), peer).await.unwrap();

            let reply = DnsMessage::response_from(&received).with_answer(Record::A {
                domain: "perdu.com".into(),
                addr: Ipv4Addr::new(10, 2, 3, 4),
                ttl: 60,
            });
            let reply = reply.create_buffer().unwrap();
            server.send_to(reply.as_slice(), peer).await.unwrap();
        };

        let (response, _) = tokio::join!(client.query(&request), exchange);
        let response = response.unwrap().expect("should have an answer");
        assert_eq!(response.header.id, 0x1234);
        assert_eq!(response.answers.len(), 1);
    }

    #[tokio::test]
    async fn should_return_none_after_retries() {
        // a server that never answers
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client_against(&server, 1).await;

        let request = DnsMessage::new(DnsHeader::question(7))
            .with_question(Question::new("perdu.com", QueryType::A));
        let response = client.query(&request).await.unwrap();
        assert!(response.is_none());

        // both the first try and the retry reached the server
        let mut buffer = [0u8; 512];
        let (first, _) = server.recv_from(&mut buffer).await.unwrap();
        let (second, _) = server.recv_from(&mut buffer).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn should_chase_cname_chain() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = client_against(&server, 0).await;

        let exchange = async {
            // first query answered with an alias only
            let mut buffer = [0u8; 512];
            let (size, peer) = server.recv_from(&mut buffer).await.unwrap();
            let received = DnsMessage::try_from(&buffer[..size]).unwrap();
            assert_eq!(received.questions[0].name, "www.example.com");
            let reply = DnsMessage::response_from(&received).with_answer(Record::Cname {
                domain: "www.example.com".into(),
                host: "example.com".into(),
                ttl: 60,
            });
            let reply = reply.create_buffer().unwrap();
            server.send_to(reply.as_slice(), peer).await.unwrap();

            // second query for the alias target gets the address
            let (size, peer) = server.recv_from(&mut buffer).await.unwrap();
            let received = DnsMessage::try_from(&buffer[..size]).unwrap();
            assert_eq!(received.questions[0].name, "example.com");
            let reply = DnsMessage::response_from(&received).with_answer(Record::A {
                domain: "example.com".into(),
                addr: Ipv4Addr::new(93, 184, 216, 34),
                ttl: 60,
            });
            let reply = reply.create_buffer().unwrap();
            server.send_to(reply.as_slice(), peer).await.unwrap();
        };

        let (addresses, _) = tokio::join!(
            client.address_list("www.example.com", QueryType::A),
            exchange
        );
        let addresses = addresses.unwrap();
        assert_eq!(addresses, vec!["93.184.216.34".parse::<std::net::IpAddr>().unwrap()]);
    }
}
