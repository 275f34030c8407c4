use clap::Args;
use nsgate_proto::QueryType;

/// Resolves a domain name through the configured resolver
#[derive(Args, Debug)]
pub struct Command {
    /// Domain name to resolve
    domain: String,
    /// Query AAAA records instead of A
    #[arg(long)]
    ipv6: bool,
}

impl Command {
    pub async fn run(&self, config: crate::config::Config) {
        let client = config
            .lookup
            .build()
            .await
            .expect("unable to build dns client");
        let qtype = if self.ipv6 {
            QueryType::AAAA
        } else {
            QueryType::A
        };
        match client.address_list(&self.domain, qtype).await {
            Ok(addresses) if addresses.is_empty() => {
                println!("no answer for {}", self.domain);
            }
            Ok(addresses) => {
                for address in addresses {
                    println!("{address}");
                }
            }
            Err(error) => eprintln!("resolution failed: {error}"),
        }
    }
}
