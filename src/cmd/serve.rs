use crate::dns::forward::ForwardTable;
use crate::dns::handler::DnsHandler;
use crate::dns::settings::Settings;
use clap::Args;
use nsgate_server::shutdown::ShutdownFlag;
use nsgate_server::UdpServer;
use std::sync::Arc;

/// Starts the DNS server, the core of the machine
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub async fn run(&self, config: crate::config::Config) {
        tracing::info!("preparing dns server");
        let address = config.dns.address();
        let settings = Arc::new(Settings::new(&config.dns));
        let records = Arc::new(config.records.build());
        let filters = Arc::new(config.filters.build());
        let shutdown = ShutdownFlag::new();
        let handler = DnsHandler::new(
            settings,
            records,
            filters,
            Arc::new(ForwardTable::new()),
            shutdown.clone(),
        );

        tracing::info!("listening on {address}");
        UdpServer::bind(address, handler, shutdown)
            .await
            .expect("unable to bind udp server")
            .run()
            .await
            .expect("unable to run udp server")
    }
}
