use futures::stream::StreamExt;
use prelude::Message;
use shutdown::ShutdownFlag;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

pub mod prelude;
pub mod receiver;
pub mod sender;
pub mod shutdown;

#[async_trait::async_trait]
pub trait Handler {
    /// Returns the datagrams this one produces: nothing, a reply, or a reply
    /// plus side-channel messages (an upstream forward, a trace clone).
    async fn handle(&self, message: Message) -> Vec<Message>;
}

/// A UDP server around a single socket. Sessions are dispatched one at a
/// time: every produced datagram is written before the next receive, and the
/// shutdown flag is polled between iterations.
pub struct UdpServer<H> {
    socket: Arc<UdpSocket>,
    handler: H,
    shutdown: ShutdownFlag,
}

impl<H: Handler> UdpServer<H> {
    pub async fn bind(
        address: SocketAddr,
        handler: H,
        shutdown: ShutdownFlag,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(address).await?;
        Ok(Self {
            socket: Arc::new(socket),
            handler,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn run(self) -> std::io::Result<()> {
        let receiver = receiver::Receiver::new(self.socket.clone());
        let sender = sender::Sender::new(self.socket);

        let stream = receiver.into_stream();
        tokio::pin!(stream);

        while !self.shutdown.is_tripped() {
            let Some(message) = stream.next().await else {
                break;
            };
            for item in self.handler.handle(message).await {
                if let Err(error) = sender.send(&item).await {
                    tracing::error!("couldn't send message to {:?}: {error:?}", item.peer);
                }
            }
        }

        tracing::info!("server loop stopped");
        Ok(())
    }
}
