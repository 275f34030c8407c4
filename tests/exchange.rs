use nsgate_proto::{DnsHeader, DnsMessage, QueryType, Question, Record};
use std::net::Ipv4Addr;
use tokio::net::UdpSocket;

/// Sends a serialized message to `target` and waits for one datagram back.
async fn exchange(buffer: &[u8], target: std::net::SocketAddr) -> (usize, [u8; 512]) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.send_to(buffer, target).await.unwrap();

    let mut response = [0u8; 512];
    let duration = std::time::Duration::from_secs(2);
    let (size, _) = tokio::time::timeout(duration, socket.recv_from(&mut response))
        .await
        .expect("no answer in time")
        .unwrap();
    (size, response)
}

/// A query survives a real socket hop and parses back into the answer the
/// far side produced.
#[tokio::test]
async fn round_trips_query_and_answer_over_udp() {
    let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = responder.local_addr().unwrap();

    let serve = async {
        let mut buffer = [0u8; 512];
        let (size, peer) = responder.recv_from(&mut buffer).await.unwrap();
        let request = DnsMessage::try_from(&buffer[..size]).unwrap();
        assert_eq!(request.questions[0].name, "perdu.com");
        assert_eq!(request.questions[0].qtype, QueryType::A);

        let reply = DnsMessage::response_from(&request).with_answer(Record::A {
            domain: "perdu.com".into(),
            addr: Ipv4Addr::new(208, 97, 177, 124),
            ttl: 300,
        });
        let reply = reply.create_buffer().unwrap();
        responder.send_to(reply.as_slice(), peer).await.unwrap();
    };

    let query = DnsMessage::new(DnsHeader::question(2))
        .with_question(Question::new("perdu.com", QueryType::A));
    let buffer = query.create_buffer().unwrap();

    let ((size, raw), _) = tokio::join!(exchange(buffer.as_slice(), target), serve);
    let response = DnsMessage::try_from(&raw[..size]).unwrap();

    assert_eq!(response.header.id, 2);
    assert!(response.header.response);
    assert_eq!(
        response.answers,
        vec![Record::A {
            domain: "perdu.com".into(),
            addr: Ipv4Addr::new(208, 97, 177, 124),
            ttl: 300,
        }]
    );
}
