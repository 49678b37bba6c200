//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a `tokio-tungstenite` client to
//! verify that frames, close reasons and the outbound pump behave over an
//! actual socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;

    use futures_util::{SinkExt, StreamExt};
    use parlor_transport::{
        pump, CloseReason, Connection, ConnectionHandle, Frame, Transport,
        TransportError, WebSocketConnection, WebSocketTransport,
    };
    use tokio::io::AsyncWriteExt;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on a random port, connects one client, and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let (client, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
        let conn = server.await.expect("task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_websocket_text_round_trip() {
        let (conn, mut client) = connected_pair().await;
        assert!(conn.id().to_string().starts_with("conn-"));

        conn.send("hello from server").await.expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "hello from server");

        client
            .send(Message::text("hello from client"))
            .await
            .unwrap();
        let frame = conn.recv().await.expect("recv should succeed");
        assert_eq!(frame, Frame::Text("hello from client".into()));
    }

    #[tokio::test]
    async fn test_websocket_binary_frame_reported_by_length() {
        let (conn, mut client) = connected_pair().await;

        client
            .send(Message::Binary(vec![1u8, 2, 3].into()))
            .await
            .unwrap();

        let frame = conn.recv().await.expect("recv should succeed");
        assert_eq!(frame, Frame::Binary(3));
    }

    #[tokio::test]
    async fn test_websocket_close_frame_carries_reason() {
        let (conn, mut client) = connected_pair().await;

        client
            .close(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "tab closed".into(),
            }))
            .await
            .unwrap();

        let frame = conn.recv().await.expect("recv should succeed");
        assert_eq!(
            frame,
            Frame::Closed(CloseReason {
                code: 1001,
                description: "tab closed".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_websocket_server_close_reaches_client() {
        let (conn, mut client) = connected_pair().await;

        conn.close().await.expect("close should succeed");

        let msg = client.next().await.unwrap().unwrap();
        assert!(matches!(msg, Message::Close(_)));
    }

    #[tokio::test]
    async fn test_pump_delivers_in_order_and_confirms() {
        let (conn, mut client) = connected_pair().await;
        let conn = Arc::new(conn);
        let (handle, outbox) = ConnectionHandle::channel(conn.id());

        let writer = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { pump(&*conn, outbox).await }
        });

        assert!(handle.send("first".into()));
        let delivered = handle.send_confirmed("second".into());

        delivered.await.expect("second frame should be confirmed");

        let first = client.next().await.unwrap().unwrap();
        let second = client.next().await.unwrap().unwrap();
        assert_eq!(first.into_text().unwrap().as_str(), "first");
        assert_eq!(second.into_text().unwrap().as_str(), "second");

        drop(handle);
        writer
            .await
            .expect("writer task should finish")
            .expect("pump should end cleanly once handles drop");
    }

    #[tokio::test]
    async fn test_bind_taken_port_reports_address() {
        let first = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = first.local_addr().unwrap().to_string();

        let err = WebSocketTransport::bind(&addr)
            .await
            .err()
            .expect("second bind should fail");

        assert!(matches!(&err, TransportError::Bind { addr: a, .. } if *a == addr));
    }

    #[tokio::test]
    async fn test_accept_plain_tcp_peer_fails_handshake() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap();

        let server = tokio::spawn(async move { transport.accept().await });
        let mut peer = tokio::net::TcpStream::connect(addr).await.unwrap();
        peer.write_all(b"hello, not http\r\n\r\n").await.unwrap();
        drop(peer);

        let result = server.await.expect("task should complete");
        assert!(matches!(result, Err(TransportError::Handshake(_))));
    }
}
