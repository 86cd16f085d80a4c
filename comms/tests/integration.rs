use std::{io as stdio, num::NonZeroUsize};

use comms::{
    Identity, Key, NetTransport, OnoReceiver, OnoSender, Transport,
    msg::{Command, Msg, Payload},
};
use tokio::{
    io::{self, DuplexStream, ReadHalf, WriteHalf},
    task::JoinHandle,
};

type Rx = OnoReceiver<ReadHalf<DuplexStream>>;
type Tx = OnoSender<WriteHalf<DuplexStream>>;

fn channel_pair() -> ((Rx, Tx), (Rx, Tx)) {
    let (one, two) = io::duplex(4096);
    let (rx, tx) = io::split(one);
    let worker = comms::channel(rx, tx);
    let (rx, tx) = io::split(two);
    let server = comms::channel(rx, tx);
    (worker, server)
}

/// A server holding a single scalar per key, it answers pushes with `tag + grad[0]`.
fn fake_server(tag: f32, (mut rx, mut tx): (Rx, Tx)) -> JoinHandle<stdio::Result<Vec<String>>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        let mut rx_buf: Vec<u32> = Vec::new();

        loop {
            let msg: Msg = rx.recv_into(&mut rx_buf).await?;
            match msg {
                Msg::Control(Command::Hello(identity)) => seen.push(identity.node_id().to_string()),
                Msg::Control(Command::Disconnect) => {
                    tx.send(&Msg::Control(Command::Disconnect)).await?;
                    return Ok(seen);
                }
                Msg::Data(Payload::Pull { key, len }) => {
                    seen.push(key.to_string());
                    let params = vec![tag; len];
                    tx.send(&Msg::Data(Payload::Params { key, params: &params })).await?;
                }
                Msg::Data(Payload::Push { key, grad }) if key == "x_bad" || grad.is_empty() => {
                    tx.send(&Msg::Err("empty gradient".into())).await?;
                }
                Msg::Data(Payload::Push { key, grad }) => {
                    seen.push(key.to_string());
                    let params: Vec<f32> = grad.iter().map(|g| tag + g).collect();
                    tx.send(&Msg::Data(Payload::Params { key, params: &params })).await?;
                }
                msg => panic!("unexpected message {msg:?}"),
            }
        }
    })
}

#[tokio::test]
async fn frames_survive_the_stream() {
    let ((_, mut tx), (mut rx, _)) = channel_pair();

    let grad = [0.5, 1.5, -4.0];
    tx.send(&Msg::Data(Payload::Push { key: "w_7", grad: &grad }))
        .await
        .unwrap();
    tx.send(&Msg::Err("boom".into())).await.unwrap();

    let mut buf: Vec<u32> = Vec::new();
    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Data(Payload::Push { key, grad: got }) => {
            assert_eq!(key, "w_7");
            assert_eq!(got, grad);
        }
        msg => panic!("expected a push, got {msg:?}"),
    }

    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Err(detail) => assert_eq!(detail, "boom"),
        msg => panic!("expected an error, got {msg:?}"),
    }
}

#[tokio::test]
async fn routes_keys_by_layer_index() {
    let (w0, s0) = channel_pair();
    let (w1, s1) = channel_pair();
    let h0 = fake_server(0., s0);
    let h1 = fake_server(100., s1);

    let mut transport = NetTransport::new();
    transport.spawn(w0.0, w0.1);
    transport.spawn(w1.0, w1.1);

    let identity = Identity::new("worker-a", 0, NonZeroUsize::new(1).unwrap()).unwrap();
    transport.connect(&identity).await.unwrap();

    let mut buf = [0.; 2];
    transport
        .pull_weight(&mut buf, &Key::parse("w_1").unwrap())
        .await
        .unwrap();
    assert_eq!(buf, [100.; 2]);

    transport
        .push_grad_and_pull_weight(&[1., 2.], &mut buf, &Key::parse("bd_2").unwrap())
        .await
        .unwrap();
    assert_eq!(buf, [1., 2.]);

    transport.disconnect().await.unwrap();

    assert_eq!(h0.await.unwrap().unwrap(), ["worker-a", "bd_2"]);
    assert_eq!(h1.await.unwrap().unwrap(), ["worker-a", "w_1"]);
}

#[tokio::test]
async fn slices_long_tensors_across_servers() {
    let (w0, s0) = channel_pair();
    let (w1, s1) = channel_pair();
    let h0 = fake_server(0., s0);
    let h1 = fake_server(100., s1);

    let mut transport = NetTransport::new().with_min_slice_len(4);
    transport.spawn(w0.0, w0.1);
    transport.spawn(w1.0, w1.1);

    let key = Key::parse("w_1").unwrap();
    assert_eq!(transport.route(&key, 3), [(1, 0..3)]);
    assert_eq!(transport.route(&key, 5), [(0, 0..2), (1, 2..5)]);

    let mut buf = [0.; 5];
    transport.pull_weight(&mut buf, &key).await.unwrap();
    assert_eq!(buf, [0., 0., 100., 100., 100.]);

    let grad = [1., 2., 3., 4., 5.];
    transport
        .push_grad_and_pull_weight(&grad, &mut buf, &key)
        .await
        .unwrap();
    assert_eq!(buf, [1., 2., 103., 104., 105.]);

    transport.disconnect().await.unwrap();

    assert_eq!(h0.await.unwrap().unwrap(), ["w_1", "w_1"]);
    assert_eq!(h1.await.unwrap().unwrap(), ["w_1", "w_1"]);
}

#[tokio::test]
async fn rejects_gradients_of_another_length() {
    let (worker, server) = channel_pair();
    let _server = fake_server(0., server);

    let mut transport = NetTransport::new();
    transport.spawn(worker.0, worker.1);

    let mut buf = [0.; 2];
    let err = transport
        .push_grad_and_pull_weight(&[1.], &mut buf, &Key::parse("w_0").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), stdio::ErrorKind::InvalidInput);
}

#[tokio::test]
async fn server_errors_are_reported_with_the_key() {
    let (worker, server) = channel_pair();
    let _server = fake_server(0., server);

    let mut transport = NetTransport::new();
    transport.spawn(worker.0, worker.1);

    let mut buf = [0.; 0];
    let err = transport
        .push_grad_and_pull_weight(&[], &mut buf, &Key::parse("w_0").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), stdio::ErrorKind::InvalidData);
    assert!(err.to_string().contains("w_0"));
}

#[tokio::test]
async fn rejects_replies_of_another_length() {
    let (worker, (mut rx, mut tx)) = channel_pair();

    let server = tokio::spawn(async move {
        let mut rx_buf: Vec<u32> = Vec::new();
        let _: Msg = rx.recv_into(&mut rx_buf).await.unwrap();
        let params = [1.; 3];
        tx.send(&Msg::Data(Payload::Params { key: "w_0", params: &params }))
            .await
            .unwrap();
    });

    let mut transport = NetTransport::new();
    transport.spawn(worker.0, worker.1);

    let mut buf = [0.; 2];
    let err = transport
        .pull_weight(&mut buf, &Key::parse("w_0").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), stdio::ErrorKind::InvalidData);
    server.await.unwrap();
}

#[tokio::test]
async fn fails_without_servers() {
    let mut transport: NetTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>> =
        NetTransport::new();

    let mut buf = [0.; 1];
    let err = transport
        .pull_weight(&mut buf, &Key::parse("b_0").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), stdio::ErrorKind::NotConnected);
}

#[tokio::test]
async fn rejects_oversized_frames() {
    use tokio::io::AsyncWriteExt;

    let (mut raw, other) = io::duplex(64);
    let (rx, _tx) = io::split(other);
    let (mut rx, _) = comms::channel(rx, io::sink());

    raw.write_all(&(comms::MAX_FRAME_LEN as u64 + 1).to_be_bytes())
        .await
        .unwrap();

    let mut buf: Vec<u32> = Vec::new();
    let err = rx.recv_into::<Msg, _>(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), stdio::ErrorKind::InvalidData);
    assert!(buf.is_empty());
}
