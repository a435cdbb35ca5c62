#![cfg(feature = "worker")]

use std::collections::HashSet;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use jobwire::frame::{Frame, AVAILABILITY_REQUEST};
use jobwire::worker::{
    connect, AvailabilityResponse, ClientPhase, InboundMessage, Job, JobType, OutboundMessage,
    RegisterAck, SessionEnd, WorkerClient, WorkerError,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

const TIMEOUT: Duration = Duration::from_secs(5);

type Handshake = Result<Response, ErrorResponse>;

/// Dispatcher side of one accepted session.
struct Dispatcher {
    ws: WebSocketStream<TcpStream>,
    auth: Option<String>,
}

impl Dispatcher {
    async fn send(&mut self, message: InboundMessage) {
        let payload = message.encode().expect("dispatcher message should encode");
        self.ws
            .send(Message::Binary(payload))
            .await
            .expect("dispatcher send should succeed");
    }

    async fn send_raw(&mut self, payload: Bytes) {
        self.ws
            .send(Message::Binary(payload))
            .await
            .expect("dispatcher send should succeed");
    }

    async fn recv(&mut self) -> OutboundMessage {
        loop {
            let next = tokio::time::timeout(TIMEOUT, self.ws.next())
                .await
                .expect("worker message should arrive")
                .expect("session should still be open")
                .expect("read should succeed");
            if let Message::Binary(payload) = next {
                return OutboundMessage::decode(payload)
                    .expect("worker message should decode")
                    .expect("worker message kind should be known");
            }
        }
    }

    async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(Message::Binary(payload)))) =
            tokio::time::timeout(window, self.ws.next()).await
        {
            panic!("unexpected worker message: {:?}", OutboundMessage::decode(payload));
        }
    }
}

/// Start a worker against a fresh local dispatcher and return both ends.
async fn session(job_type: JobType) -> (WorkerClient, Dispatcher) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/agent", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = |req: &Request, resp: Response| -> Handshake {
            let auth = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let _ = tx.send(auth);
            Ok(resp)
        };
        accept_hdr_async(stream, callback).await.unwrap()
    });

    let client = connect(&url, "test-token", job_type).await.unwrap();
    let ws = accept.await.unwrap();
    let auth = rx.await.unwrap();
    (client, Dispatcher { ws, auth })
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition should hold before timeout");
}

async fn registered(job_type: JobType) -> (WorkerClient, Dispatcher) {
    let (client, mut dispatcher) = session(job_type).await;
    client.register().await.unwrap();
    let _ = dispatcher.recv().await;
    dispatcher.send(InboundMessage::RegisterAck(RegisterAck::default())).await;
    wait_until(|| client.phase() == ClientPhase::Active).await;
    (client, dispatcher)
}

#[tokio::test]
async fn register_then_ack_activates_worker() {
    let (client, mut dispatcher) = session(JobType::Room).await;
    assert_eq!(dispatcher.auth.as_deref(), Some("Bearer test-token"));
    assert_eq!(client.phase(), ClientPhase::Connected);

    client.register().await.unwrap();
    match dispatcher.recv().await {
        OutboundMessage::Register(identity) => {
            assert_eq!(identity.worker_id(), client.identity().worker_id());
            assert_eq!(identity.job_type(), JobType::Room);
        }
        other => panic!("expected register, got {other:?}"),
    }

    dispatcher
        .send(InboundMessage::RegisterAck(RegisterAck {
            worker_id: Some(client.identity().worker_id().to_string()),
        }))
        .await;
    wait_until(|| client.state().registered() == 1).await;
    wait_until(|| client.phase() == ClientPhase::Active).await;

    client.close().await;
}

#[tokio::test]
async fn every_ack_is_counted_and_register_runs_once() {
    let (client, mut dispatcher) = registered(JobType::Room).await;

    dispatcher.send(InboundMessage::RegisterAck(RegisterAck::default())).await;
    dispatcher.send(InboundMessage::RegisterAck(RegisterAck::default())).await;
    wait_until(|| client.state().registered() == 3).await;

    let err = client.register().await.unwrap_err();
    assert!(matches!(
        err,
        WorkerError::InvalidState {
            expected: ClientPhase::Connected,
            actual: ClientPhase::Active,
        }
    ));

    client.close().await;
}

#[tokio::test]
async fn availability_request_gets_one_positive_answer() {
    let (client, mut dispatcher) = registered(JobType::Room).await;

    dispatcher
        .send(InboundMessage::AvailabilityRequest(Job::new("J1", JobType::Room)))
        .await;

    let response = dispatcher.recv().await;
    assert_eq!(
        response,
        OutboundMessage::AvailabilityResponse(AvailabilityResponse {
            job_id: "J1".to_string(),
            available: true,
        })
    );
    dispatcher.expect_silence(Duration::from_millis(100)).await;

    assert_eq!(client.state().availability_count(JobType::Room), 1);
    assert_eq!(client.state().availability_count(JobType::Publisher), 0);

    client.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_answers_are_never_interleaved() {
    let (client, mut dispatcher) = registered(JobType::Publisher).await;

    for i in 0..50 {
        let job = Job::new(format!("J{i}"), JobType::Publisher);
        dispatcher.send(InboundMessage::AvailabilityRequest(job)).await;
    }

    let mut answered = HashSet::new();
    for _ in 0..50 {
        match dispatcher.recv().await {
            OutboundMessage::AvailabilityResponse(resp) => {
                assert!(resp.available);
                answered.insert(resp.job_id);
            }
            other => panic!("expected availability response, got {other:?}"),
        }
    }
    assert_eq!(answered.len(), 50);
    wait_until(|| client.state().availability_count(JobType::Publisher) == 50).await;

    client.close().await;
}

#[tokio::test]
async fn assignments_count_per_category_without_reply() {
    let (client, mut dispatcher) = registered(JobType::Publisher).await;

    dispatcher
        .send(InboundMessage::JobAssignment(Job::new("J2", JobType::Publisher)))
        .await;
    dispatcher
        .send(InboundMessage::JobAssignment(Job::new("J3", JobType::Room)))
        .await;

    wait_until(|| {
        client.state().job_count(JobType::Publisher) == 1
            && client.state().job_count(JobType::Room) == 1
    })
    .await;
    dispatcher.expect_silence(Duration::from_millis(100)).await;

    let snapshot = client.state().snapshot();
    assert_eq!(snapshot.room_availability_count, 0);
    assert_eq!(snapshot.participant_availability_count, 0);

    client.close().await;
}

#[tokio::test]
async fn unknown_kinds_are_skipped() {
    let (client, mut dispatcher) = session(JobType::Room).await;

    let unknown = Frame::new(900, b"{\"future\":true}".to_vec()).to_bytes().unwrap();
    dispatcher.send_raw(unknown).await;
    dispatcher.send(InboundMessage::RegisterAck(RegisterAck::default())).await;

    wait_until(|| client.state().registered() == 1).await;
    assert_eq!(client.session_end(), None);

    client.close().await;
}

#[tokio::test]
async fn malformed_frame_ends_session() {
    let (client, mut dispatcher) = registered(JobType::Room).await;

    dispatcher.send_raw(Bytes::from_static(b"not a frame")).await;

    let end = tokio::time::timeout(TIMEOUT, client.session_ended())
        .await
        .expect("receive loop should stop");
    assert_eq!(end, SessionEnd::DecodeFailed);

    // Frames after the bad one are never processed.
    dispatcher.send(InboundMessage::RegisterAck(RegisterAck::default())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.state().registered(), 1);

    client.close().await;
}

#[tokio::test]
async fn peer_close_ends_session_and_later_sends_fail() {
    let (client, mut dispatcher) = registered(JobType::Room).await;

    dispatcher.ws.close(None).await.unwrap();

    let end = tokio::time::timeout(TIMEOUT, client.session_ended())
        .await
        .expect("receive loop should stop");
    assert_eq!(end, SessionEnd::ClosedByPeer);

    let err = client
        .send(&OutboundMessage::availability("late", true))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Send(_)));

    client.close().await;
}

#[tokio::test]
async fn close_is_idempotent_and_sends_normal_closure() {
    let (client, mut dispatcher) = registered(JobType::Room).await;

    client.close().await;
    client.close().await;

    assert_eq!(client.phase(), ClientPhase::Closed);
    assert_eq!(client.session_end(), Some(SessionEnd::Shutdown));

    let err = client
        .send(&OutboundMessage::availability("J9", true))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Send(_)));
    assert!(matches!(
        client.register().await,
        Err(WorkerError::Send(_))
    ));

    let close = tokio::time::timeout(TIMEOUT, async {
        loop {
            match dispatcher.ws.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("close frame should arrive");
    assert_eq!(close.map(|frame| frame.code), Some(CloseCode::Normal));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn close_during_requests_leaves_only_whole_answers() {
    let (client, mut dispatcher) = registered(JobType::Room).await;

    for i in 0..20 {
        let job = Job::new(format!("R{i}"), JobType::Room);
        dispatcher.send(InboundMessage::AvailabilityRequest(job)).await;
    }
    client.close().await;
    assert_eq!(client.phase(), ClientPhase::Closed);

    // Answers sent before the close frame arrive intact.
    let mut answered = 0;
    let close = tokio::time::timeout(TIMEOUT, async {
        loop {
            match dispatcher.ws.next().await {
                Some(Ok(Message::Binary(payload))) => {
                    match OutboundMessage::decode(payload) {
                        Ok(Some(OutboundMessage::AvailabilityResponse(resp))) => {
                            assert!(resp.available);
                            answered += 1;
                        }
                        other => panic!("unexpected worker message: {other:?}"),
                    }
                }
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("close frame should arrive");
    assert_eq!(close.map(|frame| frame.code), Some(CloseCode::Normal));
    assert!(answered <= 20);

    // Handlers that lose the race have already counted the request.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(client.state().availability_count(JobType::Room) >= answered);
}

#[tokio::test]
async fn unrecognized_job_type_is_answered_as_participant_work() {
    let (client, mut dispatcher) = registered(JobType::Publisher).await;

    let body = br#"{"job":{"id":"P1","type":"JT_PARTICIPANT"}}"#.to_vec();
    let request = Frame::new(AVAILABILITY_REQUEST, body).to_bytes().unwrap();
    dispatcher.send_raw(request).await;

    assert_eq!(
        dispatcher.recv().await,
        OutboundMessage::availability("P1", true)
    );
    wait_until(|| client.state().availability_count(JobType::Publisher) == 1).await;
    assert_eq!(client.session_end(), None);

    // The session keeps serving later requests.
    dispatcher
        .send(InboundMessage::AvailabilityRequest(Job::new("P2", JobType::Publisher)))
        .await;
    assert_eq!(
        dispatcher.recv().await,
        OutboundMessage::availability("P2", true)
    );

    client.close().await;
}

#[tokio::test]
async fn dropping_client_releases_session() {
    let (client, mut dispatcher) = registered(JobType::Room).await;
    drop(client);

    tokio::time::timeout(TIMEOUT, async {
        loop {
            match dispatcher.ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("dispatcher should observe the session ending");
}
