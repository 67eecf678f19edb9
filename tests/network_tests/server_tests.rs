//! Server Tests
//!
//! End-to-end calls through a real TCP server on an ephemeral port:
//! - Unary calls and error codes
//! - Client-streaming create and server-streaming list
//! - Clients that misbehave or leave mid-stream
//! - Graceful shutdown

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use roster::network::{Client, Server};
use roster::protocol::{encode_request, read_response, ErrorCode, Request, Response};
use roster::service::CancelToken;
use roster::{
    Config, Medal, MedalTier, NewTrainer, RosterError, TrainerId, TrainerService, UpdateTrainer,
};

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    service: Arc<TrainerService>,
    shutdown: CancelToken,
    handle: Option<JoinHandle<roster::Result<()>>>,
}

impl TestServer {
    fn start() -> Self {
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .worker_threads(2)
            .read_timeout_ms(2000)
            .build();
        let service = Arc::new(TrainerService::open(&config).unwrap());
        let server = Server::bind(config, Arc::clone(&service)).unwrap();

        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.run());

        Self {
            addr,
            service,
            shutdown,
            handle: Some(handle),
        }
    }

    fn client(&self) -> Client {
        Client::connect(self.addr).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

// =============================================================================
// Unary Call Tests
// =============================================================================

#[test]
fn test_ping() {
    let server = TestServer::start();
    let mut client = server.client();

    client.ping().unwrap();
    client.ping().unwrap();
}

#[test]
fn test_create_get_update_delete_roundtrip() {
    let server = TestServer::start();
    let mut client = server.client();

    let summary = client
        .create(vec![
            NewTrainer::new("Ash", 10).with_medal(Medal::new("kanto", MedalTier::Gold))
        ])
        .unwrap();
    assert_eq!(summary.success_count, 1);
    let ash = summary.trainers[0].clone();

    let fetched = client.get(ash.id.as_str()).unwrap();
    assert_eq!(fetched, ash);

    let updated = client
        .update(&UpdateTrainer::new(ash.id.as_str(), "Ash Ketchum", 18))
        .unwrap();
    assert_eq!(updated.name, "Ash Ketchum");
    assert!(updated.medals.is_empty());

    let removed = client.delete(ash.id.as_str()).unwrap();
    assert_eq!(removed.id, ash.id);

    assert!(matches!(client.get(ash.id.as_str()), Err(RosterError::NotFound(_))));
}

#[test]
fn test_error_codes_reach_the_client() {
    let server = TestServer::start();
    let mut client = server.client();

    assert!(matches!(client.get("bad-id"), Err(RosterError::InvalidArgument(_))));
    assert!(matches!(
        client.delete(TrainerId::generate().as_str()),
        Err(RosterError::NotFound(_))
    ));

    let ids: Vec<TrainerId> = client
        .create(vec![NewTrainer::new("Ana", 20), NewTrainer::new("Bob", 20)])
        .unwrap()
        .trainers
        .into_iter()
        .map(|t| t.id)
        .collect();

    match client.update(&UpdateTrainer::new(ids[1].as_str(), "ANA", 20)) {
        Err(RosterError::AlreadyExists(msg)) => assert!(msg.contains("ANA")),
        other => panic!("Expected AlreadyExists, got {:?}", other),
    }

    // The connection stays usable after failed calls
    client.ping().unwrap();
}

// =============================================================================
// Streaming Tests
// =============================================================================

#[test]
fn test_empty_create_stream() {
    let server = TestServer::start();
    let mut client = server.client();

    let summary = client.create(Vec::new()).unwrap();

    assert_eq!(summary.success_count, 0);
    assert!(summary.trainers.is_empty());
}

#[test]
fn test_list_streams_matches() {
    let server = TestServer::start();
    let mut client = server.client();

    client
        .create(vec![
            NewTrainer::new("Gary Oak", 10),
            NewTrainer::new("Professor Oak", 60),
            NewTrainer::new("Misty", 12),
        ])
        .unwrap();

    let found = client.list_by_name("OAK").unwrap();
    let mut names: Vec<String> = found.into_iter().map(|t| t.name).collect();
    names.sort();
    assert_eq!(names, vec!["Gary Oak", "Professor Oak"]);

    assert!(client.list_by_name("brock").unwrap().is_empty());
}

#[test]
fn test_clients_are_served_concurrently() {
    let server = TestServer::start();

    let mut idle = server.client();
    idle.ping().unwrap();

    // A second client is served while the first one stays connected
    let mut busy = server.client();
    let summary = busy.create(vec![NewTrainer::new("Brock", 15)]).unwrap();
    assert_eq!(summary.success_count, 1);

    idle.ping().unwrap();
}

// =============================================================================
// Misbehaving Client Tests
// =============================================================================

#[test]
fn test_unknown_frame_gets_error_reply() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    stream.write_all(&[0x7f, 0, 0, 0, 0]).unwrap();

    match read_response(&mut stream).unwrap() {
        Response::Error { code, .. } => assert_eq!(code, ErrorCode::Internal),
        other => panic!("Expected ERROR, got {:?}", other),
    }
}

#[test]
fn test_client_leaving_mid_create_keeps_accepted() {
    let server = TestServer::start();

    {
        let mut stream = TcpStream::connect(server.addr).unwrap();
        for name in ["Ash", "Misty"] {
            let frame = encode_request(&Request::CreateTrainer(NewTrainer::new(name, 10))).unwrap();
            stream.write_all(&frame).unwrap();
        }
        stream.flush().unwrap();
        // Dropped without CREATE_END
    }

    let service = Arc::clone(&server.service);
    assert!(wait_until(|| service.mirror().len() == 2));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_shutdown_stops_run() {
    let mut server = TestServer::start();
    server.client().ping().unwrap();

    server.shutdown.cancel();
    let handle = server.handle.take().unwrap();
    assert!(handle.join().unwrap().is_ok());
}

#[test]
fn test_bind_rejects_invalid_config() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .worker_threads(0)
        .build();
    let service = Arc::new(TrainerService::open(&config).unwrap());

    assert!(matches!(
        Server::bind(config, service),
        Err(RosterError::Config(_))
    ));
}

#[test]
fn test_bind_rejects_zero_backlog() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .max_pending_connections(0)
        .build();
    assert!(matches!(config.validate(), Err(RosterError::Config(_))));

    let service = Arc::new(TrainerService::open(&config).unwrap());
    assert!(matches!(
        Server::bind(config, service),
        Err(RosterError::Config(_))
    ));
}

#[test]
fn test_shutdown_joins_workers_after_serving() {
    let mut server = TestServer::start();
    {
        let mut client = server.client();
        client.create(vec![NewTrainer::new("Ash", 10)]).unwrap();
        client.list_by_name("ash").unwrap();
    }

    server.shutdown.cancel();
    let handle = server.handle.take().unwrap();
    assert!(handle.join().unwrap().is_ok());
    assert_eq!(server.service.mirror().len(), 1);
}
