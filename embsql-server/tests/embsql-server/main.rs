use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use embsql::{fixture, Engine, Error, Permissions, QueryEngine, Result};
use embsql_catalog::Provider;
use embsql_server::client::{Client, ClientError};
use embsql_server::{
    Authenticator, Config, Credentials, LocalAddr, Server, ShutdownHandle, StaticAuthenticator,
};

fn provider() -> Result<Arc<Provider>> {
    fixture::create_test_provider("employees", "student", 4)
}

fn config(protocol: &str, address: &str) -> Config {
    Config {
        protocol: protocol.into(),
        address: address.into(),
        auth: Arc::new(StaticAuthenticator::new("root", "123456", Permissions::ALL)),
    }
}

fn root() -> Credentials {
    Credentials::new("root", "123456")
}

struct RunningServer {
    addr: LocalAddr,
    shutdown: ShutdownHandle,
    handle: JoinHandle<Result<()>>,
}

impl RunningServer {
    fn start(config: Config, provider: Arc<Provider>) -> Result<Self> {
        let server = Server::new(config, Arc::new(Engine::new(provider)))?;
        let addr = server.local_addr().clone();
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.start());
        Ok(Self { addr, shutdown, handle })
    }

    fn stop(self) -> Result<()> {
        self.shutdown.shutdown();
        self.handle.join().expect("server thread panicked")
    }
}

#[test]
fn tcp_round_trip() -> Result<()> {
    let server = RunningServer::start(config("tcp", "127.0.0.1:0"), provider()?)?;

    let mut client = Client::connect(&server.addr, &root()).expect("connect");
    assert_eq!(client.username(), "root");
    assert_eq!(client.server_version(), env!("CARGO_PKG_VERSION"));

    let databases = client.query("SHOW DATABASES").expect("show databases");
    assert_eq!(databases.columns, ["database"]);
    assert_eq!(
        databases.rows,
        [vec![Some("employees".to_owned())], vec![Some("information_schema".to_owned())]]
    );

    client.query("USE employees").expect("use");
    let tables = client.query("SHOW TABLES").expect("show tables");
    assert_eq!(tables.rows.len(), 4);
    assert_eq!(tables.rows[3], [Some("student_0003".to_owned())]);

    let rows = client.query("SELECT * FROM student_0002").expect("select");
    assert_eq!(rows.columns.len(), 9);
    assert_eq!(rows.rows.len(), 2);
    assert_eq!(rows.rows[0][1].as_deref(), Some("2"));
    assert_eq!(rows.rows[1][1].as_deref(), Some("3"));

    let inserted = client
        .query("INSERT INTO student_0002 VALUES (DEFAULT, 7, 'Tab\there', DEFAULT, NULL, DEFAULT, DEFAULT, DEFAULT, DEFAULT)")
        .expect("insert");
    assert_eq!(inserted.rows[0][0].as_deref(), Some("3"));
    assert_eq!(inserted.rows[0][2].as_deref(), Some("Tab\there"));
    assert_eq!(inserted.rows[0][4], None);

    client.quit().expect("quit");
    server.stop()
}

#[test]
fn errors_keep_the_connection_open() -> Result<()> {
    let server = RunningServer::start(config("tcp", "127.0.0.1:0"), provider()?)?;
    let mut client = Client::connect(&server.addr, &root()).expect("connect");

    let err = client.query("SELECT * FROM student_0000").unwrap_err();
    assert!(matches!(&err, ClientError::Server(msg) if msg == "no database selected"), "{err}");

    let err = client.query("SELECT * FROM employees.missing").unwrap_err();
    assert!(matches!(&err, ClientError::Server(msg) if msg.contains("does not exist")), "{err}");

    let err = client.query("INSERT INTO employees.student_0000 VALUES (DEFAULT)").unwrap_err();
    assert!(matches!(err, ClientError::Server(_)), "{err}");

    let rows = client.query("select * from employees.student_0000").expect("select");
    assert_eq!(rows.rows.len(), 2);

    client.quit().expect("quit");
    server.stop()
}

#[test]
fn rejected_credentials() -> Result<()> {
    let server = RunningServer::start(config("tcp", "127.0.0.1:0"), provider()?)?;

    let err = Client::connect(&server.addr, &Credentials::new("root", "654321")).unwrap_err();
    assert!(matches!(&err, ClientError::Server(msg) if msg == "access denied for user `root`"), "{err}");

    // the listener survives a failed connection
    let client = Client::connect(&server.addr, &root()).expect("connect");
    client.quit().expect("quit");
    server.stop()
}

#[test]
fn concurrent_clients() -> Result<()> {
    let provider = provider()?;
    let server = RunningServer::start(config("tcp", "127.0.0.1:0"), Arc::clone(&provider))?;

    let clients = (0..4)
        .map(|_| {
            let addr = server.addr.clone();
            thread::spawn(move || {
                let mut client = Client::connect(&addr, &root()).expect("connect");
                for _ in 0..10 {
                    client
                        .query("INSERT INTO employees.student_0001 VALUES (DEFAULT, 1, 'x', DEFAULT, DEFAULT, DEFAULT, DEFAULT, DEFAULT, DEFAULT)")
                        .expect("insert");
                }
                client.quit().expect("quit");
            })
        })
        .collect::<Vec<_>>();
    for client in clients {
        client.join().expect("client thread panicked");
    }

    let table = provider.table("employees", "student_0001")?;
    assert_eq!(table.len(), 42);
    assert_eq!(table.next_auto_increment(), Some(43));
    server.stop()
}

#[test]
fn unbindable_address_fails_before_serving() -> Result<()> {
    let occupied = TcpListener::bind("127.0.0.1:0")?;
    let address = occupied.local_addr()?.to_string();

    let provider = provider()?;
    let engine = Arc::new(Engine::new(Arc::clone(&provider))) as Arc<dyn QueryEngine>;
    let err = Server::new(config("tcp", &address), Arc::clone(&engine)).err().expect("bind fails");
    assert!(matches!(err, Error::Configuration(_)), "{err}");

    // the engine was handed back untouched
    assert_eq!(Arc::strong_count(&engine), 1);
    for table in ["student_0000", "student_0003"] {
        assert_eq!(provider.table("employees", table)?.len(), 2);
    }
    Ok(())
}

#[test]
fn malformed_configuration() -> Result<()> {
    let engine = || Arc::new(Engine::new(Arc::new(Provider::default()))) as Arc<dyn QueryEngine>;

    let err = Server::new(config("udp", "127.0.0.1:0"), engine()).err().expect("bad protocol");
    assert_eq!(err.to_string(), "configuration error: unsupported protocol `udp`");

    let bad_auth = Config {
        auth: Arc::new(StaticAuthenticator::new("", "123456", Permissions::ALL))
            as Arc<dyn Authenticator>,
        ..config("tcp", "127.0.0.1:0")
    };
    let err = Server::new(bad_auth, engine()).err().expect("bad auth policy");
    assert!(matches!(err, Error::Configuration(_)), "{err}");

    let err = Server::new(config("tcp", "not an address"), engine()).err().expect("bad address");
    assert!(matches!(err, Error::Configuration(_)), "{err}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn unix_socket_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("embsql.sock");
    let address = path.to_str().expect("temp paths are utf8");

    let server = RunningServer::start(config("unix", address), provider()?)?;
    assert_eq!(server.addr, LocalAddr::Unix(path.clone()));

    let mut client = Client::connect(&server.addr, &root()).expect("connect");
    let tables = client.query("SHOW TABLES FROM employees").expect("show tables");
    assert_eq!(tables.rows.len(), 4);
    client.quit().expect("quit");

    server.stop()?;
    assert!(!path.exists(), "socket file is removed once the server is dropped");
    Ok(())
}

#[test]
fn shutdown_is_idempotent() -> Result<()> {
    let server = RunningServer::start(config("tcp", "127.0.0.1:0"), provider()?)?;
    let handle = server.shutdown.clone();
    assert!(!handle.is_shutdown());
    handle.shutdown();
    assert!(handle.is_shutdown());
    server.stop()
}
