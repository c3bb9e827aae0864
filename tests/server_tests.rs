use file_cache_server::{
    FileServer, FsSource, GeneratorConfig, ServerConfig, generate, sample_file_name,
};
use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn read_response(addr: SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn serves_generated_files_through_the_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let files_dir = tmp.path().join("files");
    let paths = generate(&GeneratorConfig {
        dir: files_dir.clone(),
        files: 2,
        lines_per_file: 5,
        line_width: 8,
        threads: 2,
    })
    .unwrap();
    assert_eq!(paths.len(), 2);

    let connections = 6;
    let server = FileServer::bind(
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            workers: 3,
            cache_capacity: 2,
            files_dir: files_dir.clone(),
            file_count: 2,
            max_connections: Some(connections),
            idle_timeout: None,
        },
        Arc::new(FsSource),
    )
    .unwrap();
    let addr = server.local_addr().unwrap();
    let cache = server.cache();
    let runner = thread::spawn(move || server.run());

    let expected: Vec<(String, String)> = (1..=2)
        .map(|id| {
            let path = files_dir.join(sample_file_name(id));
            let contents = std::fs::read_to_string(&path).unwrap();
            (path.to_string_lossy().into_owned(), contents)
        })
        .collect();

    for _ in 0..connections {
        let response = read_response(addr);
        let (status, body) = response.split_once('\n').unwrap();
        let key = status
            .strip_prefix("Cache HIT for ")
            .or_else(|| status.strip_prefix("Cache MISS for "))
            .unwrap_or_else(|| panic!("unexpected status line {status:?}"));
        let (_, contents) = expected
            .iter()
            .find(|(path, _)| path == key)
            .unwrap_or_else(|| panic!("server picked unknown file {key}"));
        assert_eq!(body, contents);
    }

    runner.join().unwrap().unwrap();

    // Both files fit, so each is loaded at most once.
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, connections as u64);
    assert_eq!(stats.puts, stats.misses);
    assert!(stats.misses <= 2);
    assert!(cache.len() <= 2);
}

#[test]
fn missing_files_are_reported_to_the_client() {
    let tmp = tempfile::tempdir().unwrap();
    let server = FileServer::bind(
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            workers: 1,
            cache_capacity: 1,
            files_dir: tmp.path().join("empty"),
            file_count: 3,
            max_connections: Some(1),
            idle_timeout: None,
        },
        Arc::new(FsSource),
    )
    .unwrap();
    let addr = server.local_addr().unwrap();
    let cache = server.cache();
    let runner = thread::spawn(move || server.run());

    let response = read_response(addr);
    let mut lines = response.lines();
    assert!(lines.next().unwrap().starts_with("Cache MISS for "));
    assert!(lines.next().unwrap().starts_with("Error reading file: "));

    runner.join().unwrap().unwrap();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn server_exits_after_idle_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let files_dir = tmp.path().join("files");
    generate(&GeneratorConfig {
        dir: files_dir.clone(),
        files: 1,
        lines_per_file: 3,
        line_width: 4,
        threads: 1,
    })
    .unwrap();

    let idle = Duration::from_millis(300);
    let server = FileServer::bind(
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            workers: 2,
            cache_capacity: 1,
            files_dir,
            file_count: 1,
            max_connections: None,
            idle_timeout: Some(idle),
        },
        Arc::new(FsSource),
    )
    .unwrap();
    let addr = server.local_addr().unwrap();
    let cache = server.cache();
    let started = Instant::now();
    let runner = thread::spawn(move || server.run());

    let response = read_response(addr);
    assert!(response.starts_with("Cache MISS for "));

    // No connection cap: only the idle timeout ends the loop.
    runner.join().unwrap().unwrap();
    assert!(started.elapsed() >= idle);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.len(), 1);
}
