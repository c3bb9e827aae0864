//! TCP front end: every accepted connection is handed to a fixed pool of
//! worker threads that answer from the shared cache.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::cache::BoundedLruCache;
use crate::error::ServerError;
use crate::generator::sample_file_name;
use crate::source::ContentSource;

/// How often the accept loop polls the listener while idle.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Listener and worker pool settings for [`FileServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub workers: usize,
    pub cache_capacity: usize,
    pub files_dir: PathBuf,
    pub file_count: u32,
    /// Stop accepting after this many connections. `None` runs forever.
    pub max_connections: Option<usize>,
    /// Stop accepting once no connection has arrived for this long. `None`
    /// waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8010)),
            workers: 5,
            cache_capacity: 3,
            files_dir: PathBuf::from("files"),
            file_count: 10,
            max_connections: None,
            idle_timeout: Some(Duration::from_secs(70)),
        }
    }
}

/// How a single request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
    /// The source could not produce the content; nothing was cached.
    Failed,
}

/// Answer one request for `key` into `out`.
///
/// On a hit the cached bytes are written after a `Cache HIT` line. On a miss
/// the content is loaded from `source` without holding the cache lock, stored,
/// and written after a `Cache MISS` line.
pub fn serve_key<W: Write + ?Sized>(
    cache: &BoundedLruCache,
    source: &dyn ContentSource,
    out: &mut W,
    key: &str,
) -> io::Result<Lookup> {
    if let Some(bytes) = cache.get(key) {
        debug!(key, size = bytes.len(), "cache hit");
        writeln!(out, "Cache HIT for {key}")?;
        out.write_all(&bytes)?;
        return Ok(Lookup::Hit);
    }

    debug!(key, "cache miss");
    writeln!(out, "Cache MISS for {key}")?;

    match source.load(key) {
        Ok(bytes) => {
            let bytes: Arc<[u8]> = bytes.into();
            cache.put(key, Arc::clone(&bytes));
            out.write_all(&bytes)?;
            Ok(Lookup::Miss)
        }
        Err(err) => {
            warn!(key, error = %err, "failed to load content");
            writeln!(out, "Error reading file: {err}")?;
            Ok(Lookup::Failed)
        }
    }
}

/// The set of sample files a client may be handed.
#[derive(Debug, Clone)]
struct FileSet {
    dir: PathBuf,
    count: u32,
}

impl FileSet {
    fn pick<R: Rng>(&self, rng: &mut R) -> String {
        let id = rng.gen_range(1..=self.count);
        self.dir
            .join(sample_file_name(id))
            .to_string_lossy()
            .into_owned()
    }
}

/// A bound listener plus the cache and content source its workers share.
pub struct FileServer {
    config: ServerConfig,
    listener: TcpListener,
    cache: Arc<BoundedLruCache>,
    source: Arc<dyn ContentSource>,
}

impl FileServer {
    /// Validate `config`, build the cache and bind the listener.
    pub fn bind(config: ServerConfig, source: Arc<dyn ContentSource>) -> Result<Self, ServerError> {
        if config.workers == 0 {
            return Err(ServerError::InvalidConfig(
                "worker pool size must be > 0".into(),
            ));
        }
        if config.file_count == 0 {
            return Err(ServerError::InvalidConfig("file count must be > 0".into()));
        }

        let cache = Arc::new(BoundedLruCache::new(config.cache_capacity)?);
        let listener = TcpListener::bind(config.addr)?;

        info!(
            addr = %listener.local_addr()?,
            workers = config.workers,
            capacity = config.cache_capacity,
            "server is listening"
        );

        Ok(Self {
            config,
            listener,
            cache,
            source,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the shared cache, usable after `run` has consumed the server.
    pub fn cache(&self) -> Arc<BoundedLruCache> {
        Arc::clone(&self.cache)
    }

    /// Run the accept loop until the connection limit is hit, the idle timeout
    /// passes without a new connection, or accepting fails.
    ///
    /// With an idle timeout the listener is polled in non-blocking mode.
    /// Workers drain any queued connections before this returns.
    pub fn run(self) -> Result<(), ServerError> {
        let idle_timeout = self.config.idle_timeout;
        self.listener.set_nonblocking(idle_timeout.is_some())?;

        let (tx, rx) = channel::unbounded::<TcpStream>();
        let files = FileSet {
            dir: self.config.files_dir.clone(),
            count: self.config.file_count,
        };

        let mut handles = Vec::with_capacity(self.config.workers);
        for n in 1..=self.config.workers {
            let rx = rx.clone();
            let cache = Arc::clone(&self.cache);
            let source = Arc::clone(&self.source);
            let files = files.clone();

            let handle = thread::Builder::new()
                .name(format!("client-thread-{n}"))
                .spawn(move || {
                    let mut rng = rand::thread_rng();
                    for stream in rx {
                        handle_client(stream, &cache, source.as_ref(), &files, &mut rng);
                    }
                })?;
            handles.push(handle);
        }
        drop(rx);

        let mut accepted = 0usize;
        let mut last_accept = Instant::now();
        let result = loop {
            if let Some(max) = self.config.max_connections
                && accepted >= max
            {
                break Ok(());
            }

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    accepted += 1;
                    last_accept = Instant::now();
                    debug!(%peer, "accepted connection");
                    if let Err(err) = stream.set_nonblocking(false) {
                        warn!(%peer, error = %err, "dropping connection");
                        continue;
                    }
                    if tx.send(stream).is_err() {
                        error!("all workers have exited");
                        break Ok(());
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if let Some(idle) = idle_timeout
                        && last_accept.elapsed() >= idle
                    {
                        info!(?idle, "no connection within the idle timeout");
                        break Ok(());
                    }
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    error!(error = %err, "accept failed");
                    break Err(ServerError::Io(err));
                }
            }
        };

        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }

        info!(accepted, "shutting down server");
        self.cache.log_state();
        result
    }
}

fn handle_client<R: Rng>(
    mut stream: TcpStream,
    cache: &BoundedLruCache,
    source: &dyn ContentSource,
    files: &FileSet,
    rng: &mut R,
) {
    let peer = stream.peer_addr().ok();
    let key = files.pick(rng);
    let worker = thread::current().name().unwrap_or("worker").to_owned();

    info!(%worker, key = %key, "requested");
    let outcome = serve_key(cache, source, &mut stream, &key).and_then(|lookup| {
        stream.flush()?;
        Ok(lookup)
    });

    match outcome {
        Ok(lookup) => debug!(%worker, key = %key, ?lookup, "request served"),
        Err(err) => warn!(%worker, key = %key, error = %err, "failed to write response"),
    }
    info!(?peer, "socket closed for client");
}
